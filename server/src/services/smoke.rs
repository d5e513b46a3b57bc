//! Monitoring smoke suite.
//!
//! ARCHITECTURE
//! ============
//! Exercises the write paths end to end (accounts, catalogue, cart,
//! checkout, order transitions) against the live database. Every fixture is
//! written inside one transaction which is rolled back at the end, whatever
//! the outcome, so production data is never touched. Progress is streamed to
//! the monitoring hub as `test_start`, one `test_log` per check,
//! `rollback_*` and finally `test_complete`.

use std::time::Instant;

use models::monitor::{RollbackEvent, TestComplete, TestLog, TestStart};
use models::{CheckoutRequest, MonitorMessage, OrderStatus, PaymentMethod, Role, User};
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use super::monitor::MonitorHub;
use super::orders::{self, OrderError};
use super::session::{USER_COLUMNS, UserRow};
use crate::state::AppState;

pub const SUITE: &str = "storefront-smoke";

const FIXTURE_PRICE_CENTS: i64 = 1000;
const FIXTURE_DISCOUNT: i32 = 10;
const FIXTURE_QUANTITY: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Check {
    CreateUsers,
    CreateCategory,
    CreateProduct,
    AddToCart,
    Checkout,
    StatusTransition,
}

impl Check {
    pub(crate) const ALL: [Self; 6] = [
        Self::CreateUsers,
        Self::CreateCategory,
        Self::CreateProduct,
        Self::AddToCart,
        Self::Checkout,
        Self::StatusTransition,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::CreateUsers => "create_users",
            Self::CreateCategory => "create_category",
            Self::CreateProduct => "create_product",
            Self::AddToCart => "add_to_cart",
            Self::Checkout => "checkout",
            Self::StatusTransition => "status_transition",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SmokeSummary {
    pub run_id: Uuid,
    pub passed: usize,
    pub failed: usize,
}

/// Ids created by earlier checks and consumed by later ones.
#[derive(Default)]
struct Fixture {
    client: Option<User>,
    artisan: Option<User>,
    category_id: Option<Uuid>,
    product_id: Option<Uuid>,
    order_id: Option<Uuid>,
}

fn missing(what: &str) -> String {
    format!("{what} fixture missing")
}

impl Fixture {
    async fn run(&mut self, check: Check, run_id: Uuid, conn: &mut PgConnection) -> Result<String, String> {
        match check {
            Check::CreateUsers => {
                let client = insert_user(conn, run_id, Role::Client).await.map_err(|e| e.to_string())?;
                let artisan = insert_user(conn, run_id, Role::Artisan).await.map_err(|e| e.to_string())?;
                let detail = format!("client {} and artisan {}", client.id, artisan.id);
                self.client = Some(client);
                self.artisan = Some(artisan);
                Ok(detail)
            }
            Check::CreateCategory => {
                let id: Uuid = sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
                    .bind(format!("smoke-{run_id}"))
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| e.to_string())?;
                self.category_id = Some(id);
                Ok(format!("category {id}"))
            }
            Check::CreateProduct => {
                let artisan = self.artisan.as_ref().ok_or_else(|| missing("artisan"))?;
                let id: Uuid = sqlx::query_scalar(
                    "INSERT INTO products (artisan_id, category_id, name, price_cents, discount_percent, stock)
                     VALUES ($1, $2, 'Smoke fixture', $3, $4, $5) RETURNING id",
                )
                .bind(artisan.id)
                .bind(self.category_id)
                .bind(FIXTURE_PRICE_CENTS)
                .bind(FIXTURE_DISCOUNT)
                .bind(FIXTURE_QUANTITY * 2)
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| e.to_string())?;
                self.product_id = Some(id);
                Ok(format!("product {id}"))
            }
            Check::AddToCart => {
                let client = self.client.as_ref().ok_or_else(|| missing("client"))?;
                let product_id = self.product_id.ok_or_else(|| missing("product"))?;
                sqlx::query("INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3)")
                    .bind(client.id)
                    .bind(product_id)
                    .bind(FIXTURE_QUANTITY)
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(format!("{FIXTURE_QUANTITY} x {product_id}"))
            }
            Check::Checkout => {
                let client_id = self.client.as_ref().ok_or_else(|| missing("client"))?.id;
                let req = CheckoutRequest {
                    shipping_address: "1 Smoke Test Lane".into(),
                    payment_method: PaymentMethod::CashOnDelivery,
                    payment_intent_id: None,
                };
                let order = orders::checkout_in_tx(conn, client_id, &req).await.map_err(|e| e.to_string())?;
                let expected = models::money::discounted_unit_price(FIXTURE_PRICE_CENTS, FIXTURE_DISCOUNT)
                    * i64::from(FIXTURE_QUANTITY);
                if order.total_cents != expected || order.items.len() != 1 {
                    return Err(format!(
                        "expected total {expected} with 1 item, got {} with {}",
                        order.total_cents,
                        order.items.len()
                    ));
                }
                self.order_id = Some(order.id);
                Ok(format!("order {} total {}", order.id, order.total_cents))
            }
            Check::StatusTransition => {
                let artisan = self.artisan.as_ref().ok_or_else(|| missing("artisan"))?;
                let order_id = self.order_id.ok_or_else(|| missing("order"))?;
                let accepted = orders::update_status_in_tx(conn, artisan, order_id, OrderStatus::Accepted)
                    .await
                    .map_err(|e| e.to_string())?;
                if accepted.status != OrderStatus::Accepted {
                    return Err(format!("order stayed {}", accepted.status));
                }
                match orders::update_status_in_tx(conn, artisan, order_id, OrderStatus::Delivered).await {
                    Err(OrderError::Transition(_)) => Ok("pending -> accepted allowed, accepted -> delivered rejected".into()),
                    Err(other) => Err(other.to_string()),
                    Ok(_) => Err("accepted -> delivered was not rejected".into()),
                }
            }
        }
    }
}

async fn insert_user(conn: &mut PgConnection, run_id: Uuid, role: Role) -> Result<User, sqlx::Error> {
    let sql = format!(
        "INSERT INTO users AS u (name, email, password_hash, role) VALUES ($1, $2, '!', $3) RETURNING {USER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(format!("Smoke {role}"))
        .bind(format!("smoke-{run_id}-{role}@smoke.invalid"))
        .bind(role.as_str())
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.into())
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Run the suite once, streaming progress to `hub`.
pub async fn run_smoke(pool: &PgPool, hub: &MonitorHub, run_id: Uuid) -> SmokeSummary {
    let started = Instant::now();
    let total = Check::ALL.len();
    hub.publish(MonitorMessage::TestStart(TestStart { run_id, suite: SUITE.to_owned(), checks: total }));

    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            warn!(%run_id, error = %e, "smoke run could not open a transaction");
            for check in Check::ALL {
                publish_log(hub, run_id, check, &Err(format!("no transaction: {e}")));
            }
            hub.publish(MonitorMessage::TestComplete(TestComplete {
                run_id,
                passed: 0,
                failed: total,
                duration_ms: elapsed_ms(started),
            }));
            return SmokeSummary { run_id, passed: 0, failed: total };
        }
    };

    let mut fixture = Fixture::default();
    let mut passed = 0;
    let mut failed = 0;
    for check in Check::ALL {
        // A failed statement aborts the transaction, so later checks cannot run.
        let outcome = if failed > 0 {
            Err("skipped after an earlier failure".to_owned())
        } else {
            fixture.run(check, run_id, &mut tx).await
        };
        if outcome.is_ok() { passed += 1 } else { failed += 1 }
        publish_log(hub, run_id, check, &outcome);
    }

    let reason = "smoke fixtures are never committed".to_owned();
    hub.publish(MonitorMessage::RollbackStart(RollbackEvent { run_id, reason: reason.clone() }));
    match tx.rollback().await {
        Ok(()) => {
            hub.publish(MonitorMessage::RollbackComplete(RollbackEvent { run_id, reason }));
        }
        Err(e) => {
            warn!(%run_id, error = %e, "smoke rollback failed");
            hub.publish(MonitorMessage::RollbackFailed(RollbackEvent { run_id, reason: e.to_string() }));
        }
    }

    let duration_ms = elapsed_ms(started);
    hub.publish(MonitorMessage::TestComplete(TestComplete { run_id, passed, failed, duration_ms }));
    info!(%run_id, passed, failed, duration_ms, "smoke run finished");
    SmokeSummary { run_id, passed, failed }
}

fn publish_log(hub: &MonitorHub, run_id: Uuid, check: Check, outcome: &Result<String, String>) {
    let (passed, detail) = match outcome {
        Ok(detail) => (true, detail.clone()),
        Err(detail) => (false, detail.clone()),
    };
    hub.publish(MonitorMessage::TestLog(TestLog { run_id, check: check.name().to_owned(), passed, detail }));
}

/// Start a smoke run in the background and return its id.
pub fn spawn_smoke_run(state: &AppState) -> Uuid {
    let run_id = Uuid::new_v4();
    let pool = state.pool.clone();
    let hub = state.monitor.clone();
    tokio::spawn(async move {
        run_smoke(&pool, &hub, run_id).await;
    });
    run_id
}

#[cfg(test)]
#[path = "smoke_test.rs"]
mod tests;
