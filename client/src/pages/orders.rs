//! Orders page (`/orders`, signed in).
//!
//! Shoppers see their own orders; artisans see orders they placed or that
//! contain their products and get buttons for the next allowed statuses;
//! admins see every order and may set any status.

use models::{Order, OrderQuery, OrderStatus, Paged, Role};

use crate::components::view::{View, el, link, paragraph, text};
use crate::components::widgets::{order_table, page_shell, pagination};
use crate::router::{LoadResult, Page};
use crate::state::session::Session;

use super::{Ctx, boxed, parse_param};

pub struct OrdersPage {
    pub session: Option<Session>,
    pub orders: Paged<Order>,
    pub status: Option<OrderStatus>,
    pub params: Vec<(String, String)>,
}

impl OrdersPage {
    fn role(&self) -> Role {
        self.session.as_ref().map_or(Role::Client, |s| s.user.role)
    }
}

impl Page for OrdersPage {
    fn render(&self) -> View {
        let filters = el("p").text("Status: ").child(link("/orders", "all")).children(
            OrderStatus::ALL
                .into_iter()
                .flat_map(|s| [text(" "), link(format!("/orders?status={s}"), s.as_str()).into()]),
        );
        let mut body: Vec<View> = vec![filters.into()];
        if self.orders.items.is_empty() {
            let message = match self.status {
                Some(status) => format!("No {status} orders."),
                None => "No orders yet.".to_owned(),
            };
            body.push(paragraph(message).into());
        } else {
            body.push(order_table(&self.orders.items, self.role()));
        }
        body.push(pagination("/orders", &self.params, &self.orders));
        page_shell(self.session.as_ref(), "Orders", body)
    }
}

pub async fn load(ctx: Ctx) -> LoadResult {
    let status = ctx.location.param("status").and_then(OrderStatus::parse);
    let query = OrderQuery { status, page: parse_param(&ctx, "page"), per_page: parse_param(&ctx, "per_page") };
    let orders = ctx.services.api.orders().list(&query).await?;
    Ok(boxed(OrdersPage {
        session: ctx.services.session.current(),
        orders,
        status,
        params: ctx.location.query.clone(),
    }))
}
