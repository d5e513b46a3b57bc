use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use client::app::{Action, App};
use client::net::ApiError;
use client::net::monitor::{RECONNECT_DELAY, monitor_url, run_monitor};
use client::state::dashboard::DashboardState;
use client::state::session::FileStorage;
use models::{CheckoutRequest, OrderStatus, PaymentMethod, RegisterRequest, Role};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use uuid::Uuid;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

const APP_NAME: &str = "storefront";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("not signed in; run `storefront login` first")]
    NotSignedIn,
    #[error("navigation to {0} did not complete")]
    Navigation(String),
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("action `{action}` is not offered on {path}")]
    ActionUnavailable { action: String, path: String },
    #[error("could not determine a session file location; pass --session-file")]
    NoSessionPath,
}

#[derive(Parser, Debug)]
#[command(name = "storefront", about = "Artisan storefront terminal client")]
struct Cli {
    #[arg(long, env = "STOREFRONT_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Where the signed-in session is kept between runs.
    #[arg(long, env = "STOREFRONT_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Log client activity to stderr.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a page and print it.
    Open { path: String },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_PASSWORD")]
        password: String,
        /// Page to open after signing in.
        #[arg(long)]
        redirect: Option<String>,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_PASSWORD")]
        password: String,
        #[arg(long, value_parser = parse_role)]
        role: Option<Role>,
    },
    Logout,
    Whoami,
    Cart(CartCommand),
    Checkout {
        #[arg(long)]
        address: String,
        #[arg(long, value_parser = parse_payment_method, default_value = "cash_on_delivery")]
        payment_method: PaymentMethod,
        #[arg(long)]
        payment_intent: Option<String>,
    },
    OrderStatus {
        order_id: Uuid,
        #[arg(value_parser = parse_order_status)]
        status: OrderStatus,
    },
    /// Press a button (`data-action`) offered on a page.
    Act {
        action: String,
        #[arg(long, default_value = "/")]
        on: String,
    },
    /// Stream the admin monitoring feed.
    Monitor {
        #[arg(long, env = "STOREFRONT_MONITOR_URL")]
        url: Option<String>,
        /// Stop after this many seconds instead of waiting for Ctrl-C.
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Subcommand, Debug)]
enum CartSubcommand {
    Show,
    Add {
        product_id: Uuid,
        #[arg(long, default_value_t = 1)]
        quantity: i32,
    },
    Set {
        product_id: Uuid,
        quantity: i32,
    },
    Remove {
        product_id: Uuid,
    },
    Clear,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role `{raw}`"))
}

fn parse_payment_method(raw: &str) -> Result<PaymentMethod, String> {
    PaymentMethod::parse(raw).ok_or_else(|| format!("unknown payment method `{raw}`"))
}

fn parse_order_status(raw: &str) -> Result<OrderStatus, String> {
    OrderStatus::parse(raw).ok_or_else(|| format!("unknown order status `{raw}`"))
}

fn session_path(explicit: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let dir = dirs::config_dir().ok_or(CliError::NoSessionPath)?;
    Ok(dir.join(APP_NAME).join(SESSION_FILE))
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let storage = FileStorage::new(session_path(cli.session_file)?);
    let app = App::new(&cli.base_url, Arc::new(storage));

    match cli.command {
        Command::Open { path } => open(&app, &path).await,
        Command::Login { email, password, redirect } => {
            act(&app, Action::Login { email, password, redirect }, "/").await
        }
        Command::Register { name, email, password, role } => {
            act(&app, Action::Register(RegisterRequest { name, email, password, role }), "/").await
        }
        Command::Logout => act(&app, Action::Logout, "/login").await,
        Command::Whoami => whoami(&app).await,
        Command::Cart(cart) => run_cart(&app, cart).await,
        Command::Checkout { address, payment_method, payment_intent } => {
            let req = CheckoutRequest { shipping_address: address, payment_method, payment_intent_id: payment_intent };
            act(&app, Action::Checkout(req), "/orders").await
        }
        Command::OrderStatus { order_id, status } => {
            act(&app, Action::UpdateOrderStatus { order_id, status }, "/orders").await
        }
        Command::Act { action, on } => press(&app, &action, &on).await,
        Command::Monitor { url, seconds } => monitor(&app, url, seconds.map(Duration::from_secs)).await,
    }
}

async fn open(app: &App, path: &str) -> Result<(), CliError> {
    app.open(path).await.ok_or_else(|| CliError::Navigation(path.to_owned()))?;
    println!("{}", app.render_text());
    Ok(())
}

/// Dispatch `action`, then print where it led (or `fallback` when the
/// action itself does not navigate).
async fn act(app: &App, action: Action, fallback: &str) -> Result<(), CliError> {
    let result = app.dispatch(action).await;
    if app.router().current().is_none() {
        app.open(fallback).await;
    }
    println!("{}", app.render_text());
    result?;
    Ok(())
}

async fn run_cart(app: &App, cart: CartCommand) -> Result<(), CliError> {
    let action = match cart.command {
        CartSubcommand::Show => return open(app, "/cart").await,
        CartSubcommand::Add { product_id, quantity } => Action::AddToCart { product_id, quantity },
        CartSubcommand::Set { product_id, quantity } => Action::SetCartQuantity { product_id, quantity },
        CartSubcommand::Remove { product_id } => Action::RemoveFromCart(product_id),
        CartSubcommand::Clear => Action::ClearCart,
    };
    act(app, action, "/cart").await
}

async fn whoami(app: &App) -> Result<(), CliError> {
    if !app.services().session.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    let user = app.services().api.auth().me().await?;
    println!("{} <{}> ({})", user.name, user.email, user.role);
    Ok(())
}

/// Open `path`, check the page offers `raw`, and dispatch it.
async fn press(app: &App, raw: &str, path: &str) -> Result<(), CliError> {
    let action = Action::from_data_action(raw).ok_or_else(|| CliError::UnknownAction(raw.to_owned()))?;
    app.open(path).await.ok_or_else(|| CliError::Navigation(path.to_owned()))?;
    let offered = app.router().render().is_some_and(|view| view.actions().iter().any(|a| a == raw));
    if !offered {
        return Err(CliError::ActionUnavailable { action: raw.to_owned(), path: path.to_owned() });
    }
    act(app, action, path).await
}

async fn monitor(app: &App, url: Option<String>, limit: Option<Duration>) -> Result<(), CliError> {
    let token = app.services().session.token().ok_or(CliError::NotSignedIn)?;
    let url = url.unwrap_or_else(|| monitor_url(app.services().api.base_url(), &token));
    let (tx, mut rx) = watch::channel(DashboardState::default());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_monitor(url, tx, cancel.clone(), RECONNECT_DELAY));

    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => {
                // Err means no signal handler could be installed; run until killed.
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", dashboard_line(&rx.borrow_and_update()));
            }
        }
    }
    cancel.cancel();
    if let Err(e) = task.await {
        tracing::warn!(error = %e, "monitor task ended abnormally");
    }
    Ok(())
}

/// One status line per dashboard change.
fn dashboard_line(state: &DashboardState) -> String {
    let link = if state.connected { "up" } else { "down" };
    let mut line = format!("[{link}]");
    if let Some(m) = &state.metrics {
        line.push_str(&format!(
            " req={} 4xx={} 5xx={} inflight={} ws={}",
            m.requests_total, m.client_errors, m.server_errors, m.in_flight, m.ws_subscribers
        ));
    }
    if let Some(run) = &state.run {
        match &run.result {
            Some(done) => line.push_str(&format!(" {}: {} passed {} failed", run.suite, done.passed, done.failed)),
            None => line.push_str(&format!(" {}: {}/{}", run.suite, run.logs.len(), run.checks)),
        }
    }
    if let Some(last) = state.rollbacks.last() {
        line.push_str(&format!(" rollback {:?}: {}", last.stage, last.reason));
    }
    line
}
