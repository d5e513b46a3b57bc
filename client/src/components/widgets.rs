//! Shared storefront widgets.
//!
//! Each function returns a [`View`] fragment; pages compose them inside
//! [`page_shell`]. Buttons encode their action as `name:arg:arg` in
//! `data-action` (see [`crate::app::Action::from_data_action`]).

use models::money::format_cents;
use models::{Cart, Order, OrderStatus, Paged, Product, Role};

use super::view::{View, alert, button, el, heading, link, list, paragraph, table, text};
use crate::state::session::Session;
use crate::state::toast::{Toast, ToastLevel};
use crate::util::location::with_query;

#[cfg(test)]
#[path = "widgets_test.rs"]
mod tests;

/// `1234` -> `"$12.34"`.
#[must_use]
pub fn money(cents: i64) -> String {
    format!("${}", format_cents(cents))
}

/// Discounted price, with the list price when a discount applies.
#[must_use]
pub fn price_label(product: &Product) -> String {
    if product.discount_percent > 0 && product.discounted_price_cents != product.price_cents {
        format!(
            "{} (was {}, -{}%)",
            money(product.discounted_price_cents),
            money(product.price_cents),
            product.discount_percent
        )
    } else {
        money(product.price_cents)
    }
}

/// Links available to the viewer's role.
#[must_use]
pub fn nav_links(session: Option<&Session>) -> Vec<(&'static str, &'static str)> {
    let mut links = vec![("/", "Shop")];
    let Some(session) = session else {
        links.extend([("/login", "Log in"), ("/register", "Register")]);
        return links;
    };
    links.extend([("/cart", "Cart"), ("/orders", "Orders"), ("/profile", "Profile")]);
    match session.user.role {
        Role::Artisan => links.push(("/artisan", "Artisan")),
        Role::Admin => links.push(("/admin", "Admin")),
        Role::Client => {}
    }
    links
}

#[must_use]
pub fn navbar(session: Option<&Session>) -> View {
    let mut nav = el("nav").class("navbar").children(
        nav_links(session)
            .into_iter()
            .map(|(href, label)| el("span").child(link(href, label)).text(" ")),
    );
    if let Some(session) = session {
        nav = nav
            .child(el("span").class("navbar-text").text(format!("{} ({}) ", session.user.name, session.user.role)))
            .child(button("logout", "Log out"));
    }
    nav.into()
}

#[must_use]
pub fn toast_stack(toasts: &[Toast]) -> View {
    View::Fragment(
        toasts
            .iter()
            .map(|toast| {
                let level = match toast.level {
                    ToastLevel::Error => "danger",
                    other => other.as_str(),
                };
                alert(level, toast.message.clone()).into()
            })
            .collect(),
    )
}

/// Navbar, title and body of one page.
#[must_use]
pub fn page_shell(session: Option<&Session>, title: &str, body: Vec<View>) -> View {
    el("div")
        .class("page")
        .child(navbar(session))
        .child(el("section").child(heading(1, title)).children(body))
        .into()
}

#[must_use]
pub fn product_table(products: &[Product]) -> View {
    let rows = products
        .iter()
        .map(|p| {
            vec![
                link(format!("/product?id={}", p.id), p.name.clone()).into(),
                text(p.category_name.clone().unwrap_or_default()),
                text(p.artisan_name.clone().unwrap_or_default()),
                text(price_label(p)),
                text(if p.stock > 0 { p.stock.to_string() } else { "sold out".to_owned() }),
            ]
        })
        .collect();
    table(&["Product", "Category", "Artisan", "Price", "Stock"], rows).into()
}

#[must_use]
pub fn cart_table(cart: &Cart, editable: bool) -> View {
    let mut headers = vec!["Product", "Qty", "Unit", "Line"];
    if editable {
        headers.push("");
    }
    let rows = cart
        .items
        .iter()
        .map(|item| {
            let mut row = vec![
                text(item.name.clone()),
                text(item.quantity.to_string()),
                text(money(item.discounted_price_cents)),
                text(money(item.line_total_cents)),
            ];
            if editable {
                row.push(button(format!("remove-from-cart:{}", item.product_id), "Remove").into());
            }
            row
        })
        .collect();
    View::Fragment(vec![
        table(&headers, rows).into(),
        paragraph(format!("{} item(s), total {}", cart.item_count, money(cart.total_cents))).into(),
    ])
}

/// Status buttons the viewer may press for `order`.
#[must_use]
pub fn status_actions(order: &Order, role: Role) -> Vec<OrderStatus> {
    match role {
        Role::Admin => OrderStatus::ALL.into_iter().filter(|s| *s != order.status).collect(),
        Role::Artisan => order.status.allowed_next().to_vec(),
        Role::Client => Vec::new(),
    }
}

#[must_use]
pub fn order_table(orders: &[Order], role: Role) -> View {
    let rows = orders
        .iter()
        .map(|order| {
            let actions = status_actions(order, role)
                .into_iter()
                .map(|next| button(format!("order-status:{}:{next}", order.id), format!("Mark {next}")));
            vec![
                text(order.id.to_string()),
                text(order.customer_name.clone().unwrap_or_default()),
                text(order.status.to_string()),
                text(order.items.len().to_string()),
                text(money(order.total_cents)),
                el("span").children(actions).into(),
            ]
        })
        .collect();
    table(&["Order", "Customer", "Status", "Items", "Total", "Actions"], rows).into()
}

/// Previous/next links preserving the other query parameters.
#[must_use]
pub fn pagination<T>(path: &str, params: &[(String, String)], paged: &Paged<T>) -> View {
    let pages = paged.total_pages().max(1);
    let mut parts = vec![text(format!("Page {} of {pages} ({} total) ", paged.page, paged.total))];
    let href = |page: u32| {
        let page = page.to_string();
        let mut pairs: Vec<(&str, &str)> =
            params.iter().filter(|(k, _)| k != "page").map(|(k, v)| (k.as_str(), v.as_str())).collect();
        pairs.push(("page", page.as_str()));
        with_query(path, &pairs)
    };
    if paged.page > 1 {
        parts.push(link(href(paged.page - 1), "Previous").into());
        parts.push(text(" "));
    }
    if paged.page < pages {
        parts.push(link(href(paged.page + 1), "Next").into());
    }
    el("div").class("pagination").children(parts).into()
}

/// Bulleted `label: value` pairs.
#[must_use]
pub fn details(pairs: Vec<(&str, String)>) -> View {
    list(pairs.into_iter().map(|(label, value)| format!("{label}: {value}"))).into()
}
