//! Artisan dashboard (`/artisan`, artisans only): own listings, including
//! inactive ones, and the orders that contain them.

use models::{Order, OrderQuery, Paged, Product, ProductQuery, Role};

use crate::components::view::{View, button, heading, link, paragraph, table, text};
use crate::components::widgets::{money, order_table, page_shell};
use crate::router::{LoadResult, Page, PageError};
use crate::state::session::Session;

use super::{Ctx, boxed};

pub struct ArtisanPage {
    pub session: Option<Session>,
    pub products: Paged<Product>,
    pub orders: Paged<Order>,
}

fn listing_rows(products: &[Product]) -> Vec<Vec<View>> {
    products
        .iter()
        .map(|p| {
            let status = if p.is_active { "listed" } else { "inactive" };
            let mut row = vec![
                link(format!("/product?id={}", p.id), p.name.clone()).into(),
                text(money(p.price_cents)),
                text(format!("{}%", p.discount_percent)),
                text(p.stock.to_string()),
                text(status),
            ];
            row.push(if p.is_active {
                button(format!("delete-product:{}", p.id), "Unlist").into()
            } else {
                text("")
            });
            row
        })
        .collect()
}

impl Page for ArtisanPage {
    fn render(&self) -> View {
        let mut body = vec![heading(2, format!("Your products ({})", self.products.total)).into()];
        if self.products.items.is_empty() {
            body.push(paragraph("You have not listed any products yet.").into());
        } else {
            body.push(
                table(&["Product", "Price", "Discount", "Stock", "Status", ""], listing_rows(&self.products.items)).into(),
            );
        }
        body.push(heading(2, format!("Orders ({})", self.orders.total)).into());
        body.push(order_table(&self.orders.items, Role::Artisan));
        page_shell(self.session.as_ref(), "Artisan dashboard", body)
    }
}

pub async fn load(ctx: Ctx) -> LoadResult {
    let session = ctx.services.session.current().ok_or_else(|| PageError::invalid("Not signed in"))?;
    let api = &ctx.services.api;
    let products_query = ProductQuery {
        artisan_id: Some(session.user.id),
        include_inactive: Some(true),
        per_page: Some(100),
        ..ProductQuery::default()
    };
    let (products_api, orders_api) = (api.products(), api.orders());
    let order_query = OrderQuery::default();
    let (products, orders) = tokio::join!(products_api.list(&products_query), orders_api.list(&order_query));
    Ok(boxed(ArtisanPage { session: Some(session), products: products?, orders: orders? }))
}
