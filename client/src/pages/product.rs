//! Product detail page (`/product?id=<uuid>`).

use models::{Product, Role};
use uuid::Uuid;

use crate::components::view::{View, alert, button, paragraph};
use crate::components::widgets::{details, page_shell, price_label};
use crate::router::{LoadResult, Page, PageError};
use crate::state::session::Session;

use super::{Ctx, boxed, parse_param};

pub struct ProductPage {
    pub session: Option<Session>,
    pub product: Product,
}

impl ProductPage {
    /// Only signed-in shoppers get an add-to-cart control, and only while
    /// the product is in stock.
    fn can_buy(&self) -> bool {
        self.product.is_active
            && self.product.stock > 0
            && self.session.as_ref().is_some_and(|s| s.user.role == Role::Client)
    }
}

impl Page for ProductPage {
    fn render(&self) -> View {
        let p = &self.product;
        let mut body = vec![details(vec![
            ("Price", price_label(p)),
            ("Artisan", p.artisan_name.clone().unwrap_or_else(|| p.artisan_id.to_string())),
            ("Category", p.category_name.clone().unwrap_or_else(|| "Uncategorized".to_owned())),
            ("In stock", p.stock.to_string()),
        ])];
        if let Some(description) = &p.description {
            body.push(paragraph(description.clone()).into());
        }
        if !p.is_active {
            body.push(alert("warning", "This product is no longer listed.").into());
        } else if p.stock <= 0 {
            body.push(alert("info", "Sold out.").into());
        }
        if self.can_buy() {
            body.push(button(format!("add-to-cart:{}", p.id), "Add to cart").into());
        } else if self.session.is_none() {
            body.push(paragraph("Log in to buy this item.").into());
        }
        page_shell(self.session.as_ref(), &p.name, body)
    }
}

pub async fn load(ctx: Ctx) -> LoadResult {
    let id: Uuid = parse_param(&ctx, "id").ok_or_else(|| PageError::invalid("Missing or invalid product id"))?;
    let product = ctx.services.api.products().get(id).await?;
    Ok(boxed(ProductPage { session: ctx.services.session.current(), product }))
}
