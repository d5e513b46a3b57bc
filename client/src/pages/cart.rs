//! Cart page (`/cart`, signed in).

use models::Cart;

use crate::components::view::{View, button, el, link, paragraph};
use crate::components::widgets::{cart_table, page_shell};
use crate::router::{LoadResult, Page};
use crate::state::session::Session;

use super::{Ctx, boxed};

pub struct CartPage {
    pub session: Option<Session>,
    pub cart: Cart,
}

impl Page for CartPage {
    fn render(&self) -> View {
        let body = if self.cart.is_empty() {
            vec![
                paragraph("Your cart is empty.").into(),
                link("/", "Browse the catalogue").into(),
            ]
        } else {
            vec![
                cart_table(&self.cart, true),
                el("p")
                    .child(button("clear-cart", "Clear cart"))
                    .text(" ")
                    .child(link("/checkout", "Proceed to checkout"))
                    .into(),
            ]
        };
        page_shell(self.session.as_ref(), "Your cart", body)
    }
}

pub async fn load(ctx: Ctx) -> LoadResult {
    let cart = ctx.services.api.cart().get().await?;
    Ok(boxed(CartPage { session: ctx.services.session.current(), cart }))
}
