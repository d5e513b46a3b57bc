//! Checkout page (`/checkout`, shoppers only).
//!
//! Loads the cart and refreshes the profile together so the shipping address
//! field is prefilled with the latest saved address.

use models::{Cart, PaymentMethod, User};

use crate::components::view::{View, alert, button, el, input, link};
use crate::components::widgets::{cart_table, page_shell};
use crate::router::{LoadResult, Page};
use crate::state::session::Session;

use super::{Ctx, boxed};

pub struct CheckoutPage {
    pub session: Option<Session>,
    pub cart: Cart,
    pub user: User,
}

impl Page for CheckoutPage {
    fn render(&self) -> View {
        if self.cart.is_empty() {
            return page_shell(
                self.session.as_ref(),
                "Checkout",
                vec![alert("info", "Your cart is empty.").into(), link("/", "Browse the catalogue").into()],
            );
        }
        let methods = el("select").attr("name", "payment_method").children(
            [PaymentMethod::CashOnDelivery, PaymentMethod::Card]
                .map(|m| el("option").attr("value", m.as_str()).text(m.as_str())),
        );
        let form = el("form")
            .attr("data-form", "checkout")
            .child(input("shipping_address", "text", self.user.address.clone().unwrap_or_default()))
            .child(methods)
            .child(input("payment_intent_id", "text", ""))
            .child(button("checkout", "Place order"));
        page_shell(self.session.as_ref(), "Checkout", vec![cart_table(&self.cart, false), form.into()])
    }
}

pub async fn load(ctx: Ctx) -> LoadResult {
    let api = &ctx.services.api;
    let (cart_api, auth_api) = (api.cart(), api.auth());
    let (cart, user) = tokio::join!(cart_api.get(), auth_api.me());
    Ok(boxed(CheckoutPage { session: ctx.services.session.current(), cart: cart?, user: user? }))
}
