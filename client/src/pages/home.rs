//! Catalogue page (`/`).
//!
//! Categories, artisans and the filtered product page are fetched
//! concurrently. Filters come from the query string: `category`, `artisan`,
//! `search`, `min_price`, `max_price` (cents), `sort`, `page`.

use models::{ArtisanSummary, Category, Paged, Product, ProductQuery, ProductSort};
use uuid::Uuid;

use crate::components::view::{View, el, heading, link, list, paragraph};
use crate::components::widgets::{page_shell, pagination, product_table};
use crate::router::{LoadResult, Page};
use crate::state::session::Session;
use crate::util::location::with_query;

use super::{Ctx, boxed, parse_param};

#[cfg(test)]
#[path = "home_test.rs"]
mod tests;

pub struct HomePage {
    pub session: Option<Session>,
    pub categories: Vec<Category>,
    pub artisans: Vec<ArtisanSummary>,
    pub products: Paged<Product>,
    pub params: Vec<(String, String)>,
}

#[must_use]
pub fn parse_sort(raw: &str) -> Option<ProductSort> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "newest" => Some(ProductSort::Newest),
        "price_asc" => Some(ProductSort::PriceAsc),
        "price_desc" => Some(ProductSort::PriceDesc),
        "name" => Some(ProductSort::Name),
        _ => None,
    }
}

/// Catalogue filters from the location's query string.
#[must_use]
pub fn product_query(ctx: &Ctx) -> ProductQuery {
    ProductQuery {
        category_id: parse_param::<Uuid>(ctx, "category"),
        artisan_id: parse_param::<Uuid>(ctx, "artisan"),
        search: ctx.location.non_empty_param("search").map(str::to_owned),
        min_price: parse_param(ctx, "min_price"),
        max_price: parse_param(ctx, "max_price"),
        sort: ctx.location.param("sort").and_then(parse_sort),
        include_inactive: None,
        page: parse_param(ctx, "page"),
        per_page: parse_param(ctx, "per_page"),
    }
}

impl Page for HomePage {
    fn render(&self) -> View {
        let categories = list(
            std::iter::once::<View>(link("/", "All").into()).chain(
                self.categories
                    .iter()
                    .map(|c| link(with_query("/", &[("category", c.id.to_string().as_str())]), c.name.clone()).into()),
            ),
        );
        let artisans = list(
            self.artisans
                .iter()
                .map(|a| link(with_query("/", &[("artisan", a.id.to_string().as_str())]), a.name.clone())),
        );
        let mut body: Vec<View> = vec![
            el("aside").child(heading(2, "Categories")).child(categories).into(),
            el("aside").child(heading(2, "Artisans")).child(artisans).into(),
            heading(2, "Products").into(),
        ];
        if self.products.items.is_empty() {
            body.push(paragraph("No products match these filters.").into());
        } else {
            body.push(product_table(&self.products.items));
        }
        body.push(pagination("/", &self.params, &self.products));
        page_shell(self.session.as_ref(), "Handmade goods", body)
    }
}

pub async fn load(ctx: Ctx) -> LoadResult {
    let api = &ctx.services.api;
    let query = product_query(&ctx);
    let (categories_api, users_api, products_api) = (api.categories(), api.users(), api.products());
    let (categories, artisans, products) =
        tokio::join!(categories_api.list(), users_api.artisans(), products_api.list(&query));
    Ok(boxed(HomePage {
        session: ctx.services.session.current(),
        categories: categories?,
        artisans: artisans?,
        products: products?,
        params: ctx.location.query.clone(),
    }))
}
