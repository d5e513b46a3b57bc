use super::*;
use crate::app::Services;
use crate::router::PageContext;
use crate::state::session::SessionStore;
use crate::util::location::Location;
use tokio_util::sync::CancellationToken;

fn ctx(path: &str) -> Ctx {
    PageContext {
        services: Services::new("http://127.0.0.1:9", SessionStore::in_memory()),
        location: Location::parse(path),
        cancel: CancellationToken::new(),
    }
}

#[test]
fn parse_sort_accepts_known_values_only() {
    assert_eq!(parse_sort("price_asc"), Some(ProductSort::PriceAsc));
    assert_eq!(parse_sort(" NAME "), Some(ProductSort::Name));
    assert_eq!(parse_sort("cheapest"), None);
}

#[test]
fn product_query_reads_filters_from_location() {
    let category = Uuid::new_v4();
    let q = product_query(&ctx(&format!("/?category={category}&search=mug&min_price=500&sort=price_desc&page=3")));
    assert_eq!(q.category_id, Some(category));
    assert_eq!(q.search.as_deref(), Some("mug"));
    assert_eq!(q.min_price, Some(500));
    assert_eq!(q.sort, Some(ProductSort::PriceDesc));
    assert_eq!(q.page, Some(3));
}

#[test]
fn product_query_ignores_malformed_values() {
    let q = product_query(&ctx("/?category=nope&min_price=cheap&search=%20"));
    assert!(q.category_id.is_none());
    assert!(q.min_price.is_none());
    assert!(q.search.is_none());
}
