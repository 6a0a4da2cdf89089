//! Dynamic `SELECT` composition for product listings.
//!
//! Every user-supplied value goes through `push_bind`; only fixed SQL
//! fragments are pushed as text.

use sqlx::{Postgres, QueryBuilder};

use dresscode_catalog::{PAGE_LIMIT, ProductFilter};
use dresscode_core::{Page, UserId};

pub(super) const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.collection_id, \
     c.name AS collection_name, p.category, p.color, p.main_photo_url";

/// `SELECT` of product summaries with `is_liked` for `viewer`, ending in an
/// open `WHERE TRUE` ready for `AND` clauses.
pub(super) fn select_products(viewer: Option<UserId>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(PRODUCT_COLUMNS);
    qb.push(", EXISTS (SELECT 1 FROM liked_products l WHERE l.product_id = p.id AND l.user_id = ");
    qb.push_bind(viewer.map(UserId::get));
    qb.push(") AS is_liked FROM products p LEFT JOIN collections c ON c.id = p.collection_id WHERE TRUE");
    qb
}

pub(super) fn product_listing(
    filter: &ProductFilter,
    viewer: Option<UserId>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = select_products(viewer);

    if let Some(collection) = filter.collection_id {
        qb.push(" AND p.collection_id = ").push_bind(collection.get());
    }
    if let Some(category) = &filter.category {
        qb.push(" AND p.category = ").push_bind(category.clone());
    }
    if !filter.colors.is_empty() {
        qb.push(" AND p.color = ANY(")
            .push_bind(filter.colors.clone())
            .push(")");
    }
    if !filter.sizes.is_empty() {
        // A size only counts while it has stock; EXISTS keeps products distinct.
        qb.push(" AND EXISTS (SELECT 1 FROM sizes s WHERE s.product_id = p.id AND s.amount > 0 AND s.name = ANY(")
            .push_bind(filter.sizes.clone())
            .push("))");
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND p.price <= ").push_bind(max);
    }

    push_page(&mut qb, filter.page);
    qb
}

pub(super) fn product_search(
    query: &str,
    page: Page,
    viewer: Option<UserId>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = select_products(viewer);
    qb.push(" AND strpos(lower(p.name), lower(")
        .push_bind(query.to_string())
        .push(")) > 0");
    push_page(&mut qb, page);
    qb
}

fn push_page(qb: &mut QueryBuilder<'static, Postgres>, page: Page) {
    qb.push(" ORDER BY p.id LIMIT ")
        .push_bind(i64::from(PAGE_LIMIT))
        .push(" OFFSET ")
        .push_bind(page.offset(PAGE_LIMIT) as i64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dresscode_core::CollectionId;

    const BASE: &str = "SELECT p.id, p.name, p.description, p.price, p.collection_id, \
         c.name AS collection_name, p.category, p.color, p.main_photo_url, \
         EXISTS (SELECT 1 FROM liked_products l WHERE l.product_id = p.id AND l.user_id = $1) AS is_liked \
         FROM products p LEFT JOIN collections c ON c.id = p.collection_id WHERE TRUE";

    #[test]
    fn empty_filter_only_pages() {
        let qb = product_listing(&ProductFilter::default(), None);
        assert_eq!(qb.sql(), format!("{BASE} ORDER BY p.id LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn every_filter_adds_a_bound_clause() {
        let filter = ProductFilter {
            collection_id: Some(CollectionId::new(4)),
            category: Some("dresses".to_string()),
            colors: vec!["red".to_string(), "black".to_string()],
            sizes: vec!["M".to_string()],
            min_price: Some(100),
            max_price: Some(900),
            page: Page::new(2),
        };
        let qb = product_listing(&filter, Some(UserId::new(1)));
        let expected = format!(
            "{BASE} AND p.collection_id = $2 AND p.category = $3 AND p.color = ANY($4) \
             AND EXISTS (SELECT 1 FROM sizes s WHERE s.product_id = p.id AND s.amount > 0 AND s.name = ANY($5)) \
             AND p.price >= $6 AND p.price <= $7 ORDER BY p.id LIMIT $8 OFFSET $9"
        );
        assert_eq!(qb.sql(), expected);
    }

    #[test]
    fn search_input_is_never_inlined() {
        let qb = product_search("'; DROP TABLE products; --", Page::FIRST, None);
        assert!(!qb.sql().contains("DROP"));
        assert!(qb.sql().contains("strpos(lower(p.name), lower($2)) > 0"));
    }
}
