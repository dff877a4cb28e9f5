//! Nested catalog projection.
//!
//! The catalog is read with a single query that joins top-level categories to
//! their direct sub-categories and those to their products. Every row is one
//! (top, sub, product) triple with `NULL`s wherever a LEFT JOIN found nothing.
//! [`build_catalog`] folds those rows into the nested shape clients consume.
//!
//! Output order is the order in which names are first seen in the rows, so the
//! query's `ORDER BY` decides it. Grandchildren are not projected.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Placeholder name used when a category level is missing from a row.
pub const UNGROUPED: &str = "Ungrouped";

/// One flat row of the catalog join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct CatalogRow {
    pub top_category: Option<String>,
    pub sub_category: Option<String>,
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
}

/// A product as it appears inside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Price>,
}

/// A sub-category and the products filed directly under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub name: String,
    pub products: Vec<CatalogProduct>,
}

/// A top-level category and its direct sub-categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCategory {
    pub name: String,
    pub sub_categories: Vec<SubCategory>,
}

fn name_or_ungrouped(name: Option<String>) -> String {
    name.filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNGROUPED.to_owned())
}

/// Fold flat join rows into the nested catalog.
///
/// - Top categories are keyed by name and kept in first-seen order.
/// - Sub-categories repeated under the same top category are merged.
/// - A row with no sub-category lands in an `"Ungrouped"` sub-category, so a
///   top category without children still appears with one empty group.
/// - A row with no product contributes its categories but no product.
#[must_use]
pub fn build_catalog<I>(rows: I) -> Vec<TopCategory>
where
    I: IntoIterator<Item = CatalogRow>,
{
    let mut tops: Vec<TopCategory> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let top_name = name_or_ungrouped(row.top_category);
        let top_idx = *index.entry(top_name.clone()).or_insert_with(|| {
            tops.push(TopCategory {
                name: top_name,
                sub_categories: Vec::new(),
            });
            tops.len() - 1
        });
        let Some(top) = tops.get_mut(top_idx) else {
            continue;
        };

        let sub_name = name_or_ungrouped(row.sub_category);
        let sub_idx = match top.sub_categories.iter().position(|s| s.name == sub_name) {
            Some(i) => i,
            None => {
                top.sub_categories.push(SubCategory {
                    name: sub_name,
                    products: Vec::new(),
                });
                top.sub_categories.len() - 1
            }
        };

        if let (Some(id), Some(name)) = (row.product_id, row.product_name)
            && let Some(sub) = top.sub_categories.get_mut(sub_idx)
        {
            sub.products.push(CatalogProduct {
                id,
                name,
                description: row.description,
                price: row.price,
            });
        }
    }

    tops
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn row(top: Option<&str>, sub: Option<&str>, product: Option<(i32, &str, i64)>) -> CatalogRow {
        CatalogRow {
            top_category: top.map(str::to_owned),
            sub_category: sub.map(str::to_owned),
            product_id: product.map(|(id, _, _)| ProductId::new(id)),
            product_name: product.map(|(_, name, _)| name.to_owned()),
            description: None,
            price: product.map(|(_, _, cents)| Price::from_cents(cents).unwrap()),
        }
    }

    #[test]
    fn test_empty_rows_give_empty_catalog() {
        assert!(build_catalog(Vec::new()).is_empty());
    }

    #[test]
    fn test_single_product_nests_once() {
        let catalog = build_catalog([row(
            Some("Electronics"),
            Some("Smartphones"),
            Some((1, "iPhone 13", 99_999)),
        )]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "Electronics");
        assert_eq!(catalog[0].sub_categories.len(), 1);
        let sub = &catalog[0].sub_categories[0];
        assert_eq!(sub.name, "Smartphones");
        assert_eq!(sub.products.len(), 1);
        assert_eq!(sub.products[0].name, "iPhone 13");
        assert_eq!(sub.products[0].price.unwrap().to_string(), "999.99");
    }

    #[test]
    fn test_top_without_children_gets_empty_ungrouped() {
        let catalog = build_catalog([row(Some("Garden"), None, None)]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].sub_categories.len(), 1);
        assert_eq!(catalog[0].sub_categories[0].name, UNGROUPED);
        assert!(catalog[0].sub_categories[0].products.is_empty());
    }

    #[test]
    fn test_sub_without_products_has_empty_list() {
        let catalog = build_catalog([row(Some("Books"), Some("Poetry"), None)]);
        assert_eq!(catalog[0].sub_categories[0].name, "Poetry");
        assert!(catalog[0].sub_categories[0].products.is_empty());
    }

    #[test]
    fn test_null_top_name_is_ungrouped() {
        let catalog = build_catalog([row(None, None, None)]);
        assert_eq!(catalog[0].name, UNGROUPED);
        assert_eq!(catalog[0].sub_categories[0].name, UNGROUPED);
    }

    #[test]
    fn test_repeated_sub_categories_merge() {
        let catalog = build_catalog([
            row(Some("Electronics"), Some("Laptops"), Some((3, "Air", 1_000))),
            row(Some("Electronics"), Some("Phones"), Some((1, "Pixel", 500))),
            row(Some("Electronics"), Some("Laptops"), Some((4, "Pro", 2_000))),
        ]);

        assert_eq!(catalog.len(), 1);
        let subs = &catalog[0].sub_categories;
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].name, "Laptops");
        assert_eq!(subs[0].products.len(), 2);
        assert_eq!(subs[1].name, "Phones");
    }

    #[test]
    fn test_first_seen_order_is_preserved() {
        let catalog = build_catalog([
            row(Some("Zoo"), Some("Lions"), None),
            row(Some("Apparel"), Some("Shoes"), None),
            row(Some("Zoo"), Some("Bears"), None),
        ]);

        let names: Vec<_> = catalog.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Zoo", "Apparel"]);
        let zoo: Vec<_> = catalog[0]
            .sub_categories
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(zoo, ["Lions", "Bears"]);
    }

    #[test]
    fn test_serializes_camel_case() {
        let catalog = build_catalog([row(Some("A"), Some("B"), None)]);
        let json = serde_json::to_value(&catalog).unwrap();
        assert!(json[0].get("subCategories").is_some());
    }
}
