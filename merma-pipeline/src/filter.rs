//! Sidebar filter engine.
//!
//! Narrows the sales, inventory and discard tables by the query's branch
//! and category selections. Branch and category are a plain conjunction
//! on their own columns, so their order is immaterial. The discard table
//! is the exception: discard rows carry category labels of their own,
//! but a category selection narrows discards through the *sales* product
//! set instead, keeping every discard of a product that still sells in
//! the filtered view. That join runs after both sales-side filters are
//! resolved.

use std::collections::HashSet;

use serde::Serialize;

use crate::loader::{DataCatalog, DiscardRecord, InventoryRecord, SaleRecord};
use crate::types::{DashboardQuery, Selection};

/// The three datasets the sidebar filters act on, after narrowing.
/// Empty vectors are valid outputs; downstream stages degrade to zeroed
/// metrics rather than failing.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilteredTables {
    pub sales: Vec<SaleRecord>,
    pub inventory: Vec<InventoryRecord>,
    pub discards: Vec<DiscardRecord>,
}

/// Apply the query's selections to the catalog.
pub fn apply(catalog: &DataCatalog, query: &DashboardQuery) -> FilteredTables {
    let sales = select_sales(&catalog.sales, &query.branch, &query.category);
    let inventory = select_inventory(&catalog.inventory, &query.branch, &query.category);
    let discards = select_discards(&catalog.discards, &query.branch, &query.category, &sales);
    log::debug!(
        "filter kept {}/{} sales, {}/{} inventory, {}/{} discard rows",
        sales.len(),
        catalog.sales.len(),
        inventory.len(),
        catalog.inventory.len(),
        discards.len(),
        catalog.discards.len(),
    );
    FilteredTables { sales, inventory, discards }
}

fn select_sales(rows: &[SaleRecord], branch: &Selection, category: &Selection) -> Vec<SaleRecord> {
    rows.iter()
        .filter(|r| branch.matches(&r.branch) && category.matches(&r.category))
        .cloned()
        .collect()
}

fn select_inventory(
    rows: &[InventoryRecord],
    branch: &Selection,
    category: &Selection,
) -> Vec<InventoryRecord> {
    rows.iter()
        .filter(|r| branch.matches(&r.branch) && category.matches(&r.category))
        .cloned()
        .collect()
}

/// Discards narrowed by branch directly, and by category through the
/// filtered-sales product join.
fn select_discards(
    rows: &[DiscardRecord],
    branch: &Selection,
    category: &Selection,
    filtered_sales: &[SaleRecord],
) -> Vec<DiscardRecord> {
    match category {
        Selection::All => rows
            .iter()
            .filter(|r| branch.matches(&r.branch))
            .cloned()
            .collect(),
        Selection::Only(_) => {
            let products: HashSet<&str> =
                filtered_sales.iter().map(|r| r.product.as_str()).collect();
            rows.iter()
                .filter(|r| branch.matches(&r.branch) && products.contains(r.product.as_str()))
                .cloned()
                .collect()
        }
    }
}
