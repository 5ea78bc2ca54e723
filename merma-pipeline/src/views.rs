//! Grouped views behind the dashboard charts.
//!
//! Hash-map accumulation with deterministic output ordering. Name-keyed
//! views sort by name, ranking views sort by quantity descending with a
//! stable sort, so products tied on quantity keep the order the data
//! introduced them in.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::filter::FilteredTables;
use crate::loader::{DiscardRecord, InventoryRecord, SaleRecord};

/// Number of products in the worst-discards ranking.
pub const TOP_DISCARDED_LIMIT: usize = 10;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BranchQuantity {
    pub branch: String,
    pub quantity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductQuantity {
    pub product: String,
    pub quantity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryQuantity {
    pub category: String,
    pub quantity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyQuantity {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// One inventory row inside the near-expiry window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NearExpiryItem {
    pub product: String,
    pub category: String,
    pub branch: String,
    pub stock: f64,
    pub expiration_date: NaiveDate,
    /// Negative when the item is already past its date.
    pub days_until_expiry: i64,
}

/// Category × branch grid of discarded quantity. Axes are the sorted
/// distinct values present in the filtered discards; every cell exists,
/// and a pairing with no discard rows holds exactly `0.0`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiscardPivot {
    pub branches: Vec<String>,
    pub rows: Vec<PivotRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PivotRow {
    pub category: String,
    /// One cell per entry of `DiscardPivot::branches`, in order.
    pub cells: Vec<f64>,
}

impl DiscardPivot {
    /// Summed discard quantity for a category/branch pair. Pairs outside
    /// the grid read as zero, same as an empty cell inside it.
    pub fn cell(&self, category: &str, branch: &str) -> f64 {
        match self.branches.iter().position(|b| b == branch) {
            Some(col) => self
                .rows
                .iter()
                .find(|row| row.category == category)
                .map(|row| row.cells[col])
                .unwrap_or(0.0),
            None => 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every aggregation the dashboard renders, for one evaluation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewSet {
    pub discards_by_branch: Vec<BranchQuantity>,
    pub top_discarded_products: Vec<ProductQuantity>,
    pub sales_by_category: Vec<CategoryQuantity>,
    pub sales_by_branch: Vec<BranchQuantity>,
    pub sales_by_date: Vec<DailyQuantity>,
    pub discard_pivot: DiscardPivot,
    pub near_expiry: Vec<NearExpiryItem>,
}

impl ViewSet {
    pub fn build(tables: &FilteredTables, today: NaiveDate, near_expiry_days: i64) -> Self {
        ViewSet {
            discards_by_branch: discards_by_branch(&tables.discards),
            top_discarded_products: top_discarded_products(&tables.discards),
            sales_by_category: sales_by_category(&tables.sales),
            sales_by_branch: sales_by_branch(&tables.sales),
            sales_by_date: sales_by_date(&tables.sales),
            discard_pivot: discard_pivot(&tables.discards),
            near_expiry: near_expiry_items(&tables.inventory, today, near_expiry_days),
        }
    }
}

/// Accumulate quantities by key, preserving first-encounter order. The
/// stable sorts downstream then break quantity ties by data order.
fn sum_quantities<'a>(pairs: impl Iterator<Item = (&'a str, f64)>) -> Vec<(String, f64)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut totals: Vec<(String, f64)> = Vec::new();
    for (key, quantity) in pairs {
        match index.get(key) {
            Some(&slot) => totals[slot].1 += quantity,
            None => {
                index.insert(key.to_string(), totals.len());
                totals.push((key.to_string(), quantity));
            }
        }
    }
    totals
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Total discarded quantity per branch, branches sorted by name.
pub fn discards_by_branch(discards: &[DiscardRecord]) -> Vec<BranchQuantity> {
    let mut rows: Vec<BranchQuantity> =
        sum_quantities(discards.iter().map(|r| (r.branch.as_str(), r.quantity)))
            .into_iter()
            .map(|(branch, quantity)| BranchQuantity { branch, quantity })
            .collect();
    rows.sort_by(|a, b| a.branch.cmp(&b.branch));
    rows
}

/// The [`TOP_DISCARDED_LIMIT`] products with the largest discarded
/// quantity, descending. Fewer products means a shorter list, never
/// padding.
pub fn top_discarded_products(discards: &[DiscardRecord]) -> Vec<ProductQuantity> {
    let mut rows: Vec<ProductQuantity> =
        sum_quantities(discards.iter().map(|r| (r.product.as_str(), r.quantity)))
            .into_iter()
            .map(|(product, quantity)| ProductQuantity { product, quantity })
            .collect();
    rows.sort_by(|a, b| descending(a.quantity, b.quantity));
    rows.truncate(TOP_DISCARDED_LIMIT);
    rows
}

/// Units sold per category, largest first.
pub fn sales_by_category(sales: &[SaleRecord]) -> Vec<CategoryQuantity> {
    let mut rows: Vec<CategoryQuantity> =
        sum_quantities(sales.iter().map(|r| (r.category.as_str(), r.quantity)))
            .into_iter()
            .map(|(category, quantity)| CategoryQuantity { category, quantity })
            .collect();
    rows.sort_by(|a, b| descending(a.quantity, b.quantity));
    rows
}

/// Units sold per branch, branches sorted by name.
pub fn sales_by_branch(sales: &[SaleRecord]) -> Vec<BranchQuantity> {
    let mut rows: Vec<BranchQuantity> =
        sum_quantities(sales.iter().map(|r| (r.branch.as_str(), r.quantity)))
            .into_iter()
            .map(|(branch, quantity)| BranchQuantity { branch, quantity })
            .collect();
    rows.sort_by(|a, b| a.branch.cmp(&b.branch));
    rows
}

/// Units sold per day, chronological.
pub fn sales_by_date(sales: &[SaleRecord]) -> Vec<DailyQuantity> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for sale in sales {
        *by_day.entry(sale.date).or_insert(0.0) += sale.quantity;
    }
    by_day
        .into_iter()
        .map(|(date, quantity)| DailyQuantity { date, quantity })
        .collect()
}

/// Dense category × branch discard grid. See [`DiscardPivot`].
pub fn discard_pivot(discards: &[DiscardRecord]) -> DiscardPivot {
    let categories: BTreeSet<&str> = discards.iter().map(|r| r.category.as_str()).collect();
    let branch_set: BTreeSet<&str> = discards.iter().map(|r| r.branch.as_str()).collect();

    let mut sums: HashMap<(&str, &str), f64> = HashMap::new();
    for r in discards {
        *sums.entry((r.category.as_str(), r.branch.as_str())).or_insert(0.0) += r.quantity;
    }

    let branches: Vec<String> = branch_set.iter().map(|b| b.to_string()).collect();
    let rows = categories
        .into_iter()
        .map(|category| PivotRow {
            category: category.to_string(),
            cells: branch_set
                .iter()
                .map(|branch| sums.get(&(category, *branch)).copied().unwrap_or(0.0))
                .collect(),
        })
        .collect();
    DiscardPivot { branches, rows }
}

/// Inventory rows expiring within `window_days` of `today`, soonest
/// first, ties broken by product name. Already-expired stock sorts to
/// the front.
pub fn near_expiry_items(
    inventory: &[InventoryRecord],
    today: NaiveDate,
    window_days: i64,
) -> Vec<NearExpiryItem> {
    let mut items: Vec<NearExpiryItem> = inventory
        .iter()
        .filter_map(|r| {
            let days = r.days_until_expiry(today);
            (days <= window_days).then(|| NearExpiryItem {
                product: r.product.clone(),
                category: r.category.clone(),
                branch: r.branch.clone(),
                stock: r.stock,
                expiration_date: r.expiration_date,
                days_until_expiry: days,
            })
        })
        .collect();
    items.sort_by(|a, b| {
        a.days_until_expiry
            .cmp(&b.days_until_expiry)
            .then_with(|| a.product.cmp(&b.product))
    });
    items
}
