//! Scalar KPI computation.
//!
//! Pure functions of the filtered tables plus the evaluation date.
//! Every ratio is guarded: a zero denominator yields zero, never a
//! division error, so an empty filter result renders as an all-zero
//! dashboard.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::filter::FilteredTables;
use crate::loader::{DiscardRecord, DonationRecord, SaleRecord};
use crate::perishable::PerishableClassifier;

/// Unit cost assumed for a discarded product with no observed sale
/// price anywhere in the filtered view.
pub const FALLBACK_UNIT_COST: f64 = 1.0;

/// One evaluation's scalar metrics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KpiSet {
    /// Units sold across the filtered sales.
    pub total_sales: f64,
    /// Units discarded across the filtered discards.
    pub total_discards: f64,
    /// Σ quantity × unit price over the filtered sales.
    pub sales_value: f64,
    /// Discarded quantity as a percentage of quantity sold.
    pub waste_ratio: f64,
    /// Inventory rows expiring within the query window (or already
    /// expired).
    pub near_expiry_count: usize,
    /// Community-kitchen volume as a percentage of discarded quantity.
    /// Kitchens are not branch-scoped, so the full donation table is
    /// set against the filtered discards.
    pub donation_ratio: f64,
    /// Deterministic value estimate of the discarded goods.
    pub estimated_loss_value: f64,
    /// Stock held in perishable categories.
    pub perishable_stock: f64,
    pub non_perishable_stock: f64,
}

/// Compute the full KPI set for one evaluation.
pub fn compute(
    tables: &FilteredTables,
    donations: &[DonationRecord],
    classifier: &PerishableClassifier,
    near_expiry_days: i64,
    today: NaiveDate,
) -> KpiSet {
    let total_sales: f64 = tables.sales.iter().map(|r| r.quantity).sum();
    let total_discards: f64 = tables.discards.iter().map(|r| r.quantity).sum();
    let sales_value: f64 = tables.sales.iter().map(|r| r.quantity * r.unit_price).sum();
    let donated: f64 = donations.iter().map(|r| r.donation_quantity).sum();

    let near_expiry_count = tables
        .inventory
        .iter()
        .filter(|r| r.days_until_expiry(today) <= near_expiry_days)
        .count();

    let mut perishable_stock = 0.0;
    let mut non_perishable_stock = 0.0;
    for item in &tables.inventory {
        if classifier.is_perishable(&item.category) {
            perishable_stock += item.stock;
        } else {
            non_perishable_stock += item.stock;
        }
    }

    KpiSet {
        total_sales,
        total_discards,
        sales_value,
        waste_ratio: percentage(total_discards, total_sales),
        near_expiry_count,
        donation_ratio: percentage(donated, total_discards),
        estimated_loss_value: estimated_loss(&tables.sales, &tables.discards),
        perishable_stock,
        non_perishable_stock,
    }
}

/// `numerator / denominator × 100`, defined as zero when the
/// denominator is not positive.
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

/// Deterministic loss estimate: each discard is priced at the mean unit
/// price its product fetches in the filtered sales. Products never sold
/// there fall back to the overall mean sale price, and to
/// [`FALLBACK_UNIT_COST`] when there are no sales at all.
fn estimated_loss(sales: &[SaleRecord], discards: &[DiscardRecord]) -> f64 {
    let mut by_product: HashMap<&str, (f64, u32)> = HashMap::new();
    let mut price_sum = 0.0;
    for sale in sales {
        let entry = by_product.entry(sale.product.as_str()).or_insert((0.0, 0));
        entry.0 += sale.unit_price;
        entry.1 += 1;
        price_sum += sale.unit_price;
    }
    let overall_mean = if sales.is_empty() {
        FALLBACK_UNIT_COST
    } else {
        price_sum / sales.len() as f64
    };

    discards
        .iter()
        .map(|d| {
            let unit = by_product
                .get(d.product.as_str())
                .map(|(sum, count)| sum / f64::from(*count))
                .unwrap_or(overall_mean);
            d.quantity * unit
        })
        .sum()
}
