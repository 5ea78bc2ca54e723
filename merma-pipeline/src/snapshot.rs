//! One full dashboard evaluation.
//!
//! `evaluate` wires the stages together: filter the catalog, compute
//! the KPI set, build the chart views, classify the alert, attach the
//! supplier directory and the kitchen map points. Same catalog, query
//! and date in, same snapshot out.

use chrono::NaiveDate;
use serde::Serialize;

use crate::alert::{self, AlertLevel};
use crate::filter::{self, FilteredTables};
use crate::geo::{DonationSite, ZoneGeocoder};
use crate::kpi::{self, KpiSet};
use crate::loader::{DataCatalog, SupplierRecord};
use crate::perishable::PerishableClassifier;
use crate::types::DashboardQuery;
use crate::views::ViewSet;

/// Everything a presentation layer needs to render one dashboard state.
#[derive(Clone, Debug, Serialize)]
pub struct DashboardSnapshot {
    /// Evaluation date the expiry arithmetic ran against.
    pub evaluated_on: NaiveDate,
    pub query: DashboardQuery,
    pub alert: AlertLevel,
    pub kpis: KpiSet,
    pub views: ViewSet,
    /// The narrowed record sets themselves, for tabular rendering.
    pub tables: FilteredTables,
    /// Supplier directory, untouched by the filters.
    pub suppliers: Vec<SupplierRecord>,
    /// Kitchens with synthetic map points, untouched by the filters.
    pub donation_sites: Vec<DonationSite>,
}

/// Evaluate with the default perishable keywords and geocoder seed.
pub fn evaluate(catalog: &DataCatalog, query: &DashboardQuery, today: NaiveDate) -> DashboardSnapshot {
    evaluate_with(
        catalog,
        query,
        today,
        &PerishableClassifier::default(),
        &ZoneGeocoder::default(),
    )
}

/// [`evaluate`] with explicit classifier and geocoder configuration.
pub fn evaluate_with(
    catalog: &DataCatalog,
    query: &DashboardQuery,
    today: NaiveDate,
    classifier: &PerishableClassifier,
    geocoder: &ZoneGeocoder,
) -> DashboardSnapshot {
    let tables = filter::apply(catalog, query);
    let kpis = kpi::compute(&tables, &catalog.donations, classifier, query.near_expiry_days, today);
    let views = ViewSet::build(&tables, today, query.near_expiry_days);
    let alert = alert::evaluate(kpis.waste_ratio, kpis.near_expiry_count);
    let donation_sites = geocoder.sites(&catalog.donations);

    DashboardSnapshot {
        evaluated_on: today,
        query: query.clone(),
        alert,
        kpis,
        views,
        tables,
        suppliers: catalog.suppliers.clone(),
        donation_sites,
    }
}
