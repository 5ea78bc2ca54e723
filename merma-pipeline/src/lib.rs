//! Supermarket waste-reduction analytics core.
//!
//! Loads the five dashboard tables (sales, inventory, discards,
//! suppliers, community-kitchen donations), narrows them through the
//! sidebar filters, and derives the KPIs, grouped views and alert level
//! a presentation layer renders. One evaluation is a single synchronous
//! pass over the in-memory catalog; the only state that outlives an
//! evaluation is the caller-held [`DataCatalog`].
//!
//! ```no_run
//! use merma_pipeline::{evaluate, DashboardQuery, DataCatalog, DataPaths};
//!
//! # fn main() -> Result<(), merma_pipeline::LoadError> {
//! let catalog = DataCatalog::load(&DataPaths::from_dir("data"))?;
//! let today = chrono::Utc::now().date_naive();
//! let snapshot = evaluate(&catalog, &DashboardQuery::default(), today);
//! println!("{} · waste ratio {:.1}%", snapshot.alert, snapshot.kpis.waste_ratio);
//! # Ok(())
//! # }
//! ```

pub mod alert;
pub mod export;
pub mod filter;
pub mod geo;
pub mod kpi;
pub mod loader;
pub mod perishable;
pub mod snapshot;
pub mod types;
pub mod views;

pub use alert::AlertLevel;
pub use filter::FilteredTables;
pub use kpi::KpiSet;
pub use loader::{DataCatalog, DataPaths, LoadError};
pub use snapshot::{evaluate, evaluate_with, DashboardSnapshot};
pub use types::{DashboardQuery, QueryError, Selection};
pub use views::ViewSet;
