//! Query-side types shared across the pipeline.
//!
//! A [`DashboardQuery`] is the sidebar state of the original dashboard:
//! one optional branch, one optional category, and the near-expiry
//! window in days. Queries are cheap values; nothing here touches data.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest selectable near-expiry window, in days.
pub const NEAR_EXPIRY_MIN_DAYS: i64 = 1;

/// Largest selectable near-expiry window, in days.
pub const NEAR_EXPIRY_MAX_DAYS: i64 = 10;

/// Near-expiry window used when the caller does not pick one.
pub const NEAR_EXPIRY_DEFAULT_DAYS: i64 = 3;

/// Narrowing applied to one column: everything, or one named value.
///
/// Names are drawn from [`DataCatalog::branches`] and
/// [`DataCatalog::categories`]; an unknown name is legal and simply
/// matches nothing, so downstream stages see empty tables rather than
/// an error.
///
/// [`DataCatalog::branches`]: crate::loader::DataCatalog::branches
/// [`DataCatalog::categories`]: crate::loader::DataCatalog::categories
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn only(name: impl Into<String>) -> Self {
        Selection::Only(name.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Does `value` survive this selection?
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(name) => name == value,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("all"),
            Selection::Only(name) => f.write_str(name),
        }
    }
}

/// One dashboard evaluation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub branch: Selection,
    pub category: Selection,
    /// Items expiring within this many days count as near-expiry.
    pub near_expiry_days: i64,
}

impl DashboardQuery {
    /// Build a query, rejecting a near-expiry window outside
    /// [`NEAR_EXPIRY_MIN_DAYS`]..=[`NEAR_EXPIRY_MAX_DAYS`]. The original
    /// UI slider made out-of-range values impossible; a library caller
    /// gets told instead of silently clamped.
    pub fn new(
        branch: Selection,
        category: Selection,
        near_expiry_days: i64,
    ) -> Result<Self, QueryError> {
        if !(NEAR_EXPIRY_MIN_DAYS..=NEAR_EXPIRY_MAX_DAYS).contains(&near_expiry_days) {
            return Err(QueryError::NearExpiryOutOfRange(near_expiry_days));
        }
        Ok(DashboardQuery { branch, category, near_expiry_days })
    }
}

impl Default for DashboardQuery {
    /// Everything, everywhere, with the default three-day window.
    fn default() -> Self {
        DashboardQuery {
            branch: Selection::All,
            category: Selection::All,
            near_expiry_days: NEAR_EXPIRY_DEFAULT_DAYS,
        }
    }
}

/// Invalid query parameters.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("near-expiry window must be between 1 and 10 days, got {0}")]
    NearExpiryOutOfRange(i64),
}
