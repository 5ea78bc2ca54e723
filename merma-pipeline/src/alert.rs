//! Alert classification over the computed KPIs.
//!
//! Stateless: the level is re-derived on every evaluation and nothing
//! is remembered between evaluations. Critical outranks warning when
//! both thresholds are breached.

use std::fmt;

use serde::Serialize;

/// Waste ratio (percent) above which the dashboard goes critical.
pub const WASTE_RATIO_CRITICAL_PCT: f64 = 20.0;

/// Near-expiry item count above which the dashboard warns.
pub const NEAR_EXPIRY_WARNING_COUNT: usize = 50;

/// Severity of the current snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
    Ok,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertLevel::Critical => "critical",
            AlertLevel::Warning => "warning",
            AlertLevel::Ok => "ok",
        };
        f.write_str(name)
    }
}

/// Classify one snapshot. Thresholds are strict: sitting exactly on a
/// threshold does not trip it.
pub fn evaluate(waste_ratio: f64, near_expiry_count: usize) -> AlertLevel {
    if waste_ratio > WASTE_RATIO_CRITICAL_PCT {
        AlertLevel::Critical
    } else if near_expiry_count > NEAR_EXPIRY_WARNING_COUNT {
        AlertLevel::Warning
    } else {
        AlertLevel::Ok
    }
}
