//! Ratio, rounding and period-over-period helpers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of decimal places for rate metrics
pub const DEFAULT_PRECISION: u32 = 4;

const MAX_PRECISION: u32 = 12;

/// `numerator / denominator`, or 0.0 when the denominator is zero.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Round half away from zero to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(MAX_PRECISION) as i32);
    (value * factor).round() / factor
}

/// Ratio rounded at the result boundary.
pub fn rate(numerator: u64, denominator: u64, precision: u32) -> f64 {
    round_to(ratio(numerator, denominator), precision)
}

/// Change of a metric relative to the preceding period, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "direction", content = "percent", rename_all = "snake_case")]
pub enum PeriodChange {
    Up(f64),
    Down(f64),
    Flat,
    /// The previous period was zero and the current one is not
    NotApplicable,
}

impl PeriodChange {
    pub fn between(current: f64, previous: f64) -> Self {
        if previous == 0.0 {
            return if current > 0.0 {
                PeriodChange::NotApplicable
            } else {
                PeriodChange::Flat
            };
        }

        let change = round_to((current - previous) / previous * 100.0, 2);
        if change > 0.0 {
            PeriodChange::Up(change)
        } else if change < 0.0 {
            PeriodChange::Down(change.abs())
        } else {
            PeriodChange::Flat
        }
    }
}

impl fmt::Display for PeriodChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodChange::Up(pct) => write!(f, "↑ {pct:.2}%"),
            PeriodChange::Down(pct) => write!(f, "↓ {pct:.2}%"),
            PeriodChange::Flat => f.write_str("0.00%"),
            PeriodChange::NotApplicable => f.write_str("N/A"),
        }
    }
}
