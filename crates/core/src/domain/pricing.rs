use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::recommendation::PriceRecommendation;
use crate::time::HourIndex;

pub const DEFAULT_MIN_PERCENT: i32 = 90;
pub const DEFAULT_MAX_PERCENT: i32 = 110;

/// Window, in percent of base price, that a randomized price may land in.
///
/// Malformed bounds are repaired with [`PriceBounds::safe_percents`], never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min_percent: i32,
    pub max_percent: i32,
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self {
            min_percent: DEFAULT_MIN_PERCENT,
            max_percent: DEFAULT_MAX_PERCENT,
        }
    }
}

impl PriceBounds {
    pub fn new(min_percent: i32, max_percent: i32) -> Self {
        Self {
            min_percent,
            max_percent,
        }
    }

    /// `(max(1, min), max(safe_min + 1, max))` as floats.
    pub fn safe_percents(self) -> (f64, f64) {
        let safe_min = i64::from(self.min_percent).max(1);
        let safe_max = (safe_min + 1).max(i64::from(self.max_percent));
        (safe_min as f64, safe_max as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub current_price: u64,
    /// Reconstructed, not read from the catalog.
    pub base_price: u64,
    pub min_possible_price: u64,
    pub max_possible_price: u64,
    pub percentage_from_base: f64,
    pub minutes_until_change: u32,
    pub recommendation: PriceRecommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub hour_index: HourIndex,
    pub starts_at: Option<DateTime<Utc>>,
    pub price: u64,
    pub percentage_from_base: f64,
    pub time_from_now: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestTime {
    pub best_hour_index: HourIndex,
    pub starts_at: Option<DateTime<Utc>>,
    pub best_price: u64,
    pub current_price: u64,
    pub savings_from_current: u64,
    pub time_from_now: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalCheapest {
    pub cheapest_price: u64,
    pub cheapest_user_id: String,
    pub cheapest_hour_index: HourIndex,
    pub cheapest_percentage: f64,
    /// Every sampled price, ascending.
    pub price_distribution: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub min: u64,
    pub max: u64,
    pub median: u64,
    pub p05: u64,
    pub p95: u64,
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub base_price: u64,
    /// Whether forward-pricing `base_price` reproduces the observation.
    pub verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_percents_keep_well_formed_bounds() {
        assert_eq!(PriceBounds::default().safe_percents(), (90.0, 110.0));
    }

    #[test]
    fn safe_percents_repair_degenerate_bounds() {
        assert_eq!(PriceBounds::new(0, 0).safe_percents(), (1.0, 2.0));
        assert_eq!(PriceBounds::new(-20, 50).safe_percents(), (1.0, 50.0));
        assert_eq!(PriceBounds::new(100, 100).safe_percents(), (100.0, 101.0));
        assert_eq!(PriceBounds::new(120, 80).safe_percents(), (120.0, 121.0));
    }

    #[test]
    fn bounds_deserialize_from_json() {
        let b: PriceBounds =
            serde_json::from_value(serde_json::json!({"min_percent": 85, "max_percent": 115}))
                .unwrap();
        assert_eq!(b, PriceBounds::new(85, 115));
    }
}
