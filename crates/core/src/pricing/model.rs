//! Forward price generation and its algebraic inverse.
//!
//! Both directions share [`PriceDraw`], so the multiplier used to decode a price is
//! bit-identical to the one used to produce it for the same hour and identifiers.

use crate::domain::PriceBounds;
use crate::error::{PricingError, Result};
use crate::pricing::hash::hourly_random;
use crate::time::HourIndex;

/// Largest price that survives the f64 arithmetic exactly (2^53).
pub const MAX_EXACT_PRICE: u64 = 1 << 53;

/// The per-(user, item, hour) multiplier and the clamped percent window it was drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceDraw {
    pub safe_min: f64,
    pub safe_max: f64,
    pub random_percent: f64,
    pub multiplier: f64,
}

impl PriceDraw {
    pub fn new(bounds: PriceBounds, hour: HourIndex, user_id: &str, item_id: &str) -> Self {
        let (safe_min, safe_max) = bounds.safe_percents();
        let random = hourly_random(user_id, item_id, hour);
        let random_percent = safe_min + random * (safe_max - safe_min);
        Self {
            safe_min,
            safe_max,
            random_percent,
            multiplier: random_percent / 100.0,
        }
    }
}

/// Price shown to `user_id` for `item_id` during `hour`.
///
/// Rounding is half away from zero; for the positive products seen here that is the
/// same as rounding half up.
pub fn forward_price(
    base_price: u64,
    bounds: PriceBounds,
    hour: HourIndex,
    user_id: &str,
    item_id: &str,
) -> Result<u64> {
    let base = checked_price("base_price", base_price)?;
    let draw = PriceDraw::new(bounds, hour, user_id, item_id);
    apply_draw(base, &draw)
}

/// Reconstructs the base price behind `observed_price`.
///
/// Only undoes the multiply-and-round step: if the forward clamp to the percent
/// window (or the floor of 1) changed the price, the estimate can be off by one.
/// `hour` must be the hour the observation was made in.
pub fn inverse_base_price(
    observed_price: u64,
    bounds: PriceBounds,
    hour: HourIndex,
    user_id: &str,
    item_id: &str,
) -> Result<u64> {
    let observed = checked_price("observed_price", observed_price)?;
    let draw = PriceDraw::new(bounds, hour, user_id, item_id);
    let base = to_price("reconstructed base_price", round_price(observed / draw.multiplier))?;
    if base == 0 {
        return Err(PricingError::invalid(format!(
            "observed_price {observed_price} reconstructs to a zero base price"
        )));
    }
    Ok(base)
}

/// `(floor(base * safe_min / 100), ceil(base * safe_max / 100))`.
pub fn price_range(base_price: u64, bounds: PriceBounds) -> Result<(u64, u64)> {
    let base = checked_price("base_price", base_price)?;
    let (safe_min, safe_max) = bounds.safe_percents();
    let lo = to_price("min price", (base * safe_min / 100.0).floor())?;
    let hi = to_price("max price", (base * safe_max / 100.0).ceil())?;
    Ok((lo, hi))
}

fn apply_draw(base: f64, draw: &PriceDraw) -> Result<u64> {
    let raw = round_price(base * draw.multiplier);
    let min_price = (base * draw.safe_min / 100.0).floor();
    let max_price = (base * draw.safe_max / 100.0).ceil();
    let clamped = min_price.max(max_price.min(raw));
    to_price("forward price", clamped.max(1.0))
}

/// Half away from zero; every operand here is positive, so ties go up.
fn round_price(value: f64) -> f64 {
    value.round()
}

pub(crate) fn checked_price(label: &str, price: u64) -> Result<f64> {
    if price == 0 {
        return Err(PricingError::invalid(format!("{label} must be positive")));
    }
    if price > MAX_EXACT_PRICE {
        return Err(PricingError::invalid(format!(
            "{label} exceeds {MAX_EXACT_PRICE} (got {price})"
        )));
    }
    Ok(price as f64)
}

pub(crate) fn to_price(label: &str, value: f64) -> Result<u64> {
    if !value.is_finite() || value < 0.0 || value > MAX_EXACT_PRICE as f64 {
        return Err(PricingError::invalid(format!(
            "{label} is out of range (got {value})"
        )));
    }
    Ok(value as u64)
}
