use crate::error::{PricingError, Result};
use crate::pricing::model::to_price;

/// Golden ratio, computed the same way as the shop does: `(1 + sqrt 5) / 2` in f64.
pub fn phi() -> f64 {
    (1.0 + 5.0_f64.sqrt()) / 2.0
}

/// Shells charged for something that costs `usd_cost`, given what an hour of work
/// is worth in dollars. A non-positive rate prices everything at 0.
pub fn shells_for_cost(usd_cost: f64, dollars_per_hour: f64) -> Result<u64> {
    if !usd_cost.is_finite() {
        return Err(PricingError::invalid(format!(
            "usd_cost must be finite (got {usd_cost})"
        )));
    }
    if !(dollars_per_hour > 0.0) {
        return Ok(0);
    }
    if !dollars_per_hour.is_finite() {
        return Err(PricingError::invalid("dollars_per_hour must be finite"));
    }

    let hours = usd_cost / dollars_per_hour;
    let shells = (hours * phi() * 10.0).round();
    to_price("shells", shells.max(0.0))
}
