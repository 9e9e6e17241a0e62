use crate::domain::{BestTime, PriceBounds, PricePoint};
use crate::error::{PricingError, Result};
use crate::pricing::model::{forward_price, inverse_base_price};
use crate::time::HourIndex;

/// Longest look-ahead accepted by [`predict`] and [`best_time`] (one month).
pub const MAX_HOURS_AHEAD: u32 = 24 * 31;

fn check_horizon(hours_ahead: u32) -> Result<()> {
    if hours_ahead > MAX_HOURS_AHEAD {
        return Err(PricingError::invalid(format!(
            "hours_ahead must be at most {MAX_HOURS_AHEAD} (got {hours_ahead})"
        )));
    }
    Ok(())
}

/// Human label for an offset from the current hour ("now", "1 hour", "5 hours", "2 days").
pub fn time_from_now(hours: i64) -> String {
    match hours {
        0 => "now".to_string(),
        1 => "1 hour".to_string(),
        h if h < 24 => format!("{h} hours"),
        h => {
            let days = h / 24;
            if days > 1 {
                format!("{days} days")
            } else {
                format!("{days} day")
            }
        }
    }
}

/// Prices for the `hours_ahead` hours after `current_hour`, ascending.
///
/// The base price is reconstructed once from `observed_price` at `current_hour`
/// and then re-priced forward; future hours only move the hash seed.
pub fn predict(
    user_id: &str,
    item_id: &str,
    observed_price: u64,
    bounds: PriceBounds,
    current_hour: HourIndex,
    hours_ahead: u32,
) -> Result<Vec<PricePoint>> {
    check_horizon(hours_ahead)?;
    let base_price = inverse_base_price(observed_price, bounds, current_hour, user_id, item_id)?;

    let mut out = Vec::with_capacity(hours_ahead as usize);
    for offset in 1..=i64::from(hours_ahead) {
        let hour = current_hour.offset(offset);
        let price = forward_price(base_price, bounds, hour, user_id, item_id)?;
        out.push(PricePoint {
            hour_index: hour,
            starts_at: hour.starts_at(),
            price,
            percentage_from_base: price as f64 / base_price as f64 * 100.0,
            time_from_now: time_from_now(offset),
        });
    }
    Ok(out)
}

/// Cheapest hour in `current_hour ..= current_hour + hours_ahead`.
///
/// The current observation is the starting candidate and a later hour only wins
/// with a strictly lower price, so ties keep the earliest hour.
pub fn best_time(
    user_id: &str,
    item_id: &str,
    observed_price: u64,
    bounds: PriceBounds,
    current_hour: HourIndex,
    hours_ahead: u32,
) -> Result<BestTime> {
    check_horizon(hours_ahead)?;
    let base_price = inverse_base_price(observed_price, bounds, current_hour, user_id, item_id)?;

    let mut best_hour = current_hour;
    let mut best_price = observed_price;
    for offset in 1..=i64::from(hours_ahead) {
        let hour = current_hour.offset(offset);
        let price = forward_price(base_price, bounds, hour, user_id, item_id)?;
        if price < best_price {
            best_price = price;
            best_hour = hour;
        }
    }

    Ok(BestTime {
        best_hour_index: best_hour,
        starts_at: best_hour.starts_at(),
        best_price,
        current_price: observed_price,
        savings_from_current: observed_price - best_price,
        time_from_now: time_from_now(best_hour.hours_since(current_hour)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::model::forward_price;

    const USER: &str = "cmcxl99oj00r9mt01sy59w923";
    const ITEM: &str = "cmebn55yi0116nv01orzpor1v";
    const NOW: HourIndex = HourIndex(487_000);

    #[test]
    fn labels() {
        assert_eq!(time_from_now(0), "now");
        assert_eq!(time_from_now(1), "1 hour");
        assert_eq!(time_from_now(2), "2 hours");
        assert_eq!(time_from_now(23), "23 hours");
        assert_eq!(time_from_now(24), "1 day");
        assert_eq!(time_from_now(47), "1 day");
        assert_eq!(time_from_now(48), "2 days");
    }

    #[test]
    fn predicts_each_future_hour_in_order() {
        let bounds = PriceBounds::default();
        let observed = forward_price(551, bounds, NOW, USER, ITEM).unwrap();
        let points = predict(USER, ITEM, observed, bounds, NOW, 24).unwrap();

        assert_eq!(points.len(), 24);
        for (i, p) in points.iter().enumerate() {
            let offset = i as i64 + 1;
            assert_eq!(p.hour_index, NOW.offset(offset));
            assert_eq!(p.time_from_now, time_from_now(offset));
            assert!((495..=608).contains(&p.price), "price {}", p.price);
        }
    }

    #[test]
    fn predictions_match_forward_model_with_recovered_base() {
        let bounds = PriceBounds::default();
        let observed = forward_price(1000, bounds, NOW, USER, ITEM).unwrap();
        let base = inverse_base_price(observed, bounds, NOW, USER, ITEM).unwrap();
        let points = predict(USER, ITEM, observed, bounds, NOW, 6).unwrap();
        for p in points {
            let expected = forward_price(base, bounds, p.hour_index, USER, ITEM).unwrap();
            assert_eq!(p.price, expected);
            assert_eq!(p.percentage_from_base, expected as f64 / base as f64 * 100.0);
        }
    }

    #[test]
    fn zero_horizon_is_empty() {
        let points = predict(USER, ITEM, 500, PriceBounds::default(), NOW, 0).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn oversized_horizon_is_invalid_input() {
        let bounds = PriceBounds::default();
        assert!(matches!(
            predict(USER, ITEM, 500, bounds, NOW, u32::MAX),
            Err(PricingError::InvalidInput(_))
        ));
        assert!(matches!(
            best_time(USER, ITEM, 500, bounds, NOW, MAX_HOURS_AHEAD + 1),
            Err(PricingError::InvalidInput(_))
        ));
        assert_eq!(predict(USER, ITEM, 500, bounds, NOW, MAX_HOURS_AHEAD).unwrap().len(), 744);
    }

    #[test]
    fn best_time_never_exceeds_observed() {
        let bounds = PriceBounds::default();
        for hour in 0..24 {
            let now = NOW.offset(hour);
            let observed = forward_price(1072, bounds, now, USER, ITEM).unwrap();
            let best = best_time(USER, ITEM, observed, bounds, now, 24).unwrap();
            assert!(best.best_price <= observed);
            assert_eq!(best.savings_from_current, observed - best.best_price);
            assert!(best.best_hour_index >= now && best.best_hour_index <= now.offset(24));
        }
    }

    #[test]
    fn best_time_picks_first_strict_minimum() {
        let bounds = PriceBounds::default();
        let observed = forward_price(1995, bounds, NOW, USER, ITEM).unwrap();
        let points = predict(USER, ITEM, observed, bounds, NOW, 48).unwrap();
        let best = best_time(USER, ITEM, observed, bounds, NOW, 48).unwrap();

        let min_future = points.iter().map(|p| p.price).min().unwrap();
        if min_future < observed {
            let first = points.iter().find(|p| p.price == min_future).unwrap();
            assert_eq!(best.best_hour_index, first.hour_index);
            assert_eq!(best.best_price, min_future);
        } else {
            assert_eq!(best.best_hour_index, NOW);
            assert_eq!(best.time_from_now, "now");
        }
    }

    #[test]
    fn best_time_keeps_now_when_already_cheapest() {
        // An observation at the window floor cannot be beaten.
        let bounds = PriceBounds::default();
        let best = best_time(USER, ITEM, 1, bounds, NOW, 24).unwrap();
        assert_eq!(best.best_hour_index, NOW);
        assert_eq!(best.best_price, 1);
        assert_eq!(best.savings_from_current, 0);
        assert_eq!(best.time_from_now, "now");
    }
}
