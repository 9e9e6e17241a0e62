use rayon::prelude::*;
use statrs::statistics::Statistics;

use crate::domain::{DistributionSummary, GlobalCheapest, PriceBounds};
use crate::error::{PricingError, Result};
use crate::pricing::model::{checked_price, forward_price};
use crate::time::HourIndex;

/// Most (user, hour) pairs one sampler run may price.
pub const MAX_SAMPLES: u64 = 1_000_000;

pub fn synthetic_user_id(index: u32) -> String {
    format!("user-{index:010}")
}

/// Approximates the lowest price any user could see for an item.
///
/// Prices `sample_users` synthetic users over `hours_to_check` hours starting at
/// `start_hour`. Users are priced in parallel, but rows are reduced in
/// (user ascending, hour ascending) order and only a strictly lower price replaces
/// the running minimum, so ties resolve to the first pair in that order.
pub fn global_cheapest(
    item_id: &str,
    base_price: u64,
    bounds: PriceBounds,
    start_hour: HourIndex,
    sample_users: u32,
    hours_to_check: u32,
) -> Result<GlobalCheapest> {
    if sample_users == 0 || hours_to_check == 0 {
        return Err(PricingError::invalid(format!(
            "sampler needs at least one user and one hour (got {sample_users} x {hours_to_check})"
        )));
    }
    let samples = u64::from(sample_users) * u64::from(hours_to_check);
    if samples > MAX_SAMPLES {
        return Err(PricingError::invalid(format!(
            "sampler is limited to {MAX_SAMPLES} prices (got {sample_users} x {hours_to_check})"
        )));
    }
    let base = checked_price("base_price", base_price)?;

    let t0 = std::time::Instant::now();
    let rows: Vec<Vec<u64>> = (0..sample_users)
        .into_par_iter()
        .map(|index| {
            let user_id = synthetic_user_id(index);
            (0..i64::from(hours_to_check))
                .map(|offset| {
                    forward_price(base_price, bounds, start_hour.offset(offset), &user_id, item_id)
                })
                .collect::<Result<Vec<u64>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let mut cheapest: Option<(u64, u32, i64)> = None;
    for (user_index, row) in (0_u32..).zip(&rows) {
        for (offset, &price) in (0_i64..).zip(row) {
            if cheapest.map_or(true, |(best, _, _)| price < best) {
                cheapest = Some((price, user_index, offset));
            }
        }
    }
    let (cheapest_price, user_index, offset) = cheapest
        .ok_or_else(|| PricingError::invalid("sampler produced no prices"))?;

    let mut price_distribution: Vec<u64> = rows.into_iter().flatten().collect();
    price_distribution.sort_unstable();

    tracing::debug!(
        %item_id,
        samples = price_distribution.len(),
        cheapest_price,
        elapsed_ms = t0.elapsed().as_millis(),
        "global price sample"
    );

    Ok(GlobalCheapest {
        cheapest_price,
        cheapest_user_id: synthetic_user_id(user_index),
        cheapest_hour_index: start_hour.offset(offset),
        cheapest_percentage: cheapest_price as f64 / base * 100.0,
        price_distribution,
    })
}

/// Spread of an ascending price distribution. `None` when empty.
pub fn summarize(sorted: &[u64]) -> Option<DistributionSummary> {
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    let values: Vec<f64> = sorted.iter().map(|&p| p as f64).collect();
    let mean = values.iter().mean();
    let std_dev = if values.len() > 1 {
        values.clone().std_dev()
    } else {
        0.0
    };

    Some(DistributionSummary {
        min,
        max,
        median: sorted[sorted.len() / 2],
        p05: quantile(sorted, 0.05),
        p95: quantile(sorted, 0.95),
        mean,
        std_dev,
    })
}

fn quantile(sorted: &[u64], q: f64) -> u64 {
    let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
    sorted[idx]
}
