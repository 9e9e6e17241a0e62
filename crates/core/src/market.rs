//! Library surface for display layers.
//!
//! Every function takes the wall-clock instant `now` captured by the caller and
//! derives the current [`HourIndex`] from it exactly once; the engine underneath
//! never reads the clock. Observed prices are therefore decoded against the hour
//! containing `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::config::MarketOptions;
use crate::domain::{
    Action, BestTime, DistributionSummary, GlobalCheapest, Item, PriceAnalysis, PriceBounds,
    PricePoint, PricingKind,
};
use crate::error::{PricingError, Result};
use crate::pricing::{self, sampler};
use crate::time::{minutes_until_change, HourIndex};

pub const FIXED_PRICE_LABEL: &str = "Fixed price";
pub const FIXED_PRICE_MESSAGE: &str = "This item has a fixed price - it does not change over time";

pub fn current_observed_price(
    user_id: &str,
    item_id: &str,
    base_price: u64,
    bounds: PriceBounds,
    now: DateTime<Utc>,
) -> Result<u64> {
    let user_id = checked_user_id(user_id)?;
    pricing::forward_price(base_price, bounds, HourIndex::from_datetime(now), user_id, item_id)
}

pub fn analyze(
    user_id: &str,
    item_id: &str,
    observed_price: u64,
    bounds: PriceBounds,
    now: DateTime<Utc>,
) -> Result<PriceAnalysis> {
    let user_id = checked_user_id(user_id)?;
    let hour = HourIndex::from_datetime(now);

    let base_price = pricing::inverse_base_price(observed_price, bounds, hour, user_id, item_id)?;
    let (min_possible_price, max_possible_price) = pricing::price_range(base_price, bounds)?;
    let percentage_from_base = observed_price as f64 / base_price as f64 * 100.0;
    let minutes = minutes_until_change(now);

    Ok(PriceAnalysis {
        current_price: observed_price,
        base_price,
        min_possible_price,
        max_possible_price,
        percentage_from_base,
        minutes_until_change: minutes,
        recommendation: pricing::score(percentage_from_base, minutes),
    })
}

pub fn predict_next_hours(
    user_id: &str,
    item_id: &str,
    observed_price: u64,
    bounds: PriceBounds,
    hours_ahead: u32,
    now: DateTime<Utc>,
) -> Result<Vec<PricePoint>> {
    let user_id = checked_user_id(user_id)?;
    pricing::predict(
        user_id,
        item_id,
        observed_price,
        bounds,
        HourIndex::from_datetime(now),
        hours_ahead,
    )
}

pub fn best_time_to_buy(
    user_id: &str,
    item_id: &str,
    observed_price: u64,
    bounds: PriceBounds,
    hours_ahead: u32,
    now: DateTime<Utc>,
) -> Result<BestTime> {
    let user_id = checked_user_id(user_id)?;
    pricing::best_time(
        user_id,
        item_id,
        observed_price,
        bounds,
        HourIndex::from_datetime(now),
        hours_ahead,
    )
}

pub fn global_cheapest(
    item_id: &str,
    base_price: u64,
    bounds: PriceBounds,
    sample_users: u32,
    hours_to_check: u32,
    now: DateTime<Utc>,
) -> Result<GlobalCheapest> {
    pricing::global_cheapest(
        item_id,
        base_price,
        bounds,
        HourIndex::from_datetime(now),
        sample_users,
        hours_to_check,
    )
}

fn checked_user_id(user_id: &str) -> Result<&str> {
    if user_id.trim().is_empty() {
        return Err(PricingError::invalid("user_id must be non-empty"));
    }
    Ok(user_id)
}

/// What everyone pays for a fixed-price item.
pub fn fixed_price(item: &Item, options: &MarketOptions) -> Result<u64> {
    match item.pricing {
        PricingKind::Stipend { usd_cost } => {
            pricing::shells_for_cost(usd_cost, options.dollars_per_hour)
        }
        PricingKind::Fixed | PricingKind::Randomized => Ok(item.base_price),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserItemPricing {
    pub item: Item,
    /// Price this user sees right now.
    pub observed_price: u64,
    /// Catalog base price, or the computed price for fixed items.
    pub base_price: u64,
    pub analysis: Option<PriceAnalysis>,
    pub best_time: BestTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDigest {
    pub best_price: u64,
    pub best_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub score: u8,
    pub action: Action,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPricing {
    pub user_id: String,
    pub items: Vec<UserItemPricing>,
    pub prices: BTreeMap<String, u64>,
    pub predictions: BTreeMap<String, PredictionDigest>,
    pub ratings: BTreeMap<String, Rating>,
}

/// Current prices, analysis and best time to buy for every catalog item.
pub fn user_pricing(
    catalog: &Catalog,
    user_id: &str,
    options: &MarketOptions,
    now: DateTime<Utc>,
) -> Result<UserPricing> {
    let user_id = checked_user_id(user_id)?;
    let hour = HourIndex::from_datetime(now);

    let mut out = UserPricing {
        user_id: user_id.to_string(),
        items: Vec::with_capacity(catalog.items().len()),
        prices: BTreeMap::new(),
        predictions: BTreeMap::new(),
        ratings: BTreeMap::new(),
    };

    for item in catalog.items() {
        let entry = if item.is_fixed() {
            let price = fixed_price(item, options)?;
            UserItemPricing {
                item: item.clone(),
                observed_price: price,
                base_price: price,
                analysis: None,
                best_time: BestTime {
                    best_hour_index: hour,
                    starts_at: hour.starts_at(),
                    best_price: price,
                    current_price: price,
                    savings_from_current: 0,
                    time_from_now: FIXED_PRICE_LABEL.to_string(),
                },
            }
        } else {
            let observed = pricing::forward_price(item.base_price, options.bounds, hour, user_id, &item.id)?;
            let analysis = analyze(user_id, &item.id, observed, options.bounds, now)?;
            let best = pricing::best_time(user_id, &item.id, observed, options.bounds, hour, options.hours_ahead)?;

            out.ratings.insert(
                item.id.clone(),
                Rating {
                    score: analysis.recommendation.score,
                    action: analysis.recommendation.action,
                    color: analysis.recommendation.color.clone(),
                },
            );
            out.predictions.insert(
                item.id.clone(),
                PredictionDigest {
                    best_price: best.best_price,
                    best_time: best.time_from_now.clone(),
                },
            );

            UserItemPricing {
                item: item.clone(),
                observed_price: observed,
                base_price: item.base_price,
                analysis: Some(analysis),
                best_time: best,
            }
        };

        out.prices.insert(item.id.clone(), entry.observed_price);
        out.items.push(entry);
    }

    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEntry {
    pub item: Item,
    pub base_price: u64,
    pub cheapest_price: u64,
    /// Negative if no sampled price undercut the base price.
    pub savings_from_base: i64,
    pub max_savings_percent: f64,
    pub cheapest_user_id: Option<String>,
    pub cheapest_hour_index: Option<HourIndex>,
    pub distribution: DistributionSummary,
}

/// Cheapest price any user could plausibly see, per catalog item.
pub fn global_market(
    catalog: &Catalog,
    options: &MarketOptions,
    now: DateTime<Utc>,
) -> Result<Vec<MarketEntry>> {
    let hour = HourIndex::from_datetime(now);
    let t0 = std::time::Instant::now();

    let mut out = Vec::with_capacity(catalog.items().len());
    for item in catalog.items() {
        if item.is_fixed() {
            let price = fixed_price(item, options)?;
            out.push(MarketEntry {
                item: item.clone(),
                base_price: price,
                cheapest_price: price,
                savings_from_base: 0,
                max_savings_percent: 0.0,
                cheapest_user_id: None,
                cheapest_hour_index: None,
                distribution: DistributionSummary {
                    min: price,
                    max: price,
                    median: price,
                    p05: price,
                    p95: price,
                    mean: price as f64,
                    std_dev: 0.0,
                },
            });
            continue;
        }

        let sample = pricing::global_cheapest(
            &item.id,
            item.base_price,
            options.bounds,
            hour,
            options.sample_users,
            options.hours_to_check,
        )?;
        let distribution = sampler::summarize(&sample.price_distribution)
            .ok_or_else(|| PricingError::invalid("empty price distribution"))?;
        let savings_from_base = item.base_price as i64 - sample.cheapest_price as i64;

        out.push(MarketEntry {
            item: item.clone(),
            base_price: item.base_price,
            cheapest_price: sample.cheapest_price,
            savings_from_base,
            max_savings_percent: savings_from_base as f64 / item.base_price as f64 * 100.0,
            cheapest_user_id: Some(sample.cheapest_user_id),
            cheapest_hour_index: Some(sample.cheapest_hour_index),
            distribution,
        });
    }

    tracing::info!(
        items = out.len(),
        sample_users = options.sample_users,
        hours_to_check = options.hours_to_check,
        elapsed_ms = t0.elapsed().as_millis(),
        "global market analysis complete"
    );
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub current_price: u64,
    pub best_price_in_period: u64,
    pub potential_savings: u64,
    pub recommended_action: Action,
    pub time_to_wait: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pricing", rename_all = "snake_case")]
pub enum ItemPrediction {
    Fixed {
        item: Item,
        current_price: u64,
        message: String,
    },
    Randomized {
        item: Item,
        current_price: u64,
        analysis: PriceAnalysis,
        predictions: Vec<PricePoint>,
        best_time: BestTime,
        summary: PredictionSummary,
    },
}

/// Full outlook for one item as seen by `user_id`.
pub fn item_prediction(
    catalog: &Catalog,
    user_id: &str,
    item_id: &str,
    hours_ahead: u32,
    options: &MarketOptions,
    now: DateTime<Utc>,
) -> Result<ItemPrediction> {
    let user_id = checked_user_id(user_id)?;
    let item = catalog.find(item_id)?;

    if item.is_fixed() {
        return Ok(ItemPrediction::Fixed {
            item: item.clone(),
            current_price: fixed_price(item, options)?,
            message: FIXED_PRICE_MESSAGE.to_string(),
        });
    }

    let observed = current_observed_price(user_id, &item.id, item.base_price, options.bounds, now)?;
    let predictions = predict_next_hours(user_id, &item.id, observed, options.bounds, hours_ahead, now)?;
    let best_time = best_time_to_buy(user_id, &item.id, observed, options.bounds, hours_ahead, now)?;
    let analysis = analyze(user_id, &item.id, observed, options.bounds, now)?;

    let summary = PredictionSummary {
        current_price: analysis.current_price,
        best_price_in_period: best_time.best_price,
        potential_savings: best_time.savings_from_current,
        recommended_action: analysis.recommendation.action,
        time_to_wait: best_time.time_from_now.clone(),
    };

    Ok(ItemPrediction::Randomized {
        item: item.clone(),
        current_price: observed,
        analysis,
        predictions,
        best_time,
        summary,
    })
}
