use anyhow::Context;
use serde::{Deserialize, Serialize};
use shelltrack_core::catalog::Catalog;
use shelltrack_core::config::MarketOptions;
use shelltrack_core::market;
use shelltrack_core::pricing::calibrate_base_price;
use shelltrack_core::time::HourIndex;
use std::path::Path;

/// One price as copied from the shop page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseSource {
    /// Recovered from the hourly price and checked by re-pricing it.
    Calibrated,
    /// Recovered, but no nearby base reproduces the observation.
    Unverified,
    /// Catalog says the price never randomizes.
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibratedItem {
    pub id: String,
    pub name: String,
    pub current_price: u64,
    pub base_price: u64,
    pub source: BaseSource,
}

pub fn read_observations(path: &Path) -> anyhow::Result<Vec<Observation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read observations {}", path.display()))?;
    let observations = serde_json::from_str::<Vec<Observation>>(&text)
        .with_context(|| format!("observations in {} are not a JSON array of {{id, name, price}}", path.display()))?;
    anyhow::ensure!(!observations.is_empty(), "no observations in {}", path.display());
    Ok(observations)
}

/// Reverse-engineers base prices for observations all taken during `hour`.
pub fn calibrate_all(
    catalog: &Catalog,
    user_id: &str,
    observations: &[Observation],
    options: &MarketOptions,
    hour: HourIndex,
) -> anyhow::Result<Vec<CalibratedItem>> {
    let mut out = Vec::with_capacity(observations.len());
    for obs in observations {
        let fixed_item = catalog.find(&obs.id).ok().filter(|item| item.is_fixed());

        let (base_price, source) = match fixed_item {
            Some(item) => (market::fixed_price(item, options)?, BaseSource::Fixed),
            None => {
                let c = calibrate_base_price(user_id, &obs.id, obs.price, options.bounds, hour)
                    .with_context(|| format!("calibration failed for item {}", obs.id))?;
                let source = if c.verified {
                    BaseSource::Calibrated
                } else {
                    BaseSource::Unverified
                };
                (c.base_price, source)
            }
        };

        tracing::info!(
            item_id = %obs.id,
            current_price = obs.price,
            base_price,
            ?source,
            "calibrated"
        );

        out.push(CalibratedItem {
            id: obs.id.clone(),
            name: obs.name.clone(),
            current_price: obs.price,
            base_price,
            source,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shelltrack_core::pricing::forward_price;

    const USER: &str = "cmcxl99oj00r9mt01sy59w923";

    #[test]
    fn parses_shop_observations() {
        let v = json!([
            {"id": "cmebn7caq0118nv01spx78x4t", "name": "Raspbery PI 5", "price": 464},
            {"id": "cmd7in0r4000kro01x3l2c1v8", "price": 16}
        ]);
        let obs: Vec<Observation> = serde_json::from_value(v).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[1].name, "");
    }

    #[test]
    fn recovers_catalog_base_prices() {
        let catalog = Catalog::builtin().unwrap();
        let options = MarketOptions::default();
        let hour = HourIndex(487_000);

        let observations: Vec<Observation> = catalog
            .items()
            .iter()
            .map(|item| Observation {
                id: item.id.clone(),
                name: item.name.clone(),
                price: if item.is_fixed() {
                    market::fixed_price(item, &options).unwrap()
                } else {
                    forward_price(item.base_price, options.bounds, hour, USER, &item.id).unwrap()
                },
            })
            .collect();

        let out = calibrate_all(&catalog, USER, &observations, &options, hour).unwrap();
        assert_eq!(out.len(), observations.len());
        for (calibrated, item) in out.iter().zip(catalog.items()) {
            if item.is_fixed() {
                assert_eq!(calibrated.source, BaseSource::Fixed);
            } else {
                assert_eq!(calibrated.source, BaseSource::Calibrated);
                assert!(calibrated.base_price.abs_diff(item.base_price) <= 1);
            }
        }
    }

    #[test]
    fn unknown_items_are_still_calibrated() {
        let catalog = Catalog::builtin().unwrap();
        let obs = [Observation {
            id: "not-in-catalog".to_string(),
            name: "Mystery".to_string(),
            price: 500,
        }];
        let out =
            calibrate_all(&catalog, USER, &obs, &MarketOptions::default(), HourIndex(487_000)).unwrap();
        assert_ne!(out[0].source, BaseSource::Fixed);
        assert!((454..=556).contains(&out[0].base_price));
    }
}
