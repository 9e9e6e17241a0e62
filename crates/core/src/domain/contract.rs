use crate::domain::item::{Item, PricingKind};
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// On-disk catalog shape, as loaded from `SHELLTRACK_CATALOG_PATH`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub items: Vec<CatalogRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub base_price: u64,
    #[serde(default)]
    pub is_fixed: bool,
    /// Only for fixed items priced from a USD amount (travel stipends).
    pub usd_cost: Option<f64>,
}

impl CatalogFile {
    pub fn validate_and_into_items(self) -> anyhow::Result<Vec<Item>> {
        ensure!(!self.items.is_empty(), "catalog must contain at least one item");

        let mut seen_ids = BTreeSet::<String>::new();
        let mut items = Vec::with_capacity(self.items.len());
        for record in self.items {
            items.push(record.validate_and_into_item(&mut seen_ids)?);
        }
        Ok(items)
    }
}

impl CatalogRecord {
    fn validate_and_into_item(self, seen_ids: &mut BTreeSet<String>) -> anyhow::Result<Item> {
        let id = self.id.trim().to_string();
        ensure!(!id.is_empty(), "item id must be non-empty");
        ensure!(seen_ids.insert(id.clone()), "duplicate item id: {id}");

        let name = self.name.trim().to_string();
        ensure!(!name.is_empty(), "item name must be non-empty (id={id})");

        ensure!(
            self.base_price >= 1,
            "base_price must be positive (id={id}, got {})",
            self.base_price
        );

        let pricing = match (self.is_fixed, self.usd_cost) {
            (false, None) => PricingKind::Randomized,
            (false, Some(_)) => {
                anyhow::bail!("usd_cost is only valid on fixed items (id={id})")
            }
            (true, None) => PricingKind::Fixed,
            (true, Some(usd_cost)) => {
                ensure!(
                    usd_cost.is_finite() && usd_cost > 0.0,
                    "usd_cost must be a positive number (id={id}, got {usd_cost})"
                );
                PricingKind::Stipend { usd_cost }
            }
        };

        Ok(Item {
            id,
            name,
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            base_price: self.base_price,
            pricing,
        })
    }
}
