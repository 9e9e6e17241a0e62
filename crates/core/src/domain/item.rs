use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingKind {
    /// Price re-rolls every hour per user.
    Randomized,
    /// Price never changes; `base_price` is what everyone pays.
    Fixed,
    /// Fixed price derived from a USD amount at the configured hourly rate.
    Stipend { usd_cost: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub base_price: u64,
    pub pricing: PricingKind,
}

impl Item {
    pub fn is_fixed(&self) -> bool {
        !matches!(self.pricing, PricingKind::Randomized)
    }
}
