use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "BUY NOW")]
    BuyNow,
    #[serde(rename = "GOOD DEAL")]
    GoodDeal,
    #[serde(rename = "FAIR PRICE")]
    FairPrice,
    #[serde(rename = "WAIT")]
    Wait,
    #[serde(rename = "EXPENSIVE")]
    Expensive,
    #[serde(rename = "OVERPRICED")]
    Overpriced,
    #[serde(rename = "DON'T BUY")]
    DontBuy,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::BuyNow => "BUY NOW",
            Action::GoodDeal => "GOOD DEAL",
            Action::FairPrice => "FAIR PRICE",
            Action::Wait => "WAIT",
            Action::Expensive => "EXPENSIVE",
            Action::Overpriced => "OVERPRICED",
            Action::DontBuy => "DON'T BUY",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecommendation {
    /// 1 (best deal) ..= 7 (worst).
    pub score: u8,
    pub action: Action,
    /// Display hint, opaque to the engine.
    pub color: String,
    pub reason: String,
    /// 0..=100.
    pub confidence: u8,
}
