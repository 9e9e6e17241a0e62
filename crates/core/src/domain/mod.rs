pub mod contract;
pub mod item;
pub mod pricing;
pub mod recommendation;

pub use item::{Item, PricingKind};
pub use pricing::{
    BestTime, Calibration, DistributionSummary, GlobalCheapest, PriceAnalysis, PriceBounds,
    PricePoint,
};
pub use recommendation::{Action, PriceRecommendation};
