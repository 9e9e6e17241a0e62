//! The hourly pricing engine: hash source, forward/inverse models and everything
//! built on top of them. Nothing in here reads the clock.

pub mod calibrate;
pub mod hash;
pub mod model;
pub mod predict;
pub mod recommend;
pub mod sampler;
pub mod shells;

pub use calibrate::calibrate_base_price;
pub use hash::hourly_random;
pub use model::{forward_price, inverse_base_price, price_range};
pub use predict::{best_time, predict};
pub use recommend::score;
pub use sampler::global_cheapest;
pub use shells::shells_for_cost;
