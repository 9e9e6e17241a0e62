pub mod catalog;
pub mod domain;
pub mod error;
pub mod format;
pub mod market;
pub mod pricing;
pub mod time;

pub use error::{PricingError, Result};

pub mod config {
    use crate::domain::pricing::{DEFAULT_MAX_PERCENT, DEFAULT_MIN_PERCENT};
    use crate::domain::PriceBounds;
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub catalog_path: Option<String>,
        pub user_id: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                catalog_path: std::env::var("SHELLTRACK_CATALOG_PATH")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                user_id: std::env::var("SHELLTRACK_USER_ID")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
            })
        }

        pub fn require_user_id(&self) -> anyhow::Result<&str> {
            self.user_id
                .as_deref()
                .context("SHELLTRACK_USER_ID is required (or pass --user-id)")
        }
    }

    /// Pricing knobs shared by the api and the cli.
    #[derive(Debug, Clone, PartialEq)]
    pub struct MarketOptions {
        pub bounds: PriceBounds,
        /// Hourly rate used to turn USD stipends into shells.
        pub dollars_per_hour: f64,
        /// Horizon for predictions and best-time searches.
        pub hours_ahead: u32,
        pub sample_users: u32,
        pub hours_to_check: u32,
    }

    impl Default for MarketOptions {
        fn default() -> Self {
            Self {
                bounds: PriceBounds::new(DEFAULT_MIN_PERCENT, DEFAULT_MAX_PERCENT),
                dollars_per_hour: 10.0,
                hours_ahead: 24,
                sample_users: 500,
                // One week.
                hours_to_check: 168,
            }
        }
    }

    impl MarketOptions {
        pub fn from_env() -> Self {
            let mut out = Self::default();

            if let Some(n) = env_parse::<i32>("PRICE_MIN_PERCENT") {
                out.bounds.min_percent = n;
            }
            if let Some(n) = env_parse::<i32>("PRICE_MAX_PERCENT") {
                out.bounds.max_percent = n;
            }
            if let Some(n) = env_parse::<f64>("DOLLARS_PER_HOUR") {
                out.dollars_per_hour = n;
            }
            if let Some(n) = env_parse::<u32>("PREDICT_HOURS_AHEAD") {
                out.hours_ahead = n;
            }
            if let Some(n) = env_parse::<u32>("GLOBAL_SAMPLE_USERS") {
                out.sample_users = n;
            }
            if let Some(n) = env_parse::<u32>("GLOBAL_HOURS_TO_CHECK") {
                out.hours_to_check = n;
            }

            out
        }
    }

    fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
    }

}
