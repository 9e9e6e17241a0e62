use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;
const MS_PER_MINUTE: i64 = 60 * 1000;

/// Whole hours elapsed since the Unix epoch. The only time-varying seed of the
/// price hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HourIndex(pub i64);

impl HourIndex {
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis().div_euclid(MS_PER_HOUR))
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn offset(self, hours: i64) -> Self {
        Self(self.0 + hours)
    }

    pub fn hours_since(self, earlier: HourIndex) -> i64 {
        self.0 - earlier.0
    }

    /// UTC instant at which this hour begins.
    pub fn starts_at(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0.checked_mul(MS_PER_HOUR)?)
            .single()
    }
}

impl fmt::Display for HourIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whole minutes left before prices roll over to the next hour.
pub fn minutes_until_change(now: DateTime<Utc>) -> u32 {
    let now_ms = now.timestamp_millis();
    let next_hour_ms = (now_ms.div_euclid(MS_PER_HOUR) + 1) * MS_PER_HOUR;
    let remaining = (next_hour_ms - now_ms) % MS_PER_HOUR;
    (remaining / MS_PER_MINUTE) as u32
}
