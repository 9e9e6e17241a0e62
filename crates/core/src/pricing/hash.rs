use sha2::{Digest, Sha256};

use crate::time::HourIndex;

/// Reproducible draw for a (user, item, hour) triple.
///
/// The first 8 hex characters of `sha256("{user}-{item}-{hour}")` are read as a
/// u32 and scaled by `0xFFFFFFFF`, so the result lies in `[0, 1]` (1.0 only for an
/// all-ones prefix). Every previously observed price depends on this exact
/// truncation; do not swap the digest or the width.
pub fn hourly_random(user_id: &str, item_id: &str, hour: HourIndex) -> f64 {
    let combined = format!("{user_id}-{item_id}-{hour}");
    let digest = Sha256::digest(combined.as_bytes());
    // First 4 bytes == first 8 hex chars.
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    f64::from(prefix) / f64::from(u32::MAX)
}
