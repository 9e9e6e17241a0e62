use crate::domain::{Calibration, PriceBounds};
use crate::error::Result;
use crate::pricing::model::{forward_price, inverse_base_price};
use crate::time::HourIndex;

const SEARCH_RADIUS: i64 = 5;

/// Recovers a base price and checks it by pricing it forward again.
///
/// The plain inverse can land one off when the forward clamp kicked in, so on a
/// mismatch nearby bases are tried (lowest first) and the first one that
/// reproduces `observed_price` is returned.
pub fn calibrate_base_price(
    user_id: &str,
    item_id: &str,
    observed_price: u64,
    bounds: PriceBounds,
    hour: HourIndex,
) -> Result<Calibration> {
    let estimate = inverse_base_price(observed_price, bounds, hour, user_id, item_id)?;
    if forward_price(estimate, bounds, hour, user_id, item_id)? == observed_price {
        return Ok(Calibration {
            base_price: estimate,
            verified: true,
        });
    }

    for offset in -SEARCH_RADIUS..=SEARCH_RADIUS {
        let Some(candidate) = estimate.checked_add_signed(offset).filter(|c| *c > 0) else {
            continue;
        };
        if forward_price(candidate, bounds, hour, user_id, item_id)? == observed_price {
            return Ok(Calibration {
                base_price: candidate,
                verified: true,
            });
        }
    }

    tracing::warn!(
        %user_id,
        %item_id,
        observed_price,
        estimate,
        %hour,
        "could not verify reconstructed base price"
    );
    Ok(Calibration {
        base_price: estimate,
        verified: false,
    })
}
