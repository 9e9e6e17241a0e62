use crate::domain::{Action, PriceRecommendation};

struct Tier {
    upper_percent: f64,
    score: u8,
    action: Action,
    color: &'static str,
    confidence: u8,
}

// Evaluated top-down; the first tier whose upper bound holds wins.
static TIERS: [Tier; 7] = [
    Tier { upper_percent: 92.0, score: 1, action: Action::BuyNow, color: "#00C851", confidence: 95 },
    Tier { upper_percent: 96.0, score: 2, action: Action::GoodDeal, color: "#2BBBAD", confidence: 85 },
    Tier { upper_percent: 100.0, score: 3, action: Action::FairPrice, color: "#4285F4", confidence: 75 },
    Tier { upper_percent: 104.0, score: 4, action: Action::Wait, color: "#FF6F00", confidence: 70 },
    Tier { upper_percent: 108.0, score: 5, action: Action::Expensive, color: "#FF5722", confidence: 80 },
    Tier { upper_percent: 110.0, score: 6, action: Action::Overpriced, color: "#F44336", confidence: 90 },
    Tier { upper_percent: f64::INFINITY, score: 7, action: Action::DontBuy, color: "#9C27B0", confidence: 95 },
];

const LAST_MINUTES_WINDOW: u32 = 10;
const LAST_MINUTES_BONUS: u8 = 10;

/// Classifies a price given as percent of its base price.
///
/// Close to the hourly roll-over the "wait" advice (score 4 and up) gets more
/// confident, since a new price is only minutes away.
pub fn score(percentage_from_base: f64, minutes_until_change: u32) -> PriceRecommendation {
    let tier = TIERS
        .iter()
        .find(|t| percentage_from_base <= t.upper_percent)
        .unwrap_or(&TIERS[TIERS.len() - 1]);

    let below = 100.0 - percentage_from_base;
    let above = percentage_from_base - 100.0;
    let mut reason = match tier.action {
        Action::BuyNow => format!("Excellent deal! {below:.1}% below base price"),
        Action::GoodDeal => format!("Good discount of {below:.1}% off base price"),
        Action::FairPrice => format!("Fair price, within {below:.1}% of base price"),
        Action::Wait => format!(
            "{above:.1}% above base price. Consider waiting {minutes_until_change}min for price change"
        ),
        Action::Expensive => format!("{above:.1}% above base price. Wait for better deal"),
        Action::Overpriced => format!("Overpriced by {above:.1}%. Definitely wait"),
        Action::DontBuy => {
            format!("Extremely overpriced at {above:.1}% above base! Wait for much better deal")
        }
    };

    let mut confidence = tier.confidence;
    if minutes_until_change < LAST_MINUTES_WINDOW && tier.score >= 4 {
        confidence = confidence.saturating_add(LAST_MINUTES_BONUS);
        reason.push_str(&format!(" (price changes in {minutes_until_change}min)"));
    }

    PriceRecommendation {
        score: tier.score,
        action: tier.action,
        color: tier.color.to_string(),
        reason,
        confidence: confidence.min(100),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_of(p: f64) -> u8 {
        score(p, 60).score
    }

    #[test]
    fn every_boundary_lands_in_its_tier() {
        let cases = [
            (91.0, 1),
            (92.0, 1),
            (92.01, 2),
            (93.0, 2),
            (96.0, 2),
            (97.0, 3),
            (100.0, 3),
            (101.0, 4),
            (104.0, 4),
            (105.0, 5),
            (108.0, 5),
            (109.0, 6),
            (110.0, 6),
            (110.01, 7),
            (111.0, 7),
        ];
        for (p, expected) in cases {
            assert_eq!(score_of(p), expected, "percentage {p}");
        }
    }

    #[test]
    fn actions_and_confidence_follow_the_table() {
        let r = score(90.0, 60);
        assert_eq!((r.action, r.confidence), (Action::BuyNow, 95));
        let r = score(95.0, 60);
        assert_eq!((r.action, r.confidence), (Action::GoodDeal, 85));
        let r = score(99.0, 60);
        assert_eq!((r.action, r.confidence), (Action::FairPrice, 75));
        let r = score(102.0, 60);
        assert_eq!((r.action, r.confidence), (Action::Wait, 70));
        let r = score(106.0, 60);
        assert_eq!((r.action, r.confidence), (Action::Expensive, 80));
        let r = score(109.5, 60);
        assert_eq!((r.action, r.confidence), (Action::Overpriced, 90));
        let r = score(130.0, 60);
        assert_eq!((r.action, r.confidence), (Action::DontBuy, 95));
    }

    #[test]
    fn reasons_embed_one_decimal_deviation() {
        assert!(score(91.26, 60).reason.contains("8.7% below"));
        assert!(score(94.0, 60).reason.contains("6.0% off"));
        assert!(score(98.5, 60).reason.contains("1.5%"));
        assert!(score(102.26, 60).reason.contains("2.3% above"));
        assert!(score(107.0, 60).reason.contains("7.0% above"));
        assert!(score(109.94, 60).reason.contains("9.9%"));
        assert!(score(120.0, 60).reason.contains("20.0% above"));
    }

    #[test]
    fn confidence_bump_near_rollover() {
        let r = score(105.0, 5);
        assert_eq!(r.score, 5);
        assert_eq!(r.confidence, 90);
        assert!(r.reason.contains('5'));
        assert!(r.reason.ends_with("(price changes in 5min)"));
    }

    #[test]
    fn confidence_bump_is_capped() {
        let r = score(115.0, 2);
        assert_eq!(r.confidence, 100);
        let r = score(110.0, 9);
        assert_eq!(r.confidence, 100);
    }

    #[test]
    fn no_bump_for_good_prices_or_early_in_the_hour() {
        let r = score(91.0, 1);
        assert_eq!(r.confidence, 95);
        assert!(!r.reason.contains("price changes"));

        let r = score(105.0, 10);
        assert_eq!(r.confidence, 80);
        assert!(!r.reason.contains("price changes"));
    }

    #[test]
    fn action_serializes_as_label() {
        let v = serde_json::to_value(Action::DontBuy).unwrap();
        assert_eq!(v, serde_json::json!("DON'T BUY"));
        assert_eq!(Action::BuyNow.to_string(), "BUY NOW");
    }
}
