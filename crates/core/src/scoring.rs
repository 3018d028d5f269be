use crate::domain::{Confidence, SignalKind};
use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightsError {
    #[error("weight {name} must be within [0, 1] (got {value})")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("weights must sum to 1.0 (got {0})")]
    BadSum(f64),
}

/// Component weights of the final score. Must be non-negative and sum to 1.0 so the final
/// score stays within [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub price: f64,
    pub news: f64,
    pub insider: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            price: 0.4,
            news: 0.3,
            insider: 0.3,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), WeightsError> {
        for (name, value) in [
            ("price", self.price),
            ("news", self.news),
            ("insider", self.insider),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(WeightsError::OutOfRange { name, value });
            }
        }

        let sum = self.price + self.news + self.insider;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightsError::BadSum(sum));
        }
        Ok(())
    }

    /// Weighted sum of the component scores, rounded to 3 decimals.
    pub fn final_score(&self, price_score: f64, news_score: f64, insider_score: f64) -> f64 {
        round_to(
            self.price * price_score + self.news * news_score + self.insider * insider_score,
            3,
        )
    }
}

/// Step function over the day-over-day percent change. Every comparison is strict.
pub fn price_score(pct_change: Option<f64>) -> f64 {
    let Some(pct) = pct_change else {
        return 0.0;
    };

    if pct > 5.0 {
        1.0
    } else if pct > 2.0 {
        0.7
    } else if pct > 0.0 {
        0.3
    } else if pct > -2.0 {
        -0.3
    } else if pct > -5.0 {
        -0.7
    } else {
        -1.0
    }
}

pub fn insider_score(buys: u32, sells: u32) -> f64 {
    ((f64::from(buys) - f64::from(sells)) / 10.0).clamp(-1.0, 1.0)
}

/// Bands are checked in order and the first match wins, so boundary values land on the
/// stronger signal.
pub fn classify(score: f64) -> (SignalKind, Confidence) {
    if score >= 0.5 {
        (SignalKind::Buy, Confidence::High)
    } else if score >= 0.2 {
        (SignalKind::Buy, Confidence::Low)
    } else if score <= -0.5 {
        (SignalKind::Sell, Confidence::High)
    } else if score <= -0.2 {
        (SignalKind::Sell, Confidence::Low)
    } else {
        (SignalKind::Hold, Confidence::Neutral)
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_score_matches_boundary_table() {
        let cases = [
            (None, 0.0),
            (Some(5.01), 1.0),
            (Some(5.0), 0.7),
            (Some(2.01), 0.7),
            (Some(2.0), 0.3),
            (Some(0.01), 0.3),
            (Some(0.0), -0.3),
            (Some(-1.99), -0.3),
            (Some(-2.0), -0.7),
            (Some(-4.99), -0.7),
            (Some(-5.0), -1.0),
            (Some(-50.0), -1.0),
        ];
        for (pct, expected) in cases {
            assert_eq!(price_score(pct), expected, "pct={pct:?}");
        }
    }

    #[test]
    fn price_score_is_monotone() {
        let mut prev = price_score(Some(-20.0));
        let mut pct = -20.0;
        while pct <= 20.0 {
            let s = price_score(Some(pct));
            assert!(s >= prev, "score dropped at pct={pct}");
            prev = s;
            pct += 0.05;
        }
    }

    #[test]
    fn insider_score_is_bounded_and_linear_in_range() {
        for buys in 0..=30u32 {
            for sells in 0..=30u32 {
                let s = insider_score(buys, sells);
                assert!((-1.0..=1.0).contains(&s));
                let raw = (buys as f64 - sells as f64) / 10.0;
                if (-1.0..=1.0).contains(&raw) {
                    assert!((s - raw).abs() < 1e-12);
                }
            }
        }
        assert_eq!(insider_score(2, 0), 0.2);
        assert_eq!(insider_score(0, 25), -1.0);
    }

    #[test]
    fn final_score_stays_in_unit_range() {
        let w = ScoringWeights::default();
        let components = [-1.0, -0.7, -0.3, 0.0, 0.3, 0.7, 1.0];
        for p in components {
            for n in components {
                for i in components {
                    let s = w.final_score(p, n, i);
                    assert!((-1.0..=1.0).contains(&s), "p={p} n={n} i={i} -> {s}");
                }
            }
        }
        assert_eq!(w.final_score(1.0, 1.0, 1.0), 1.0);
        assert_eq!(w.final_score(-1.0, -1.0, -1.0), -1.0);
    }

    #[test]
    fn final_score_rounds_to_three_decimals() {
        let w = ScoringWeights::default();
        let s = w.final_score(0.7, 0.5, 0.2);
        assert_eq!(s, 0.49);
        assert_eq!(w.final_score(0.3, 0.123456, 0.0), 0.157);
    }

    #[test]
    fn classification_boundaries_are_inclusive() {
        assert_eq!(classify(0.5), (SignalKind::Buy, Confidence::High));
        assert_eq!(classify(0.499), (SignalKind::Buy, Confidence::Low));
        assert_eq!(classify(0.2), (SignalKind::Buy, Confidence::Low));
        assert_eq!(classify(0.199), (SignalKind::Hold, Confidence::Neutral));
        assert_eq!(classify(0.0), (SignalKind::Hold, Confidence::Neutral));
        assert_eq!(classify(-0.199), (SignalKind::Hold, Confidence::Neutral));
        assert_eq!(classify(-0.2), (SignalKind::Sell, Confidence::Low));
        assert_eq!(classify(-0.499), (SignalKind::Sell, Confidence::Low));
        assert_eq!(classify(-0.5), (SignalKind::Sell, Confidence::High));
        assert_eq!(classify(-1.0), (SignalKind::Sell, Confidence::High));
        assert_eq!(classify(1.0), (SignalKind::Buy, Confidence::High));
    }

    #[test]
    fn classification_is_total_over_the_unit_range() {
        let mut score = -1.0;
        while score <= 1.0 {
            let (kind, confidence) = classify(score);
            let consistent = matches!(
                (kind, confidence),
                (SignalKind::Buy, Confidence::High | Confidence::Low)
                    | (SignalKind::Sell, Confidence::High | Confidence::Low)
                    | (SignalKind::Hold, Confidence::Neutral)
            );
            assert!(consistent, "score={score}");
            score += 0.001;
        }
    }

    #[test]
    fn weights_validation() {
        assert!(ScoringWeights::default().validate().is_ok());
        assert!(ScoringWeights {
            price: 0.5,
            news: 0.5,
            insider: 0.0
        }
        .validate()
        .is_ok());
        assert!(matches!(
            ScoringWeights {
                price: 0.5,
                news: 0.5,
                insider: 0.5
            }
            .validate(),
            Err(WeightsError::BadSum(_))
        ));
        assert!(matches!(
            ScoringWeights {
                price: 1.5,
                news: -0.25,
                insider: -0.25
            }
            .validate(),
            Err(WeightsError::OutOfRange { name: "price", .. })
        ));
    }

    #[test]
    fn custom_weights_change_the_score() {
        let price_only = ScoringWeights {
            price: 1.0,
            news: 0.0,
            insider: 0.0,
        };
        assert_eq!(price_only.final_score(0.7, -1.0, -1.0), 0.7);
    }
}
