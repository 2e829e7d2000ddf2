//! Platform statistics.

use serde::Serialize;
use ts_rs::TS;

/// Public summary shown on the landing page.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct BaseInfo {
    pub review_count: i64,
    /// Rounded to one decimal place; `0.0` when there are no reviews.
    pub average_rating: f64,
    pub business_profile_count: i64,
    pub offer_count: i64,
}

/// Rounds a raw average to one decimal place.
pub fn round_rating(average: Option<f64>) -> f64 {
    match average {
        Some(avg) if avg.is_finite() => (avg * 10.0).round() / 10.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_rating() {
        assert_eq!(round_rating(None), 0.0);
        assert_eq!(round_rating(Some(4.0)), 4.0);
        assert_eq!(round_rating(Some(4.25)), 4.3);
        assert_eq!(round_rating(Some(11.0 / 3.0)), 3.7);
    }
}
