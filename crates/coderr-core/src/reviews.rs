//! Review payloads and listing filters.

use std::collections::HashMap;

use serde::Deserialize;
use ts_rs::TS;

use crate::error::{ValidationError, ValidationErrors};
use crate::validation::{parse_id_param, validate_rating};

/// `POST /reviews/` body.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct ReviewInput {
    pub business_user: Option<i64>,
    pub rating: Option<i64>,
    pub description: Option<String>,
}

/// A validated review. Whether `business_user_id` really is a business user
/// is checked against storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub business_user_id: i64,
    pub rating: i64,
    pub description: String,
}

impl NewReview {
    pub fn validate(input: ReviewInput) -> Result<NewReview, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if input.business_user.is_none() {
            errors.push(ValidationError::required("business_user"));
        }
        match input.rating {
            Some(rating) => errors.check(validate_rating(rating)),
            None => errors.push(ValidationError::required("rating")),
        }

        errors.into_result()?;

        Ok(NewReview {
            business_user_id: input.business_user.unwrap_or_default(),
            rating: input.rating.unwrap_or_default(),
            description: input.description.unwrap_or_default().trim().to_string(),
        })
    }
}

/// `PATCH /reviews/{id}/` body. The reviewed business user and the author
/// are fixed; other keys are ignored.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct ReviewPatchInput {
    pub rating: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewPatch {
    pub rating: Option<i64>,
    pub description: Option<String>,
}

impl ReviewPatch {
    pub fn validate(input: ReviewPatchInput) -> Result<ReviewPatch, ValidationErrors> {
        if let Some(rating) = input.rating {
            validate_rating(rating)?;
        }

        Ok(ReviewPatch {
            rating: input.rating,
            description: input.description.map(|d| d.trim().to_string()),
        })
    }
}

/// Sort order of review listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewOrdering {
    UpdatedAtAsc,
    #[default]
    UpdatedAtDesc,
    RatingAsc,
    RatingDesc,
}

impl ReviewOrdering {
    /// First allowed token of a comma-separated value; others are ignored.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.into_iter()
            .flat_map(|s| s.split(','))
            .find_map(|token| match token.trim() {
                "updated_at" => Some(ReviewOrdering::UpdatedAtAsc),
                "-updated_at" => Some(ReviewOrdering::UpdatedAtDesc),
                "rating" => Some(ReviewOrdering::RatingAsc),
                "-rating" => Some(ReviewOrdering::RatingDesc),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewListQuery {
    pub business_user_id: Option<i64>,
    pub reviewer_id: Option<i64>,
    pub ordering: ReviewOrdering,
}

impl ReviewListQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let get = |key: &str| params.get(key).map(String::as_str);

        let business_user_id = parse_id_param("business_user_id", get("business_user_id"))
            .map_err(|e| errors.push(e))
            .ok()
            .flatten();
        let reviewer_id = parse_id_param("reviewer_id", get("reviewer_id"))
            .map_err(|e| errors.push(e))
            .ok()
            .flatten();

        errors.into_result()?;

        Ok(ReviewListQuery {
            business_user_id,
            reviewer_id,
            ordering: ReviewOrdering::from_param(get("ordering")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_review_validation() {
        let review = NewReview::validate(ReviewInput {
            business_user: Some(2),
            rating: Some(4),
            description: Some(" Alles war toll! ".to_string()),
        })
        .unwrap();
        assert_eq!(review.description, "Alles war toll!");

        let errs = NewReview::validate(ReviewInput {
            business_user: None,
            rating: Some(9),
            description: None,
        })
        .unwrap_err();
        assert!(errs.has_field("business_user"));
        assert!(errs.has_field("rating"));
    }

    #[test]
    fn test_fractional_rating_is_rejected_by_deserialization() {
        assert!(serde_json::from_str::<ReviewInput>(r#"{"business_user":1,"rating":4.5}"#).is_err());
    }

    #[test]
    fn test_patch_validation() {
        assert!(ReviewPatch::validate(ReviewPatchInput {
            rating: Some(0),
            description: None
        })
        .is_err());

        let patch = ReviewPatch::validate(ReviewPatchInput {
            rating: None,
            description: Some("Noch besser".to_string()),
        })
        .unwrap();
        assert_eq!(patch.rating, None);
    }

    #[test]
    fn test_list_query() {
        let params: HashMap<String, String> = [("reviewer_id", "3"), ("ordering", "rating")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let query = ReviewListQuery::from_params(&params).unwrap();
        assert_eq!(query.reviewer_id, Some(3));
        assert_eq!(query.business_user_id, None);
        assert_eq!(query.ordering, ReviewOrdering::RatingAsc);

        let params: HashMap<String, String> =
            [("business_user_id".to_string(), "x".to_string())].into_iter().collect();
        assert!(ReviewListQuery::from_params(&params).is_err());
    }
}
