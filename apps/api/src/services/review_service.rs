//! Review service.
//!
//! A customer reviews each business user at most once. There is no
//! "already reviewed?" read before the insert; the UNIQUE index rejects the
//! second row and the violation becomes `409 CONFLICT`.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use coderr_core::policy::{self, Action, Target};
use coderr_core::reviews::{NewReview, ReviewInput, ReviewListQuery, ReviewPatch, ReviewPatchInput};
use coderr_core::{Actor, CoreError, ProfileKind, Review};
use coderr_db::DbError;

/// Review service implementation.
pub struct ReviewService {
    state: AppState,
}

impl ReviewService {
    /// Create a new review service.
    pub fn new(state: AppState) -> Self {
        ReviewService { state }
    }

    /// Reviews filtered by business user and/or reviewer.
    pub async fn list_reviews(
        &self,
        actor: Option<&Actor>,
        params: &HashMap<String, String>,
    ) -> ApiResult<Vec<Review>> {
        policy::ensure(actor, Action::ReviewList, None)?;

        let query = ReviewListQuery::from_params(params)?;
        Ok(self.state.db.reviews().list(&query).await?)
    }

    /// Creates the caller's review of a business user.
    pub async fn create_review(
        &self,
        actor: Option<&Actor>,
        input: ApiResult<ReviewInput>,
    ) -> ApiResult<Review> {
        policy::ensure(actor, Action::ReviewCreate, None).map_err(|e| {
            warn!(error = %e, "Review creation denied");
            e
        })?;
        let reviewer = policy::require_actor(actor)?;

        let review = NewReview::validate(input?)?;

        let kind = self.state.db.users().profile_kind(review.business_user_id).await?;
        if kind != Some(ProfileKind::Business) {
            return Err(ApiError::invalid("business_user", "No business user with this id exists."));
        }

        let created = self
            .state
            .db
            .reviews()
            .create(reviewer.user_id, &review)
            .await
            .map_err(|e| match e {
                e if e.is_unique_violation_on("reviews") => {
                    CoreError::conflict("You have already reviewed this business user.").into()
                }
                DbError::ForeignKeyViolation { .. } => {
                    ApiError::invalid("business_user", "No business user with this id exists.")
                }
                other => ApiError::from(other),
            })?;

        info!(
            review_id = created.id,
            reviewer = created.reviewer_id,
            business_user = created.business_user_id,
            rating = created.rating,
            "Review created"
        );
        Ok(created)
    }

    /// Changes rating and/or description of the caller's own review.
    pub async fn update_review(
        &self,
        actor: Option<&Actor>,
        id: i64,
        input: ApiResult<ReviewPatchInput>,
    ) -> ApiResult<Review> {
        policy::require_actor(actor)?;
        let existing = self.load(id).await?;
        self.ensure_reviewer(actor, Action::ReviewUpdate, &existing)?;

        let patch = ReviewPatch::validate(input?)?;

        let updated = self
            .state
            .db
            .reviews()
            .update(id, &patch)
            .await?
            .ok_or_else(|| CoreError::not_found("Review", id))?;

        info!(review_id = id, "Review updated");
        Ok(updated)
    }

    /// Deletes the caller's own review.
    pub async fn delete_review(&self, actor: Option<&Actor>, id: i64) -> ApiResult<()> {
        policy::require_actor(actor)?;
        let existing = self.load(id).await?;
        self.ensure_reviewer(actor, Action::ReviewDelete, &existing)?;

        if !self.state.db.reviews().delete(id).await? {
            return Err(CoreError::not_found("Review", id).into());
        }

        info!(review_id = id, "Review deleted");
        Ok(())
    }

    fn ensure_reviewer(&self, actor: Option<&Actor>, action: Action, review: &Review) -> ApiResult<()> {
        let target = Target::Review {
            reviewer_id: review.reviewer_id,
        };
        policy::ensure(actor, action, Some(&target)).map_err(|e| {
            warn!(review_id = review.id, action = action.tag(), error = %e, "Review change denied");
            e.into()
        })
    }

    async fn load(&self, id: i64) -> ApiResult<Review> {
        let review = self.state.db.reviews().get(id).await?;
        review.ok_or_else(|| CoreError::not_found("Review", id).into())
    }
}
