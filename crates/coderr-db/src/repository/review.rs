//! # Review Repository
//!
//! One review per (business user, reviewer). The UNIQUE index on that pair is
//! the only duplicate guard: `create` is a single INSERT, and a second
//! submission, concurrent or not, fails with [`DbError::UniqueViolation`].

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use coderr_core::reviews::{NewReview, ReviewListQuery, ReviewOrdering, ReviewPatch};
use coderr_core::Review;

#[derive(Debug, sqlx::FromRow)]
struct ReviewRecord {
    id: i64,
    business_user_id: i64,
    reviewer_id: i64,
    rating: i64,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRecord> for Review {
    fn from(r: ReviewRecord) -> Self {
        Review {
            id: r.id,
            business_user_id: r.business_user_id,
            reviewer_id: r.reviewer_id,
            rating: r.rating,
            description: r.description,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const REVIEW_COLUMNS: &str =
    "id, business_user_id, reviewer_id, rating, description, created_at, updated_at";

/// Repository for review database operations.
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    /// Creates a new ReviewRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReviewRepository { pool }
    }

    /// Inserts a review.
    pub async fn create(&self, reviewer_id: i64, review: &NewReview) -> DbResult<Review> {
        debug!(
            reviewer_id,
            business_user_id = review.business_user_id,
            rating = review.rating,
            "Creating review"
        );

        let sql = format!(
            r#"
            INSERT INTO reviews (business_user_id, reviewer_id, rating, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, ReviewRecord>(&sql)
            .bind(review.business_user_id)
            .bind(reviewer_id)
            .bind(review.rating)
            .bind(&review.description)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(record.into())
    }

    /// Gets a review by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1");
        let record = sqlx::query_as::<_, ReviewRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Review::from))
    }

    /// Lists reviews matching the filters.
    pub async fn list(&self, query: &ReviewListQuery) -> DbResult<Vec<Review>> {
        debug!(?query, "Listing reviews");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(REVIEW_COLUMNS).push(" FROM reviews WHERE 1 = 1");

        if let Some(business_user_id) = query.business_user_id {
            qb.push(" AND business_user_id = ").push_bind(business_user_id);
        }
        if let Some(reviewer_id) = query.reviewer_id {
            qb.push(" AND reviewer_id = ").push_bind(reviewer_id);
        }

        qb.push(match query.ordering {
            ReviewOrdering::UpdatedAtAsc => " ORDER BY updated_at ASC, id ASC",
            ReviewOrdering::UpdatedAtDesc => " ORDER BY updated_at DESC, id DESC",
            ReviewOrdering::RatingAsc => " ORDER BY rating ASC, id ASC",
            ReviewOrdering::RatingDesc => " ORDER BY rating DESC, id DESC",
        });

        let rows = qb
            .build_query_as::<ReviewRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Merges rating and description and stamps `updated_at`.
    ///
    /// ## Returns
    /// The updated review, or `None` if it does not exist.
    pub async fn update(&self, id: i64, patch: &ReviewPatch) -> DbResult<Option<Review>> {
        debug!(review_id = id, "Updating review");

        let sql = format!(
            r#"
            UPDATE reviews SET
                rating      = COALESCE(?2, rating),
                description = COALESCE(?3, description),
                updated_at  = ?4
            WHERE id = ?1
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, ReviewRecord>(&sql)
            .bind(id)
            .bind(patch.rating)
            .bind(&patch.description)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Review::from))
    }

    /// Deletes a review.
    ///
    /// ## Returns
    /// `false` if no such review existed.
    pub async fn delete(&self, id: i64) -> DbResult<bool> {
        debug!(review_id = id, "Deleting review");

        let result = sqlx::query("DELETE FROM reviews WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::testing::{business, customer, setup};

    fn review(business_user_id: i64, rating: i64) -> NewReview {
        NewReview {
            business_user_id,
            rating,
            description: "Great work".to_string(),
        }
    }

    #[tokio::test]
    async fn test_second_review_for_same_pair_is_unique_violation() {
        let db = setup().await;
        let b = business(&db, "bea").await;
        let c = customer(&db, "carl").await;

        db.reviews().create(c, &review(b, 4)).await.unwrap();
        let err = db.reviews().create(c, &review(b, 5)).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(err.is_unique_violation_on("reviews"));
        assert_eq!(db.reviews().list(&ReviewListQuery::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rating_out_of_range_rejected_by_storage() {
        let db = setup().await;
        let b = business(&db, "bea").await;
        let c = customer(&db, "carl").await;

        let err = db.reviews().create(c, &review(b, 6)).await.unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_filters_and_ordering() {
        let db = setup().await;
        let b1 = business(&db, "bea").await;
        let b2 = business(&db, "bob").await;
        let c1 = customer(&db, "carl").await;
        let c2 = customer(&db, "cleo").await;

        db.reviews().create(c1, &review(b1, 2)).await.unwrap();
        db.reviews().create(c2, &review(b1, 5)).await.unwrap();
        db.reviews().create(c1, &review(b2, 3)).await.unwrap();

        let query = ReviewListQuery {
            business_user_id: Some(b1),
            ordering: ReviewOrdering::RatingDesc,
            ..Default::default()
        };
        let ratings: Vec<i64> = db
            .reviews()
            .list(&query)
            .await
            .unwrap()
            .iter()
            .map(|r| r.rating)
            .collect();
        assert_eq!(ratings, vec![5, 2]);

        let query = ReviewListQuery {
            reviewer_id: Some(c1),
            ..Default::default()
        };
        assert_eq!(db.reviews().list(&query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = setup().await;
        let b = business(&db, "bea").await;
        let c = customer(&db, "carl").await;
        let created = db.reviews().create(c, &review(b, 4)).await.unwrap();

        let patch = ReviewPatch {
            rating: Some(5),
            description: None,
        };
        let updated = db.reviews().update(created.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.rating, 5);
        assert_eq!(updated.description, "Great work");
        assert_eq!(updated.business_user_id, b);
        assert!(updated.updated_at >= created.updated_at);

        assert!(db.reviews().delete(created.id).await.unwrap());
        assert!(db.reviews().get(created.id).await.unwrap().is_none());
        assert!(db.reviews().update(created.id, &patch).await.unwrap().is_none());
    }
}
