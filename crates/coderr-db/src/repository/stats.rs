//! Platform counters for the landing page.

use sqlx::SqlitePool;

use crate::error::DbResult;
use coderr_core::stats::{round_rating, BaseInfo};

#[derive(Debug, sqlx::FromRow)]
struct BaseInfoRecord {
    review_count: i64,
    average_rating: Option<f64>,
    business_profile_count: i64,
    offer_count: i64,
}

/// Read-only aggregate queries.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Creates a new StatsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Review count, average rating, business profile count and offer count.
    pub async fn base_info(&self) -> DbResult<BaseInfo> {
        let record = sqlx::query_as::<_, BaseInfoRecord>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM reviews)                          AS review_count,
                (SELECT AVG(rating) FROM reviews)                       AS average_rating,
                (SELECT COUNT(*) FROM profiles WHERE type = 'business') AS business_profile_count,
                (SELECT COUNT(*) FROM offers)                           AS offer_count
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(BaseInfo {
            review_count: record.review_count,
            average_rating: round_rating(record.average_rating),
            business_profile_count: record.business_profile_count,
            offer_count: record.offer_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::testing::{business, customer, new_offer, setup};
    use coderr_core::reviews::NewReview;

    #[tokio::test]
    async fn test_empty_platform() {
        let db = setup().await;
        let info = db.stats().base_info().await.unwrap();

        assert_eq!(info.review_count, 0);
        assert_eq!(info.average_rating, 0.0);
        assert_eq!(info.business_profile_count, 0);
        assert_eq!(info.offer_count, 0);
    }

    #[tokio::test]
    async fn test_counts_and_rounded_average() {
        let db = setup().await;
        let b1 = business(&db, "bea").await;
        let b2 = business(&db, "bob").await;
        let c1 = customer(&db, "carl").await;
        let c2 = customer(&db, "cleo").await;
        db.offers().create(b1, &new_offer("Logo", [10, 30, 80])).await.unwrap();

        for (reviewer, business_user_id, rating) in [(c1, b1, 4), (c2, b1, 4), (c1, b2, 5)] {
            let review = NewReview {
                business_user_id,
                rating,
                description: String::new(),
            };
            db.reviews().create(reviewer, &review).await.unwrap();
        }

        let info = db.stats().base_info().await.unwrap();
        assert_eq!(info.review_count, 3);
        assert_eq!(info.average_rating, 4.3);
        assert_eq!(info.business_profile_count, 2);
        assert_eq!(info.offer_count, 1);
    }
}
