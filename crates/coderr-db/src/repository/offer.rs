//! # Offer Repository
//!
//! Offers and their three tiers (offer details).
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(owner, NewOffer)                                               │
//! │    BEGIN                                                               │
//! │    INSERT offers ........................ RETURNING id                 │
//! │    INSERT offer_details × 3  (UNIQUE(offer_id, offer_type))            │
//! │    COMMIT                                                              │
//! │                                                                         │
//! │  update(id, OfferPatch)                                                │
//! │    BEGIN                                                               │
//! │    UPDATE offers SET ..., updated_at = now       (0 rows → NotFound)   │
//! │    UPDATE offers SET search_text           (title/description changed) │
//! │    UPDATE offer_details ... WHERE offer_id = ? AND offer_type = ?      │
//! │                                                  (0 rows → NotFound)   │
//! │    COMMIT            (any error drops the transaction → ROLLBACK)      │
//! │                                                                         │
//! │  delete(id)   DELETE offers  → ON DELETE CASCADE removes the tiers     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `min_price` and `min_delivery_time` are computed with `MIN()` on every
//! read and never stored. `search_text` holds the Unicode-lowercased title and
//! description so that search folds case beyond ASCII.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{decode_features, encode_features};
use coderr_core::catalog::{NewOffer, OfferListQuery, OfferOrdering, OfferPatch};
use coderr_core::{Money, Offer, OfferDetail, OfferSummary, OfferType, OfferWithDetails, UserDetails};

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OfferRecord {
    id: i64,
    user_id: i64,
    title: String,
    image: Option<String>,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OfferRecord> for Offer {
    fn from(r: OfferRecord) -> Self {
        Offer {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            image: r.image,
            description: r.description,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OfferDetailRecord {
    id: i64,
    offer_id: i64,
    title: String,
    revisions: i64,
    delivery_time_in_days: i64,
    price_cents: Money,
    features: String,
    offer_type: OfferType,
}

impl TryFrom<OfferDetailRecord> for OfferDetail {
    type Error = DbError;

    fn try_from(r: OfferDetailRecord) -> DbResult<Self> {
        Ok(OfferDetail {
            id: r.id,
            offer_id: r.offer_id,
            title: r.title,
            revisions: r.revisions,
            delivery_time_in_days: r.delivery_time_in_days,
            price: r.price_cents,
            features: decode_features(&r.features)?,
            offer_type: r.offer_type,
        })
    }
}

/// One row of the listing query: offer, aggregates and creator.
#[derive(Debug, sqlx::FromRow)]
struct OfferListRecord {
    id: i64,
    user_id: i64,
    title: String,
    image: Option<String>,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    min_price_cents: Option<Money>,
    min_delivery_time: Option<i64>,
    detail_ids: Option<String>,
    first_name: String,
    last_name: String,
    username: String,
}

impl From<OfferListRecord> for OfferSummary {
    fn from(r: OfferListRecord) -> Self {
        let mut detail_ids: Vec<i64> = r
            .detail_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|id| id.trim().parse().ok())
            .collect();
        detail_ids.sort_unstable();

        OfferSummary {
            offer: Offer {
                id: r.id,
                user_id: r.user_id,
                title: r.title,
                image: r.image,
                description: r.description,
                created_at: r.created_at,
                updated_at: r.updated_at,
            },
            min_price: r.min_price_cents,
            min_delivery_time: r.min_delivery_time,
            user_details: UserDetails {
                first_name: r.first_name,
                last_name: r.last_name,
                username: r.username,
            },
            detail_ids,
        }
    }
}

const DETAIL_COLUMNS: &str = r#"
    id, offer_id, title, revisions, delivery_time_in_days, price_cents, features, offer_type
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for offer database operations.
#[derive(Debug, Clone)]
pub struct OfferRepository {
    pool: SqlitePool,
}

impl OfferRepository {
    /// Creates a new OfferRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OfferRepository { pool }
    }

    /// Inserts an offer and its tiers in one transaction.
    ///
    /// ## Returns
    /// The id of the new offer.
    pub async fn create(&self, owner_id: i64, offer: &NewOffer) -> DbResult<i64> {
        debug!(owner_id, title = %offer.title, tiers = offer.details.len(), "Creating offer");
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let offer_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO offers (
                user_id, title, image, description, search_text, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(&offer.title)
        .bind(&offer.image)
        .bind(&offer.description)
        .bind(search_text(&offer.title, &offer.description))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for detail in &offer.details {
            sqlx::query(
                r#"
                INSERT INTO offer_details (
                    offer_id, title, revisions, delivery_time_in_days,
                    price_cents, features, offer_type
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(offer_id)
            .bind(&detail.title)
            .bind(detail.revisions)
            .bind(detail.delivery_time_in_days)
            .bind(detail.price)
            .bind(encode_features(&detail.features)?)
            .bind(detail.offer_type)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(offer_id, "Offer created");
        Ok(offer_id)
    }

    /// Gets an offer with all of its tiers (cheapest first).
    pub async fn get(&self, id: i64) -> DbResult<Option<OfferWithDetails>> {
        let offer = sqlx::query_as::<_, OfferRecord>(
            r#"
            SELECT id, user_id, title, image, description, created_at, updated_at
            FROM offers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(offer) = offer else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {DETAIL_COLUMNS} FROM offer_details WHERE offer_id = ?1 ORDER BY price_cents, id"
        );
        let details = sqlx::query_as::<_, OfferDetailRecord>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(OfferDetail::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Some(OfferWithDetails {
            offer: offer.into(),
            details,
        }))
    }

    /// The owner of an offer, for authorization.
    pub async fn owner_of(&self, id: i64) -> DbResult<Option<i64>> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT user_id FROM offers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner)
    }

    /// Gets a single tier by its id.
    pub async fn get_detail(&self, id: i64) -> DbResult<Option<OfferDetail>> {
        let sql = format!("SELECT {DETAIL_COLUMNS} FROM offer_details WHERE id = ?1");
        let record = sqlx::query_as::<_, OfferDetailRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        record.map(OfferDetail::try_from).transpose()
    }

    /// Applies a validated patch in one transaction.
    ///
    /// Offer fields merge independently of tier replacements. Each tier is
    /// addressed by `(offer_id, offer_type)`; a missing tier aborts the whole
    /// update with [`DbError::NotFound`]. `updated_at` is always stamped.
    pub async fn update(&self, id: i64, patch: &OfferPatch) -> DbResult<()> {
        debug!(offer_id = id, tiers = patch.details.len(), "Updating offer");

        let mut tx = self.pool.begin().await?;

        let merged: Option<(String, String)> = sqlx::query_as(
            r#"
            UPDATE offers SET
                title       = COALESCE(?2, title),
                description = COALESCE(?3, description),
                image       = CASE WHEN ?4 THEN ?5 ELSE image END,
                updated_at  = ?6
            WHERE id = ?1
            RETURNING title, description
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.image.is_some())
        .bind(patch.image.clone().flatten())
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((title, description)) = merged else {
            return Err(DbError::not_found("Offer", id));
        };

        if patch.title.is_some() || patch.description.is_some() {
            sqlx::query("UPDATE offers SET search_text = ?2 WHERE id = ?1")
                .bind(id)
                .bind(search_text(&title, &description))
                .execute(&mut *tx)
                .await?;
        }

        for detail in &patch.details {
            let features = detail.features.as_deref().map(encode_features).transpose()?;

            let result = sqlx::query(
                r#"
                UPDATE offer_details SET
                    title                 = COALESCE(?3, title),
                    revisions             = COALESCE(?4, revisions),
                    delivery_time_in_days = COALESCE(?5, delivery_time_in_days),
                    price_cents           = COALESCE(?6, price_cents),
                    features              = COALESCE(?7, features)
                WHERE offer_id = ?1 AND offer_type = ?2
                "#,
            )
            .bind(id)
            .bind(detail.offer_type)
            .bind(&detail.title)
            .bind(detail.revisions)
            .bind(detail.delivery_time_in_days)
            .bind(detail.price)
            .bind(features)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found(
                    "OfferDetail",
                    format!("{}/{}", id, detail.offer_type),
                ));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes an offer; its tiers go with it.
    ///
    /// ## Returns
    /// `false` if no such offer existed.
    pub async fn delete(&self, id: i64) -> DbResult<bool> {
        debug!(offer_id = id, "Deleting offer");

        let result = sqlx::query("DELETE FROM offers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists offers matching the filters, one page at a time.
    ///
    /// ## Returns
    /// The page rows and the total number of matching offers.
    pub async fn list(&self, query: &OfferListQuery) -> DbResult<(Vec<OfferSummary>, i64)> {
        debug!(?query, "Listing offers");

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM offers o LEFT JOIN ");
        count_qb.push(AGGREGATE_SUBQUERY);
        push_filters(&mut count_qb, query);
        let count: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                o.id, o.user_id, o.title, o.image, o.description, o.created_at, o.updated_at,
                agg.min_price_cents, agg.min_delivery_time, agg.detail_ids,
                u.first_name, u.last_name, u.username
            FROM offers o
            JOIN users u ON u.id = o.user_id
            LEFT JOIN "#,
        );
        qb.push(AGGREGATE_SUBQUERY);
        push_filters(&mut qb, query);

        qb.push(match query.ordering {
            OfferOrdering::UpdatedAtAsc => " ORDER BY o.updated_at ASC, o.id ASC",
            OfferOrdering::UpdatedAtDesc => " ORDER BY o.updated_at DESC, o.id DESC",
            OfferOrdering::MinPriceAsc => " ORDER BY agg.min_price_cents ASC, o.id ASC",
            OfferOrdering::MinPriceDesc => " ORDER BY agg.min_price_cents DESC, o.id DESC",
        });
        qb.push(" LIMIT ")
            .push_bind(query.page.limit())
            .push(" OFFSET ")
            .push_bind(query.page.offset());

        let rows = qb
            .build_query_as::<OfferListRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(OfferSummary::from).collect(), count))
    }
}

const AGGREGATE_SUBQUERY: &str = r#"(
        SELECT
            offer_id,
            MIN(price_cents) AS min_price_cents,
            MIN(delivery_time_in_days) AS min_delivery_time,
            GROUP_CONCAT(id) AS detail_ids
        FROM offer_details
        GROUP BY offer_id
    ) agg ON agg.offer_id = o.id
    WHERE 1 = 1"#;

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &OfferListQuery) {
    if let Some(creator_id) = query.creator_id {
        qb.push(" AND o.user_id = ").push_bind(creator_id);
    }
    if let Some(min_price) = query.min_price {
        qb.push(" AND agg.min_price_cents >= ").push_bind(min_price.cents());
    }
    if let Some(max_delivery) = query.max_delivery_time {
        qb.push(" AND agg.min_delivery_time <= ").push_bind(max_delivery);
    }
    if let Some(search) = &query.search {
        qb.push(" AND instr(o.search_text, ")
            .push_bind(search.to_lowercase())
            .push(") > 0");
    }
}

/// The `search_text` column value.
fn search_text(title: &str, description: &str) -> String {
    format!("{title}\n{description}").to_lowercase()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{business, new_offer, setup};
    use coderr_core::catalog::OfferDetailPatch;
    use coderr_core::pagination::PageRequest;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup().await;
        let owner = business(&db, "anna").await;

        let id = db.offers().create(owner, &new_offer("Logo", [10, 30, 80])).await.unwrap();
        let offer = db.offers().get(id).await.unwrap().unwrap();

        assert_eq!(offer.offer.user_id, owner);
        assert_eq!(offer.details.len(), 3);
        assert_eq!(offer.min_price(), Some(Money::from_units(10)));
        assert_eq!(offer.min_delivery_time(), Some(3));
        assert_eq!(
            offer.detail(OfferType::Premium).unwrap().features,
            vec!["Logo Design".to_string(), "premium".to_string()]
        );
    }

    #[tokio::test]
    async fn test_duplicate_tier_rolls_back_whole_offer() {
        let db = setup().await;
        let owner = business(&db, "anna").await;

        let mut offer = new_offer("Logo", [10, 30, 80]);
        offer.details[2].offer_type = OfferType::Basic;
        let err = db.offers().create(owner, &offer).await.unwrap_err();
        assert!(err.is_unique_violation_on("offer_details"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offers")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_update_replaces_tier_by_type_and_bumps_updated_at() {
        let db = setup().await;
        let owner = business(&db, "anna").await;
        let id = db.offers().create(owner, &new_offer("Logo", [10, 30, 80])).await.unwrap();
        let before = db.offers().get(id).await.unwrap().unwrap();
        let standard_id = before.detail(OfferType::Standard).unwrap().id;

        let patch = OfferPatch {
            title: Some("Logo Deluxe".to_string()),
            details: vec![OfferDetailPatch {
                offer_type: OfferType::Standard,
                title: None,
                revisions: Some(7),
                delivery_time_in_days: None,
                price: Some(Money::from_units(35)),
                features: None,
            }],
            ..Default::default()
        };
        db.offers().update(id, &patch).await.unwrap();

        let after = db.offers().get(id).await.unwrap().unwrap();
        let standard = after.detail(OfferType::Standard).unwrap();
        assert_eq!(after.offer.title, "Logo Deluxe");
        assert_eq!(standard.id, standard_id);
        assert_eq!(standard.price, Money::from_units(35));
        assert_eq!(standard.revisions, 7);
        assert_eq!(standard.delivery_time_in_days, 5);
        assert_eq!(after.details.len(), 3);
        assert!(after.offer.updated_at >= before.offer.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_tier_rolls_back() {
        let db = setup().await;
        let owner = business(&db, "anna").await;
        let id = db.offers().create(owner, &new_offer("Logo", [10, 30, 80])).await.unwrap();

        sqlx::query("DELETE FROM offer_details WHERE offer_id = ?1 AND offer_type = 'premium'")
            .bind(id)
            .execute(db.pool())
            .await
            .unwrap();

        let patch = OfferPatch {
            title: Some("Changed".to_string()),
            details: vec![OfferDetailPatch {
                offer_type: OfferType::Premium,
                title: Some("Gold".to_string()),
                revisions: None,
                delivery_time_in_days: None,
                price: None,
                features: None,
            }],
            ..Default::default()
        };
        let err = db.offers().update(id, &patch).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let offer = db.offers().get(id).await.unwrap().unwrap();
        assert_eq!(offer.offer.title, "Logo");
    }

    #[tokio::test]
    async fn test_delete_cascades_details() {
        let db = setup().await;
        let owner = business(&db, "anna").await;
        let id = db.offers().create(owner, &new_offer("Logo", [10, 30, 80])).await.unwrap();

        assert!(db.offers().delete(id).await.unwrap());
        assert!(!db.offers().delete(id).await.unwrap());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offer_details")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_list_filters_and_ordering() {
        let db = setup().await;
        let anna = business(&db, "anna").await;
        let bert = business(&db, "bert").await;

        db.offers().create(anna, &new_offer("Cheap logo", [10, 30, 80])).await.unwrap();
        db.offers().create(anna, &new_offer("Website", [60, 90, 150])).await.unwrap();
        db.offers().create(bert, &new_offer("Premium branding", [120, 200, 400])).await.unwrap();

        let query = OfferListQuery {
            min_price: Some(Money::from_units(50)),
            ordering: OfferOrdering::MinPriceDesc,
            ..Default::default()
        };
        let (rows, count) = db.offers().list(&query).await.unwrap();
        assert_eq!(count, 2);
        let prices: Vec<Money> = rows.iter().filter_map(|r| r.min_price).collect();
        assert_eq!(prices, vec![Money::from_units(120), Money::from_units(60)]);
        assert_eq!(rows[0].user_details.username, "bert");
        assert_eq!(rows[0].detail_ids.len(), 3);

        let query = OfferListQuery {
            creator_id: Some(anna),
            search: Some("LOGO".to_string()),
            ..Default::default()
        };
        let (rows, count) = db.offers().list(&query).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(rows[0].offer.title, "Cheap logo");

        let query = OfferListQuery {
            max_delivery_time: Some(2),
            ..Default::default()
        };
        assert_eq!(db.offers().list(&query).await.unwrap().1, 0);
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let db = setup().await;
        let anna = business(&db, "anna").await;
        for i in 0..5 {
            db.offers()
                .create(anna, &new_offer(&format!("Offer {i}"), [10, 20, 30]))
                .await
                .unwrap();
        }

        let query = OfferListQuery {
            page: PageRequest { page: 3, page_size: 2 },
            ..Default::default()
        };
        let (rows, count) = db.offers().list(&query).await.unwrap();
        assert_eq!(count, 5);
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let db = setup().await;
        let anna = business(&db, "anna").await;
        let id = db.offers().create(anna, &new_offer("Übersetzung", [10, 20, 30])).await.unwrap();
        db.offers().create(anna, &new_offer("50% off logo", [10, 20, 30])).await.unwrap();

        let search = |term: &str| OfferListQuery {
            search: Some(term.to_string()),
            ..Default::default()
        };
        assert_eq!(db.offers().list(&search("übersetzung")).await.unwrap().1, 1);
        assert_eq!(db.offers().list(&search("ÜBERSETZ")).await.unwrap().1, 1);
        // Wildcard characters match literally
        assert_eq!(db.offers().list(&search("50%")).await.unwrap().1, 1);
        assert_eq!(db.offers().list(&search("_")).await.unwrap().1, 0);

        let patch = OfferPatch {
            title: Some("Lektorat".to_string()),
            description: Some("Größere Texte".to_string()),
            ..Default::default()
        };
        db.offers().update(id, &patch).await.unwrap();

        assert_eq!(db.offers().list(&search("übersetzung")).await.unwrap().1, 0);
        assert_eq!(db.offers().list(&search("GRÖßERE")).await.unwrap().1, 1);
        assert_eq!(db.offers().list(&search("LEKTORAT")).await.unwrap().1, 1);
    }
}
