//! # Order Repository
//!
//! Orders are snapshots: the commercial fields of a tier are copied when the
//! order is placed and are never resynchronized.
//!
//! ## Snapshot In One Statement
//! ```text
//! INSERT INTO orders (...)
//! SELECT customer, offers.user_id, detail.title, detail.revisions, ...
//! FROM offer_details JOIN offers
//! WHERE offer_details.id = ?
//! RETURNING ...
//! ```
//! The read of the tier and the insert are one statement, so a concurrent
//! tier edit lands either wholly before or wholly after the snapshot.
//! No matching tier means no row is returned.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::decode_features;
use coderr_core::{Money, OfferType, Order, OrderStatus};

#[derive(Debug, sqlx::FromRow)]
struct OrderRecord {
    id: i64,
    customer_user_id: i64,
    business_user_id: i64,
    title: String,
    revisions: i64,
    delivery_time_in_days: i64,
    price_cents: Money,
    features: String,
    offer_type: OfferType,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = DbError;

    fn try_from(r: OrderRecord) -> DbResult<Self> {
        Ok(Order {
            id: r.id,
            customer_user_id: r.customer_user_id,
            business_user_id: r.business_user_id,
            title: r.title,
            revisions: r.revisions,
            delivery_time_in_days: r.delivery_time_in_days,
            price: r.price_cents,
            features: decode_features(&r.features)?,
            offer_type: r.offer_type,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = r#"
    id, customer_user_id, business_user_id, title, revisions, delivery_time_in_days,
    price_cents, features, offer_type, status, created_at, updated_at
"#;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Places an order for a tier, copying its commercial fields.
    ///
    /// ## Returns
    /// `None` if the tier does not exist.
    pub async fn create_from_detail(
        &self,
        customer_id: i64,
        detail_id: i64,
    ) -> DbResult<Option<Order>> {
        debug!(customer_id, detail_id, "Creating order from offer detail");

        let sql = format!(
            r#"
            INSERT INTO orders (
                customer_user_id, business_user_id, title, revisions,
                delivery_time_in_days, price_cents, features, offer_type,
                status, created_at, updated_at
            )
            SELECT
                ?1, o.user_id, d.title, d.revisions,
                d.delivery_time_in_days, d.price_cents, d.features, d.offer_type,
                ?3, ?4, ?4
            FROM offer_details d
            JOIN offers o ON o.id = d.offer_id
            WHERE d.id = ?2
            RETURNING {ORDER_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(customer_id)
            .bind(detail_id)
            .bind(OrderStatus::InProgress)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        let order = record.map(Order::try_from).transpose()?;
        if let Some(order) = &order {
            debug!(order_id = order.id, business_user_id = order.business_user_id, "Order created");
        }
        Ok(order)
    }

    /// Gets an order by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let record = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        record.map(Order::try_from).transpose()
    }

    /// Orders in which the user is either the customer or the business.
    ///
    /// Newest first.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<Order>> {
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE customer_user_id = ?1 OR business_user_id = ?1
            ORDER BY created_at DESC, id DESC
            "#
        );

        sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    /// Assigns a status and stamps `updated_at`.
    ///
    /// ## Returns
    /// The updated order, or `None` if it does not exist.
    pub async fn set_status(&self, id: i64, status: OrderStatus) -> DbResult<Option<Order>> {
        debug!(order_id = id, status = %status, "Setting order status");

        let sql = format!(
            "UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1 RETURNING {ORDER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        record.map(Order::try_from).transpose()
    }

    /// Deletes an order.
    ///
    /// ## Returns
    /// `false` if no such order existed.
    pub async fn delete(&self, id: i64) -> DbResult<bool> {
        debug!(order_id = id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of orders of a business user in the given status.
    pub async fn count_for_business(&self, business_id: i64, status: OrderStatus) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE business_user_id = ?1 AND status = ?2",
        )
        .bind(business_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
