//! Order service: placing orders, moving their status and counting them.

use tracing::{info, warn};

use crate::error::ApiResult;
use crate::AppState;
use coderr_core::orders::{OrderCreateInput, OrderStatusInput};
use coderr_core::policy::{self, Action, Target};
use coderr_core::{Actor, CoreError, Order, OrderStatus, ProfileKind};

/// Order service implementation.
pub struct OrderService {
    state: AppState,
}

impl OrderService {
    /// Create a new order service.
    pub fn new(state: AppState) -> Self {
        OrderService { state }
    }

    /// Orders where the caller is the customer or the business.
    pub async fn list_orders(&self, actor: Option<&Actor>) -> ApiResult<Vec<Order>> {
        policy::ensure(actor, Action::OrderList, None)?;
        let actor = policy::require_actor(actor)?;

        Ok(self.state.db.orders().list_for_user(actor.user_id).await?)
    }

    /// Snapshots a tier into a new in-progress order.
    pub async fn create_order(
        &self,
        actor: Option<&Actor>,
        input: ApiResult<OrderCreateInput>,
    ) -> ApiResult<Order> {
        policy::ensure(actor, Action::OrderCreate, None).map_err(|e| {
            warn!(error = %e, "Order creation denied");
            e
        })?;
        let customer = policy::require_actor(actor)?;
        let detail_id = input?.validate()?;

        let order = self
            .state
            .db
            .orders()
            .create_from_detail(customer.user_id, detail_id)
            .await?
            .ok_or_else(|| CoreError::not_found("OfferDetail", detail_id))?;

        info!(
            order_id = order.id,
            customer = order.customer_user_id,
            business = order.business_user_id,
            offer_type = %order.offer_type,
            "Order created"
        );
        Ok(order)
    }

    /// Assigns a new status. Only the order's business party may do this.
    pub async fn update_status(
        &self,
        actor: Option<&Actor>,
        id: i64,
        input: ApiResult<OrderStatusInput>,
    ) -> ApiResult<Order> {
        policy::require_actor(actor)?;

        let order = self
            .state
            .db
            .orders()
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", id))?;

        let target = Target::Order {
            customer_id: order.customer_user_id,
            business_id: order.business_user_id,
        };
        policy::ensure(actor, Action::OrderUpdateStatus, Some(&target)).map_err(|e| {
            warn!(order_id = id, error = %e, "Order status change denied");
            e
        })?;

        let status = input?.validate()?;

        let updated = self
            .state
            .db
            .orders()
            .set_status(id, status)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", id))?;

        info!(order_id = id, from = %order.status, to = %updated.status, "Order status changed");
        Ok(updated)
    }

    /// Administrative delete.
    pub async fn delete_order(&self, actor: Option<&Actor>, id: i64) -> ApiResult<()> {
        policy::ensure(actor, Action::OrderDelete, None).map_err(|e| {
            warn!(order_id = id, error = %e, "Order deletion denied");
            e
        })?;

        if !self.state.db.orders().delete(id).await? {
            return Err(CoreError::not_found("Order", id).into());
        }

        info!(order_id = id, "Order deleted");
        Ok(())
    }

    /// Orders of a business user in one status.
    pub async fn count_orders(
        &self,
        actor: Option<&Actor>,
        business_user_id: i64,
        status: OrderStatus,
    ) -> ApiResult<i64> {
        policy::ensure(actor, Action::OrderCount, None)?;

        let kind = self.state.db.users().profile_kind(business_user_id).await?;
        if kind != Some(ProfileKind::Business) {
            return Err(CoreError::not_found("Business user", business_user_id).into());
        }

        Ok(self
            .state
            .db
            .orders()
            .count_for_business(business_user_id, status)
            .await?)
    }
}
