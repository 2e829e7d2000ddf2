//! Order payloads.
//!
//! Orders are created from a tier id and afterwards only their status moves.
//! The status is validated here so that an invalid literal never reaches the
//! database and the stored status stays unchanged.

use serde::Deserialize;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::OrderStatus;

/// `POST /orders/` body.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct OrderCreateInput {
    pub offer_detail_id: Option<i64>,
}

impl OrderCreateInput {
    pub fn validate(self) -> Result<i64, ValidationError> {
        self.offer_detail_id
            .ok_or_else(|| ValidationError::required("offer_detail_id"))
    }
}

/// `PATCH /orders/{id}/` body. Only `status` is accepted.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(deny_unknown_fields)]
#[ts(export)]
pub struct OrderStatusInput {
    pub status: Option<String>,
}

impl OrderStatusInput {
    /// Any of the three literals is accepted regardless of the current status.
    pub fn validate(self) -> Result<OrderStatus, ValidationError> {
        match self.status {
            None => Err(ValidationError::required("status")),
            Some(raw) => raw.parse(),
        }
    }
}
