//! # Domain Types
//!
//! Core domain types used throughout Coderr.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Profile      │   │     Offer       │   │  OfferDetail    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  user_id (1:1)  │◄──│  user_id        │◄──│  offer_id       │       │
//! │  │  kind           │   │  title          │   │  offer_type ◄── key     │
//! │  │  contact fields │   │  updated_at     │   │  price (Money)  │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ snapshot        │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │     Review      │   │   ProfileKind   │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  business_user  │   │  Customer       │   │  customer/biz   │       │
//! │  │  reviewer       │   │  Business       │   │  frozen fields  │       │
//! │  │  rating 1..=5   │   └─────────────────┘   │  status         │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity uses an integer id (SQLite rowid). Offer details are also
//! identified by `(offer_id, offer_type)`, which never changes after creation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Profile Kind
// =============================================================================

/// Role marker attached 1:1 to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Buys offers and writes reviews.
    Customer,
    /// Publishes offers and fulfils orders.
    Business,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 2] = [ProfileKind::Customer, ProfileKind::Business];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Customer => "customer",
            ProfileKind::Business => "business",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(ProfileKind::Customer),
            "business" => Ok(ProfileKind::Business),
            _ => Err(not_allowed("type", &ProfileKind::ALL.map(|k| k.as_str()))),
        }
    }
}

// =============================================================================
// Offer Type (tier)
// =============================================================================

/// One of the three tiers every offer carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Basic,
    Standard,
    Premium,
}

impl OfferType {
    /// The complete tier set, in display order.
    pub const ALL: [OfferType; 3] = [OfferType::Basic, OfferType::Standard, OfferType::Premium];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OfferType::Basic => "basic",
            OfferType::Standard => "standard",
            OfferType::Premium => "premium",
        }
    }
}

impl fmt::Display for OfferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(OfferType::Basic),
            "standard" => Ok(OfferType::Standard),
            "premium" => Ok(OfferType::Premium),
            _ => Err(not_allowed("offer_type", &OfferType::ALL.map(|t| t.as_str()))),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ## Transitions
/// Every order starts as `InProgress`. Any of the three values may be assigned
/// afterwards, including moving a completed order back to in progress; the
/// business party decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, work ongoing.
    #[default]
    InProgress,
    /// Delivered.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(not_allowed("status", &OrderStatus::ALL.map(|s| s.as_str()))),
        }
    }
}

fn not_allowed(field: &str, allowed: &[&str]) -> ValidationError {
    ValidationError::NotAllowed {
        field: field.to_string(),
        allowed: allowed.iter().map(|s| s.to_string()).collect(),
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The authenticated caller of an operation.
///
/// Passed explicitly into every engine call; an anonymous request is
/// `Option::<&Actor>::None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    /// `None` for administrative accounts created without a profile.
    pub kind: Option<ProfileKind>,
    /// Administrative role (may delete orders).
    pub is_staff: bool,
}

impl Actor {
    pub fn customer(user_id: i64) -> Self {
        Actor {
            user_id,
            kind: Some(ProfileKind::Customer),
            is_staff: false,
        }
    }

    pub fn business(user_id: i64) -> Self {
        Actor {
            user_id,
            kind: Some(ProfileKind::Business),
            is_staff: false,
        }
    }

    pub fn admin(user_id: i64) -> Self {
        Actor {
            user_id,
            kind: None,
            is_staff: true,
        }
    }

    #[inline]
    pub fn is(&self, kind: ProfileKind) -> bool {
        self.kind == Some(kind)
    }
}

// =============================================================================
// Profile
// =============================================================================

/// A user's profile joined with the account fields shown next to it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Profile {
    #[serde(rename = "user")]
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: ProfileKind,
    /// Avatar reference (storage is external).
    pub file: String,
    pub location: String,
    pub tel: String,
    pub description: String,
    pub working_hours: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Creator info shown on offer listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserDetails {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

// =============================================================================
// Offer
// =============================================================================

/// A business user's service listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Offer {
    pub id: i64,
    /// Owner (business user).
    #[serde(rename = "user")]
    pub user_id: i64,
    pub title: String,
    /// Image reference (storage is external).
    pub image: Option<String>,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One pricing tier of an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OfferDetail {
    pub id: i64,
    #[serde(skip)]
    pub offer_id: i64,
    pub title: String,
    pub revisions: i64,
    pub delivery_time_in_days: i64,
    pub price: Money,
    pub features: Vec<String>,
    pub offer_type: OfferType,
}

/// An offer together with all of its tiers.
#[derive(Debug, Clone)]
pub struct OfferWithDetails {
    pub offer: Offer,
    pub details: Vec<OfferDetail>,
}

impl OfferWithDetails {
    /// Cheapest tier price (computed, never stored).
    pub fn min_price(&self) -> Option<Money> {
        self.details.iter().map(|d| d.price).min()
    }

    /// Fastest tier delivery time (computed, never stored).
    pub fn min_delivery_time(&self) -> Option<i64> {
        self.details.iter().map(|d| d.delivery_time_in_days).min()
    }

    pub fn detail(&self, offer_type: OfferType) -> Option<&OfferDetail> {
        self.details.iter().find(|d| d.offer_type == offer_type)
    }
}

/// An offer as it appears in listings: computed aggregates and creator info.
#[derive(Debug, Clone)]
pub struct OfferSummary {
    pub offer: Offer,
    /// Minimum tier price; `None` only if the offer somehow has no tiers.
    pub min_price: Option<Money>,
    pub min_delivery_time: Option<i64>,
    pub user_details: UserDetails,
    pub detail_ids: Vec<i64>,
}

// =============================================================================
// Order
// =============================================================================

/// A commercial snapshot of one offer tier.
///
/// ## Snapshot Pattern
/// `title`, `revisions`, `delivery_time_in_days`, `price`, `features` and
/// `offer_type` are copied from the tier when the order is placed and never
/// resynchronized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: i64,
    #[serde(rename = "customer_user")]
    pub customer_user_id: i64,
    #[serde(rename = "business_user")]
    pub business_user_id: i64,
    pub title: String,
    pub revisions: i64,
    pub delivery_time_in_days: i64,
    pub price: Money,
    pub features: Vec<String>,
    pub offer_type: OfferType,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Review
// =============================================================================

/// A customer's rating of a business user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Review {
    pub id: i64,
    #[serde(rename = "business_user")]
    pub business_user_id: i64,
    #[serde(rename = "reviewer")]
    pub reviewer_id: i64,
    pub rating: i64,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
