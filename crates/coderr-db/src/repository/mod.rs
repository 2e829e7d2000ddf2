//! # Repository Module
//!
//! Database repository implementations for Coderr.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP service                                                          │
//! │       │                                                                 │
//! │       │  db.offers().list(&query)                                      │
//! │       ▼                                                                 │
//! │  OfferRepository                                                       │
//! │  ├── create(&self, owner_id, &NewOffer)                                │
//! │  ├── get(&self, id)                                                    │
//! │  ├── update(&self, id, &OfferPatch)                                    │
//! │  └── list(&self, &OfferListQuery)                                      │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories take validated values from `coderr-core` and return domain
//! types. They never decide who may do what; that happens in the policy
//! table before a repository is called.
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - Accounts, profiles, actor lookup
//! - [`OfferRepository`] - Offers, tiers and the filtered listing
//! - [`OrderRepository`] - Order snapshots and status changes
//! - [`ReviewRepository`] - Reviews, one per customer and business
//! - [`StatsRepository`] - Platform counters

pub mod offer;
pub mod order;
pub mod review;
pub mod stats;
pub mod user;

pub use offer::OfferRepository;
pub use order::OrderRepository;
pub use review::ReviewRepository;
pub use stats::StatsRepository;
pub use user::{CredentialsRecord, NewUserRecord, UserRepository};

use crate::error::{DbError, DbResult};

/// Serializes a feature list for the `features` TEXT column.
pub(crate) fn encode_features(features: &[String]) -> DbResult<String> {
    serde_json::to_string(features).map_err(|e| DbError::Internal(e.to_string()))
}

/// Parses the `features` TEXT column.
pub(crate) fn decode_features(raw: &str) -> DbResult<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| DbError::Corrupt {
        column: "features".to_string(),
        message: e.to_string(),
    })
}
