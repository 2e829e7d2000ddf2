//! # coderr-core: Pure Marketplace Rules for Coderr
//!
//! This crate is the **heart** of Coderr. It decides who may do what, and
//! which offers, orders and reviews are well-formed, as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Coderr Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │    Offers ──► Offer Detail ──► Order ──► Review                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │    extract actor ──► authorize ──► validate ──► repository     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ coderr-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  policy   │  │  catalog  │  │  orders   │  │  reviews  │  │   │
//! │  │   │  Action   │  │ NewOffer  │  │  status   │  │ NewReview │  │   │
//! │  │   │ Decision  │  │ OfferPatch│  │  input    │  │ filters   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    coderr-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Profile, Offer, OfferDetail, Order, Review, Actor)
//! - [`money`] - Money type with integer cents
//! - [`policy`] - The authorization table
//! - [`catalog`], [`orders`], [`reviews`], [`accounts`] - Payload validation
//! - [`pagination`] - Page-number pagination
//! - [`stats`] - Platform statistics
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use coderr_core::policy::{authorize, Action, Decision, DenyReason};
//! use coderr_core::Actor;
//!
//! let customer = Actor::customer(7);
//! let decision = authorize(Some(&customer), Action::OfferCreate, None);
//! assert!(matches!(decision, Decision::Deny(DenyReason::RoleMismatch { .. })));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod accounts;
pub mod catalog;
pub mod error;
pub mod money;
pub mod orders;
pub mod pagination;
pub mod policy;
pub mod reviews;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Offers listed per page unless `page_size` says otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound for `page_size`.
pub const MAX_PAGE_SIZE: u32 = 100;

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_USERNAME_LEN: usize = 150;
pub const MAX_EMAIL_LEN: usize = 254;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
