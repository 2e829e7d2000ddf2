//! # coderr-db: Database Layer for Coderr
//!
//! SQLite storage for the marketplace, accessed asynchronously through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Coderr Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /api/orders/)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     coderr-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ UserRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OfferRepo     │    │ 001_initial_ │  │   │
//! │  │   │ WAL, FKs,     │    │ OrderRepo     │    │   schema.sql │  │   │
//! │  │   │ busy timeout  │    │ ReviewRepo    │    │              │  │   │
//! │  │   └───────────────┘    │ StatsRepo     │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (DATABASE_PATH, default ./coderr.db)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`credentials`] - Password hashing
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coderr_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("coderr.db")).await?;
//! let offer = db.offers().get(1).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credentials;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    CredentialsRecord, NewUserRecord, OfferRepository, OrderRepository, ReviewRepository,
    StatsRepository, UserRepository,
};
