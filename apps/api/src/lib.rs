//! # Coderr API
//!
//! HTTP server for the Coderr marketplace.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Coderr API Services                            │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ AccountService │  │ CatalogService │  │  OrderService              ││
//! │  │                │  │                │  │                            ││
//! │  │ • register     │  │ • list_offers  │  │ • create_order (snapshot)  ││
//! │  │ • login        │  │ • create_offer │  │ • update_status            ││
//! │  │ • profiles     │  │ • update_offer │  │ • delete_order (admin)     ││
//! │  └────────────────┘  └────────────────┘  │ • count_orders             ││
//! │                                          └────────────────────────────┘│
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │ ReviewService  │  │  StatsService  │                                │
//! │  │                │  │                │                                │
//! │  │ • one review   │  │ • base_info    │                                │
//! │  │   per business │  │                │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  SQLite      │  │ Policy table │  │    JWT Auth              ││  │
//! │  │  │  (coderr-db) │  │ (coderr-core)│  │                          ││  │
//! │  │  │ Primary data │  │ who may do   │  │ Bearer/Token → Actor     ││  │
//! │  │  │ store        │  │ what         │  │                          ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `CODERR_HTTP_PORT` - HTTP port (default: 8000)
//! - `CODERR_BIND_ADDR` - Bind address (default: 0.0.0.0)
//! - `DATABASE_PATH` - SQLite file (default: ./coderr.db)
//! - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 86400)
//! - `RUST_LOG` - Log filter (default: info)

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use coderr_db::Database;

// Re-exports
pub use auth::JwtManager;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.jwt_access_lifetime_secs);
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
