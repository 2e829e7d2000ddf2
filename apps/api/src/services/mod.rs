//! Service layer.
//!
//! Every operation takes the caller as an explicit `Option<&Actor>` and asks
//! the policy table before touching storage.

pub mod account_service;
pub mod catalog_service;
pub mod order_service;
pub mod review_service;
pub mod stats_service;

pub use account_service::AccountService;
pub use catalog_service::CatalogService;
pub use order_service::OrderService;
pub use review_service::ReviewService;
pub use stats_service::StatsService;
