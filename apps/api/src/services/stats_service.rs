//! Platform statistics service.

use crate::error::ApiResult;
use crate::AppState;
use coderr_core::policy::{self, Action};
use coderr_core::stats::BaseInfo;
use coderr_core::Actor;

/// Statistics service implementation.
pub struct StatsService {
    state: AppState,
}

impl StatsService {
    /// Create a new statistics service.
    pub fn new(state: AppState) -> Self {
        StatsService { state }
    }

    /// Counters for the landing page. Public.
    pub async fn base_info(&self, actor: Option<&Actor>) -> ApiResult<BaseInfo> {
        policy::ensure(actor, Action::StatsBaseInfo, None)?;
        Ok(self.state.db.stats().base_info().await?)
    }
}
