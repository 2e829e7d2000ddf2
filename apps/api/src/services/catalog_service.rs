//! Catalog service: offers and their tiers.
//!
//! ## Check Order
//! ```text
//! authenticated?  ──► 401
//! offer exists?   ──► 404
//! policy table    ──► 403   (role, then owner)
//! payload valid?  ──► 400
//! write           ──► one transaction
//! ```

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::ApiResult;
use crate::AppState;
use coderr_core::catalog::{NewOffer, OfferInput, OfferListQuery, OfferPatch};
use coderr_core::pagination::Page;
use coderr_core::policy::{self, Action, Target};
use coderr_core::{Actor, CoreError, OfferDetail, OfferSummary, OfferWithDetails};

/// Catalog service implementation.
pub struct CatalogService {
    state: AppState,
}

impl CatalogService {
    /// Create a new catalog service.
    pub fn new(state: AppState) -> Self {
        CatalogService { state }
    }

    /// Public, filtered and paginated offer listing.
    pub async fn list_offers(
        &self,
        actor: Option<&Actor>,
        params: &HashMap<String, String>,
    ) -> ApiResult<Page<OfferSummary>> {
        policy::ensure(actor, Action::OfferList, None)?;

        let query = OfferListQuery::from_params(params)?;
        let (rows, count) = self.state.db.offers().list(&query).await?;

        Ok(Page::new(rows, count, query.page))
    }

    /// Creates an offer with its three tiers.
    pub async fn create_offer(
        &self,
        actor: Option<&Actor>,
        input: ApiResult<OfferInput>,
    ) -> ApiResult<OfferWithDetails> {
        policy::ensure(actor, Action::OfferCreate, None).map_err(|e| {
            warn!(error = %e, "Offer creation denied");
            e
        })?;
        let owner = policy::require_actor(actor)?;

        let offer = NewOffer::validate(input?)?;
        let offer_id = self.state.db.offers().create(owner.user_id, &offer).await?;

        info!(offer_id, owner = owner.user_id, "Offer created");
        self.load(offer_id).await
    }

    /// One offer with all of its tiers.
    pub async fn get_offer(&self, actor: Option<&Actor>, id: i64) -> ApiResult<OfferWithDetails> {
        policy::ensure(actor, Action::OfferRetrieve, None)?;
        self.load(id).await
    }

    /// Merges offer fields and replaces tiers by type.
    pub async fn update_offer(
        &self,
        actor: Option<&Actor>,
        id: i64,
        input: ApiResult<OfferInput>,
    ) -> ApiResult<OfferWithDetails> {
        policy::require_actor(actor)?;
        let owner_id = self.owner_of(id).await?;
        policy::ensure(actor, Action::OfferUpdate, Some(&Target::Offer { owner_id })).map_err(|e| {
            warn!(offer_id = id, error = %e, "Offer update denied");
            e
        })?;

        let patch = OfferPatch::validate(input?)?;
        self.state.db.offers().update(id, &patch).await?;

        info!(offer_id = id, tiers = patch.details.len(), "Offer updated");
        self.load(id).await
    }

    /// Deletes an offer and its tiers.
    pub async fn delete_offer(&self, actor: Option<&Actor>, id: i64) -> ApiResult<()> {
        policy::require_actor(actor)?;
        let owner_id = self.owner_of(id).await?;
        policy::ensure(actor, Action::OfferDelete, Some(&Target::Offer { owner_id })).map_err(|e| {
            warn!(offer_id = id, error = %e, "Offer deletion denied");
            e
        })?;

        if !self.state.db.offers().delete(id).await? {
            return Err(CoreError::not_found("Offer", id).into());
        }

        info!(offer_id = id, "Offer deleted");
        Ok(())
    }

    /// A single tier.
    pub async fn get_detail(&self, actor: Option<&Actor>, id: i64) -> ApiResult<OfferDetail> {
        policy::ensure(actor, Action::OfferDetailRetrieve, None)?;

        let detail = self.state.db.offers().get_detail(id).await?;
        detail.ok_or_else(|| CoreError::not_found("OfferDetail", id).into())
    }

    async fn owner_of(&self, id: i64) -> ApiResult<i64> {
        let owner = self.state.db.offers().owner_of(id).await?;
        owner.ok_or_else(|| CoreError::not_found("Offer", id).into())
    }

    async fn load(&self, id: i64) -> ApiResult<OfferWithDetails> {
        let offer = self.state.db.offers().get(id).await?;
        offer.ok_or_else(|| CoreError::not_found("Offer", id).into())
    }
}
