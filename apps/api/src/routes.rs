//! HTTP handlers and the route table.
//!
//! ## Routes
//! ```text
//! POST         /api/registration/
//! POST         /api/login/
//! GET, PATCH   /api/profile/{user_id}/
//! GET          /api/profiles/business/
//! GET          /api/profiles/customer/
//! GET, POST    /api/offers/
//! GET, PATCH,
//!      DELETE  /api/offers/{id}/
//! GET          /api/offerdetails/{id}/
//! GET, POST    /api/orders/
//! PATCH,
//!      DELETE  /api/orders/{id}/
//! GET          /api/order-count/{business_user_id}/
//! GET          /api/completed-order-count/{business_user_id}/
//! GET, POST    /api/reviews/
//! PATCH,
//!      DELETE  /api/reviews/{id}/
//! GET          /api/base-info/
//! GET          /health
//! ```
//! Handlers only extract, call one service operation and pick a status code.
//! Bodies of authenticated operations reach the service even when they fail
//! to parse; the service reports the error after authorization.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::auth::MaybeActor;
use crate::dto::{
    AuthResponse, CompletedOrderCount, HealthResponse, OfferListItem, OfferView, OfferWritten,
    OrderCount,
};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, DeferredJson};
use crate::services::{AccountService, CatalogService, OrderService, ReviewService, StatsService};
use crate::AppState;
use coderr_core::accounts::{LoginInput, ProfilePatchInput, RegistrationInput};
use coderr_core::catalog::OfferInput;
use coderr_core::orders::{OrderCreateInput, OrderStatusInput};
use coderr_core::pagination::Page;
use coderr_core::reviews::{ReviewInput, ReviewPatchInput};
use coderr_core::stats::BaseInfo;
use coderr_core::{OfferDetail, Order, OrderStatus, Profile, ProfileKind, Review};

type Params = Query<HashMap<String, String>>;

/// The `/api` route table.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/registration/", post(register))
        .route("/login/", post(login))
        .route("/profile/{user_id}/", get(get_profile).patch(update_profile))
        .route("/profiles/business/", get(list_business_profiles))
        .route("/profiles/customer/", get(list_customer_profiles))
        .route("/offers/", get(list_offers).post(create_offer))
        .route("/offers/{id}/", get(get_offer).patch(update_offer).delete(delete_offer))
        .route("/offerdetails/{id}/", get(get_offer_detail))
        .route("/orders/", get(list_orders).post(create_order))
        .route("/orders/{id}/", patch(update_order_status).delete(delete_order))
        .route("/order-count/{business_user_id}/", get(order_count))
        .route("/completed-order-count/{business_user_id}/", get(completed_order_count))
        .route("/reviews/", get(list_reviews).post(create_review))
        .route("/reviews/{id}/", patch(update_review).delete(delete_review))
        .route("/base-info/", get(base_info))
}

// =============================================================================
// Accounts
// =============================================================================

async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegistrationInput>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let response = AccountService::new(state).register(input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(AccountService::new(state).login(input).await?))
}

async fn get_profile(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<Json<Profile>> {
    let profile = AccountService::new(state)
        .get_profile(actor.actor(), user_id)
        .await?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(user_id): ApiPath<i64>,
    body: DeferredJson<ProfilePatchInput>,
) -> ApiResult<Json<Profile>> {
    let profile = AccountService::new(state)
        .update_profile(actor.actor(), user_id, ApiJson::deferred(body))
        .await?;
    Ok(Json(profile))
}

async fn list_business_profiles(
    State(state): State<AppState>,
    actor: MaybeActor,
) -> ApiResult<Json<Vec<Profile>>> {
    let profiles = AccountService::new(state)
        .list_profiles(actor.actor(), ProfileKind::Business)
        .await?;
    Ok(Json(profiles))
}

async fn list_customer_profiles(
    State(state): State<AppState>,
    actor: MaybeActor,
) -> ApiResult<Json<Vec<Profile>>> {
    let profiles = AccountService::new(state)
        .list_profiles(actor.actor(), ProfileKind::Customer)
        .await?;
    Ok(Json(profiles))
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_offers(
    State(state): State<AppState>,
    actor: MaybeActor,
    Query(params): Params,
) -> ApiResult<Json<Page<OfferListItem>>> {
    let page = CatalogService::new(state)
        .list_offers(actor.actor(), &params)
        .await?;
    Ok(Json(page.map(OfferListItem::from)))
}

async fn create_offer(
    State(state): State<AppState>,
    actor: MaybeActor,
    body: DeferredJson<OfferInput>,
) -> ApiResult<(StatusCode, Json<OfferWritten>)> {
    let offer = CatalogService::new(state)
        .create_offer(actor.actor(), ApiJson::deferred(body))
        .await?;
    Ok((StatusCode::CREATED, Json(offer.into())))
}

async fn get_offer(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<OfferView>> {
    let offer = CatalogService::new(state).get_offer(actor.actor(), id).await?;
    Ok(Json(offer.into()))
}

async fn update_offer(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(id): ApiPath<i64>,
    body: DeferredJson<OfferInput>,
) -> ApiResult<Json<OfferWritten>> {
    let offer = CatalogService::new(state)
        .update_offer(actor.actor(), id, ApiJson::deferred(body))
        .await?;
    Ok(Json(offer.into()))
}

async fn delete_offer(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    CatalogService::new(state).delete_offer(actor.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_offer_detail(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<OfferDetail>> {
    let detail = CatalogService::new(state).get_detail(actor.actor(), id).await?;
    Ok(Json(detail))
}

// =============================================================================
// Orders
// =============================================================================

async fn list_orders(State(state): State<AppState>, actor: MaybeActor) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(OrderService::new(state).list_orders(actor.actor()).await?))
}

async fn create_order(
    State(state): State<AppState>,
    actor: MaybeActor,
    body: DeferredJson<OrderCreateInput>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = OrderService::new(state)
        .create_order(actor.actor(), ApiJson::deferred(body))
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn update_order_status(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(id): ApiPath<i64>,
    body: DeferredJson<OrderStatusInput>,
) -> ApiResult<Json<Order>> {
    let order = OrderService::new(state)
        .update_status(actor.actor(), id, ApiJson::deferred(body))
        .await?;
    Ok(Json(order))
}

async fn delete_order(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    OrderService::new(state).delete_order(actor.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn order_count(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(business_user_id): ApiPath<i64>,
) -> ApiResult<Json<OrderCount>> {
    let order_count = OrderService::new(state)
        .count_orders(actor.actor(), business_user_id, OrderStatus::InProgress)
        .await?;
    Ok(Json(OrderCount { order_count }))
}

async fn completed_order_count(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(business_user_id): ApiPath<i64>,
) -> ApiResult<Json<CompletedOrderCount>> {
    let completed_order_count = OrderService::new(state)
        .count_orders(actor.actor(), business_user_id, OrderStatus::Completed)
        .await?;
    Ok(Json(CompletedOrderCount {
        completed_order_count,
    }))
}

// =============================================================================
// Reviews
// =============================================================================

async fn list_reviews(
    State(state): State<AppState>,
    actor: MaybeActor,
    Query(params): Params,
) -> ApiResult<Json<Vec<Review>>> {
    let reviews = ReviewService::new(state)
        .list_reviews(actor.actor(), &params)
        .await?;
    Ok(Json(reviews))
}

async fn create_review(
    State(state): State<AppState>,
    actor: MaybeActor,
    body: DeferredJson<ReviewInput>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let review = ReviewService::new(state)
        .create_review(actor.actor(), ApiJson::deferred(body))
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn update_review(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(id): ApiPath<i64>,
    body: DeferredJson<ReviewPatchInput>,
) -> ApiResult<Json<Review>> {
    let review = ReviewService::new(state)
        .update_review(actor.actor(), id, ApiJson::deferred(body))
        .await?;
    Ok(Json(review))
}

async fn delete_review(
    State(state): State<AppState>,
    actor: MaybeActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    ReviewService::new(state).delete_review(actor.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Statistics & Health
// =============================================================================

async fn base_info(State(state): State<AppState>, actor: MaybeActor) -> ApiResult<Json<BaseInfo>> {
    Ok(Json(StatsService::new(state).base_info(actor.actor()).await?))
}

/// Liveness plus a database round trip.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
