//! End-to-end tests that drive the full router against a temporary database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use coderr_api::{router, ApiConfig, AppState};
use coderr_db::credentials::hash_password;
use coderr_db::{Database, DbConfig, NewUserRecord};

struct TestApp {
    app: Router,
    db: Database,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("coderr.db")))
            .await
            .unwrap();
        let config = ApiConfig {
            jwt_secret: "integration-test-secret".to_string(),
            ..ApiConfig::default()
        };

        TestApp {
            app: router(AppState::new(db.clone(), config)),
            db,
            _dir: dir,
        }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Creates a staff account directly in storage and logs it in.
    async fn admin(&self) -> String {
        let record = NewUserRecord {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: hash_password("asdasd").unwrap(),
            first_name: String::new(),
            last_name: String::new(),
        };
        self.db.users().create_staff(&record).await.unwrap();

        let (status, body) = self
            .post("/api/login/", None, json!({ "username": "admin", "password": "asdasd" }))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Registers an account and returns `(token, user_id)`.
    async fn register(&self, username: &str, kind: &str) -> (String, i64) {
        let (status, body) = self
            .post(
                "/api/registration/",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "asdasd",
                    "repeated_password": "asdasd",
                    "type": kind,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["user_id"].as_i64().unwrap(),
        )
    }

    /// Creates an offer whose three tiers cost the given whole amounts.
    async fn create_offer(&self, token: &str, title: &str, prices: [i64; 3]) -> Value {
        let details: Vec<Value> = ["basic", "standard", "premium"]
            .iter()
            .zip(prices)
            .zip([3, 5, 10])
            .map(|((offer_type, price), days)| {
                json!({
                    "title": format!("{title} {offer_type}"),
                    "revisions": 2,
                    "delivery_time_in_days": days,
                    "price": price,
                    "features": ["Logo", "Visitenkarte"],
                    "offer_type": offer_type,
                })
            })
            .collect();

        let (status, body) = self
            .post(
                "/api/offers/",
                Some(token),
                json!({ "title": title, "description": "Professional work", "details": details }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn tier_id(offer: &Value, offer_type: &str) -> i64 {
    offer["details"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["offer_type"] == offer_type)
        .and_then(|d| d["id"].as_i64())
        .unwrap()
}

#[tokio::test]
async fn test_order_lifecycle() {
    let app = TestApp::new().await;
    let (business, business_id) = app.register("kevin", "business").await;
    let (customer, customer_id) = app.register("andrey", "customer").await;

    let offer = app.create_offer(&business, "Grafikdesign-Paket", [10, 30, 80]).await;
    let standard = tier_id(&offer, "standard");

    let (status, order) = app
        .post("/api/orders/", Some(&customer), json!({ "offer_detail_id": standard }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["customer_user"], customer_id);
    assert_eq!(order["business_user"], business_id);
    assert_eq!(order["price"], "30.00");
    assert_eq!(order["offer_type"], "standard");
    assert_eq!(order["status"], "in_progress");
    let order_id = order["id"].as_i64().unwrap();

    let (_, counts) = app
        .get(&format!("/api/order-count/{business_id}/"), Some(&customer))
        .await;
    assert_eq!(counts["order_count"], 1);

    // The customer is not the business party of the order
    let uri = format!("/api/orders/{order_id}/");
    let (status, body) = app
        .patch(&uri, Some(&customer), json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ROLE_MISMATCH");

    let (status, body) = app
        .patch(&uri, Some(&business), json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "completed");

    let (_, counts) = app
        .get(&format!("/api/completed-order-count/{business_id}/"), Some(&business))
        .await;
    assert_eq!(counts["completed_order_count"], 1);
    let (_, counts) = app
        .get(&format!("/api/order-count/{business_id}/"), Some(&business))
        .await;
    assert_eq!(counts["order_count"], 0);

    // Both parties see the order; only an admin may delete it
    let (_, listed) = app.get("/api/orders/", Some(&customer)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (status, body) = app.delete(&uri, Some(&business)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let admin = app.admin().await;
    let (status, _) = app.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, listed) = app.get("/api/orders/", Some(&customer)).await;
    assert!(listed.as_array().unwrap().is_empty());
    let (status, _) = app.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_status_leaves_order_unchanged() {
    let app = TestApp::new().await;
    let (business, _) = app.register("kevin", "business").await;
    let (customer, _) = app.register("andrey", "customer").await;

    let offer = app.create_offer(&business, "Website", [100, 200, 300]).await;
    let (_, order) = app
        .post(
            "/api/orders/",
            Some(&customer),
            json!({ "offer_detail_id": tier_id(&offer, "basic") }),
        )
        .await;
    let uri = format!("/api/orders/{}/", order["id"]);

    let (status, body) = app
        .patch(&uri, Some(&business), json!({ "status": "shipped" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, listed) = app.get("/api/orders/", Some(&business)).await;
    assert_eq!(listed[0]["status"], "in_progress");
}

#[tokio::test]
async fn test_authentication_and_roles() {
    let app = TestApp::new().await;
    let (business, _) = app.register("kevin", "business").await;

    let (status, body) = app.get("/api/orders/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let (status, _) = app.get("/api/orders/", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Businesses cannot place orders
    let (status, body) = app
        .post("/api/orders/", Some(&business), json!({ "offer_detail_id": 1 }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ROLE_MISMATCH");

    let (status, body) = app
        .post("/api/login/", None, json!({ "username": "kevin", "password": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .post("/api/login/", None, json!({ "username": "kevin", "password": "asdasd" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "kevin");
}

#[tokio::test]
async fn test_offer_listing_filters_and_ordering() {
    let app = TestApp::new().await;
    let (business, business_id) = app.register("kevin", "business").await;
    app.create_offer(&business, "Logo", [10, 30, 80]).await;
    app.create_offer(&business, "Website", [50, 60, 70]).await;

    // Public listing
    let (status, page) = app.get("/api/offers/?ordering=min_price", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 2);
    assert_eq!(page["results"][0]["title"], "Logo");
    assert_eq!(page["results"][0]["min_price"], "10.00");
    assert_eq!(page["results"][0]["min_delivery_time"], 3);
    assert_eq!(page["results"][0]["user_details"]["username"], "kevin");
    assert_eq!(page["results"][0]["details"].as_array().unwrap().len(), 3);

    let (_, page) = app.get("/api/offers/?min_price=20", None).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["title"], "Website");

    let (_, page) = app.get("/api/offers/?search=webs", None).await;
    assert_eq!(page["count"], 1);

    let (_, page) = app
        .get(&format!("/api/offers/?creator_id={business_id}&page_size=1"), None)
        .await;
    assert_eq!(page["count"], 2);
    assert_eq!(page["results"].as_array().unwrap().len(), 1);
    assert_eq!(page["next"], 2);

    let (status, _) = app.get("/api/offers/?min_price=cheap", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_base_info_without_reviews() {
    let app = TestApp::new().await;

    let (status, info) = app.get("/api/base-info/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["review_count"], 0);
    assert_eq!(info["average_rating"], 0.0);
    assert_eq!(info["business_profile_count"], 0);
    assert_eq!(info["offer_count"], 0);
}

#[tokio::test]
async fn test_concurrent_duplicate_review() {
    let app = TestApp::new().await;
    let (_, business_id) = app.register("kevin", "business").await;
    let (customer, _) = app.register("andrey", "customer").await;

    let review = json!({ "business_user": business_id, "rating": 4, "description": "Good" });
    let (first, second) = tokio::join!(
        app.post("/api/reviews/", Some(&customer), review.clone()),
        app.post("/api/reviews/", Some(&customer), review.clone()),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let (_, reviews) = app
        .get(&format!("/api/reviews/?business_user_id={business_id}"), Some(&customer))
        .await;
    assert_eq!(reviews.as_array().unwrap().len(), 1);

    let (_, info) = app.get("/api/base-info/", None).await;
    assert_eq!(info["review_count"], 1);
    assert_eq!(info["average_rating"], 4.0);
}

#[tokio::test]
async fn test_bad_body_never_hides_authorization_failure() {
    let app = TestApp::new().await;
    let (business, business_id) = app.register("kevin", "business").await;
    let (customer, _) = app.register("andrey", "customer").await;

    let offer = app.create_offer(&business, "Logo", [10, 30, 80]).await;
    let (_, order) = app
        .post(
            "/api/orders/",
            Some(&customer),
            json!({ "offer_detail_id": tier_id(&offer, "basic") }),
        )
        .await;
    let uri = format!("/api/orders/{}/", order["id"]);
    let bad_status = json!({ "status": "completed", "price": 1 });

    let (status, body) = app.patch(&uri, None, bad_status.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let (status, body) = app.patch(&uri, Some(&customer), bad_status.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ROLE_MISMATCH");

    let (status, _) = app
        .patch("/api/orders/9999/", Some(&business), bad_status.clone())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Only an authorized caller learns that the body is bad
    let (status, body) = app.patch(&uri, Some(&business), bad_status).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["fields"]["non_field_errors"].is_array());

    let (status, _) = app
        .post("/api/reviews/", None, json!({ "business_user": business_id, "rating": "five" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = app
        .post("/api/reviews/", Some(&business), json!({ "business_user": business_id, "rating": 4.5 }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ROLE_MISMATCH");
    let (status, _) = app
        .post("/api/reviews/", Some(&customer), json!({ "business_user": business_id, "rating": "five" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_offer = json!({
        "title": "Logo",
        "details": [{ "title": "Basic", "price": "abc", "offer_type": "basic" }],
    });
    let (status, _) = app.post("/api/offers/", None, bad_offer.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = app.post("/api/offers/", Some(&customer), bad_offer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ROLE_MISMATCH");
}

#[tokio::test]
async fn test_offer_ownership_and_tier_rules() {
    let app = TestApp::new().await;
    let (owner, _) = app.register("kevin", "business").await;
    let (other, _) = app.register("mara", "business").await;

    let offer = app.create_offer(&owner, "Logo", [10, 30, 80]).await;
    let offer_id = offer["id"].as_i64().unwrap();
    let uri = format!("/api/offers/{offer_id}/");

    let (status, body) = app.patch(&uri, Some(&other), json!({ "title": "Stolen" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    let (status, body) = app.delete(&uri, Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // A patch naming a missing tier is rejected as a whole
    sqlx::query("DELETE FROM offer_details WHERE offer_id = ?1 AND offer_type = 'premium'")
        .bind(offer_id)
        .execute(app.db.pool())
        .await
        .unwrap();
    let (status, _) = app
        .patch(
            &uri,
            Some(&owner),
            json!({ "title": "Renamed", "details": [{ "offer_type": "premium", "price": 99 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, current) = app.get(&uri, Some(&owner)).await;
    assert_eq!(current["title"], "Logo");

    let (status, updated) = app
        .patch(
            &uri,
            Some(&owner),
            json!({ "title": "Renamed", "details": [{ "offer_type": "basic", "price": 15 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["details"][0]["id"], tier_id(&offer, "basic"));

    let two_tiers: Vec<Value> = ["basic", "standard"]
        .iter()
        .map(|offer_type| {
            json!({
                "title": "Tier",
                "revisions": 1,
                "delivery_time_in_days": 3,
                "price": 10,
                "features": ["Logo"],
                "offer_type": offer_type,
            })
        })
        .collect();
    let (status, body) = app
        .post("/api/offers/", Some(&owner), json!({ "title": "Half", "details": two_tiers }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["details"].is_array(), "{body}");

    let (status, _) = app.delete(&uri, Some(&owner)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, Some(&owner)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_and_profile_ownership() {
    let app = TestApp::new().await;
    let (_, business_id) = app.register("kevin", "business").await;
    let (author, author_id) = app.register("andrey", "customer").await;
    let (other, _) = app.register("lena", "customer").await;

    let (status, review) = app
        .post(
            "/api/reviews/",
            Some(&author),
            json!({ "business_user": business_id, "rating": 4, "description": "Good" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/reviews/{}/", review["id"]);

    let (status, body) = app.patch(&uri, Some(&other), json!({ "rating": 1 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    let (status, _) = app.delete(&uri, Some(&other)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.patch(&uri, Some(&author), json!({ "rating": 5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 5);
    let (status, _) = app.delete(&uri, Some(&author)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let profile_uri = format!("/api/profile/{author_id}/");
    let (status, body) = app
        .patch(&profile_uri, Some(&other), json!({ "first_name": "Mallory" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = app
        .patch(&profile_uri, Some(&author), json!({ "first_name": "Andrey" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_name"], "Andrey");
}

#[tokio::test]
async fn test_search_ignores_case_beyond_ascii() {
    let app = TestApp::new().await;
    let (business, _) = app.register("kevin", "business").await;
    app.create_offer(&business, "Übersetzung", [20, 40, 60]).await;

    let (_, page) = app.get("/api/offers/?search=%C3%BCbersetzung", None).await;
    assert_eq!(page["count"], 1);
}
