//! API integration tests against the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use rfp_api::{create_router, ApiConfig, AppState, StaticTokenVerifier};
use rfp_firestore::{MemoryStore, RfpStore};
use rfp_models::{CreateRfpRequest, Rfp};

const BUYER: &str = "buyer-token";
const SUPPLIER: &str = "supplier-token";
const OTHER_SUPPLIER: &str = "other-supplier-token";
const OTHER_BUYER: &str = "other-buyer-token";
const NEWCOMER: &str = "newcomer-token";

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let verifier = StaticTokenVerifier::new()
            .with_user(BUYER, "buyer-1")
            .with_user(SUPPLIER, "supplier-1")
            .with_user(OTHER_SUPPLIER, "supplier-2")
            .with_user(OTHER_BUYER, "buyer-2")
            .with_user(NEWCOMER, "newcomer");
        let state = AppState::with_parts(ApiConfig::default(), store.clone(), Arc::new(verifier));
        Self {
            router: create_router(state, None),
            store,
        }
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn onboard(&self, token: &str, role: &str) {
        let (status, _) = self
            .call(Method::PUT, "/api/me", Some(token), Some(json!({ "role": role })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    /// Buyer and two suppliers with profiles.
    async fn with_parties() -> Self {
        let app = Self::new();
        app.onboard(BUYER, "buyer").await;
        app.onboard(SUPPLIER, "supplier").await;
        app.onboard(OTHER_SUPPLIER, "supplier").await;
        app.onboard(OTHER_BUYER, "buyer").await;
        app
    }

    async fn create_rfp(&self, title: &str) -> String {
        let (status, body) = self
            .call(Method::POST, "/api/rfps", Some(BUYER), Some(rfp_body(title)))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn published_rfp(&self, title: &str) -> String {
        let id = self.create_rfp(title).await;
        let (status, _) = self
            .call(Method::POST, &format!("/api/rfps/{}/publish", id), Some(BUYER), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        id
    }

    async fn submit(&self, rfp_id: &str, token: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                &format!("/api/rfps/{}/responses", rfp_id),
                Some(token),
                Some(json!({ "proposal": "We can do it", "budget": 3000.0 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

fn rfp_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Replace the lobby carpets",
        "company": "Acme",
        "budget_min": 1000.0,
        "budget_max": 5000.0,
        "deadline": (Utc::now() + Duration::days(7)).to_rfc3339(),
        "category": "facilities",
    })
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.call(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["store"]["status"], "ok");
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header("x-request-id", "trace-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-request-id").unwrap(), "trace-abc-123");
}

#[tokio::test]
async fn test_authentication_required() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/api/rfps", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = app.call(Method::GET, "/api/rfps", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_onboarding_is_one_shot() {
    let app = TestApp::new();

    let (status, _) = app.call(Method::GET, "/api/me", Some(NEWCOMER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Role-gated routes refuse until a role is chosen
    let (status, _) = app.call(Method::GET, "/api/rfps", Some(NEWCOMER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            Method::PUT,
            "/api/me",
            Some(NEWCOMER),
            Some(json!({ "role": "buyer", "display_name": "  Nia  " })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "buyer");
    assert_eq!(body["display_name"], "Nia");
    assert_eq!(body["email"], "newcomer@example.com");

    let (status, body) = app
        .call(Method::PUT, "/api/me", Some(NEWCOMER), Some(json!({ "role": "supplier" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "profile_exists");

    let (status, body) = app.call(Method::GET, "/api/me", Some(NEWCOMER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "buyer");
}

#[tokio::test]
async fn test_buyer_creates_and_publishes() {
    let app = TestApp::with_parties().await;
    let id = app.create_rfp("Office cleaning").await;

    let (status, body) = app.call(Method::GET, &format!("/api/rfps/{}", id), Some(BUYER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "draft");

    // Drafts are invisible to everyone but the owner
    let (status, _) = app
        .call(Method::GET, &format!("/api/rfps/{}/view", id), Some(SUPPLIER), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call(Method::GET, &format!("/api/rfps/{}/view", id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/rfps/{}", id),
            Some(BUYER),
            Some(json!({ "title": "Office deep cleaning" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Office deep cleaning");

    let (status, body) = app
        .call(Method::POST, &format!("/api/rfps/{}/publish", id), Some(BUYER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "published");
    assert!(body["published_at"].is_string());

    let (status, body) = app.call(Method::GET, &format!("/api/rfps/{}/view", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Office deep cleaning");

    // Published RFPs are frozen
    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/rfps/{}", id),
            Some(BUYER),
            Some(json!({ "title": "Too late" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_state");

    let (status, _) = app
        .call(Method::POST, &format!("/api/rfps/{}/publish", id), Some(BUYER), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_supplier_cannot_manage_rfps() {
    let app = TestApp::with_parties().await;

    let (status, body) = app
        .call(Method::POST, "/api/rfps", Some(SUPPLIER), Some(rfp_body("Sneaky")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let id = app.create_rfp("Roof repair").await;
    let (status, _) = app.call(Method::GET, &format!("/api/rfps/{}", id), Some(SUPPLIER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::POST, &format!("/api/rfps/{}/publish", id), Some(SUPPLIER), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Access is decided before the body is looked at
    let (status, body) = app
        .call(Method::PUT, &format!("/api/rfps/{}", id), Some(SUPPLIER), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, body) = app
        .call(Method::PUT, "/api/rfps/missing", Some(BUYER), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_create_rejects_invalid_budget() {
    let app = TestApp::with_parties().await;
    let mut body = rfp_body("Backwards budget");
    body["budget_min"] = json!(9000.0);

    let (status, body) = app.call(Method::POST, "/api/rfps", Some(BUYER), Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");
}

#[tokio::test]
async fn test_browse_lists_only_published() {
    let app = TestApp::with_parties().await;
    app.published_rfp("Window washing").await;
    app.published_rfp("Catering services").await;
    app.create_rfp("Window frames").await;

    let (status, body) = app.call(Method::GET, "/api/rfps/browse", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);

    let (status, body) = app
        .call(Method::GET, "/api/rfps/browse?search=window&page=1&per_page=10", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "Window washing");

    let (status, body) = app
        .call(Method::GET, "/api/rfps/browse?category=software", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_submit_and_approve() {
    let app = TestApp::with_parties().await;
    let rfp_id = app.published_rfp("Security guards").await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/rfps/{}/responses", rfp_id),
            Some(SUPPLIER),
            Some(json!({ "proposal": "24/7 coverage", "budget": 4000.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rfp_id"], rfp_id.as_str());
    assert_eq!(body["status"], "submitted");
    assert!(body["submitted_at"].is_string());
    let response_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = app.call(Method::GET, "/api/responses/my", Some(SUPPLIER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app
        .call(Method::GET, &format!("/api/responses?rfp_id={}", rfp_id), Some(BUYER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], response_id.as_str());

    let (status, body) = app
        .call(Method::PUT, &format!("/api/responses/{}/review", response_id), Some(BUYER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "under_review");

    let (status, body) = app
        .call(Method::PUT, &format!("/api/responses/{}/approve", response_id), Some(BUYER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["reviewed_by"], "buyer-1");

    // Decisions are final
    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/responses/{}/reject", response_id),
            Some(BUYER),
            Some(json!({ "rejection_reason": "Changed my mind" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_state");
}

#[tokio::test]
async fn test_duplicate_submission_rejected() {
    let app = TestApp::with_parties().await;
    let rfp_id = app.published_rfp("Landscaping").await;
    app.submit(&rfp_id, SUPPLIER).await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/rfps/{}/responses", rfp_id),
            Some(SUPPLIER),
            Some(json!({ "proposal": "Second try" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "already_submitted");

    // Another supplier is unaffected
    app.submit(&rfp_id, OTHER_SUPPLIER).await;
}

#[tokio::test]
async fn test_submit_to_draft_is_not_found() {
    let app = TestApp::with_parties().await;
    let rfp_id = app.create_rfp("Unannounced").await;

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/rfps/{}/responses", rfp_id),
            Some(SUPPLIER),
            Some(json!({ "proposal": "Early bird" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_after_deadline() {
    let app = TestApp::with_parties().await;

    let request: CreateRfpRequest = serde_json::from_value(rfp_body("Expired")).unwrap();
    let mut rfp = Rfp::draft("buyer-1".to_string(), request, Utc::now() - Duration::days(3));
    rfp.publish(Utc::now() - Duration::days(2));
    rfp.deadline = Utc::now() - Duration::hours(1);
    app.store.insert_rfp(&rfp).await.unwrap();

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/rfps/{}/responses", rfp.id),
            Some(SUPPLIER),
            Some(json!({ "proposal": "Sorry I'm late" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");
}

#[tokio::test]
async fn test_reject_requires_reason() {
    let app = TestApp::with_parties().await;
    let rfp_id = app.published_rfp("Printing").await;
    let response_id = app.submit(&rfp_id, SUPPLIER).await;
    let uri = format!("/api/responses/{}/reject", response_id);

    let (status, _) = app.call(Method::PUT, &uri, Some(BUYER), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(Method::PUT, &uri, Some(BUYER), Some(json!({ "rejection_reason": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(Method::PUT, &uri, Some(BUYER), Some(json!({ "reason": "  Budget too high " })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejection_reason"], "Budget too high");
    assert!(body["reviewed_at"].is_string());
}

#[tokio::test]
async fn test_responses_hidden_from_other_parties() {
    let app = TestApp::with_parties().await;
    let rfp_id = app.published_rfp("Plumbing").await;
    let response_id = app.submit(&rfp_id, SUPPLIER).await;

    // Another buyer cannot decide on responses to someone else's RFP
    let (status, body) = app
        .call(Method::PUT, &format!("/api/responses/{}/approve", response_id), Some(OTHER_BUYER), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, body) = app
        .call(Method::GET, &format!("/api/responses/{}", response_id), Some(BUYER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "submitted");

    let (status, body) = app.call(Method::GET, "/api/responses", Some(OTHER_BUYER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    // Suppliers cannot review, even their own response
    let (status, _) = app
        .call(Method::PUT, &format!("/api/responses/{}/approve", response_id), Some(SUPPLIER), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::GET, &format!("/api/responses/{}", response_id), Some(OTHER_SUPPLIER), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(Method::GET, "/api/responses", Some(SUPPLIER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(Method::GET, "/api/responses/my", Some(BUYER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.call(Method::GET, "/api/responses/my", Some(OTHER_SUPPLIER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = app.call(Method::GET, "/api/responses/missing", Some(BUYER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
