//! End-to-end HTTP tests against an in-memory store.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use chrono::{DateTime, Duration};
use serde_json::{Value, json};
use subtrack_auth::AuthConfig;
use subtrack_core::clock::FixedClock;
use subtrack_core::models::user::Role;
use subtrack_db::{DbConfig, DbManager};
use subtrack_server::{AppState, api};

struct Harness {
    state: web::Data<AppState>,
    clock: Arc<FixedClock>,
}

async fn harness() -> Harness {
    let db = DbManager::connect(&DbConfig {
        url: "mem://".into(),
        ..DbConfig::default()
    })
    .await
    .unwrap();

    // 2025-03-14T12:00:00Z
    let clock = Arc::new(FixedClock::new(
        DateTime::from_timestamp(1_741_953_600, 0).unwrap(),
    ));
    let auth = AuthConfig {
        jwt_secret: "api-test-secret".into(),
        ..AuthConfig::default()
    };
    let state = AppState::new(&db, auth, "USD".into(), clock.clone()).unwrap();

    Harness {
        state: web::Data::new(state),
        clock,
    }
}

macro_rules! app {
    ($h:expr) => {{
        let state = $h.state.clone();
        test::init_service(App::new().configure(move |cfg| api::configure(cfg, state))).await
    }};
}

/// Registers an account with the shared test password; yields the status.
macro_rules! register {
    ($app:expr, $name:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/users/register")
            .set_json(json!({ "name": $name, "email": $email, "password": "correct horse" }))
            .to_request();
        test::call_service(&$app, req).await.status()
    }};
}

/// Logs in with the shared test password; yields the bearer token.
macro_rules! login {
    ($app:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/users/login")
            .set_json(json!({ "email": $email, "password": "correct horse" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["token"].as_str().unwrap().to_string()
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

#[actix_web::test]
async fn health_is_public() {
    let h = harness().await;
    let app = app!(h);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "status": "ok" }));
}

#[actix_web::test]
async fn register_and_login_flow() {
    let h = harness().await;
    let app = app!(h);

    assert_eq!(register!(app, "Alice", "alice@example.com"), StatusCode::CREATED);

    // Same email, different case.
    let req = test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(json!({ "name": "A", "email": "ALICE@example.com", "password": "correct horse" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User already exists");

    let req = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "email": "alice@example.com", "password": "correct horse" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    for (email, password) in [
        ("alice@example.com", "wrong password"),
        ("nobody@example.com", "correct horse"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/users/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid credentials");
    }
}

#[actix_web::test]
async fn protected_routes_need_a_valid_token() {
    let h = harness().await;
    let app = app!(h);
    register!(app, "Alice", "alice@example.com");
    let token = login!(app, "alice@example.com");

    let req = test::TestRequest::get().uri("/api/users/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Unauthenticated");

    let req = test::TestRequest::get()
        .uri("/api/users/profile")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "Alice");

    h.clock.advance(Duration::hours(24) + Duration::seconds(1));
    let req = test::TestRequest::get()
        .uri("/api/subscriptions")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Unauthenticated");

    let req = test::TestRequest::get()
        .uri("/api/subscriptions")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn monthly_summary_normalises_billing_cycles() {
    let h = harness().await;
    let app = app!(h);
    register!(app, "Alice", "alice@example.com");
    let token = login!(app, "alice@example.com");

    for (name, amount, cycle) in [
        ("Netflix", 10.0, "monthly"),
        ("Gym", 30.0, "quarterly"),
        ("Cloud", 120.0, "yearly"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/subscriptions")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": name, "amount": amount, "billingCycle": cycle }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    // Inactive records do not count.
    let req = test::TestRequest::post()
        .uri("/api/subscriptions")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Paused", "amount": 99.0, "isActive": false }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/subscriptions/summary")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!((body["totalMonthly"].as_f64().unwrap() - 30.0).abs() < 1e-9);
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["activeCount"], 3);
    assert_eq!(body["subscriptionCount"], 4);
}

#[actix_web::test]
async fn oversized_amounts_are_refused_and_summary_stays_numeric() {
    let h = harness().await;
    let app = app!(h);
    register!(app, "Alice", "alice@example.com");
    let token = login!(app, "alice@example.com");

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/subscriptions")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Yacht", "amount": 1e308 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let req = test::TestRequest::get()
        .uri("/api/subscriptions/summary")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["totalMonthly"].as_f64(), Some(0.0));
    assert_eq!(body["subscriptionCount"], 0);
}

#[actix_web::test]
async fn create_applies_defaults_and_aliases() {
    let h = harness().await;
    let app = app!(h);
    register!(app, "Alice", "alice@example.com");
    let token = login!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/subscriptions")
        .insert_header(bearer(&token))
        .set_json(json!({ "planName": "Spotify", "price": 9.99 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let sub = &body["subscription"];
    assert_eq!(sub["name"], "Spotify");
    assert_eq!(sub["amount"], 9.99);
    assert_eq!(sub["currency"], "USD");
    assert_eq!(sub["category"], "Other");
    assert_eq!(sub["billingCycle"], "monthly");
    assert_eq!(sub["nextBillingDate"], "2025-03-14");
    assert_eq!(sub["status"], "active");

    let req = test::TestRequest::post()
        .uri("/api/subscriptions")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Broken", "amount": -5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().is_some_and(|m| m.contains("amount")));
}

#[actix_web::test]
async fn strangers_cannot_touch_other_subscriptions() {
    let h = harness().await;
    let app = app!(h);
    register!(app, "Alice", "alice@example.com");
    register!(app, "Bob", "bob@example.com");
    let alice = login!(app, "alice@example.com");
    let bob = login!(app, "bob@example.com");

    let req = test::TestRequest::post()
        .uri("/api/subscriptions")
        .insert_header(bearer(&alice))
        .set_json(json!({ "name": "Netflix", "amount": 15.99 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["subscription"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/subscriptions/{id}");

    for req in [
        test::TestRequest::get().uri(&uri),
        test::TestRequest::put()
            .uri(&uri)
            .set_json(json!({ "amount": 1.0 })),
        test::TestRequest::delete().uri(&uri),
    ] {
        let resp = test::call_service(&app, req.insert_header(bearer(&bob)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Subscription not found");
    }

    // Bob's own list stays empty.
    let req = test::TestRequest::get()
        .uri("/api/subscriptions")
        .insert_header(bearer(&bob))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["subscriptions"], json!([]));

    // The owner can cancel; the record stays with status cancelled.
    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["subscription"]["status"], "cancelled");
    assert_eq!(body["subscription"]["amount"], 15.99);
}

#[actix_web::test]
async fn malformed_id_is_not_found() {
    let h = harness().await;
    let app = app!(h);
    register!(app, "Alice", "alice@example.com");
    let token = login!(app, "alice@example.com");

    let req = test::TestRequest::get()
        .uri("/api/subscriptions/not-a-uuid")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_routes_require_admin_role() {
    let h = harness().await;
    let app = app!(h);
    register!(app, "Alice", "alice@example.com");
    register!(app, "Root", "root@example.com");
    let alice = login!(app, "alice@example.com");

    let req = test::TestRequest::post()
        .uri("/api/subscriptions")
        .insert_header(bearer(&alice))
        .set_json(json!({ "name": "Netflix", "amount": 15.99 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    for uri in ["/api/users", "/api/subscriptions/admin/all"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(&alice))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Forbidden");
    }

    h.state
        .auth
        .assign_role("root@example.com", Role::Admin)
        .await
        .unwrap();
    let root = login!(app, "root@example.com");

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&root))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/subscriptions/admin/all")
        .insert_header(bearer(&root))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let all = body["subscriptions"].as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["name"], "Netflix");
    assert_eq!(all[0]["owner"]["name"], "Alice");
    assert_eq!(all[0]["owner"]["email"], "alice@example.com");
}
