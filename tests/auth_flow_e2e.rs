//! End-to-end protocol test: provision, login, session check, gated profile
//! fetch, client-side recovery, logout. Drives the production router over
//! in-memory stores; no network, database or Redis required.

use axum::body::Body;
use axum::Router;
use http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use planvault::app;
use planvault::config::Config;
use planvault::crypto::{envelope, identity};
use planvault::models::credential::CredentialRecord;
use planvault::state::AppState;

const ALICE_PASSWORD: &str = "p@ss";
const ALICE_PROFILE: &[u8] = br#"{"name":"Alice"}"#;

fn test_app() -> Router {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        redis_url: "redis://unused".to_string(),
        session_ttl_minutes: 30,
    };
    app::router(AppState::in_memory(config))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Pulls `session_id=<token>` out of a login response's Set-Cookie header.
fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login did not set a cookie")
        .to_str()
        .unwrap();
    let pair = set_cookie.split(';').next().unwrap();
    assert!(pair.starts_with("session_id="));
    pair.to_string()
}

async fn register(app: &Router, record: &CredentialRecord) -> StatusCode {
    let request = json_request(
        "POST",
        "/api/auth/register",
        serde_json::to_value(record).unwrap(),
    );
    app.clone().oneshot(request).await.unwrap().status()
}

async fn login(app: &Router, identity_token: &str, verifier: &str) -> axum::response::Response {
    let request = json_request(
        "POST",
        "/api/auth/login",
        json!({ "identity_token": identity_token, "verifier": verifier }),
    );
    app.clone().oneshot(request).await.unwrap()
}

#[tokio::test]
async fn full_protocol_round_trip() {
    let app = test_app();

    // Client-side provisioning: hash the identity, seal the profile.
    let alice = envelope::enroll("alice", ALICE_PASSWORD, ALICE_PROFILE).unwrap();
    let token = alice.identity_token.clone();
    assert_eq!(token, identity::identity_token("alice"));

    assert_eq!(register(&app, &alice).await, StatusCode::CREATED);

    // Provisioning the same identity again collides.
    assert_eq!(register(&app, &alice).await, StatusCode::CONFLICT);

    // Nothing is gated open before login.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/profile/{token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A wrong password produces the same generic 401 a wrong identity would.
    let wrong = envelope::verifier_of("wrong", &alice.salt).unwrap();
    let response = login(&app, &token, &wrong).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid credentials");

    // The real login issues a session cookie.
    let response = login(&app, &token, &alice.password_verifier).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/auth/session")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["authenticated"], true);

    // Gated fetch returns exactly the stored record fields.
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri(format!("/api/profile/{token}"))
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let fetched: CredentialRecord = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(fetched.identity_token, token);
    assert_eq!(fetched.password_verifier, alice.password_verifier);
    assert_eq!(fetched.salt, alice.salt);
    assert_eq!(fetched.envelope, alice.envelope);

    // The client re-derives its key from the fetched salt and opens the
    // envelope locally; the server never saw this plaintext.
    let profile = envelope::recover(ALICE_PASSWORD, &fetched.salt, &fetched.envelope).unwrap();
    assert_eq!(profile, ALICE_PROFILE);

    // Alice's session cannot fetch Bob's record.
    let bob = envelope::enroll("bob", "hunter2!", br#"{"name":"Bob"}"#).unwrap();
    assert_eq!(register(&app, &bob).await, StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri(format!("/api/profile/{}", bob.identity_token))
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Logout ends the session; repeating it is still a 200.
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(with_cookie(
                json_request("POST", "/api/auth/logout", json!({})),
                &cookie,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);
    }

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/auth/session")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_accepts_a_raw_identity() {
    let app = test_app();

    let record = envelope::enroll("carol", "s3cret-pw", b"profile").unwrap();
    assert_eq!(register(&app, &record).await, StatusCode::CREATED);

    let request = json_request(
        "POST",
        "/api/auth/login",
        json!({ "raw_identity": "carol", "verifier": record.password_verifier }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_records_are_rejected() {
    let app = test_app();

    let mut record = envelope::enroll("dave", "p@ssw0rd!", b"profile").unwrap();
    record.salt.pop();
    assert_eq!(register(&app, &record).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn repeated_failures_are_throttled() {
    let app = test_app();

    let record = envelope::enroll("erin", "right-pw!", b"profile").unwrap();
    assert_eq!(register(&app, &record).await, StatusCode::CREATED);

    let wrong = envelope::verifier_of("wrong", &record.salt).unwrap();
    for _ in 0..5 {
        let response = login(&app, &record.identity_token, &wrong).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the correct verifier is refused once the identity is throttled.
    let response = login(&app, &record.identity_token, &record.password_verifier).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
