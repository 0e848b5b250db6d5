//! Guard, origin and rate-limit behavior through the full router.

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::*;

mod common;

#[tokio::test]
async fn health_needs_no_session() {
    let app = app();
    let res = send(&app.router, request(Method::GET, "/health", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn me_returns_the_session_user() {
    let app = app();
    let res = send(&app.router, request(Method::GET, "/api/me", Some(MEMBER_TOKEN), None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    assert_eq!(body["id"], "member-1");
    assert_eq!(body["role"], "MEMBER");
    assert_eq!(body["isDisabled"], false);
}

#[tokio::test]
async fn missing_unknown_expired_and_disabled_sessions_are_unauthorized() {
    let app = app();
    for token in [None, Some("no-such-token"), Some(EXPIRED_TOKEN), Some(DISABLED_TOKEN)] {
        let res = send(&app.router, request(Method::GET, "/api/me", token, None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "token {token:?}");

        let body = json_body(res).await;
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["status"], 401);
    }
}

#[tokio::test]
async fn bearer_token_is_accepted_without_cookie() {
    let app = app();
    let mut req = request(Method::GET, "/api/me", None, None);
    req.headers_mut()
        .insert(header::AUTHORIZATION, format!("Bearer {SELLER_TOKEN}").parse().unwrap());
    let res = send(&app.router, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["role"], "SELLER");
}

#[tokio::test]
async fn seller_overview_checks_role() {
    let app = app();

    let res = send(&app.router, request(Method::GET, "/api/seller/overview", Some(MEMBER_TOKEN), None)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(res).await["code"], "FORBIDDEN");

    for token in [SELLER_TOKEN, ADMIN_TOKEN] {
        let res = send(&app.router, request(Method::GET, "/api/seller/overview", Some(token), None)).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn cross_origin_mutation_is_rejected() {
    let app = app();
    let mut req = request(Method::POST, "/api/auth/logout", Some(MEMBER_TOKEN), None);
    req.headers_mut()
        .insert(header::ORIGIN, "https://evil.example.com".parse().unwrap());

    let res = send(&app.router, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(res).await["code"], "INVALID_ORIGIN");
    // The session survived the rejected logout.
    assert_eq!(app.store.session_count(), 5);
}

#[tokio::test]
async fn referer_is_used_when_origin_is_absent() {
    let app = app();
    let mut req = request(Method::POST, "/api/auth/logout", Some(MEMBER_TOKEN), None);
    req.headers_mut().remove(header::ORIGIN);
    req.headers_mut()
        .insert(header::REFERER, "https://evil.example.com/page".parse().unwrap());

    let res = send(&app.router, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn safe_methods_skip_the_origin_check() {
    let app = app();
    let mut req = request(Method::GET, "/api/me", Some(MEMBER_TOKEN), None);
    req.headers_mut()
        .insert(header::ORIGIN, "https://evil.example.com".parse().unwrap());

    let res = send(&app.router, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_deletes_the_session_and_clears_the_cookie() {
    let app = app();
    let res = send(&app.router, request(Method::POST, "/api/auth/logout", Some(MEMBER_TOKEN), None)).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("session=;"));
    assert!(cookie.contains("Max-Age=0"));

    let res = send(&app.router, request(Method::GET, "/api/me", Some(MEMBER_TOKEN), None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_rule_limits_then_reports_retry_after() {
    let mut config = test_config();
    config.rate_limit.auth.limit = 2;
    config.rate_limit.auth.window_ms = 60_000;
    let app = app_with(config);

    // Unauthenticated calls still count against the auth rule.
    for remaining in ["1", "0"] {
        let res = send(&app.router, request(Method::POST, "/api/auth/logout", None, None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()["x-ratelimit-remaining"], remaining);
    }

    let res = send(&app.router, request(Method::POST, "/api/auth/logout", Some(MEMBER_TOKEN), None)).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = res.headers()[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry_after));
    assert_eq!(json_body(res).await["code"], "RATE_LIMITED");

    // Reads outside /api/auth are not limited.
    let res = send(&app.router, request(Method::GET, "/api/me", Some(MEMBER_TOKEN), None)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn disabled_rate_limiting_lets_everything_through() {
    let mut config = test_config();
    config.rate_limit.enabled = false;
    config.rate_limit.auth.limit = 0;
    let app = app_with(config);

    let res = send(&app.router, request(Method::POST, "/api/auth/logout", None, None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.state.rate_limiter.tracked_keys(), 0);
}

#[tokio::test]
async fn rate_limit_reads_reloaded_rules() {
    let app = app();
    let mut reloaded = test_config();
    reloaded.rate_limit.mutation.limit = 0;
    app.state.config.store(std::sync::Arc::new(reloaded));

    let body = json!({ "userId": "member-1", "delta": 5, "reason": "bonus" });
    let res = send(&app.router, request(Method::POST, "/api/admin/points/adjust", Some(ADMIN_TOKEN), Some(body))).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
}
