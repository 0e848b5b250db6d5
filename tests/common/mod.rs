//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use market_gate::auth::{Role, UserId, UserIdentity};
use market_gate::config::GateConfig;
use market_gate::http::build_router;
use market_gate::points::LedgerEntry;
use market_gate::store::memory::StoreFixture;
use market_gate::{AppState, MemoryStore};

pub const BASE_URL: &str = "https://market.example.com";
pub const MEMBER_TOKEN: &str = "tok-member";
pub const SELLER_TOKEN: &str = "tok-seller";
pub const ADMIN_TOKEN: &str = "tok-admin";
pub const DISABLED_TOKEN: &str = "tok-disabled";
pub const EXPIRED_TOKEN: &str = "tok-expired";

/// Far enough ahead that seeded sessions never expire mid-test.
const FAR_FUTURE: u64 = 4_102_444_800;

pub fn test_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.app.base_url = BASE_URL.to_string();
    config.admin.api_key = "ops-test-key".to_string();
    config
}

fn user(id: &str, role: Role, is_disabled: bool) -> UserIdentity {
    UserIdentity {
        id: UserId::new(id),
        email: format!("{id}@example.com"),
        role,
        is_disabled,
    }
}

/// Store with one user per role, a disabled user, an expired session and a
/// small ledger for the member.
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new(None));
    store.apply_fixture(StoreFixture {
        users: vec![
            user("member-1", Role::Member, false),
            user("seller-1", Role::Seller, false),
            user("admin-1", Role::Admin, false),
            user("disabled-1", Role::Member, true),
        ],
        sessions: Vec::new(),
        ledger: vec![
            LedgerEntry::new(UserId::new("member-1"), 100),
            LedgerEntry::new(UserId::new("member-1"), -30).with_reason("redeemed"),
            LedgerEntry::new(UserId::new("member-1"), 50),
        ],
    });
    store.insert_session(MEMBER_TOKEN, &UserId::new("member-1"), FAR_FUTURE);
    store.insert_session(SELLER_TOKEN, &UserId::new("seller-1"), FAR_FUTURE);
    store.insert_session(ADMIN_TOKEN, &UserId::new("admin-1"), FAR_FUTURE);
    store.insert_session(DISABLED_TOKEN, &UserId::new("disabled-1"), FAR_FUTURE);
    store.insert_session(EXPIRED_TOKEN, &UserId::new("member-1"), 1);
    store
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

pub fn app_with(config: GateConfig) -> TestApp {
    let store = seeded_store();
    let state = AppState::new(config, store.clone()).unwrap();
    let router = build_router(state.clone());
    TestApp { state, store, router }
}

pub fn app() -> TestApp {
    app_with(test_config())
}

/// Request builder with the session cookie and a same-origin header set.
pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session={token}"));
    }
    builder = builder.header(header::ORIGIN, BASE_URL);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let mut request = builder.body(body).unwrap();
    let peer: SocketAddr = "203.0.113.7:40000".parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
