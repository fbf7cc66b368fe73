#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use lostfound_api::session::{SESSION_COOKIE, SessionConfig};
use lostfound_api::{AppContext, AppState, router};
use lostfound_db::Database;

pub const PASSWORD: &str = "hunter2-but-longer";

/// Fresh state on an in-memory database. Tests keep the state to reach
/// the store directly (e.g. to promote an admin).
pub fn test_state() -> AppState {
    let db = Database::open_in_memory().expect("in-memory database");
    Arc::new(AppContext::new(
        db,
        &SessionConfig {
            secret: "integration-test-secret".into(),
            secure_cookie: false,
        },
    ))
}

pub fn test_app(state: &AppState) -> Router {
    router(state.clone())
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, None, cookie).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
    cookie: Option<&str>,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), cookie).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

/// Raw `Set-Cookie` header for the session cookie, if any.
pub fn session_set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{SESSION_COOKIE}=")))
        .map(str::to_owned)
}

/// `name=value` pair suitable for a `Cookie` request header.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().trim().to_owned()
}

pub async fn signup(app: &Router, username: &str) -> serde_json::Value {
    let response = post_json(
        app,
        "/api/signup",
        serde_json::json!({ "username": username, "password": PASSWORD }),
        None,
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await
}

/// Log in and return the cookie to send on later requests.
pub async fn login(app: &Router, username: &str) -> String {
    let response = post_json(
        app,
        "/api/login",
        serde_json::json!({ "username": username, "password": PASSWORD }),
        None,
    )
    .await;
    assert_eq!(response.status(), 200);
    let set_cookie = session_set_cookie(&response).expect("login sets a session cookie");
    cookie_pair(&set_cookie)
}

/// Sign up, promote in the store, then log in.
pub async fn admin_cookie(state: &AppState, app: &Router, username: &str) -> String {
    let user = signup(app, username).await;
    let id = user["id"].as_i64().unwrap();
    assert!(state.db.set_admin(id, true).unwrap());
    login(app, username).await
}

pub fn new_post_body(title: &str, room: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "Left after the lecture",
        "room": room,
        "image_url": "https://img.test/umbrella.png",
        "item_type": "lost",
    })
}
