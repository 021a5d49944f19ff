#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use chrono::{DateTime, Utc};
use tower::ServiceExt;

use bunko::backend::memory::InMemoryBackend;
use bunko::config::Config;
use bunko::state::AppState;
use bunko::vocab::{MasteryLevel, Word};

pub const PASSWORD: &str = "secret123";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub backend: Arc<InMemoryBackend>,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(InMemoryBackend::new()).await
}

pub async fn create_test_app_with(backend: InMemoryBackend) -> TestApp {
    let backend = Arc::new(backend);
    let state = AppState::new(Config::default(), backend.clone(), backend.clone());
    state.auth().start().await;

    TestApp {
        app: bunko::build_app(state.clone()),
        state,
        backend,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Signs up through the HTML form and returns the `bunko_session=...` pair.
    pub async fn sign_up(&self, email: &str) -> String {
        let body = format!("email={}&password={PASSWORD}", email.replace('@', "%40"));
        let response = self.send(form_post("/auth/signup", &body, None)).await;
        session_cookie(&response).expect("sign-up should set a session cookie")
    }

    pub async fn user_id(&self, cookie: &str) -> String {
        let response = self.send(get("/api/session", Some(cookie))).await;
        let json = body_json(response).await;
        json["data"]["user"]["id"].as_str().unwrap().to_string()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Response<Body> {
        let body = format!("email={}&password={password}", email.replace('@', "%40"));
        self.send(form_post("/auth/signin", &body, None)).await
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn bearer_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// `name=value` of a cookie the response set, skipping clearing cookies.
pub fn cookie_pair(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|raw| {
        let pair = raw.split(';').next()?.trim().to_string();
        let (key, value) = pair.split_once('=')?;
        (key == name && !value.is_empty()).then_some(pair)
    })
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    cookie_pair(response, "bunko_session")
}

/// Raw token from a `bunko_session=...` pair, for bearer-authenticated calls.
pub fn token_of(cookie: &str) -> &str {
    cookie.split_once('=').map(|(_, value)| value).unwrap_or_default()
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let text = body_string(response).await;
    serde_json::from_str(&text).unwrap()
}

pub fn word(user_id: &str, headword: &str, mastery: MasteryLevel, created_at: DateTime<Utc>) -> Word {
    Word {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        word: headword.to_string(),
        reading: None,
        meaning: None,
        tags: Vec::new(),
        mastery_level: mastery,
        created_at,
    }
}
