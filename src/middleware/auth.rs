use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::cookies;
use crate::response::json_error;
use crate::session::SessionSnapshot;
use crate::state::AppState;

async fn resolve(state: &AppState, token: Option<String>) -> Option<SessionSnapshot> {
    let token = token?;
    state.auth().current(&token).await
}

/// Browser routes: unauthenticated visitors go to the auth screen, and a stale
/// session cookie is cleared on the way.
pub async fn require_page_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let presented = cookies::extract_token(req.headers());
    let had_token = presented.is_some();

    match resolve(&state, presented).await {
        Some(snapshot) => {
            req.extensions_mut().insert(snapshot);
            next.run(req).await
        }
        None => {
            let mut response = Redirect::to("/auth").into_response();
            if had_token {
                if let Some(cookie) = cookies::clear_session_cookie(state.cookie_options()) {
                    response.headers_mut().append(header::SET_COOKIE, cookie);
                }
            }
            response
        }
    }
}

pub async fn require_api_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(presented) = cookies::extract_token(req.headers()) else {
        return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Missing session token")
            .into_response();
    };

    match resolve(&state, Some(presented)).await {
        Some(snapshot) => {
            req.extensions_mut().insert(snapshot);
            next.run(req).await
        }
        None => json_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Session expired, please sign in again",
        )
        .into_response(),
    }
}

pub async fn optional_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let presented = cookies::extract_token(req.headers());
    if let Some(snapshot) = resolve(&state, presented).await {
        req.extensions_mut().insert(snapshot);
    }

    next.run(req).await
}
