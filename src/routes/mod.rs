mod api;
mod auth;
mod dashboard;
mod dictionary;
mod health;
mod pages;

use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::middleware;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{delete, get, post};
use axum::Router;

use crate::cookies::CookieOptions;
use crate::flash::{self, Toast};
use crate::middleware::auth::{optional_session, require_api_session, require_page_session};
use crate::response::AppError;
use crate::state::AppState;
use crate::views;

pub fn router(state: AppState) -> Router {
    let public_pages = Router::new()
        .route("/", get(pages::index))
        .route("/auth", get(auth::auth_page))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signout", post(auth::sign_out))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_session));

    let member_pages = Router::new()
        .route("/dashboard", get(dashboard::show))
        .route(
            "/dashboard/new",
            get(dashboard::new_word_form).post(dashboard::submit_word),
        )
        .route("/dictionary", get(dictionary::show))
        .route("/dictionary/:id/delete", post(dictionary::delete_word))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_page_session));

    let api = Router::new()
        .route("/session", get(api::session))
        .route("/words", get(api::list_words).post(api::create_word))
        .route("/words/:id", delete(api::delete_word))
        .route("/stats", get(api::stats))
        .route("/dictionary", get(api::dictionary))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_session))
        .fallback(api_fallback);

    Router::new()
        .merge(public_pages)
        .merge(member_pages)
        .nest("/api", api)
        .nest("/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn api_fallback() -> Response {
    AppError::not_found("Route not found").into_response()
}

async fn fallback_handler(uri: Uri) -> Response {
    if uri.path().starts_with("/api/") {
        return api_fallback().await;
    }
    tracing::debug!(path = %uri.path(), "no page for path");
    (StatusCode::NOT_FOUND, Html(views::pages::not_found_page())).into_response()
}

/// HTML response that also consumes a pending flash toast cookie.
pub(crate) fn render(
    status: StatusCode,
    html: String,
    request_headers: &HeaderMap,
    options: CookieOptions,
) -> Response {
    let mut response = (status, Html(html)).into_response();
    flash::consume(request_headers, response.headers_mut(), options);
    response
}

/// POST-redirect-GET with a toast for the next page.
pub(crate) fn redirect_with_toast(to: &str, toast: &Toast, options: CookieOptions) -> Response {
    let mut response = Redirect::to(to).into_response();
    if let Some(cookie) = flash::set_cookie(toast, options) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}
