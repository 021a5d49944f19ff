use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;

use super::render;
use crate::session::SessionSnapshot;
use crate::state::AppState;
use crate::views::pages::{landing_page, loading_page};

pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    session: Option<Extension<SessionSnapshot>>,
) -> Response {
    if state.auth().is_loading() {
        return render(StatusCode::OK, loading_page(), &headers, state.cookie_options());
    }

    if session.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    render(StatusCode::OK, landing_page(), &headers, state.cookie_options())
}
