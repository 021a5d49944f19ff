use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use super::{redirect_with_toast, render};
use crate::cookies;
use crate::flash::{self, Toast};
use crate::session::{SessionError, SessionSnapshot, SignUpResult};
use crate::state::AppState;
use crate::views::pages::{auth_page as render_auth_page, AuthTab};
use crate::vocab::Credentials;

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    tab: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl From<CredentialsForm> for Credentials {
    fn from(form: CredentialsForm) -> Self {
        Credentials {
            email: form.email,
            password: form.password,
        }
    }
}

pub async fn auth_page(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
    session: Option<Extension<SessionSnapshot>>,
) -> Response {
    if session.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    let tab = AuthTab::from_query(query.tab.as_deref());
    let toast = flash::peek(&headers);
    render(
        StatusCode::OK,
        render_auth_page(tab, "", toast.as_ref()),
        &headers,
        state.cookie_options(),
    )
}

pub async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let credentials = Credentials::from(form);
    let options = state.cookie_options();

    match state.auth().sign_in(&credentials).await {
        Ok((token, _snapshot)) => {
            let toast = Toast::success("ログイン成功！", "日本語学習を続けましょう。");
            let mut response = redirect_with_toast("/dashboard", &toast, options);
            if let Some(cookie) = cookies::session_cookie(&token, options) {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            response
        }
        Err(err) => {
            let status = match &err {
                SessionError::Validation(_) => StatusCode::BAD_REQUEST,
                SessionError::Backend(backend) => {
                    tracing::warn!(error = %backend, operation = "sign_in", "sign-in failed");
                    StatusCode::UNAUTHORIZED
                }
            };
            let toast = Toast::error("エラー", failure_message(&err, "ログインに失敗しました。"));
            render(
                status,
                render_auth_page(AuthTab::SignIn, &credentials.email, Some(&toast)),
                &headers,
                options,
            )
        }
    }
}

pub async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let credentials = Credentials::from(form);
    let options = state.cookie_options();
    let redirect_to = state.config().sign_up_redirect();

    match state.auth().sign_up(&credentials, &redirect_to).await {
        Ok(SignUpResult::PendingConfirmation { .. }) => {
            let toast = Toast::success("Account Created!", "Check your email to complete registration.");
            render(
                StatusCode::OK,
                render_auth_page(AuthTab::SignIn, &credentials.email, Some(&toast)),
                &headers,
                options,
            )
        }
        Ok(SignUpResult::SignedIn { token, .. }) => {
            let toast = Toast::success("Account Created!", "Welcome to Bunko.");
            let mut response = redirect_with_toast("/dashboard", &toast, options);
            if let Some(cookie) = cookies::session_cookie(&token, options) {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            response
        }
        Err(err) => {
            let status = match &err {
                SessionError::Validation(_) => StatusCode::BAD_REQUEST,
                SessionError::Backend(backend) => {
                    tracing::warn!(error = %backend, operation = "sign_up", "sign-up failed");
                    StatusCode::BAD_REQUEST
                }
            };
            let toast = Toast::error("Error", failure_message(&err, "Failed to create account."));
            render(
                status,
                render_auth_page(AuthTab::SignUp, &credentials.email, Some(&toast)),
                &headers,
                options,
            )
        }
    }
}

pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = cookies::extract_token(&headers) {
        state.auth().sign_out(&token).await;
    }

    let mut response = Redirect::to("/").into_response();
    if let Some(cookie) = cookies::clear_session_cookie(state.cookie_options()) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// Message shown to the user: validation text as-is, the service's own
/// message when it sent one, otherwise `fallback`.
fn failure_message(err: &SessionError, fallback: &str) -> String {
    match err {
        SessionError::Validation(err) => err.to_string(),
        SessionError::Backend(err) => err.service_message().unwrap_or_else(|| fallback.to_string()),
    }
}
