use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;

use super::{redirect_with_toast, render};
use crate::flash::{self, Toast};
use crate::session::SessionSnapshot;
use crate::state::AppState;
use crate::views::pages::dictionary_page;
use crate::vocab::{group_words, WordQuery};

pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<SessionSnapshot>,
    headers: HeaderMap,
) -> Response {
    let scope = session.scope();
    let mut toast = flash::peek(&headers);

    let words = match state.store().list_words(&scope, &WordQuery::by_headword()).await {
        Ok(words) => words,
        Err(err) => {
            tracing::warn!(error = %err, user_id = %scope.user_id, operation = "list_words", "failed to fetch dictionary");
            toast = Some(Toast::error("Error", "Failed to fetch words."));
            Vec::new()
        }
    };

    let index = group_words(words);
    render(
        StatusCode::OK,
        dictionary_page(&index, toast.as_ref()),
        &headers,
        state.cookie_options(),
    )
}

pub async fn delete_word(
    State(state): State<AppState>,
    Extension(session): Extension<SessionSnapshot>,
    Path(id): Path<String>,
) -> Response {
    let scope = session.scope();
    match state.store().delete_word(&scope, &id).await {
        Ok(true) => {
            tracing::info!(user_id = %scope.user_id, word_id = %id, "word deleted");
            Redirect::to("/dictionary").into_response()
        }
        Ok(false) => {
            tracing::debug!(user_id = %scope.user_id, word_id = %id, "delete matched no word");
            Redirect::to("/dictionary").into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, user_id = %scope.user_id, word_id = %id, operation = "delete_word", "failed to delete word");
            redirect_with_toast(
                "/dictionary",
                &Toast::error("Error", "Failed to delete word."),
                state.cookie_options(),
            )
        }
    }
}
