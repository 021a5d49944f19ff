use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::{Extension, Form};

use super::{redirect_with_toast, render};
use crate::flash::{self, Toast};
use crate::session::SessionSnapshot;
use crate::state::AppState;
use crate::views::pages::{add_word_page, dashboard_page, DashboardView};
use crate::vocab::{DraftAction, ProgressStats, WordDraft, WordQuery};

pub async fn show(
    State(state): State<AppState>,
    Extension(session): Extension<SessionSnapshot>,
    headers: HeaderMap,
) -> Response {
    let scope = session.scope();
    let store = state.store();
    let all_query = WordQuery::newest_first();
    let today_query = WordQuery::newest_first().since(state.config().day_boundary.today_start());

    let (all, today) = tokio::join!(
        store.list_words(&scope, &all_query),
        store.list_words(&scope, &today_query),
    );

    let mut toast = flash::peek(&headers);
    let all = match all {
        Ok(words) => words,
        Err(err) => {
            tracing::warn!(error = %err, user_id = %scope.user_id, operation = "list_words", "failed to fetch words");
            toast = Some(Toast::error("Error", "Failed to fetch words."));
            Vec::new()
        }
    };
    let today = today.unwrap_or_else(|err| {
        tracing::warn!(error = %err, user_id = %scope.user_id, operation = "list_today_words", "failed to fetch today's words");
        Vec::new()
    });

    let view = DashboardView {
        stats: ProgressStats::compute(&all, &today),
        today: &today,
        has_words: !all.is_empty(),
        toast: toast.as_ref(),
    };
    render(StatusCode::OK, dashboard_page(&view), &headers, state.cookie_options())
}

pub async fn new_word_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let toast = flash::peek(&headers);
    render(
        StatusCode::OK,
        add_word_page(&WordDraft::default(), toast.as_ref()),
        &headers,
        state.cookie_options(),
    )
}

/// Every button on the add-word form posts here; only `Save` touches the store.
pub async fn submit_word(
    State(state): State<AppState>,
    Extension(session): Extension<SessionSnapshot>,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let options = state.cookie_options();
    let (draft, action) = WordDraft::from_form(&pairs);

    if action != DraftAction::Save {
        return render(StatusCode::OK, add_word_page(&draft, None), &headers, options);
    }

    let valid = match draft.validate() {
        Ok(valid) => valid,
        Err(err) => {
            let toast = Toast::error("Error", err.to_string());
            return render(
                StatusCode::BAD_REQUEST,
                add_word_page(&draft, Some(&toast)),
                &headers,
                options,
            );
        }
    };

    let scope = session.scope();
    match state.store().insert_word(&scope, valid).await {
        Ok(word) => {
            tracing::info!(user_id = %scope.user_id, word_id = %word.id, "word added");
            redirect_with_toast("/dashboard", &Toast::success("Success!", "New word added."), options)
        }
        Err(err) => {
            tracing::warn!(error = %err, user_id = %scope.user_id, operation = "insert_word", "failed to add word");
            let toast = Toast::error("Error", "Failed to add word.");
            render(
                StatusCode::BAD_GATEWAY,
                add_word_page(&draft, Some(&toast)),
                &headers,
                options,
            )
        }
    }
}
