use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::response::{ok, AppError};
use crate::session::SessionSnapshot;
use crate::state::AppState;
use crate::vocab::stats::count_since;
use crate::vocab::{group_words, ProgressStats, WordDraft, WordQuery};

pub async fn session(
    State(state): State<AppState>,
    Extension(session): Extension<SessionSnapshot>,
) -> Result<Response, AppError> {
    let user_id = session.user.id.clone();
    let session = state.auth().confirm_user(session).await.map_err(|err| {
        tracing::warn!(error = %err, %user_id, operation = "session", "failed to confirm user");
        AppError::from_backend(&err, "Session expired, please sign in again")
    })?;
    Ok(ok(session).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ListWordsQuery {
    since: Option<String>,
    order: Option<String>,
}

impl ListWordsQuery {
    fn into_word_query(self, state: &AppState) -> Result<WordQuery, AppError> {
        let mut query = match self.order.as_deref() {
            None | Some("newest") => WordQuery::newest_first(),
            Some("headword") => WordQuery::by_headword(),
            Some(other) => {
                return Err(AppError::validation(format!("unknown order: {other}")));
            }
        };

        match self.since.as_deref() {
            None => {}
            Some("today") => query = query.since(state.config().day_boundary.today_start()),
            Some(raw) => {
                let since = chrono::DateTime::parse_from_rfc3339(raw)
                    .map_err(|_| AppError::validation("since must be 'today' or an RFC 3339 timestamp"))?;
                query = query.since(since.with_timezone(&chrono::Utc));
            }
        }

        Ok(query)
    }
}

pub async fn list_words(
    State(state): State<AppState>,
    Extension(session): Extension<SessionSnapshot>,
    Query(params): Query<ListWordsQuery>,
) -> Result<Response, AppError> {
    let query = params.into_word_query(&state)?;
    let scope = session.scope();
    let words = state
        .store()
        .list_words(&scope, &query)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, user_id = %scope.user_id, operation = "list_words", "failed to fetch words");
            AppError::from_backend(&err, "Failed to fetch words.")
        })?;

    Ok(ok(words).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CreateWordRequest {
    word: String,
    #[serde(default)]
    reading: Option<String>,
    #[serde(default)]
    meaning: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl From<CreateWordRequest> for WordDraft {
    fn from(request: CreateWordRequest) -> Self {
        let mut draft = WordDraft {
            word: request.word,
            reading: request.reading.unwrap_or_default(),
            meaning: request.meaning.unwrap_or_default(),
            tags: Vec::new(),
        };
        for tag in &request.tags {
            draft.add_tag(tag);
        }
        draft
    }
}

pub async fn create_word(
    State(state): State<AppState>,
    Extension(session): Extension<SessionSnapshot>,
    Json(payload): Json<CreateWordRequest>,
) -> Result<Response, AppError> {
    let valid = WordDraft::from(payload).validate()?;
    let scope = session.scope();

    let word = state
        .store()
        .insert_word(&scope, valid)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, user_id = %scope.user_id, operation = "insert_word", "failed to add word");
            AppError::from_backend(&err, "Failed to add word.")
        })?;

    Ok((StatusCode::CREATED, ok(word)).into_response())
}

#[derive(Serialize)]
struct DeleteResult {
    removed: bool,
}

pub async fn delete_word(
    State(state): State<AppState>,
    Extension(session): Extension<SessionSnapshot>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let scope = session.scope();
    let removed = state
        .store()
        .delete_word(&scope, &id)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, user_id = %scope.user_id, word_id = %id, operation = "delete_word", "failed to delete word");
            AppError::from_backend(&err, "Failed to delete word.")
        })?;

    Ok(ok(DeleteResult { removed }).into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(flatten)]
    stats: ProgressStats,
    mastery_rate: u32,
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(session): Extension<SessionSnapshot>,
) -> Result<Response, AppError> {
    let scope = session.scope();
    let since = state.config().day_boundary.today_start();

    let all = state
        .store()
        .list_words(&scope, &WordQuery::newest_first())
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, user_id = %scope.user_id, operation = "stats", "failed to fetch words");
            AppError::from_backend(&err, "Failed to fetch words.")
        })?;

    let mut stats = ProgressStats::compute(&all, &[]);
    stats.words_today = count_since(&all, since);
    Ok(ok(StatsResponse {
        mastery_rate: stats.mastery_rate(),
        stats,
    })
    .into_response())
}

pub async fn dictionary(
    State(state): State<AppState>,
    Extension(session): Extension<SessionSnapshot>,
) -> Result<Response, AppError> {
    let scope = session.scope();
    let words = state
        .store()
        .list_words(&scope, &WordQuery::by_headword())
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, user_id = %scope.user_id, operation = "dictionary", "failed to fetch words");
            AppError::from_backend(&err, "Failed to fetch words.")
        })?;

    Ok(ok(group_words(words)).into_response())
}
