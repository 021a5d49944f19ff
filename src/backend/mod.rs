//! Seams to the hosted backend: the auth service and the `words` table.

pub mod hosted;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vocab::{ValidDraft, Word, WordQuery};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The service sent a confirmation mail; the user cannot sign in yet.
    PendingConfirmation { user: AuthUser },
    /// The service confirmed the account immediately.
    SignedIn(AuthSession),
}

/// Who a table call is made for. Every query is constrained by `user_id`, and the
/// bearer token lets the service enforce row-level security on its side.
#[derive(Debug, Clone)]
pub struct AccessScope {
    pub user_id: String,
    pub access_token: String,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("Email not confirmed")]
    EmailNotConfirmed,
    #[error("User already registered")]
    UserAlreadyRegistered,
    #[error("Invalid or expired session")]
    InvalidSession,
}

impl BackendError {
    /// The message the service itself returned, if any. Used as the toast text
    /// for auth failures.
    pub fn service_message(&self) -> Option<String> {
        match self {
            BackendError::Service { message, .. } if !message.trim().is_empty() => {
                Some(message.clone())
            }
            BackendError::InvalidCredentials
            | BackendError::EmailNotConfirmed
            | BackendError::UserAlreadyRegistered
            | BackendError::InvalidSession => Some(self.to_string()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        match self {
            BackendError::InvalidCredentials | BackendError::InvalidSession => true,
            BackendError::Service { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, BackendError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError>;

    /// Short name for logs and `/health/info`.
    fn provider(&self) -> &'static str;
}

#[async_trait]
pub trait WordStore: Send + Sync {
    async fn list_words(
        &self,
        scope: &AccessScope,
        query: &WordQuery,
    ) -> Result<Vec<Word>, BackendError>;

    async fn insert_word(&self, scope: &AccessScope, draft: ValidDraft)
        -> Result<Word, BackendError>;

    /// Removes the row only if it belongs to `scope.user_id`. `Ok(false)` when
    /// nothing matched.
    async fn delete_word(&self, scope: &AccessScope, id: &str) -> Result<bool, BackendError>;
}
