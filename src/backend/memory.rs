//! In-process stand-in for the hosted backend. Used for local development
//! (`BACKEND_MODE=memory`) and by the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{
    AccessScope, AuthService, AuthSession, AuthUser, BackendError, SignUpOutcome, WordStore,
};
use crate::vocab::{ValidDraft, Word, WordOrder, WordQuery};

const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct UserRecord {
    user: AuthUser,
    password: String,
    confirmed: bool,
}

#[derive(Debug, Clone)]
struct TokenRecord {
    user_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    users_by_email: HashMap<String, UserRecord>,
    access_tokens: HashMap<String, TokenRecord>,
    refresh_tokens: HashMap<String, String>,
    words: Vec<Word>,
}

pub struct InMemoryBackend {
    inner: RwLock<Inner>,
    auto_confirm: bool,
    token_ttl: Duration,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Accounts are usable right after sign-up.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            auto_confirm: true,
            token_ttl: Duration::seconds(ACCESS_TOKEN_TTL_SECS),
        }
    }

    /// Accounts stay pending until [`InMemoryBackend::confirm_email`] is called,
    /// like a hosted project with mail confirmation switched on.
    pub fn with_email_confirmation() -> Self {
        Self {
            auto_confirm: false,
            ..Self::new()
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn confirm_email(&self, email: &str) -> bool {
        let mut inner = self.inner.write();
        match inner.users_by_email.get_mut(&normalize_email(email)) {
            Some(record) => {
                record.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Inserts a row as-is, bypassing validation. Lets tests seed timestamps and
    /// mastery levels the public API never produces.
    pub fn seed_word(&self, word: Word) {
        self.inner.write().words.push(word);
    }

    pub fn word_count(&self) -> usize {
        self.inner.read().words.len()
    }

    pub fn access_token_count(&self) -> usize {
        self.inner.read().access_tokens.len()
    }

    fn issue_session(&self, inner: &mut Inner, user: &AuthUser) -> AuthSession {
        let now = Utc::now();
        inner.access_tokens.retain(|_, token| token.expires_at > now);

        let access_token = Uuid::new_v4().to_string();
        let refresh_token = Uuid::new_v4().to_string();
        let expires_at = now + self.token_ttl;

        inner.access_tokens.insert(
            access_token.clone(),
            TokenRecord {
                user_id: user.id.clone(),
                expires_at,
            },
        );
        inner
            .refresh_tokens
            .insert(refresh_token.clone(), user.id.clone());

        AuthSession {
            access_token,
            refresh_token: Some(refresh_token),
            expires_at,
            user: user.clone(),
        }
    }

    fn authorize(&self, inner: &Inner, scope: &AccessScope) -> Result<(), BackendError> {
        match inner.access_tokens.get(&scope.access_token) {
            Some(token) if token.user_id == scope.user_id && token.expires_at > Utc::now() => {
                Ok(())
            }
            _ => Err(BackendError::Service {
                status: 401,
                code: Some("PGRST301".to_string()),
                message: "JWT expired".to_string(),
            }),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl AuthService for InMemoryBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _redirect_to: &str,
    ) -> Result<SignUpOutcome, BackendError> {
        let email = normalize_email(email);
        let mut inner = self.inner.write();
        if inner.users_by_email.contains_key(&email) {
            return Err(BackendError::UserAlreadyRegistered);
        }

        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
        };
        inner.users_by_email.insert(
            email,
            UserRecord {
                user: user.clone(),
                password: password.to_string(),
                confirmed: self.auto_confirm,
            },
        );

        if self.auto_confirm {
            let session = self.issue_session(&mut inner, &user);
            Ok(SignUpOutcome::SignedIn(session))
        } else {
            Ok(SignUpOutcome::PendingConfirmation { user })
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let mut inner = self.inner.write();
        let record = inner
            .users_by_email
            .get(&normalize_email(email))
            .filter(|record| record.password == password)
            .cloned()
            .ok_or(BackendError::InvalidCredentials)?;

        if !record.confirmed {
            return Err(BackendError::EmailNotConfirmed);
        }

        Ok(self.issue_session(&mut inner, &record.user))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let mut inner = self.inner.write();
        // Refresh tokens are single use.
        let user_id = inner
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(BackendError::InvalidSession)?;
        let user = inner
            .users_by_email
            .values()
            .find(|record| record.user.id == user_id)
            .map(|record| record.user.clone())
            .ok_or(BackendError::InvalidSession)?;

        Ok(self.issue_session(&mut inner, &user))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.write();
        let Some(token) = inner.access_tokens.remove(access_token) else {
            return Err(BackendError::InvalidSession);
        };
        inner
            .refresh_tokens
            .retain(|_, user_id| *user_id != token.user_id);
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        let inner = self.inner.read();
        let token = inner
            .access_tokens
            .get(access_token)
            .filter(|token| token.expires_at > Utc::now())
            .ok_or(BackendError::InvalidSession)?;

        inner
            .users_by_email
            .values()
            .find(|record| record.user.id == token.user_id)
            .map(|record| record.user.clone())
            .ok_or(BackendError::InvalidSession)
    }

    fn provider(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl WordStore for InMemoryBackend {
    async fn list_words(
        &self,
        scope: &AccessScope,
        query: &WordQuery,
    ) -> Result<Vec<Word>, BackendError> {
        let inner = self.inner.read();
        self.authorize(&inner, scope)?;

        let mut words: Vec<Word> = inner
            .words
            .iter()
            .filter(|word| word.user_id == scope.user_id)
            .filter(|word| {
                query
                    .created_since
                    .map_or(true, |since| word.created_at >= since)
            })
            .cloned()
            .collect();

        match query.order {
            Some(WordOrder::NewestFirst) => {
                words.sort_by(|a, b| b.created_at.cmp(&a.created_at))
            }
            Some(WordOrder::Headword) => words.sort_by(|a, b| a.word.cmp(&b.word)),
            None => {}
        }

        Ok(words)
    }

    async fn insert_word(
        &self,
        scope: &AccessScope,
        draft: ValidDraft,
    ) -> Result<Word, BackendError> {
        let mut inner = self.inner.write();
        self.authorize(&inner, scope)?;

        let row = draft.into_new_word(&scope.user_id);
        let word = Word {
            id: Uuid::new_v4().to_string(),
            user_id: row.user_id,
            word: row.word,
            reading: row.reading,
            meaning: row.meaning,
            tags: row.tags,
            mastery_level: row.mastery_level,
            created_at: Utc::now(),
        };
        inner.words.push(word.clone());
        Ok(word)
    }

    async fn delete_word(&self, scope: &AccessScope, id: &str) -> Result<bool, BackendError> {
        let mut inner = self.inner.write();
        self.authorize(&inner, scope)?;

        let before = inner.words.len();
        inner
            .words
            .retain(|word| !(word.id == id && word.user_id == scope.user_id));
        Ok(inner.words.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{MasteryLevel, WordDraft};

    fn scope_of(session: &AuthSession) -> AccessScope {
        AccessScope {
            user_id: session.user.id.clone(),
            access_token: session.access_token.clone(),
        }
    }

    async fn signed_in(backend: &InMemoryBackend, email: &str) -> AuthSession {
        match backend.sign_up(email, "secret1", "/").await.unwrap() {
            SignUpOutcome::SignedIn(session) => session,
            SignUpOutcome::PendingConfirmation { .. } => panic!("expected auto-confirm"),
        }
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let backend = InMemoryBackend::new();
        signed_in(&backend, "a@example.com").await;

        let err = backend
            .sign_in_with_password("a@example.com", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_confirmation_required_before_sign_in() {
        let backend = InMemoryBackend::with_email_confirmation();
        let outcome = backend.sign_up("b@example.com", "secret1", "/").await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::PendingConfirmation { .. }));

        let err = backend
            .sign_in_with_password("b@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::EmailNotConfirmed));

        assert!(backend.confirm_email("B@example.com"));
        assert!(backend
            .sign_in_with_password("b@example.com", "secret1")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_insert_defaults_and_scoped_delete() {
        let backend = InMemoryBackend::new();
        let alice = signed_in(&backend, "alice@example.com").await;
        let bob = signed_in(&backend, "bob@example.com").await;

        let draft = WordDraft::headword("みず").validate().unwrap();
        let word = backend.insert_word(&scope_of(&alice), draft).await.unwrap();
        assert_eq!(word.mastery_level, MasteryLevel::New);
        assert!(word.tags.is_empty());

        let removed = backend.delete_word(&scope_of(&bob), &word.id).await.unwrap();
        assert!(!removed);
        assert_eq!(backend.word_count(), 1);

        let removed = backend.delete_word(&scope_of(&alice), &word.id).await.unwrap();
        assert!(removed);
        assert_eq!(backend.word_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_token_is_single_use() {
        let backend = InMemoryBackend::new();
        let session = signed_in(&backend, "c@example.com").await;
        let refresh = session.refresh_token.clone().unwrap();

        let renewed = backend.refresh_session(&refresh).await.unwrap();
        assert_ne!(renewed.access_token, session.access_token);
        assert!(matches!(
            backend.refresh_session(&refresh).await,
            Err(BackendError::InvalidSession)
        ));
    }

    #[tokio::test]
    async fn test_expired_access_tokens_are_pruned() {
        let backend = InMemoryBackend::new().with_token_ttl(Duration::milliseconds(5));
        let mut session = signed_in(&backend, "e@example.com").await;

        for _ in 0..3 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            let refresh = session.refresh_token.clone().unwrap();
            session = backend.refresh_session(&refresh).await.unwrap();
        }

        assert_eq!(backend.access_token_count(), 1);
    }

    #[tokio::test]
    async fn test_table_calls_reject_foreign_token() {
        let backend = InMemoryBackend::new();
        let alice = signed_in(&backend, "d@example.com").await;
        let forged = AccessScope {
            user_id: "someone-else".to_string(),
            access_token: alice.access_token.clone(),
        };
        let err = backend
            .list_words(&forged, &WordQuery::default())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }
}
