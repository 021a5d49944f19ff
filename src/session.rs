//! Process-wide authentication context.
//!
//! Browsers hold an opaque session token in a cookie; the hosted access and
//! refresh tokens never leave the server. Sessions are keyed by the SHA-256 of
//! the browser token so a leaked session table does not leak usable cookies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::{
    AccessScope, AuthService, AuthSession, AuthUser, BackendError, SignUpOutcome,
};
use crate::vocab::{Credentials, ValidationError};

pub const SESSION_COOKIE: &str = "bunko_session";

/// Access tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user_id: String },
    SignedOut { user_id: String },
    TokenRefreshed { user_id: String },
    Expired { user_id: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Read-only view of a signed-in session handed to request handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: AuthUser,
    pub access_expires_at: DateTime<Utc>,
    #[serde(skip)]
    access_token: String,
}

impl SessionSnapshot {
    pub fn scope(&self) -> AccessScope {
        AccessScope {
            user_id: self.user.id.clone(),
            access_token: self.access_token.clone(),
        }
    }
}

pub enum SignUpResult {
    PendingConfirmation { email: String },
    SignedIn { token: String, snapshot: SessionSnapshot },
}

#[derive(Debug, Clone)]
struct StoredSession {
    user: AuthUser,
    access_token: String,
    refresh_token: Option<String>,
    access_expires_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    refresh_lock: Arc<Mutex<()>>,
}

impl StoredSession {
    fn from_auth(session: AuthSession) -> Self {
        Self {
            user: session.user,
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            access_expires_at: session.expires_at,
            last_seen: Utc::now(),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            access_expires_at: self.access_expires_at,
            access_token: self.access_token.clone(),
        }
    }

    fn idle_expired(&self, idle_ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        // A deadline past the representable range never expires.
        self.last_seen
            .checked_add_signed(idle_ttl)
            .is_some_and(|deadline| deadline < now)
    }

    fn refresh_due(&self, now: DateTime<Utc>) -> bool {
        self.access_expires_at
            .checked_sub_signed(chrono::Duration::seconds(REFRESH_MARGIN_SECS))
            .map_or(true, |due| due <= now)
    }
}

enum Lookup {
    Fresh(SessionSnapshot),
    RefreshDue {
        lock: Arc<Mutex<()>>,
        refresh_token: String,
        snapshot: SessionSnapshot,
    },
    Gone,
}

pub struct AuthContext {
    auth: Arc<dyn AuthService>,
    sessions: RwLock<HashMap<String, StoredSession>>,
    events: broadcast::Sender<AuthEvent>,
    idle_ttl: chrono::Duration,
    ready: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl AuthContext {
    pub fn new(auth: Arc<dyn AuthService>, idle_ttl: chrono::Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            auth,
            sessions: RwLock::new(HashMap::new()),
            events,
            idle_ttl,
            ready: AtomicBool::new(false),
            listener: Mutex::new(None),
            shutdown_tx,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.auth.provider()
    }

    /// True until [`AuthContext::start`] has run.
    pub fn is_loading(&self) -> bool {
        !self.ready.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Subscribes to session changes and marks the context ready.
    pub async fn start(&self) {
        let mut events = self.events.subscribe();
        let mut shutdown = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    event = events.recv() => match event {
                        Ok(event) => log_event(&event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "auth event listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        *self.listener.lock().await = Some(handle);
        self.ready.store(true, Ordering::Release);
        tracing::info!(provider = self.provider(), "auth context started");
    }

    /// Tears down the subscription started by [`AuthContext::start`].
    pub async fn stop(&self) {
        self.ready.store(false, Ordering::Release);
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.listener.lock().await.take() {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "auth event listener ended abnormally");
            }
        }
        tracing::info!("auth context stopped");
    }

    pub async fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> Result<(String, SessionSnapshot), SessionError> {
        credentials.validate_sign_in()?;
        let session = self
            .auth
            .sign_in_with_password(credentials.email.trim(), &credentials.password)
            .await?;
        Ok(self.open_session(session))
    }

    pub async fn sign_up(
        &self,
        credentials: &Credentials,
        redirect_to: &str,
    ) -> Result<SignUpResult, SessionError> {
        credentials.validate_sign_up()?;
        let outcome = self
            .auth
            .sign_up(credentials.email.trim(), &credentials.password, redirect_to)
            .await?;

        Ok(match outcome {
            SignUpOutcome::PendingConfirmation { user } => {
                tracing::info!(user_id = %user.id, "sign-up pending email confirmation");
                SignUpResult::PendingConfirmation { email: user.email }
            }
            SignUpOutcome::SignedIn(session) => {
                let (token, snapshot) = self.open_session(session);
                SignUpResult::SignedIn { token, snapshot }
            }
        })
    }

    /// Drops the local session and revokes it at the service. Service failures
    /// are logged only; the browser is signed out either way.
    pub async fn sign_out(&self, token: &str) {
        let removed = self.sessions.write().remove(&hash_token(token));
        let Some(session) = removed else {
            return;
        };

        if let Err(err) = self.auth.sign_out(&session.access_token).await {
            tracing::warn!(error = %err, user_id = %session.user.id, "hosted sign-out failed");
        }
        self.emit(AuthEvent::SignedOut {
            user_id: session.user.id,
        });
    }

    /// Resolves a browser token, refreshing the hosted access token when it is
    /// about to expire. `None` when the token is unknown, idle too long, or the
    /// refresh was rejected.
    ///
    /// Refreshes are serialized per session: concurrent requests wait for the
    /// one in flight and reuse its tokens.
    pub async fn current(&self, token: &str) -> Option<SessionSnapshot> {
        let key = hash_token(token);

        let (lock, seen_refresh_token) = match self.lookup(&key) {
            Lookup::Fresh(snapshot) => return Some(snapshot),
            Lookup::Gone => return None,
            Lookup::RefreshDue {
                lock,
                refresh_token,
                ..
            } => (lock, refresh_token),
        };
        let _guard = lock.lock().await;

        let refresh_token = match self.lookup(&key) {
            Lookup::Fresh(snapshot) => return Some(snapshot),
            Lookup::Gone => return None,
            // Renewed by the request that held the lock before us.
            Lookup::RefreshDue {
                refresh_token,
                snapshot,
                ..
            } if refresh_token != seen_refresh_token => return Some(snapshot),
            Lookup::RefreshDue { refresh_token, .. } => refresh_token,
        };

        match self.auth.refresh_session(&refresh_token).await {
            Ok(renewed) => {
                let mut sessions = self.sessions.write();
                let session = sessions.get_mut(&key)?;
                session.access_token = renewed.access_token;
                session.refresh_token = renewed.refresh_token.or(Some(refresh_token));
                session.access_expires_at = renewed.expires_at;
                let snapshot = session.snapshot();
                drop(sessions);
                self.emit(AuthEvent::TokenRefreshed {
                    user_id: snapshot.user.id.clone(),
                });
                Some(snapshot)
            }
            Err(err) => {
                tracing::warn!(error = %err, "session refresh failed");
                let mut sessions = self.sessions.write();
                let superseded = sessions
                    .get(&key)
                    .is_some_and(|session| session.refresh_token.as_deref() != Some(&refresh_token));
                if superseded {
                    return sessions.get(&key).map(StoredSession::snapshot);
                }
                let removed = sessions.remove(&key);
                drop(sessions);
                if let Some(session) = removed {
                    self.emit(AuthEvent::Expired {
                        user_id: session.user.id,
                    });
                }
                None
            }
        }
    }

    /// Re-reads the signed-in user from the auth service.
    pub async fn confirm_user(
        &self,
        snapshot: SessionSnapshot,
    ) -> Result<SessionSnapshot, BackendError> {
        let user = self.auth.get_user(&snapshot.access_token).await?;
        Ok(SessionSnapshot { user, ..snapshot })
    }

    fn lookup(&self, key: &str) -> Lookup {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let Some(session) = sessions.get_mut(key) else {
            return Lookup::Gone;
        };

        if session.idle_expired(self.idle_ttl, now) {
            let user_id = session.user.id.clone();
            sessions.remove(key);
            drop(sessions);
            self.emit(AuthEvent::Expired { user_id });
            return Lookup::Gone;
        }

        session.last_seen = now;
        if !session.refresh_due(now) {
            return Lookup::Fresh(session.snapshot());
        }

        match session.refresh_token.clone() {
            Some(refresh_token) => Lookup::RefreshDue {
                lock: Arc::clone(&session.refresh_lock),
                refresh_token,
                snapshot: session.snapshot(),
            },
            None => {
                let user_id = session.user.id.clone();
                sessions.remove(key);
                drop(sessions);
                self.emit(AuthEvent::Expired { user_id });
                Lookup::Gone
            }
        }
    }

    /// Removes sessions idle for longer than the configured TTL.
    pub fn sweep_idle(&self, now: DateTime<Utc>) -> usize {
        let mut expired = Vec::new();
        self.sessions.write().retain(|_, session| {
            let alive = !session.idle_expired(self.idle_ttl, now);
            if !alive {
                expired.push(session.user.id.clone());
            }
            alive
        });

        let count = expired.len();
        for user_id in expired {
            self.emit(AuthEvent::Expired { user_id });
        }
        count
    }

    fn open_session(&self, session: AuthSession) -> (String, SessionSnapshot) {
        let token = new_session_token();
        let stored = StoredSession::from_auth(session);
        let snapshot = stored.snapshot();
        self.sessions.write().insert(hash_token(&token), stored);
        self.emit(AuthEvent::SignedIn {
            user_id: snapshot.user.id.clone(),
        });
        (token, snapshot)
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine; the listener only runs between start and stop.
        let _ = self.events.send(event);
    }
}

fn log_event(event: &AuthEvent) {
    match event {
        AuthEvent::SignedIn { user_id } => tracing::info!(%user_id, "signed in"),
        AuthEvent::SignedOut { user_id } => tracing::info!(%user_id, "signed out"),
        AuthEvent::TokenRefreshed { user_id } => tracing::debug!(%user_id, "access token refreshed"),
        AuthEvent::Expired { user_id } => tracing::info!(%user_id, "session expired"),
    }
}

fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
