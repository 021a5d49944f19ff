use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use bunko::backend::memory::InMemoryBackend;
use bunko::backend::{AuthService, AuthSession, AuthUser, BackendError, SignUpOutcome};
use bunko::session::{hash_token, AuthContext, AuthEvent, SessionError, SignUpResult};
use bunko::vocab::Credentials;
use bunko::workers::cleanup_idle_sessions;

/// Delays refreshes so concurrent requests overlap.
struct SlowRefresh(InMemoryBackend);

#[async_trait]
impl AuthService for SlowRefresh {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, BackendError> {
        self.0.sign_up(email, password, redirect_to).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        self.0.sign_in_with_password(email, password).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        self.0.refresh_session(refresh_token).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        self.0.sign_out(access_token).await
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        self.0.get_user(access_token).await
    }

    fn provider(&self) -> &'static str {
        "slow"
    }
}

fn credentials(email: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: "secret123".to_string(),
    }
}

async fn signed_up(auth: &AuthContext, email: &str) -> String {
    match auth.sign_up(&credentials(email), "http://localhost:3000/").await {
        Ok(SignUpResult::SignedIn { token, .. }) => token,
        Ok(SignUpResult::PendingConfirmation { .. }) => panic!("expected auto-confirmed sign-up"),
        Err(err) => panic!("sign-up failed: {err}"),
    }
}

#[tokio::test]
async fn test_start_and_stop_toggle_loading() {
    let auth = AuthContext::new(Arc::new(InMemoryBackend::new()), Duration::hours(1));
    assert!(auth.is_loading());

    auth.start().await;
    assert!(!auth.is_loading());

    auth.stop().await;
    assert!(auth.is_loading());
}

#[tokio::test]
async fn test_sign_in_events_and_current() {
    let auth = AuthContext::new(Arc::new(InMemoryBackend::new()), Duration::hours(1));
    let mut events = auth.subscribe();

    let token = signed_up(&auth, "mei@example.com").await;
    let snapshot = auth.current(&token).await.unwrap();

    assert_eq!(snapshot.user.email, "mei@example.com");
    assert_eq!(
        events.recv().await.unwrap(),
        AuthEvent::SignedIn {
            user_id: snapshot.user.id.clone()
        }
    );

    auth.sign_out(&token).await;
    assert!(auth.current(&token).await.is_none());
    assert_eq!(
        events.recv().await.unwrap(),
        AuthEvent::SignedOut {
            user_id: snapshot.user.id
        }
    );
}

#[tokio::test]
async fn test_wrong_password_surfaces_backend_error() {
    let auth = AuthContext::new(Arc::new(InMemoryBackend::new()), Duration::hours(1));
    signed_up(&auth, "kei@example.com").await;

    let mut wrong = credentials("kei@example.com");
    wrong.password = "not-it".to_string();

    match auth.sign_in(&wrong).await {
        Err(SessionError::Backend(err)) => {
            assert_eq!(err.service_message().as_deref(), Some("Invalid login credentials"));
        }
        other => panic!("unexpected result: {:?}", other.map(|(token, _)| token)),
    }
}

#[tokio::test]
async fn test_access_token_near_expiry_is_refreshed() {
    let backend = Arc::new(InMemoryBackend::new().with_token_ttl(Duration::seconds(30)));
    let auth = AuthContext::new(backend.clone(), Duration::hours(1));
    let token = signed_up(&auth, "rin@example.com").await;
    let mut events = auth.subscribe();

    let snapshot = auth.current(&token).await.unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        AuthEvent::TokenRefreshed {
            user_id: snapshot.user.id.clone()
        }
    );
    // The renewed access token works against the backend.
    let user = backend.get_user(&snapshot.scope().access_token).await.unwrap();
    assert_eq!(user.id, snapshot.user.id);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_refresh() {
    let backend = SlowRefresh(InMemoryBackend::new().with_token_ttl(Duration::seconds(30)));
    let auth = AuthContext::new(Arc::new(backend), Duration::hours(1));
    let token = signed_up(&auth, "twin@example.com").await;
    let mut events = auth.subscribe();

    let (first, second) = tokio::join!(auth.current(&token), auth.current(&token));
    let first = first.expect("first request keeps the session");
    let second = second.expect("second request keeps the session");

    assert_eq!(first.scope().access_token, second.scope().access_token);
    assert!(matches!(events.try_recv(), Ok(AuthEvent::TokenRefreshed { .. })));
    assert!(events.try_recv().is_err());

    assert!(auth.current(&token).await.is_some());
    assert_eq!(auth.session_count(), 1);
}

#[tokio::test]
async fn test_huge_idle_ttl_never_expires() {
    let auth = AuthContext::new(Arc::new(InMemoryBackend::new()), Duration::MAX);
    let token = signed_up(&auth, "forever@example.com").await;

    assert!(auth.current(&token).await.is_some());
    assert_eq!(auth.sweep_idle(Utc::now()), 0);
}

#[tokio::test]
async fn test_confirm_user_reads_service_user() {
    let auth = AuthContext::new(Arc::new(InMemoryBackend::new()), Duration::hours(1));
    let token = signed_up(&auth, "who@example.com").await;
    let snapshot = auth.current(&token).await.unwrap();

    let confirmed = auth.confirm_user(snapshot.clone()).await.unwrap();
    assert_eq!(confirmed.user.id, snapshot.user.id);

    auth.sign_out(&token).await;
    assert!(auth.confirm_user(snapshot).await.is_err());
}

#[tokio::test]
async fn test_rejected_refresh_drops_session() {
    let backend = Arc::new(InMemoryBackend::new().with_token_ttl(Duration::seconds(30)));
    let auth = AuthContext::new(backend.clone(), Duration::hours(1));
    let token = signed_up(&auth, "yui@example.com").await;

    let snapshot = auth.current(&token).await.unwrap();
    backend.sign_out(&snapshot.scope().access_token).await.unwrap();

    assert!(auth.current(&token).await.is_none());
    assert_eq!(auth.session_count(), 0);
}

#[tokio::test]
async fn test_idle_session_expires() {
    let auth = AuthContext::new(Arc::new(InMemoryBackend::new()), Duration::milliseconds(5));
    let token = signed_up(&auth, "idle@example.com").await;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert!(auth.current(&token).await.is_none());
    assert_eq!(auth.session_count(), 0);
}

#[tokio::test]
async fn test_sweep_removes_only_idle_sessions() {
    let auth = Arc::new(AuthContext::new(Arc::new(InMemoryBackend::new()), Duration::hours(1)));
    signed_up(&auth, "a@example.com").await;
    signed_up(&auth, "b@example.com").await;

    assert_eq!(auth.sweep_idle(Utc::now()), 0);
    assert_eq!(auth.session_count(), 2);

    assert_eq!(auth.sweep_idle(Utc::now() + Duration::hours(2)), 2);
    assert_eq!(auth.session_count(), 0);
}

#[tokio::test]
async fn test_cleanup_worker_sweeps_expired_sessions() {
    let auth = Arc::new(AuthContext::new(
        Arc::new(InMemoryBackend::new()),
        Duration::milliseconds(5),
    ));
    signed_up(&auth, "worker@example.com").await;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    cleanup_idle_sessions(Arc::clone(&auth));

    assert_eq!(auth.session_count(), 0);
}

#[test]
fn test_session_key_is_not_the_token() {
    let key = hash_token("browser-token");
    assert_eq!(key.len(), 64);
    assert_ne!(key, "browser-token");
    assert_eq!(key, hash_token("browser-token"));
}
