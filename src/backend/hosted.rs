//! HTTP client for a GoTrue-compatible auth service and a PostgREST-compatible
//! table API sharing one base URL and public API key.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{
    AccessScope, AuthService, AuthSession, AuthUser, BackendError, SignUpOutcome, WordStore,
};
use crate::vocab::{ValidDraft, Word, WordQuery};

const WORDS_TABLE: &str = "words";
const PGRST_SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct HostedConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout: Duration,
}

impl HostedConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Clone)]
pub struct HostedBackend {
    config: HostedConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        let now = Utc::now();
        let expires_at = self
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| {
                self.expires_in
                    .map(|secs| now + chrono::Duration::seconds(secs))
            })
            .unwrap_or_else(|| now + chrono::Duration::hours(1));

        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Union of the error bodies GoTrue and PostgREST produce.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

impl ErrorBody {
    fn message(&self) -> Option<String> {
        [&self.msg, &self.message, &self.error_description, &self.error]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
            .cloned()
    }

    fn code(&self) -> Option<String> {
        if let Some(code) = self.error_code.as_ref().filter(|v| !v.is_empty()) {
            return Some(code.clone());
        }
        match &self.code {
            Some(serde_json::Value::String(code)) => Some(code.clone()),
            _ => None,
        }
    }
}

impl HostedBackend {
    pub fn new(config: HostedConfig) -> Result<Self, BackendError> {
        if config.url.is_empty() {
            return Err(BackendError::NotConfigured("SUPABASE_URL"));
        }
        if config.anon_key.trim().is_empty() {
            return Err(BackendError::NotConfigured("SUPABASE_ANON_KEY"));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.anon_key)
            .map_err(|_| BackendError::NotConfigured("SUPABASE_ANON_KEY"))?;
        headers.insert("apikey", key);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url, table)
    }

    /// Anonymous auth calls authenticate with the public key itself.
    fn anon(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.config.anon_key)
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, BackendError> {
        let response = builder.send().await?;
        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| {
            tracing::warn!(error = %err, body = %String::from_utf8_lossy(&bytes), "hosted backend response decode failed");
            BackendError::Decode(err.to_string())
        })
    }

    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        Err(classify_error(status.as_u16(), &body, &text))
    }
}

fn classify_error(status: u16, body: &ErrorBody, raw: &str) -> BackendError {
    let code = body.code();
    let message = body.message().unwrap_or_else(|| raw.trim().to_string());

    match code.as_deref() {
        Some("invalid_credentials") => return BackendError::InvalidCredentials,
        Some("email_not_confirmed") => return BackendError::EmailNotConfirmed,
        Some("user_already_exists") => return BackendError::UserAlreadyRegistered,
        _ => {}
    }

    match message.as_str() {
        "Invalid login credentials" => BackendError::InvalidCredentials,
        "Email not confirmed" => BackendError::EmailNotConfirmed,
        "User already registered" => BackendError::UserAlreadyRegistered,
        _ => BackendError::Service {
            status,
            code,
            message,
        },
    }
}

#[async_trait]
impl AuthService for HostedBackend {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, BackendError> {
        let builder = self
            .anon(self.client.post(self.auth_url("signup")))
            .query(&[("redirect_to", redirect_to)])
            .json(&serde_json::json!({ "email": email, "password": password }));

        // Auto-confirming projects answer with a full session, the others with the
        // bare user awaiting confirmation.
        let value: serde_json::Value = Self::send_json(builder).await?;
        if value.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(value)
                .map_err(|err| BackendError::Decode(err.to_string()))?;
            return Ok(SignUpOutcome::SignedIn(token.into_session()));
        }

        let user_value = value.get("user").cloned().unwrap_or(value);
        let user: AuthUser = serde_json::from_value(user_value)
            .map_err(|err| BackendError::Decode(err.to_string()))?;
        Ok(SignUpOutcome::PendingConfirmation { user })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let builder = self
            .anon(self.client.post(self.auth_url("token")))
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }));

        let token: TokenResponse = Self::send_json(builder).await?;
        Ok(token.into_session())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let builder = self
            .anon(self.client.post(self.auth_url("token")))
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token }));

        let token: TokenResponse = Self::send_json(builder).await.map_err(|err| match err {
            BackendError::Service { status: 400, .. } | BackendError::InvalidCredentials => {
                BackendError::InvalidSession
            }
            other => other,
        })?;
        Ok(token.into_session())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.auth_url("logout"))
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, BackendError> {
        let builder = self.client.get(self.auth_url("user")).bearer_auth(access_token);
        Self::send_json(builder).await.map_err(|err| {
            if err.is_unauthorized() {
                BackendError::InvalidSession
            } else {
                err
            }
        })
    }

    fn provider(&self) -> &'static str {
        "hosted"
    }
}

#[async_trait]
impl WordStore for HostedBackend {
    async fn list_words(
        &self,
        scope: &AccessScope,
        query: &WordQuery,
    ) -> Result<Vec<Word>, BackendError> {
        let mut params: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", scope.user_id)),
        ];
        if let Some(since) = query.created_since {
            params.push(("created_at", created_since_filter(since)));
        }
        if let Some(order) = query.order {
            params.push(("order", order.as_query_value().to_string()));
        }

        let builder = self
            .client
            .get(self.table_url(WORDS_TABLE))
            .bearer_auth(&scope.access_token)
            .query(&params);

        Self::send_json(builder).await
    }

    async fn insert_word(
        &self,
        scope: &AccessScope,
        draft: ValidDraft,
    ) -> Result<Word, BackendError> {
        let row = draft.into_new_word(&scope.user_id);
        let builder = self
            .client
            .post(self.table_url(WORDS_TABLE))
            .bearer_auth(&scope.access_token)
            .header("Prefer", "return=representation")
            .header(ACCEPT, PGRST_SINGLE_OBJECT)
            .json(&row);

        Self::send_json(builder).await
    }

    async fn delete_word(&self, scope: &AccessScope, id: &str) -> Result<bool, BackendError> {
        let builder = self
            .client
            .delete(self.table_url(WORDS_TABLE))
            .bearer_auth(&scope.access_token)
            .header("Prefer", "return=representation")
            .query(&[
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{}", scope.user_id)),
            ]);

        let removed: Vec<serde_json::Value> = Self::send_json(builder).await?;
        Ok(!removed.is_empty())
    }
}

/// Inclusive lower bound on `created_at`, keeping sub-second precision.
fn created_since_filter(since: DateTime<Utc>) -> String {
    format!("gte.{}", since.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}
