//! Credential service client for the Firebase Identity Toolkit REST API.
//!
//! Tokens are held in memory for the life of the process; nothing is
//! persisted locally.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use super::{AuthStateReceiver, CredentialService, OAuthProvider, ProviderChallenge, Session};
use crate::config::AuthEndpoints;
use crate::error::{Result, VitalWatchError};

/// Refresh the identity token when it expires within this window.
const REFRESH_MARGIN_SECS: i64 = 60;
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct Tokens {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Tokens {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now < chrono::Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAuthUriResponse {
    auth_uri: String,
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Readable text for an Identity Toolkit error message such as
/// `"EMAIL_EXISTS"` or `"WEAK_PASSWORD : Password should be at least 6 characters"`.
/// Unknown codes are returned unchanged.
pub fn describe_auth_error(message: &str) -> String {
    let (code, detail) = match message.split_once(" : ") {
        Some((code, detail)) => (code.trim(), Some(detail.trim())),
        None => (message.trim(), None),
    };

    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Incorrect email or password.".to_string()
        }
        "EMAIL_EXISTS" => "An account with this email already exists.".to_string(),
        "INVALID_EMAIL" | "MISSING_EMAIL" => "The email address is badly formatted.".to_string(),
        "USER_DISABLED" => "This account has been disabled.".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            "Too many unsuccessful attempts. Please try again later.".to_string()
        }
        "OPERATION_NOT_ALLOWED" => "This sign-in method is not enabled.".to_string(),
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            "Your session has expired. Please sign in again.".to_string()
        }
        "WEAK_PASSWORD" => detail
            .map(|d| d.to_string())
            .unwrap_or_else(|| "Password should be at least 6 characters.".to_string()),
        _ => message.trim().to_string(),
    }
}

fn auth_error_from_body(body: &str) -> VitalWatchError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => VitalWatchError::Auth(describe_auth_error(&envelope.error.message)),
        Err(_) if body.trim().is_empty() => {
            VitalWatchError::Auth("The sign-in service returned an empty error.".to_string())
        }
        Err(_) => VitalWatchError::Auth(body.trim().to_string()),
    }
}

fn expiry_from(expires_in: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let secs = expires_in
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    now + chrono::Duration::seconds(secs)
}

pub struct FirebaseAuth {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoints: AuthEndpoints,
    state: watch::Sender<Option<Session>>,
    tokens: Mutex<Option<Tokens>>,
}

impl FirebaseAuth {
    pub fn new(api_key: Option<String>, endpoints: AuthEndpoints) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("VitalWatch/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });
        let (state, _) = watch::channel(None);

        Self {
            client,
            api_key,
            endpoints,
            state,
            tokens: Mutex::new(None),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            VitalWatchError::Config(
                "Firebase API key is not configured. Add it in Settings.".to_string(),
            )
        })
    }

    fn endpoint_url(&self, base: &str, path: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/v1/{}", base, path))
            .map_err(|e| VitalWatchError::Config(format!("Invalid auth endpoint '{}': {}", base, e)))?;
        url.query_pairs_mut().append_pair("key", self.api_key()?);
        Ok(url)
    }

    async fn accounts_call<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R> {
        let url = self.endpoint_url(&self.endpoints.identity_toolkit, &format!("accounts:{}", method))?;
        debug!("Calling accounts:{}", method);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| VitalWatchError::Auth(format!("Could not reach the sign-in service: {}", e)))?;
        read_auth_response(response).await
    }

    /// Record the new identity and notify subscribers.
    fn establish(&self, response: AuthResponse) -> Session {
        let now = Utc::now();
        let tokens = Tokens {
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at: expiry_from(response.expires_in.as_deref(), now),
        };
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = Some(tokens);

        let session = Session {
            uid: response.local_id,
            email: response.email,
        };
        info!("Signed in user: {}", session.uid);
        self.state.send_replace(Some(session.clone()));
        session
    }

    async fn refresh(&self, stale: Tokens) -> Result<String> {
        let url = self.endpoint_url(&self.endpoints.secure_token, "token")?;
        let response = self
            .client
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", stale.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| VitalWatchError::Auth(format!("Could not reach the sign-in service: {}", e)))?;
        let refreshed: RefreshResponse = read_auth_response(response).await?;

        let mut guard = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        // Signed out (or signed in again) while the refresh was in flight.
        let still_current = guard
            .as_ref()
            .is_some_and(|t| t.refresh_token == stale.refresh_token);
        if !still_current {
            return guard
                .as_ref()
                .map(|t| t.id_token.clone())
                .ok_or_else(|| VitalWatchError::Auth("You are signed out.".to_string()));
        }

        let id_token = refreshed.id_token.clone();
        *guard = Some(Tokens {
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
            expires_at: expiry_from(refreshed.expires_in.as_deref(), Utc::now()),
        });
        debug!("Refreshed identity token");
        Ok(id_token)
    }
}

async fn read_auth_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| VitalWatchError::Auth(format!("Failed to read sign-in response: {}", e)))?;

    if !status.is_success() {
        warn!("Sign-in service returned {}", status);
        return Err(auth_error_from_body(&body));
    }

    serde_json::from_str(&body).map_err(|e| {
        VitalWatchError::Auth(format!("Unexpected response from the sign-in service: {}", e))
    })
}

#[async_trait]
impl CredentialService for FirebaseAuth {
    fn subscribe(&self) -> AuthStateReceiver {
        self.state.subscribe()
    }

    fn current_session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: AuthResponse = self.accounts_call("signInWithPassword", &body).await?;
        Ok(self.establish(response))
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Session> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: AuthResponse = self.accounts_call("signUp", &body).await?;
        info!("Created account for {}", email);
        Ok(self.establish(response))
    }

    async fn begin_provider_sign_in(
        &self,
        provider: OAuthProvider,
        continue_uri: &str,
    ) -> Result<ProviderChallenge> {
        let body = json!({
            "providerId": provider.provider_id(),
            "continueUri": continue_uri,
        });
        let response: CreateAuthUriResponse = self.accounts_call("createAuthUri", &body).await?;
        Ok(ProviderChallenge {
            auth_uri: response.auth_uri,
            session_id: response.session_id,
        })
    }

    async fn complete_provider_sign_in(
        &self,
        challenge: &ProviderChallenge,
        redirect_url: &str,
    ) -> Result<Session> {
        let body = json!({
            "requestUri": redirect_url,
            "sessionId": challenge.session_id,
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });
        let response: AuthResponse = self.accounts_call("signInWithIdp", &body).await?;
        Ok(self.establish(response))
    }

    async fn sign_out(&self) -> Result<()> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(session) = self.state.send_replace(None) {
            info!("Signed out user: {}", session.uid);
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        let body = json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
        });
        let _: serde_json::Value = self.accounts_call("sendOobCode", &body).await?;
        info!("Sent password reset email to {}", email);
        Ok(())
    }

    async fn id_token(&self) -> Result<Option<String>> {
        let snapshot = self
            .tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match snapshot {
            None => Ok(None),
            Some(tokens) if !tokens.needs_refresh(Utc::now()) => Ok(Some(tokens.id_token)),
            Some(tokens) => self.refresh(tokens).await.map(Some),
        }
    }
}
