//! Clients for the hosted credential service and document store.
//!
//! Everything stateful (accounts, sessions, documents) lives in the managed
//! backend. The traits here are the seam the rest of the app is written
//! against: `firebase_auth` and `firestore` talk to the real REST APIs,
//! `memory` is an in-process stand-in for tests and offline demos.

pub mod firebase_auth;
pub mod firestore;
pub mod memory;
pub mod oauth;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::watch;

use crate::error::Result;

/// Schema-less document body, keyed by field name.
pub type Fields = Map<String, Value>;

/// Key of the single-entry object that marks a field as a timestamp.
pub const TIMESTAMP_KEY: &str = "timestampValue";

/// A field value stored as a native timestamp. Reads hand it back as an
/// RFC 3339 string.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    json!({ TIMESTAMP_KEY: at.to_rfc3339_opts(SecondsFormat::Secs, true) })
}

/// The RFC 3339 text of a value built by `timestamp_value`.
pub fn as_timestamp(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(TIMESTAMP_KEY)?.as_str(),
        _ => None,
    }
}

/// Auth-state subscription. Each change carries the current identity, or
/// `None` after sign-out. Dropping the receiver unsubscribes.
pub type AuthStateReceiver = watch::Receiver<Option<Session>>;

/// The signed-in identity as reported by the credential service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
}

/// A stored record with its opaque id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    pub fn provider_id(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google.com",
        }
    }
}

/// First half of a provider sign-in: where to send the browser, and the
/// service-side session to complete against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderChallenge {
    pub auth_uri: String,
    pub session_id: String,
}

#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Subscribe to sign-in/sign-out notifications.
    fn subscribe(&self) -> AuthStateReceiver;

    fn current_session(&self) -> Option<Session>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn create_account(&self, email: &str, password: &str) -> Result<Session>;

    async fn begin_provider_sign_in(
        &self,
        provider: OAuthProvider,
        continue_uri: &str,
    ) -> Result<ProviderChallenge>;

    /// Exchange the provider's redirect back to `continue_uri` for a session.
    async fn complete_provider_sign_in(
        &self,
        challenge: &ProviderChallenge,
        redirect_url: &str,
    ) -> Result<Session>;

    async fn sign_out(&self) -> Result<()>;

    async fn send_password_reset(&self, email: &str) -> Result<()>;

    /// Bearer token for document-store calls, refreshed when close to expiry.
    /// `None` when nobody is signed in.
    async fn id_token(&self) -> Result<Option<String>>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in the collection, in the store's order.
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Insert with a generated id.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Create or overwrite the whole document.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Overwrite only the given top-level fields. Fails if the document is missing.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Remove the document. Deleting a missing id is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}
