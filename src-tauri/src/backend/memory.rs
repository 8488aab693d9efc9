//! In-process credential service and document store.
//!
//! Used by the test suites and by the `memory` backend mode for offline
//! demos. Nothing is persisted. Both types can be told to fail specific
//! operations so error paths can be exercised.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::Value;
use tokio::sync::watch;
use tracing::info;
use url::Url;

use super::firebase_auth::describe_auth_error;
use super::{
    as_timestamp, AuthStateReceiver, CredentialService, Document, DocumentStore, Fields, OAuthProvider,
    ProviderChallenge, Session,
};
use crate::error::{Result, VitalWatchError};

const MIN_PASSWORD_LEN: usize = 6;

/// Firestore-style 20 character id.
pub fn generate_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetAll,
    Get,
    Add,
    Set,
    Update,
    Delete,
}

/// One recorded call against the memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub collection: String,
    pub id: Option<String>,
}

#[derive(Default)]
struct StoreInner {
    collections: HashMap<String, Vec<(String, Fields)>>,
    failing: HashSet<StoreOp>,
    calls: Vec<StoreCall>,
}

/// Timestamps are kept the way the hosted store hands them back: as strings.
fn stored(fields: Fields) -> Fields {
    fields.into_iter().map(|(k, v)| (k, stored_value(v))).collect()
}

fn stored_value(value: Value) -> Value {
    if let Some(ts) = as_timestamp(&value) {
        return Value::String(ts.to_string());
    }
    match value {
        Value::Object(map) => Value::Object(stored(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(stored_value).collect()),
        other => other,
    }
}

/// Documents kept in insertion order per collection.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert without going through the async API (seeding).
    pub fn insert(&self, collection: &str, fields: Fields) -> String {
        let id = generate_id();
        self.lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), stored(fields)));
        id
    }

    /// Make every future call of these kinds fail until `heal` is called.
    pub fn fail_on(&self, ops: &[StoreOp]) {
        self.lock().failing.extend(ops.iter().copied());
    }

    pub fn heal(&self) {
        self.lock().failing.clear();
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log the call, then fail it if injected.
    fn enter(&self, op: StoreOp, collection: &str, id: Option<&str>) -> Result<std::sync::MutexGuard<'_, StoreInner>> {
        let mut inner = self.lock();
        inner.calls.push(StoreCall {
            op,
            collection: collection.to_string(),
            id: id.map(String::from),
        });
        if inner.failing.contains(&op) {
            return Err(VitalWatchError::Store(format!(
                "injected {:?} failure on {}",
                op, collection
            )));
        }
        Ok(inner)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>> {
        let inner = self.enter(StoreOp::GetAll, collection, None)?;
        Ok(inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let inner = self.enter(StoreOp::Get, collection, Some(id))?;
        Ok(inner.collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(doc_id, fields)| Document {
                    id: doc_id.clone(),
                    fields: fields.clone(),
                })
        }))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String> {
        let mut inner = self.enter(StoreOp::Add, collection, None)?;
        let id = generate_id();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), stored(fields)));
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut inner = self.enter(StoreOp::Set, collection, Some(id))?;
        let docs = inner.collections.entry(collection.to_string()).or_default();
        let fields = stored(fields);
        match docs.iter().position(|(doc_id, _)| doc_id == id) {
            Some(index) => docs[index].1 = fields,
            None => docs.push((id.to_string(), fields)),
        }
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let mut inner = self.enter(StoreOp::Update, collection, Some(id))?;
        let existing = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| doc_id == id))
            .map(|(_, existing)| existing)
            .ok_or_else(|| VitalWatchError::NotFound(format!("{}/{}", collection, id)))?;
        existing.extend(stored(fields));
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut inner = self.enter(StoreOp::Delete, collection, Some(id))?;
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.retain(|(doc_id, _)| doc_id != id);
        }
        Ok(())
    }
}

struct Account {
    uid: String,
    password: String,
}

/// Accounts keyed by lowercase email.
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    reset_requests: Mutex<Vec<String>>,
    state: watch::Sender<Option<Session>>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            reset_requests: Mutex::new(Vec::new()),
            state,
        }
    }

    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.insert_account(email, password);
        self
    }

    fn insert_account(&self, email: &str, password: &str) -> Session {
        let uid = generate_id();
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                email.to_ascii_lowercase(),
                Account {
                    uid: uid.clone(),
                    password: password.to_string(),
                },
            );
        Session {
            uid,
            email: Some(email.to_string()),
        }
    }

    /// Email addresses that asked for a password reset, oldest first.
    pub fn reset_requests(&self) -> Vec<String> {
        self.reset_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, session: Option<Session>) {
        self.state.send_replace(session);
    }

    fn auth_error(code: &str) -> VitalWatchError {
        VitalWatchError::Auth(describe_auth_error(code))
    }
}

#[async_trait]
impl CredentialService for MemoryAuth {
    fn subscribe(&self) -> AuthStateReceiver {
        self.state.subscribe()
    }

    fn current_session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = {
            let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
            let account = accounts
                .get(&email.to_ascii_lowercase())
                .filter(|a| a.password == password)
                .ok_or_else(|| Self::auth_error("INVALID_LOGIN_CREDENTIALS"))?;
            Session {
                uid: account.uid.clone(),
                email: Some(email.to_string()),
            }
        };
        info!("Signed in user: {}", session.uid);
        self.publish(Some(session.clone()));
        Ok(session)
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Session> {
        if !email.contains('@') {
            return Err(Self::auth_error("INVALID_EMAIL"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(Self::auth_error(
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ));
        }
        let exists = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&email.to_ascii_lowercase());
        if exists {
            return Err(Self::auth_error("EMAIL_EXISTS"));
        }

        let session = self.insert_account(email, password);
        info!("Created account for {}", email);
        self.publish(Some(session.clone()));
        Ok(session)
    }

    async fn begin_provider_sign_in(
        &self,
        provider: OAuthProvider,
        continue_uri: &str,
    ) -> Result<ProviderChallenge> {
        let mut auth_uri = Url::parse("memory://oauth/authorize")
            .map_err(|e| VitalWatchError::OAuth(e.to_string()))?;
        auth_uri
            .query_pairs_mut()
            .append_pair("provider", provider.provider_id())
            .append_pair("redirect_uri", continue_uri);
        Ok(ProviderChallenge {
            auth_uri: auth_uri.to_string(),
            session_id: generate_id(),
        })
    }

    /// The redirect must carry an `email` query parameter naming the
    /// provider account; unknown accounts are created on first use.
    async fn complete_provider_sign_in(
        &self,
        _challenge: &ProviderChallenge,
        redirect_url: &str,
    ) -> Result<Session> {
        let url = Url::parse(redirect_url).map_err(|e| VitalWatchError::OAuth(e.to_string()))?;
        let email = url
            .query_pairs()
            .find(|(k, _)| k == "email")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| Self::auth_error("INVALID_IDP_RESPONSE"))?;

        let existing = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&email.to_ascii_lowercase())
            .map(|a| a.uid.clone());
        let session = match existing {
            Some(uid) => Session {
                uid,
                email: Some(email),
            },
            None => self.insert_account(&email, &generate_id()),
        };
        info!("Signed in user: {}", session.uid);
        self.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.publish(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<()> {
        let known = self
            .accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&email.to_ascii_lowercase());
        if !known {
            return Err(Self::auth_error("EMAIL_NOT_FOUND"));
        }
        self.reset_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.to_string());
        Ok(())
    }

    async fn id_token(&self) -> Result<Option<String>> {
        Ok(self
            .state
            .borrow()
            .as_ref()
            .map(|s| format!("memory-token-{}", s.uid)))
    }
}
