//! Managed application state: the backend clients chosen by `BackendConfig`,
//! the session synchronizer and its background tasks.

use std::sync::{Arc, Mutex, PoisonError};

use tauri::async_runtime::JoinHandle;
use tauri::{AppHandle, Emitter};
use tracing::{debug, info, warn};

use crate::backend::firebase_auth::FirebaseAuth;
use crate::backend::firestore::Firestore;
use crate::backend::memory::{MemoryAuth, MemoryStore};
use crate::backend::{CredentialService, DocumentStore};
use crate::config::{BackendConfig, BackendMode};
use crate::records::alerts::{demo_alerts, ALERTS_COLLECTION};
use crate::records::DiagnosticTestEditor;
use crate::session::{SessionSynchronizer, SyncHandle};

/// Emitted with the current `SessionState` whenever it changes.
pub const SESSION_CHANGED_EVENT: &str = "session-changed";

#[derive(Default)]
struct Tasks {
    sync: Option<SyncHandle>,
    forwarder: Option<JoinHandle<()>>,
}

pub struct AppState {
    pub config: BackendConfig,
    pub auth: Arc<dyn CredentialService>,
    pub store: Arc<dyn DocumentStore>,
    pub sync: SessionSynchronizer,
    pub editor: DiagnosticTestEditor,
    tasks: Mutex<Tasks>,
}

impl AppState {
    pub fn new(config: BackendConfig) -> Self {
        let (auth, store): (Arc<dyn CredentialService>, Arc<dyn DocumentStore>) = match config.mode {
            BackendMode::Firebase => {
                let auth: Arc<dyn CredentialService> =
                    Arc::new(FirebaseAuth::new(config.api_key.clone(), config.auth_endpoints()));
                let store = Arc::new(Firestore::new(
                    config.firestore_documents_url(),
                    config.api_key.clone(),
                    auth.clone(),
                ));
                (auth, store)
            }
            BackendMode::Memory => {
                let store = MemoryStore::new();
                for alert in demo_alerts() {
                    store.insert(ALERTS_COLLECTION, alert);
                }
                info!("Using in-memory backend with demo alerts");
                (Arc::new(MemoryAuth::new()), Arc::new(store))
            }
        };
        Self::with_backends(config, auth, store)
    }

    pub fn with_backends(
        config: BackendConfig,
        auth: Arc<dyn CredentialService>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            config,
            sync: SessionSynchronizer::new(store.clone()),
            editor: DiagnosticTestEditor::new(store.clone()),
            auth,
            store,
            tasks: Mutex::new(Tasks::default()),
        }
    }

    /// Subscribe the synchronizer to the credential service and forward every
    /// state change to the front-end.
    pub fn start(&self, app: AppHandle) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if tasks.sync.is_some() {
            return;
        }

        tasks.sync = Some(self.sync.spawn(self.auth.subscribe()));

        let mut rx = self.sync.watch();
        tasks.forwarder = Some(tauri::async_runtime::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                if let Err(e) = app.emit(SESSION_CHANGED_EVENT, &state) {
                    warn!("Failed to emit {}: {}", SESSION_CHANGED_EVENT, e);
                }
            }
            debug!("Session event forwarder stopping");
        }));
        info!("Session synchronizer started");
    }

    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sync) = tasks.sync.take() {
            sync.unsubscribe();
        }
        if let Some(forwarder) = tasks.forwarder.take() {
            forwarder.abort();
        }
        info!("Session synchronizer stopped");
    }
}
