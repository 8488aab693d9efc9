//! Mirrors the credential service's auth state, plus the matching profile
//! document, into a single observable `SessionState`.

use std::sync::Arc;

use serde::Serialize;
use tauri::async_runtime::JoinHandle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::profile::{normalize_profile, Profile, USERS_COLLECTION};
use crate::backend::{AuthStateReceiver, DocumentStore, Session};
use crate::error::{Result, VitalWatchError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub user: Option<Session>,
    pub profile: Option<Profile>,
    /// True while a profile fetch is outstanding. Dependent views wait.
    pub loading: bool,
    /// Last profile fetch failure, if the current profile is a fallback.
    pub error: Option<String>,
}

impl SessionState {
    fn starting() -> Self {
        Self {
            user: None,
            profile: None,
            loading: true,
            error: None,
        }
    }

    fn signed_out() -> Self {
        Self {
            user: None,
            profile: None,
            loading: false,
            error: None,
        }
    }
}

/// Running subscription to the credential service.
pub struct SyncHandle {
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub fn unsubscribe(self) {
        self.task.abort();
        debug!("Session synchronizer unsubscribed");
    }
}

#[derive(Clone)]
pub struct SessionSynchronizer {
    store: Arc<dyn DocumentStore>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionSynchronizer {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (state, _) = watch::channel(SessionState::starting());
        Self {
            store,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Apply one auth transition. A single profile read per sign-in, no retry.
    pub async fn handle_auth_change(&self, session: Option<Session>) {
        let Some(session) = session else {
            self.state.send_replace(SessionState::signed_out());
            info!("Session cleared");
            return;
        };

        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let (profile, error) = match self.store.get(USERS_COLLECTION, &session.uid).await {
            Ok(Some(doc)) => (normalize_profile(Some(&doc.fields), &session), None),
            Ok(None) => {
                info!("No profile document for {}, using defaults", session.uid);
                (Profile::default_for(&session), None)
            }
            Err(e) => {
                warn!("Failed to fetch profile for {}: {}", session.uid, e);
                (Profile::default_for(&session), Some(e.to_string()))
            }
        };

        info!("Session ready for {}", session.uid);
        self.state.send_replace(SessionState {
            user: Some(session),
            profile: Some(profile),
            loading: false,
            error,
        });
    }

    /// Follow the credential service until unsubscribed. The current value of
    /// the subscription is applied first. A profile fetch still in flight when
    /// the identity changes again is dropped, never published.
    pub fn spawn(&self, mut auth: AuthStateReceiver) -> SyncHandle {
        let sync = self.clone();
        let task = tauri::async_runtime::spawn(async move {
            loop {
                let next = auth.borrow_and_update().clone();
                tokio::select! {
                    biased;
                    changed = auth.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        debug!("Auth state changed mid-fetch, dropping stale profile");
                        continue;
                    }
                    _ = sync.handle_auth_change(next) => {}
                }
                if auth.changed().await.is_err() {
                    break;
                }
            }
            debug!("Credential service went away, synchronizer stopping");
        });
        SyncHandle { task }
    }

    /// Replace the surfaced profile after a save, keeping the session.
    pub fn replace_profile(&self, profile: Profile) {
        self.state.send_modify(|s| {
            if s.user.is_some() {
                s.profile = Some(profile);
                s.error = None;
            }
        });
    }

    /// Wait until no fetch is outstanding.
    pub async fn settled(&self) -> Result<SessionState> {
        self.wait_until(|s| !s.loading).await
    }

    /// Wait until the surfaced session belongs to `uid` (or is absent for
    /// `None`) and has finished loading.
    pub async fn settled_for(&self, uid: Option<&str>) -> Result<SessionState> {
        self.wait_until(|s| !s.loading && s.user.as_ref().map(|u| u.uid.as_str()) == uid)
            .await
    }

    async fn wait_until(&self, done: impl FnMut(&SessionState) -> bool) -> Result<SessionState> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(done)
            .await
            .map_err(|_| VitalWatchError::Config("Session synchronizer stopped".to_string()))?;
        Ok(state.clone())
    }
}
