//! List-then-mutate-then-reload editor over the diagnostic test collection.
//!
//! Each action is one remote call followed by a full reload. Nothing is
//! applied optimistically, so a failed mutation leaves the list exactly as
//! the store last reported it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::diagnostics::{add_test, delete_test, list_tests, update_test, DiagnosticTest, DiagnosticTestInput};
use crate::backend::DocumentStore;

/// What the view renders. `tests` is `None` when the reload failed; the view
/// keeps showing whatever list it had.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditorSnapshot {
    pub tests: Option<Vec<DiagnosticTest>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorAction {
    Add { input: DiagnosticTestInput },
    Update { id: String, input: DiagnosticTestInput },
    Delete { id: String },
}

pub struct DiagnosticTestEditor {
    store: Arc<dyn DocumentStore>,
}

impl DiagnosticTestEditor {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch the whole collection.
    pub async fn load(&self) -> EditorSnapshot {
        match list_tests(self.store.as_ref()).await {
            Ok(tests) => EditorSnapshot {
                tests: Some(tests),
                error: None,
            },
            Err(e) => {
                warn!("Failed to load diagnostic tests: {}", e);
                EditorSnapshot {
                    tests: None,
                    error: Some(e.user_message()),
                }
            }
        }
    }

    /// Run one mutation, then reload. The reload happens whether or not the
    /// mutation succeeded; the mutation's error wins over the reload's.
    pub async fn apply(&self, action: EditorAction) -> EditorSnapshot {
        let store = self.store.as_ref();
        let outcome = match &action {
            EditorAction::Add { input } => add_test(store, input).await.map(|_| ()),
            EditorAction::Update { id, input } => update_test(store, id, input).await,
            EditorAction::Delete { id } => delete_test(store, id).await,
        };

        let mut snapshot = self.load().await;
        if let Err(e) = outcome {
            warn!("Diagnostic test {:?} failed: {}", action, e);
            snapshot.error = Some(e.user_message());
        }
        snapshot
    }
}
