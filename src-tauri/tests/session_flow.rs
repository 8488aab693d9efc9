use std::sync::Arc;

use serde_json::json;

use vitalwatch_tauri::backend::memory::{MemoryAuth, MemoryStore, StoreOp};
use vitalwatch_tauri::backend::{CredentialService, DocumentStore};
use vitalwatch_tauri::config::BackendConfig;
use vitalwatch_tauri::error::STORE_RETRY_MESSAGE;
use vitalwatch_tauri::records::alerts;
use vitalwatch_tauri::records::diagnostics::TESTS_COLLECTION;
use vitalwatch_tauri::records::{DiagnosticTestInput, EditorAction};
use vitalwatch_tauri::session::flows;
use vitalwatch_tauri::session::profile::USERS_COLLECTION;
use vitalwatch_tauri::session::{ProfileForm, RegistrationForm};
use vitalwatch_tauri::AppState;

struct Harness {
    auth: Arc<MemoryAuth>,
    store: Arc<MemoryStore>,
    state: AppState,
}

fn harness(auth: MemoryAuth) -> Harness {
    let auth = Arc::new(auth);
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_backends(BackendConfig::default(), auth.clone(), store.clone());
    Harness { auth, store, state }
}

fn registration() -> RegistrationForm {
    RegistrationForm {
        first_name: "Pat".into(),
        middle_name: "Q".into(),
        last_name: "Doe".into(),
        email: "pat@example.com".into(),
        password: "Secret1!".into(),
        confirm_password: "Secret1!".into(),
    }
}

#[tokio::test]
async fn test_register_sign_out_sign_in() {
    let h = harness(MemoryAuth::new());
    let handle = h.state.sync.spawn(h.auth.subscribe());
    h.state.sync.settled().await.unwrap();

    let state = flows::register(h.auth.as_ref(), h.store.as_ref(), &h.state.sync, registration())
        .await
        .unwrap();
    let uid = state.user.as_ref().unwrap().uid.clone();
    let profile = state.profile.unwrap();
    assert_eq!(profile.first_name, "Pat");
    assert_eq!(profile.middle_name, "Q");
    assert!(profile.preferences.notifications);
    assert_eq!(profile.preferences.threshold, 5.0);

    let stored = h.store.get(USERS_COLLECTION, &uid).await.unwrap().unwrap();
    assert_eq!(stored.fields["preferences"], json!({ "notifications": true, "threshold": 5 }));

    let state = flows::sign_out(h.auth.as_ref(), &h.state.sync).await.unwrap();
    assert!(state.user.is_none());
    assert!(state.profile.is_none());
    assert!(!state.loading);

    let state = flows::sign_in(h.auth.as_ref(), &h.state.sync, "pat@example.com", "Secret1!")
        .await
        .unwrap();
    assert_eq!(state.user.unwrap().uid, uid);
    assert_eq!(state.profile.unwrap().last_name, "Doe");

    handle.unsubscribe();
}

#[tokio::test]
async fn test_wrong_password_is_surfaced_verbatim() {
    let h = harness(MemoryAuth::new().with_account("pat@example.com", "Secret1!"));
    let _handle = h.state.sync.spawn(h.auth.subscribe());

    let err = flows::sign_in(h.auth.as_ref(), &h.state.sync, "pat@example.com", "wrong")
        .await
        .unwrap_err();
    let message = err.user_message();
    assert_ne!(message, STORE_RETRY_MESSAGE);
    assert!(!message.is_empty());
    assert!(h.auth.current_session().is_none());
}

#[tokio::test]
async fn test_profile_fetch_failure_keeps_session() {
    let h = harness(MemoryAuth::new().with_account("pat@example.com", "Secret1!"));
    h.store.fail_on(&[StoreOp::Get]);
    let _handle = h.state.sync.spawn(h.auth.subscribe());

    let state = flows::sign_in(h.auth.as_ref(), &h.state.sync, "pat@example.com", "Secret1!")
        .await
        .unwrap();
    assert!(state.user.is_some());
    assert!(!state.loading);
    assert!(state.error.is_some());
    let profile = state.profile.unwrap();
    assert!(profile.preferences.notifications);
    assert_eq!(profile.preferences.threshold, 5.0);
}

#[tokio::test]
async fn test_profile_save_then_load() {
    let h = harness(MemoryAuth::new().with_account("pat@example.com", "Secret1!"));
    let _handle = h.state.sync.spawn(h.auth.subscribe());
    flows::sign_in(h.auth.as_ref(), &h.state.sync, "pat@example.com", "Secret1!")
        .await
        .unwrap();

    let form = ProfileForm {
        first_name: "Pat".into(),
        middle_name: "".into(),
        last_name: "Doe".into(),
        email: "pat@example.com".into(),
        threshold: "7".into(),
        notifications: false,
    };
    flows::save_profile(h.auth.as_ref(), h.store.as_ref(), &h.state.sync, form)
        .await
        .unwrap();

    let loaded = flows::load_profile(h.auth.as_ref(), h.store.as_ref()).await.unwrap();
    assert_eq!(loaded.preferences.threshold, 7.0);
    assert!(!loaded.preferences.notifications);
    assert_eq!(h.state.sync.state().profile, Some(loaded));
}

#[tokio::test]
async fn test_profile_requires_session() {
    let h = harness(MemoryAuth::new());
    let err = flows::load_profile(h.auth.as_ref(), h.store.as_ref()).await.unwrap_err();
    assert_eq!(err.user_message(), "You must be signed in.");
}

#[tokio::test]
async fn test_password_reset_is_recorded() {
    let h = harness(MemoryAuth::new().with_account("pat@example.com", "Secret1!"));
    flows::send_password_reset(h.auth.as_ref(), " pat@example.com ").await.unwrap();
    assert_eq!(h.auth.reset_requests(), vec!["pat@example.com".to_string()]);
}

#[tokio::test]
async fn test_adding_cbc_creates_one_record() {
    let h = harness(MemoryAuth::new());
    let before = h.state.editor.load().await.tests.unwrap().len();

    let snapshot = h
        .state
        .editor
        .apply(EditorAction::Add {
            input: DiagnosticTestInput {
                name: "CBC".into(),
                result: "Normal".into(),
                date: "2025-01-01".into(),
            },
        })
        .await;

    let tests = snapshot.tests.unwrap();
    assert_eq!(tests.len(), before + 1);
    let cbc = tests.iter().find(|t| t.name == "CBC").unwrap();
    assert_eq!(cbc.result, "Normal");
    assert_eq!(cbc.date, "2025-01-01");
    assert!(!cbc.id.is_empty());
    assert_eq!(h.store.len(TESTS_COLLECTION), 1);
}

#[tokio::test]
async fn test_deleting_unknown_id_reloads() {
    let h = harness(MemoryAuth::new());
    let snapshot = h
        .state
        .editor
        .apply(EditorAction::Delete {
            id: "no-such-test".into(),
        })
        .await;
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.tests, Some(vec![]));

    let ops: Vec<StoreOp> = h.store.calls().iter().map(|c| c.op).collect();
    assert_eq!(ops, vec![StoreOp::Delete, StoreOp::GetAll]);
}

#[tokio::test]
async fn test_store_outage_gives_retry_message() {
    let h = harness(MemoryAuth::new());
    h.store.fail_on(&[StoreOp::GetAll]);
    let err = alerts::load_dashboard(h.store.as_ref()).await.unwrap_err();
    assert_eq!(err.user_message(), STORE_RETRY_MESSAGE);

    h.store.heal();
    alerts::seed_alerts(h.store.as_ref()).await.unwrap();
    let dashboard = alerts::load_dashboard(h.store.as_ref()).await.unwrap();
    assert_eq!(dashboard.summary.total(), 5);
}
