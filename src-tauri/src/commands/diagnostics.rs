use tauri::{AppHandle, Manager};
use tracing::info;

use crate::records::{DiagnosticTestInput, EditorAction, EditorSnapshot};
use crate::state::AppState;

#[tauri::command]
pub async fn load_diagnostic_tests(app: AppHandle) -> Result<EditorSnapshot, String> {
    let state = app.state::<AppState>();
    Ok(state.editor.load().await)
}

#[tauri::command]
pub async fn add_diagnostic_test(
    app: AppHandle,
    input: DiagnosticTestInput,
) -> Result<EditorSnapshot, String> {
    info!("Adding diagnostic test: {}", input.name);
    let state = app.state::<AppState>();
    Ok(state.editor.apply(EditorAction::Add { input }).await)
}

#[tauri::command]
pub async fn update_diagnostic_test(
    app: AppHandle,
    id: String,
    input: DiagnosticTestInput,
) -> Result<EditorSnapshot, String> {
    info!("Updating diagnostic test: {}", id);
    let state = app.state::<AppState>();
    Ok(state.editor.apply(EditorAction::Update { id, input }).await)
}

#[tauri::command]
pub async fn delete_diagnostic_test(app: AppHandle, id: String) -> Result<EditorSnapshot, String> {
    info!("Deleting diagnostic test: {}", id);
    let state = app.state::<AppState>();
    Ok(state.editor.apply(EditorAction::Delete { id }).await)
}
