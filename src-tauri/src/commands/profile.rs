use tauri::{AppHandle, Manager};
use tracing::warn;

use crate::session::{flows, Profile, ProfileForm};
use crate::state::AppState;

#[tauri::command]
pub async fn get_profile(app: AppHandle) -> Result<Profile, String> {
    let state = app.state::<AppState>();
    flows::load_profile(state.auth.as_ref(), state.store.as_ref())
        .await
        .map_err(|e| {
            warn!("Failed to load profile: {}", e);
            e.into()
        })
}

#[tauri::command]
pub async fn save_profile(app: AppHandle, form: ProfileForm) -> Result<Profile, String> {
    let state = app.state::<AppState>();
    flows::save_profile(state.auth.as_ref(), state.store.as_ref(), &state.sync, form)
        .await
        .map_err(|e| {
            warn!("Failed to save profile: {}", e);
            e.into()
        })
}
