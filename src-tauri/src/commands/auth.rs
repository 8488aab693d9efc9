use tauri::{AppHandle, Manager};
use tauri_plugin_opener::OpenerExt;
use tracing::{info, warn};

use crate::backend::oauth::{self, REDIRECT_TIMEOUT};
use crate::backend::OAuthProvider;
use crate::config::BackendMode;
use crate::error::VitalWatchError;
use crate::session::{flows, RegistrationForm, SessionState};
use crate::state::AppState;

/// Current session once the synchronizer has finished loading.
#[tauri::command]
pub async fn get_session_state(app: AppHandle) -> Result<SessionState, String> {
    let state = app.state::<AppState>();
    Ok(state.sync.settled().await?)
}

#[tauri::command]
pub async fn sign_in(app: AppHandle, email: String, password: String) -> Result<SessionState, String> {
    info!("Signing in: {}", email);
    let state = app.state::<AppState>();
    flows::sign_in(state.auth.as_ref(), &state.sync, &email, &password)
        .await
        .map_err(|e| {
            warn!("Sign-in failed for {}: {}", email, e);
            e.into()
        })
}

#[tauri::command]
pub async fn register(app: AppHandle, form: RegistrationForm) -> Result<SessionState, String> {
    info!("Registering: {}", form.email);
    let state = app.state::<AppState>();
    flows::register(state.auth.as_ref(), state.store.as_ref(), &state.sync, form)
        .await
        .map_err(|e| {
            warn!("Registration failed: {}", e);
            e.into()
        })
}

/// Browser-based provider sign-in through a loopback redirect.
#[tauri::command]
pub async fn sign_in_with_provider(
    app: AppHandle,
    provider: OAuthProvider,
) -> Result<SessionState, String> {
    info!("Starting {} sign-in", provider.provider_id());
    let state = app.state::<AppState>();
    if state.config.mode == BackendMode::Memory {
        return Err(VitalWatchError::OAuth(
            "provider sign-in needs the Firebase backend".to_string(),
        )
        .into());
    }

    let opener = app.clone();
    let open_browser = move |url: &str| {
        opener
            .opener()
            .open_url(url, None::<&str>)
            .map_err(|e| VitalWatchError::OAuth(format!("could not open the browser: {}", e)))
    };

    let session = oauth::sign_in_with_provider(state.auth.as_ref(), provider, open_browser, REDIRECT_TIMEOUT)
        .await
        .map_err(|e| {
            warn!("Provider sign-in failed: {}", e);
            String::from(e)
        })?;
    Ok(state.sync.settled_for(Some(&session.uid)).await?)
}

#[tauri::command]
pub async fn sign_out(app: AppHandle) -> Result<SessionState, String> {
    info!("Signing out");
    let state = app.state::<AppState>();
    Ok(flows::sign_out(state.auth.as_ref(), &state.sync).await?)
}

#[tauri::command]
pub async fn send_password_reset(app: AppHandle, email: String) -> Result<String, String> {
    info!("Password reset requested for {}", email);
    let state = app.state::<AppState>();
    flows::send_password_reset(state.auth.as_ref(), &email)
        .await
        .map_err(|e| {
            warn!("Password reset failed for {}: {}", email, e);
            String::from(e)
        })?;
    Ok("Password reset email sent! Check your inbox.".to_string())
}
