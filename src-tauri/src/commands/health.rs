use std::time::Duration;

use serde::Serialize;
use tauri::{AppHandle, Manager};
use tracing::info;

use crate::config::{self, BackendMode};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub backend_mode: BackendMode,
    pub api_key_set: bool,
    pub project_id_set: bool,
    pub auth_reachable: bool,
    pub signed_in: bool,
    /// Settings saved since launch that differ from the running backend.
    pub restart_required: bool,
}

/// Any HTTP answer counts; only transport failures mean unreachable.
async fn probe(url: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(_) => return false,
    };
    client.get(url).send().await.is_ok()
}

#[tauri::command]
pub async fn run_health_check(app: AppHandle) -> Result<HealthReport, String> {
    info!("Running health check");
    let state = app.state::<AppState>();
    let running = &state.config;

    let auth_reachable = match running.mode {
        BackendMode::Memory => true,
        BackendMode::Firebase => probe(&running.auth_endpoints().identity_toolkit).await,
    };
    info!("Auth endpoint reachable: {}", auth_reachable);

    let saved = config::BackendConfig::load(&app);
    let restart_required = saved.mode != running.mode
        || saved.project_id != running.project_id
        || saved.api_key != running.api_key
        || saved.auth_emulator_host != running.auth_emulator_host
        || saved.firestore_emulator_host != running.firestore_emulator_host;

    Ok(HealthReport {
        backend_mode: running.mode,
        api_key_set: saved.api_key.is_some(),
        project_id_set: saved.project_id.is_some(),
        auth_reachable,
        signed_in: state.auth.current_session().is_some(),
        restart_required,
    })
}
