use tauri::{AppHandle, Manager};
use tracing::{info, warn};

use crate::records::alerts::{self, AlertsDashboard};
use crate::state::AppState;

#[tauri::command]
pub async fn list_alerts(app: AppHandle) -> Result<AlertsDashboard, String> {
    let state = app.state::<AppState>();
    alerts::load_dashboard(state.store.as_ref())
        .await
        .map_err(|e| {
            warn!("Failed to load alerts: {}", e);
            e.into()
        })
}

/// Developer action: write the demo alerts.
#[tauri::command]
pub async fn seed_demo_alerts(app: AppHandle) -> Result<usize, String> {
    info!("Seeding demo alerts");
    let state = app.state::<AppState>();
    alerts::seed_alerts(state.store.as_ref())
        .await
        .map_err(|e| {
            warn!("Failed to seed alerts: {}", e);
            e.into()
        })
}
