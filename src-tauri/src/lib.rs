pub mod backend;
mod commands;
pub mod config;
pub mod error;
pub mod records;
pub mod session;
pub mod state;
pub mod validation;

pub use error::{Result, VitalWatchError};
pub use session::{SessionState, SessionSynchronizer};
pub use state::AppState;

use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_store::Builder::new().build())
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![
            commands::keychain::set_api_key,
            commands::keychain::get_api_key,
            commands::keychain::delete_api_key,
            commands::config::get_preference,
            commands::config::set_preference,
            commands::health::run_health_check,
            commands::auth::get_session_state,
            commands::auth::sign_in,
            commands::auth::register,
            commands::auth::sign_in_with_provider,
            commands::auth::sign_out,
            commands::auth::send_password_reset,
            commands::profile::get_profile,
            commands::profile::save_profile,
            commands::alerts::list_alerts,
            commands::alerts::seed_demo_alerts,
            commands::diagnostics::load_diagnostic_tests,
            commands::diagnostics::add_diagnostic_test,
            commands::diagnostics::update_diagnostic_test,
            commands::diagnostics::delete_diagnostic_test,
        ])
        .setup(|app| {
            let backend = config::BackendConfig::load(app.handle());
            app.manage(AppState::new(backend));
            app.state::<AppState>().start(app.handle().clone());
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|handle, event| {
        if let tauri::RunEvent::Exit = event {
            handle.state::<AppState>().shutdown();
        }
    });
}
