use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], catch)]
    async fn invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "event"], catch)]
    async fn listen(event: &str, handler: &Closure<dyn FnMut(JsValue)>) -> Result<JsValue, JsValue>;
}

pub const SESSION_CHANGED_EVENT: &str = "session-changed";
pub const FIREBASE_API_SERVICE: &str = "vitalwatch-firebase-api";

// -- Types matching backend structs --

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Preferences {
    pub notifications: bool,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionState {
    pub user: Option<Session>,
    pub profile: Option<Profile>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    /// Before the backend has reported anything.
    pub fn starting() -> Self {
        Self {
            user: None,
            profile: None,
            loading: true,
            error: None,
        }
    }

    /// The backend never answered. Signed out and settled, so the public
    /// routes (Settings, Health) stay reachable.
    pub fn unavailable(error: String) -> Self {
        Self {
            loading: false,
            error: Some(error),
            ..Self::starting()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub status: String,
    pub timestamp: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AlertSummary {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub other: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AlertsDashboard {
    pub alerts: Vec<Alert>,
    pub summary: AlertSummary,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DiagnosticTest {
    pub id: String,
    pub name: String,
    pub result: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EditorSnapshot {
    pub tests: Option<Vec<DiagnosticTest>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthReport {
    pub backend_mode: String,
    pub api_key_set: bool,
    pub project_id_set: bool,
    pub auth_reachable: bool,
    pub signed_in: bool,
    pub restart_required: bool,
}

// -- Request bodies --

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationForm {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileForm {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub threshold: String,
    pub notifications: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiagnosticTestInput {
    pub name: String,
    pub result: String,
    pub date: String,
}

// -- Arg structs for serialization --

#[derive(Serialize)]
struct NoArgs {}

#[derive(Serialize)]
struct ServiceArgs<'a> {
    service: &'a str,
}

#[derive(Serialize)]
struct SetApiKeyArgs<'a> {
    service: &'a str,
    key: &'a str,
}

#[derive(Serialize)]
struct GetPreferenceArgs<'a> {
    key: &'a str,
}

#[derive(Serialize)]
struct SetPreferenceArgs<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct SignInArgs<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct EmailArgs<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ProviderArgs<'a> {
    provider: &'a str,
}

/// Wrapper to provide the `form` key expected by the Tauri command.
#[derive(Serialize)]
struct FormArgs<'a, T> {
    form: &'a T,
}

#[derive(Serialize)]
struct InputArgs<'a> {
    input: &'a DiagnosticTestInput,
}

#[derive(Serialize)]
struct UpdateTestArgs<'a> {
    id: &'a str,
    input: &'a DiagnosticTestInput,
}

#[derive(Serialize)]
struct IdArgs<'a> {
    id: &'a str,
}

// -- Typed invoke helpers --

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| "Unknown error".to_string())
}

async fn call<A: Serialize, T: DeserializeOwned>(cmd: &str, args: &A) -> Result<T, String> {
    let args = serde_wasm_bindgen::to_value(args).map_err(|e| e.to_string())?;
    let result = invoke(cmd, args).await.map_err(js_error)?;
    serde_wasm_bindgen::from_value(result).map_err(|e| format!("Failed to parse response: {}", e))
}

async fn call_unit<A: Serialize>(cmd: &str, args: &A) -> Result<(), String> {
    let args = serde_wasm_bindgen::to_value(args).map_err(|e| e.to_string())?;
    invoke(cmd, args).await.map(|_| ()).map_err(js_error)
}

pub async fn set_api_key(service: &str, key: &str) -> Result<(), String> {
    call_unit("set_api_key", &SetApiKeyArgs { service, key }).await
}

pub async fn get_api_key(service: &str) -> Result<Option<String>, String> {
    call("get_api_key", &ServiceArgs { service }).await
}

pub async fn delete_api_key(service: &str) -> Result<(), String> {
    call_unit("delete_api_key", &ServiceArgs { service }).await
}

pub async fn get_preference(key: &str) -> Result<Option<String>, String> {
    call("get_preference", &GetPreferenceArgs { key }).await
}

pub async fn set_preference(key: &str, value: &str) -> Result<(), String> {
    call_unit("set_preference", &SetPreferenceArgs { key, value }).await
}

pub async fn run_health_check() -> Result<HealthReport, String> {
    call("run_health_check", &NoArgs {}).await
}

// -- Session --

pub async fn get_session_state() -> Result<SessionState, String> {
    call("get_session_state", &NoArgs {}).await
}

pub async fn sign_in(email: &str, password: &str) -> Result<SessionState, String> {
    call("sign_in", &SignInArgs { email, password }).await
}

pub async fn register(form: &RegistrationForm) -> Result<SessionState, String> {
    call("register", &FormArgs { form }).await
}

/// Opens the system browser and resolves once the provider redirects back.
pub async fn sign_in_with_google() -> Result<SessionState, String> {
    call("sign_in_with_provider", &ProviderArgs { provider: "google" }).await
}

pub async fn sign_out() -> Result<SessionState, String> {
    call("sign_out", &NoArgs {}).await
}

/// Resolves to the confirmation text to show.
pub async fn send_password_reset(email: &str) -> Result<String, String> {
    call("send_password_reset", &EmailArgs { email }).await
}

/// Register `callback` for every `session-changed` event. The listener lives
/// for the rest of the page.
pub async fn on_session_changed(mut callback: impl FnMut(SessionState) + 'static) -> Result<(), String> {
    let handler = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
        let payload = js_sys::Reflect::get(&event, &JsValue::from_str("payload")).unwrap_or(JsValue::NULL);
        match serde_wasm_bindgen::from_value::<SessionState>(payload) {
            Ok(state) => callback(state),
            Err(e) => web_sys::console::warn_1(&JsValue::from_str(&format!(
                "Ignoring malformed {} payload: {}",
                SESSION_CHANGED_EVENT, e
            ))),
        }
    });
    listen(SESSION_CHANGED_EVENT, &handler).await.map_err(js_error)?;
    handler.forget();
    Ok(())
}

// -- Profile --

pub async fn get_profile() -> Result<Profile, String> {
    call("get_profile", &NoArgs {}).await
}

pub async fn save_profile(form: &ProfileForm) -> Result<Profile, String> {
    call("save_profile", &FormArgs { form }).await
}

// -- Alerts --

pub async fn list_alerts() -> Result<AlertsDashboard, String> {
    call("list_alerts", &NoArgs {}).await
}

pub async fn seed_demo_alerts() -> Result<usize, String> {
    call("seed_demo_alerts", &NoArgs {}).await
}

// -- Diagnostic tests --

pub async fn load_diagnostic_tests() -> Result<EditorSnapshot, String> {
    call("load_diagnostic_tests", &NoArgs {}).await
}

pub async fn add_diagnostic_test(input: &DiagnosticTestInput) -> Result<EditorSnapshot, String> {
    call("add_diagnostic_test", &InputArgs { input }).await
}

pub async fn update_diagnostic_test(id: &str, input: &DiagnosticTestInput) -> Result<EditorSnapshot, String> {
    call("update_diagnostic_test", &UpdateTestArgs { id, input }).await
}

pub async fn delete_diagnostic_test(id: &str) -> Result<EditorSnapshot, String> {
    call("delete_diagnostic_test", &IdArgs { id }).await
}
