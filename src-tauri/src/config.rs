//! Backend connection settings.
//!
//! Non-secret values come from the `preferences.json` store, the Web API key
//! from the OS keychain. Loaded once at startup.

use std::str::FromStr;

use keyring::Entry;
use serde::{Deserialize, Serialize};
use tauri::AppHandle;
use tauri_plugin_store::StoreExt;
use tracing::{info, warn};

pub const PREFERENCES_STORE: &str = "preferences.json";
pub const API_KEY_SERVICE: &str = "vitalwatch-firebase-api";
pub const KEYRING_USER: &str = "vitalwatch";

pub const PROJECT_ID_KEY: &str = "firebase_project_id";
pub const BACKEND_MODE_KEY: &str = "backend_mode";
pub const AUTH_EMULATOR_KEY: &str = "auth_emulator_host";
pub const FIRESTORE_EMULATOR_KEY: &str = "firestore_emulator_host";

const IDENTITY_TOOLKIT_HOST: &str = "https://identitytoolkit.googleapis.com";
const SECURE_TOKEN_HOST: &str = "https://securetoken.googleapis.com";
const FIRESTORE_HOST: &str = "https://firestore.googleapis.com";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    #[default]
    Firebase,
    Memory,
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" | "" => Ok(BackendMode::Firebase),
            "memory" => Ok(BackendMode::Memory),
            other => Err(format!("Unknown backend mode: {}", other)),
        }
    }
}

/// Base URLs for the Identity Toolkit and Secure Token APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub identity_toolkit: String,
    pub secure_token: String,
}

#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    pub mode: BackendMode,
    pub api_key: Option<String>,
    pub project_id: Option<String>,
    pub auth_emulator_host: Option<String>,
    pub firestore_emulator_host: Option<String>,
}

impl BackendConfig {
    /// Build from a preference lookup and the keychain value.
    /// Blank values count as unset.
    pub fn from_values(get: impl Fn(&str) -> Option<String>, api_key: Option<String>) -> Self {
        let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let mode = match get(BACKEND_MODE_KEY) {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!("{}, falling back to firebase", e);
                BackendMode::Firebase
            }),
            None => BackendMode::Firebase,
        };

        Self {
            mode,
            api_key: non_blank(api_key),
            project_id: non_blank(get(PROJECT_ID_KEY)),
            auth_emulator_host: non_blank(get(AUTH_EMULATOR_KEY)),
            firestore_emulator_host: non_blank(get(FIRESTORE_EMULATOR_KEY)),
        }
    }

    pub fn load(app: &AppHandle) -> Self {
        let store = match app.store(PREFERENCES_STORE) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!("Failed to open store: {}", e);
                None
            }
        };
        let get = |key: &str| {
            store
                .as_ref()
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_str().map(|s| s.to_string()))
        };

        let api_key = match read_api_key() {
            Ok(key) => key,
            Err(e) => {
                warn!("Failed to read Firebase API key from keychain: {}", e);
                None
            }
        };

        let config = Self::from_values(get, api_key);
        info!(
            "Backend config: mode={:?}, project={:?}, api key set={}, auth emulator={:?}, firestore emulator={:?}",
            config.mode,
            config.project_id,
            config.api_key.is_some(),
            config.auth_emulator_host,
            config.firestore_emulator_host
        );
        config
    }

    pub fn auth_endpoints(&self) -> AuthEndpoints {
        match &self.auth_emulator_host {
            Some(host) => {
                let origin = emulator_origin(host);
                AuthEndpoints {
                    identity_toolkit: format!("{}/identitytoolkit.googleapis.com", origin),
                    secure_token: format!("{}/securetoken.googleapis.com", origin),
                }
            }
            None => AuthEndpoints {
                identity_toolkit: IDENTITY_TOOLKIT_HOST.to_string(),
                secure_token: SECURE_TOKEN_HOST.to_string(),
            },
        }
    }

    /// `.../documents` root for the configured project, if any.
    pub fn firestore_documents_url(&self) -> Option<String> {
        let project = self.project_id.as_ref()?;
        let origin = match &self.firestore_emulator_host {
            Some(host) => emulator_origin(host),
            None => FIRESTORE_HOST.to_string(),
        };
        Some(format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            origin, project
        ))
    }
}

fn emulator_origin(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

pub fn read_api_key() -> Result<Option<String>, String> {
    let entry = Entry::new(API_KEY_SERVICE, KEYRING_USER).map_err(|e| e.to_string())?;
    match entry.get_password() {
        Ok(key) => Ok(Some(key)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)], api_key: Option<&str>) -> BackendConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BackendConfig::from_values(|k| map.get(k).cloned(), api_key.map(String::from))
    }

    #[test]
    fn test_defaults_point_at_google() {
        let config = config_with(&[(PROJECT_ID_KEY, "vital-demo")], Some("AIza-test"));
        assert_eq!(config.mode, BackendMode::Firebase);
        assert_eq!(config.api_key.as_deref(), Some("AIza-test"));

        let endpoints = config.auth_endpoints();
        assert_eq!(endpoints.identity_toolkit, "https://identitytoolkit.googleapis.com");
        assert_eq!(endpoints.secure_token, "https://securetoken.googleapis.com");
        assert_eq!(
            config.firestore_documents_url().unwrap(),
            "https://firestore.googleapis.com/v1/projects/vital-demo/databases/(default)/documents"
        );
    }

    #[test]
    fn test_emulator_hosts() {
        let config = config_with(
            &[
                (PROJECT_ID_KEY, "demo-vital"),
                (AUTH_EMULATOR_KEY, "127.0.0.1:9099"),
                (FIRESTORE_EMULATOR_KEY, "http://127.0.0.1:8080/"),
            ],
            None,
        );
        let endpoints = config.auth_endpoints();
        assert_eq!(
            endpoints.identity_toolkit,
            "http://127.0.0.1:9099/identitytoolkit.googleapis.com"
        );
        assert_eq!(
            endpoints.secure_token,
            "http://127.0.0.1:9099/securetoken.googleapis.com"
        );
        assert_eq!(
            config.firestore_documents_url().unwrap(),
            "http://127.0.0.1:8080/v1/projects/demo-vital/databases/(default)/documents"
        );
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = config_with(&[(PROJECT_ID_KEY, "   ")], Some(""));
        assert!(config.project_id.is_none());
        assert!(config.api_key.is_none());
        assert!(config.firestore_documents_url().is_none());
    }

    #[test]
    fn test_backend_mode_parsing() {
        assert_eq!("memory".parse::<BackendMode>().unwrap(), BackendMode::Memory);
        assert_eq!("Firebase".parse::<BackendMode>().unwrap(), BackendMode::Firebase);
        assert!("sqlite".parse::<BackendMode>().is_err());

        let config = config_with(&[(BACKEND_MODE_KEY, "bogus")], None);
        assert_eq!(config.mode, BackendMode::Firebase);
    }
}
