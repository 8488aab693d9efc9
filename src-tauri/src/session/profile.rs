//! Per-user profile documents (`users/{uid}`) and their normalization.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backend::{Fields, Session};
use crate::error::{Result, VitalWatchError};
use crate::validation::{is_non_empty, is_valid_email, parse_positive_number};

pub const USERS_COLLECTION: &str = "users";

pub const DEFAULT_NOTIFICATIONS: bool = true;
pub const DEFAULT_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub notifications: bool,
    pub threshold: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            notifications: DEFAULT_NOTIFICATIONS,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub preferences: Preferences,
}

impl Profile {
    /// Empty names and default preferences, with the session's email.
    pub fn default_for(session: &Session) -> Self {
        Self {
            email: session.email.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Document body as stored in `users/{uid}`.
    pub fn to_fields(&self) -> Fields {
        let value = json!({
            "firstName": self.first_name,
            "middleName": self.middle_name,
            "lastName": self.last_name,
            "email": self.email,
            "preferences": {
                "notifications": self.preferences.notifications,
                "threshold": threshold_value(self.preferences.threshold),
            },
        });
        match value {
            Value::Object(map) => map,
            _ => Fields::new(),
        }
    }
}

/// Whole thresholds are stored as integers.
fn threshold_value(threshold: f64) -> Value {
    if threshold.fract() == 0.0 && threshold.abs() < i64::MAX as f64 {
        json!(threshold as i64)
    } else {
        json!(threshold)
    }
}

fn string_field(raw: &Fields, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// Merge a stored profile document over the defaults.
///
/// Missing or mistyped fields fall back individually: names to empty, email
/// to the session's email, `notifications` to true and `threshold` to 5
/// (non-positive thresholds count as missing). Documents written by the
/// older single `name` field are split into first and last name.
pub fn normalize_profile(raw: Option<&Fields>, session: &Session) -> Profile {
    let Some(raw) = raw else {
        return Profile::default_for(session);
    };

    let mut first_name = string_field(raw, "firstName").unwrap_or_default();
    let middle_name = string_field(raw, "middleName").unwrap_or_default();
    let mut last_name = string_field(raw, "lastName").unwrap_or_default();

    if first_name.is_empty() && last_name.is_empty() {
        if let Some(name) = string_field(raw, "name") {
            let name = name.trim();
            match name.split_once(char::is_whitespace) {
                Some((first, last)) => {
                    first_name = first.to_string();
                    last_name = last.trim().to_string();
                }
                None => first_name = name.to_string(),
            }
        }
    }

    let email = string_field(raw, "email")
        .filter(|e| !e.is_empty())
        .or_else(|| session.email.clone())
        .unwrap_or_default();

    let stored = raw.get("preferences").and_then(Value::as_object);
    let notifications = stored
        .and_then(|p| p.get("notifications"))
        .and_then(Value::as_bool)
        .unwrap_or(DEFAULT_NOTIFICATIONS);
    let threshold = stored
        .and_then(|p| p.get("threshold"))
        .and_then(Value::as_f64)
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(DEFAULT_THRESHOLD);

    Profile {
        first_name,
        middle_name,
        last_name,
        email,
        preferences: Preferences {
            notifications,
            threshold,
        },
    }
}

/// Profile form as submitted by the UI. `threshold` is the raw input text.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileForm {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub threshold: String,
    pub notifications: bool,
}

impl ProfileForm {
    pub fn into_profile(self) -> Result<Profile> {
        if !is_non_empty(&self.first_name) || !is_non_empty(&self.last_name) {
            return Err(VitalWatchError::Validation(
                "First and last name are required.".to_string(),
            ));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(VitalWatchError::Validation(
                "Please enter a valid email address.".to_string(),
            ));
        }
        let threshold = parse_positive_number(&self.threshold).ok_or_else(|| {
            VitalWatchError::Validation("Alert threshold must be a positive number.".to_string())
        })?;

        Ok(Profile {
            first_name: self.first_name.trim().to_string(),
            middle_name: self.middle_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            preferences: Preferences {
                notifications: self.notifications,
                threshold,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            uid: "u1".to_string(),
            email: Some("pat@example.com".to_string()),
        }
    }

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_missing_document_gives_defaults() {
        let profile = normalize_profile(None, &session());
        assert_eq!(profile.first_name, "");
        assert_eq!(profile.middle_name, "");
        assert_eq!(profile.last_name, "");
        assert_eq!(profile.email, "pat@example.com");
        assert!(profile.preferences.notifications);
        assert_eq!(profile.preferences.threshold, 5.0);
    }

    #[test]
    fn test_stored_fields_win() {
        let raw = fields(json!({
            "firstName": "Pat",
            "middleName": "Q",
            "lastName": "Doe",
            "email": "pat.doe@clinic.org",
            "preferences": { "notifications": false, "threshold": 8 }
        }));
        let profile = normalize_profile(Some(&raw), &session());
        assert_eq!(profile.first_name, "Pat");
        assert_eq!(profile.last_name, "Doe");
        assert_eq!(profile.email, "pat.doe@clinic.org");
        assert!(!profile.preferences.notifications);
        assert_eq!(profile.preferences.threshold, 8.0);
    }

    #[test]
    fn test_partial_preferences_are_filled() {
        let raw = fields(json!({ "preferences": { "notifications": false } }));
        let profile = normalize_profile(Some(&raw), &session());
        assert!(!profile.preferences.notifications);
        assert_eq!(profile.preferences.threshold, DEFAULT_THRESHOLD);

        let raw = fields(json!({ "preferences": { "threshold": 3 } }));
        let profile = normalize_profile(Some(&raw), &session());
        assert!(profile.preferences.notifications);
        assert_eq!(profile.preferences.threshold, 3.0);
    }

    #[test]
    fn test_bad_preference_values_fall_back() {
        let raw = fields(json!({
            "preferences": { "notifications": "yes", "threshold": 0 }
        }));
        let profile = normalize_profile(Some(&raw), &session());
        assert_eq!(profile.preferences, Preferences::default());

        let raw = fields(json!({ "preferences": "on" }));
        assert_eq!(
            normalize_profile(Some(&raw), &session()).preferences,
            Preferences::default()
        );
    }

    #[test]
    fn test_legacy_name_field_is_split() {
        let raw = fields(json!({ "name": "Pat  van Doe", "email": "" }));
        let profile = normalize_profile(Some(&raw), &session());
        assert_eq!(profile.first_name, "Pat");
        assert_eq!(profile.last_name, "van Doe");
        assert_eq!(profile.email, "pat@example.com");
    }

    #[test]
    fn test_to_fields_round_trips_through_normalize() {
        let profile = Profile {
            first_name: "Pat".into(),
            middle_name: "".into(),
            last_name: "Doe".into(),
            email: "pat@example.com".into(),
            preferences: Preferences {
                notifications: false,
                threshold: 7.0,
            },
        };
        let stored = profile.to_fields();
        assert_eq!(stored["preferences"]["threshold"], json!(7));
        assert_eq!(normalize_profile(Some(&stored), &session()), profile);
    }

    #[test]
    fn test_profile_form_validation() {
        let form = ProfileForm {
            first_name: " Pat ".into(),
            middle_name: "".into(),
            last_name: "Doe".into(),
            email: "pat@example.com".into(),
            threshold: "6.5".into(),
            notifications: true,
        };
        let profile = form.clone().into_profile().unwrap();
        assert_eq!(profile.first_name, "Pat");
        assert_eq!(profile.preferences.threshold, 6.5);

        let bad_threshold = ProfileForm {
            threshold: "-1".into(),
            ..form.clone()
        };
        assert!(bad_threshold.into_profile().is_err());

        let bad_email = ProfileForm {
            email: "nope".into(),
            ..form
        };
        assert_eq!(
            bad_email.into_profile().unwrap_err().user_message(),
            "Please enter a valid email address."
        );
    }
}
