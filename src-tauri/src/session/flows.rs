//! Sign-in, registration, sign-out and profile save, each ending once the
//! synchronizer has caught up so callers see a settled `SessionState`.

use serde::Deserialize;
use tracing::info;

use super::profile::{Profile, ProfileForm, USERS_COLLECTION};
use super::sync::{SessionState, SessionSynchronizer};
use crate::backend::{CredentialService, DocumentStore};
use crate::error::{Result, VitalWatchError};
use crate::validation::{is_non_empty, is_strong_password, is_valid_email, WEAK_PASSWORD_MESSAGE};

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<()> {
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
        if !is_strong_password(&self.password) {
            return Err(VitalWatchError::Validation(WEAK_PASSWORD_MESSAGE.to_string()));
        }
        if self.password != self.confirm_password {
            return Err(VitalWatchError::Validation("Passwords do not match.".to_string()));
        }
        Ok(())
    }

    fn initial_profile(&self) -> Profile {
        Profile {
            first_name: self.first_name.trim().to_string(),
            middle_name: self.middle_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            preferences: Default::default(),
        }
    }
}

fn require_field(value: &str, message: &str) -> Result<()> {
    if is_non_empty(value) {
        Ok(())
    } else {
        Err(VitalWatchError::Validation(message.to_string()))
    }
}

pub async fn sign_in(
    auth: &dyn CredentialService,
    sync: &SessionSynchronizer,
    email: &str,
    password: &str,
) -> Result<SessionState> {
    require_field(email, "Please enter your email.")?;
    require_field(password, "Please enter your password.")?;
    let session = auth.sign_in(email.trim(), password).await?;
    sync.settled_for(Some(&session.uid)).await
}

/// Create the account, then write the profile document with default
/// preferences.
pub async fn register(
    auth: &dyn CredentialService,
    store: &dyn DocumentStore,
    sync: &SessionSynchronizer,
    form: RegistrationForm,
) -> Result<SessionState> {
    form.validate()?;

    let session = auth.create_account(form.email.trim(), &form.password).await?;
    let profile = form.initial_profile();
    store
        .set(USERS_COLLECTION, &session.uid, profile.to_fields())
        .await?;
    info!("Created profile for {}", session.uid);

    // The synchronizer may have read before the profile existed.
    sync.settled_for(Some(&session.uid)).await?;
    sync.replace_profile(profile);
    Ok(sync.state())
}

pub async fn sign_out(
    auth: &dyn CredentialService,
    sync: &SessionSynchronizer,
) -> Result<SessionState> {
    auth.sign_out().await?;
    sync.settled_for(None).await
}

pub async fn send_password_reset(auth: &dyn CredentialService, email: &str) -> Result<()> {
    require_field(email, "Please enter your email.")?;
    auth.send_password_reset(email.trim()).await
}

/// Fresh read of the signed-in user's profile.
pub async fn load_profile(
    auth: &dyn CredentialService,
    store: &dyn DocumentStore,
) -> Result<Profile> {
    let session = auth
        .current_session()
        .ok_or_else(|| VitalWatchError::Auth("You must be signed in.".to_string()))?;
    let doc = store.get(USERS_COLLECTION, &session.uid).await?;
    Ok(super::profile::normalize_profile(
        doc.as_ref().map(|d| &d.fields),
        &session,
    ))
}

/// Overwrite the profile document wholesale; last writer wins.
pub async fn save_profile(
    auth: &dyn CredentialService,
    store: &dyn DocumentStore,
    sync: &SessionSynchronizer,
    form: ProfileForm,
) -> Result<Profile> {
    let session = auth
        .current_session()
        .ok_or_else(|| VitalWatchError::Auth("You must be signed in.".to_string()))?;
    let profile = form.into_profile()?;
    store
        .set(USERS_COLLECTION, &session.uid, profile.to_fields())
        .await?;
    info!("Saved profile for {}", session.uid);
    sync.replace_profile(profile.clone());
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            first_name: "Pat".into(),
            middle_name: "".into(),
            last_name: "Doe".into(),
            email: "pat@example.com".into(),
            password: "Secret1!".into(),
            confirm_password: "Secret1!".into(),
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(form().validate().is_ok());

        let weak = RegistrationForm {
            password: "secret".into(),
            confirm_password: "secret".into(),
            ..form()
        };
        assert_eq!(weak.validate().unwrap_err().user_message(), WEAK_PASSWORD_MESSAGE);

        let mismatch = RegistrationForm {
            confirm_password: "Secret2!".into(),
            ..form()
        };
        assert_eq!(
            mismatch.validate().unwrap_err().user_message(),
            "Passwords do not match."
        );

        let nameless = RegistrationForm {
            last_name: "  ".into(),
            ..form()
        };
        assert!(nameless.validate().is_err());
    }

    #[test]
    fn test_initial_profile_has_default_preferences() {
        let profile = form().initial_profile();
        assert!(profile.preferences.notifications);
        assert_eq!(profile.preferences.threshold, 5.0);
        assert_eq!(profile.email, "pat@example.com");
    }
}
