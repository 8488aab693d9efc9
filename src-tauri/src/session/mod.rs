pub mod flows;
pub mod profile;
pub mod sync;

pub use flows::RegistrationForm;
pub use profile::{normalize_profile, Preferences, Profile, ProfileForm};
pub use sync::{SessionState, SessionSynchronizer, SyncHandle};
