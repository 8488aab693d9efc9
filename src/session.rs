use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, Profile, SessionState};

/// The backend's session state mirrored into signals. Handed to every page
/// that needs it as a prop.
#[derive(Clone, Copy)]
pub struct SessionHandle {
    state: ReadSignal<SessionState>,
    set_state: WriteSignal<SessionState>,
}

impl SessionHandle {
    pub fn new() -> Self {
        let (state, set_state) = signal(SessionState::starting());
        Self { state, set_state }
    }

    /// Fetch the settled state once and follow `session-changed` events.
    pub fn start(self) {
        let set_state = self.set_state;
        spawn_local(async move {
            if let Err(e) = commands::on_session_changed(move |s| set_state.set(s)).await {
                web_sys::console::warn_1(&format!("Session events unavailable: {}", e).into());
            }
            match commands::get_session_state().await {
                Ok(s) => set_state.set(s),
                Err(e) => set_state.set(SessionState::unavailable(e)),
            }
        });
    }

    /// Apply the state a command returned, without waiting for the event.
    pub fn replace(&self, state: SessionState) {
        self.set_state.set(state);
    }

    pub fn loading(&self) -> bool {
        self.state.with(|s| s.loading)
    }

    pub fn signed_in(&self) -> bool {
        self.state.with(|s| s.user.is_some())
    }

    pub fn email(&self) -> Option<String> {
        self.state.with(|s| s.user.as_ref().and_then(|u| u.email.clone()))
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state.with(|s| s.profile.clone())
    }

    pub fn error(&self) -> Option<String> {
        self.state.with(|s| s.error.clone())
    }
}
