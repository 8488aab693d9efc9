use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, SessionState};
use crate::guard::Route;
use crate::session::SessionHandle;

#[component]
pub fn LoginPage(session: SessionHandle) -> impl IntoView {
    let navigate = use_navigate();
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);

    let finish = move |result: Result<SessionState, String>| {
        match result {
            Ok(state) => {
                session.replace(state);
                navigate(Route::Alerts.path(), Default::default());
            }
            Err(e) => set_error.set(Some(e)),
        }
        set_busy.set(false);
    };

    let finish_password = finish.clone();
    let sign_in = move |_| {
        let finish = finish_password.clone();
        let (email, password) = (email.get(), password.get());
        set_busy.set(true);
        set_error.set(None);
        spawn_local(async move {
            finish(commands::sign_in(&email, &password).await);
        });
    };

    let sign_in_google = move |_| {
        let finish = finish.clone();
        set_busy.set(true);
        set_error.set(None);
        spawn_local(async move {
            finish(commands::sign_in_with_google().await);
        });
    };

    view! {
        <div class="page auth-page">
            <h2>"Sign In"</h2>
            {move || session.error().map(|e| view! {
                <p class="status-text status-error">{format!("Backend unavailable: {}", e)}</p>
            })}
            <div class="form-group">
                <label for="login-email">"Email"</label>
                <input
                    id="login-email"
                    type="email"
                    class="input"
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
            </div>
            <div class="form-group">
                <label for="login-password">"Password"</label>
                <input
                    id="login-password"
                    type="password"
                    class="input input-password"
                    prop:value=move || password.get()
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                />
            </div>
            {move || error.get().map(|e| view! { <p class="status-text status-error">{e}</p> })}
            <div class="input-row">
                <button class="btn btn-primary" on:click=sign_in disabled=move || busy.get()>
                    {move || if busy.get() { "Signing in..." } else { "Sign In" }}
                </button>
                <button class="btn btn-secondary" on:click=sign_in_google disabled=move || busy.get()>
                    "Sign in with Google"
                </button>
            </div>
            <p class="auth-links">
                <a href=Route::ForgotPassword.path()>"Forgot password?"</a>
                " | "
                <a href=Route::Register.path()>"Create an account"</a>
                " | "
                <a href=Route::Settings.path()>"Settings"</a>
            </p>
        </div>
    }
}
