use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, RegistrationForm};
use crate::guard::Route;
use crate::session::SessionHandle;

#[component]
pub fn RegisterPage(session: SessionHandle) -> impl IntoView {
    let navigate = use_navigate();
    let form = RwSignal::new(RegistrationForm::default());
    let (error, set_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);

    let submit = move |_| {
        let navigate = navigate.clone();
        let data = form.get();
        if data.password != data.confirm_password {
            set_error.set(Some("Passwords do not match.".to_string()));
            return;
        }
        set_busy.set(true);
        set_error.set(None);
        spawn_local(async move {
            match commands::register(&data).await {
                Ok(state) => {
                    session.replace(state);
                    navigate(Route::Alerts.path(), Default::default());
                }
                Err(e) => set_error.set(Some(e)),
            }
            set_busy.set(false);
        });
    };

    let field = move |id: &'static str, label: &'static str, kind: &'static str, get: fn(&RegistrationForm) -> String, set: fn(&mut RegistrationForm, String)| {
        view! {
            <div class="form-group">
                <label for=id>{label}</label>
                <input
                    id=id
                    type=kind
                    class="input"
                    prop:value=move || form.with(get)
                    on:input=move |ev| form.update(|f| set(f, event_target_value(&ev)))
                />
            </div>
        }
    };

    view! {
        <div class="page auth-page">
            <h2>"Create Account"</h2>
            {field("reg-first", "First Name", "text", |f| f.first_name.clone(), |f, v| f.first_name = v)}
            {field("reg-middle", "Middle Name (optional)", "text", |f| f.middle_name.clone(), |f, v| f.middle_name = v)}
            {field("reg-last", "Last Name", "text", |f| f.last_name.clone(), |f, v| f.last_name = v)}
            {field("reg-email", "Email", "email", |f| f.email.clone(), |f, v| f.email = v)}
            {field("reg-password", "Password", "password", |f| f.password.clone(), |f, v| f.password = v)}
            {field("reg-confirm", "Confirm Password", "password", |f| f.confirm_password.clone(), |f, v| f.confirm_password = v)}
            <p class="section-description">
                "At least 8 characters with uppercase, lowercase, a number and one of @$!%*?&."
            </p>
            {move || error.get().map(|e| view! { <p class="status-text status-error">{e}</p> })}
            <button class="btn btn-primary" on:click=submit disabled=move || busy.get()>
                {move || if busy.get() { "Creating account..." } else { "Register" }}
            </button>
            <p class="auth-links">
                "Already have an account? "
                <a href=Route::Login.path()>"Sign in"</a>
            </p>
        </div>
    }
}
