use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands;
use crate::guard::Route;

#[component]
pub fn ForgotPasswordPage() -> impl IntoView {
    let (email, set_email) = signal(String::new());
    let (message, set_message) = signal::<Option<String>>(None);
    let (error, set_error) = signal::<Option<String>>(None);
    let (busy, set_busy) = signal(false);

    let send = move |_| {
        let address = email.get();
        set_busy.set(true);
        set_message.set(None);
        set_error.set(None);
        spawn_local(async move {
            match commands::send_password_reset(&address).await {
                Ok(text) => set_message.set(Some(text)),
                Err(e) => set_error.set(Some(e)),
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="page auth-page">
            <h2>"Reset Password"</h2>
            <div class="form-group">
                <label for="reset-email">"Email"</label>
                <input
                    id="reset-email"
                    type="email"
                    class="input"
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
            </div>
            {move || message.get().map(|m| view! { <p class="status-text status-saved">{m}</p> })}
            {move || error.get().map(|e| view! { <p class="status-text status-error">{e}</p> })}
            <button class="btn btn-primary" on:click=send disabled=move || busy.get()>
                "Send Reset Email"
            </button>
            <p class="auth-links">
                <a href=Route::Login.path()>"Back to sign in"</a>
            </p>
        </div>
    }
}
