use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, FIREBASE_API_SERVICE};
use crate::components::api_key_form::ApiKeyForm;

/// A text preference saved to `preferences.json`.
#[component]
fn PreferenceField(
    #[prop(into)] label: String,
    key: &'static str,
    #[prop(into)] placeholder: String,
    on_change: Callback<()>,
) -> impl IntoView {
    let (value, set_value) = signal(String::new());
    let (status, set_status) = signal::<Option<String>>(None);

    Effect::new(move |_| {
        spawn_local(async move {
            match commands::get_preference(key).await {
                Ok(Some(saved)) => set_value.set(saved),
                Ok(None) => {}
                Err(e) => set_status.set(Some(format!("Failed to load preference: {}", e))),
            }
        });
    });

    let save = move |_| {
        let v = value.get();
        spawn_local(async move {
            match commands::set_preference(key, &v).await {
                Ok(()) => {
                    set_status.set(Some("Saved".to_string()));
                    on_change.run(());
                }
                Err(e) => set_status.set(Some(format!("Failed to save: {}", e))),
            }
        });
    };

    view! {
        <div class="form-group">
            <label for=key>{label}</label>
            <div class="input-row">
                <input
                    id=key
                    type="text"
                    placeholder=placeholder
                    class="input"
                    prop:value=move || value.get()
                    on:input=move |ev| set_value.set(event_target_value(&ev))
                />
                <button class="btn btn-save" on:click=save>"Save"</button>
            </div>
            <Show when=move || status.get().is_some()>
                <span class="status-text">{move || status.get().unwrap_or_default()}</span>
            </Show>
        </div>
    }
}

#[component]
pub fn SettingsPage() -> impl IntoView {
    let (changed, set_changed) = signal(false);
    let mark_changed = Callback::new(move |()| set_changed.set(true));

    view! {
        <div class="page settings-page">
            <h2>"Settings"</h2>

            <section class="settings-section">
                <h3>"Firebase"</h3>
                <p class="section-description">"The Web API key is stored in your system keychain."</p>
                <ApiKeyForm
                    label="Firebase Web API Key"
                    service=FIREBASE_API_SERVICE
                    placeholder="AIza..."
                    on_change=mark_changed
                />
                <PreferenceField
                    label="Project ID"
                    key="firebase_project_id"
                    placeholder="my-health-project"
                    on_change=mark_changed
                />
            </section>

            <section class="settings-section">
                <h3>"Development"</h3>
                <p class="section-description">
                    "Backend mode is \"firebase\" or \"memory\". Emulator hosts are optional."
                </p>
                <PreferenceField
                    label="Backend Mode"
                    key="backend_mode"
                    placeholder="firebase"
                    on_change=mark_changed
                />
                <PreferenceField
                    label="Auth Emulator Host"
                    key="auth_emulator_host"
                    placeholder="127.0.0.1:9099"
                    on_change=mark_changed
                />
                <PreferenceField
                    label="Firestore Emulator Host"
                    key="firestore_emulator_host"
                    placeholder="127.0.0.1:8080"
                    on_change=mark_changed
                />
            </section>

            <Show when=move || changed.get()>
                <p class="status-text status-warning">"Restart VitalWatch to apply backend changes."</p>
            </Show>
            <p class="auth-links">
                <a href="/health">"Check connection"</a>
            </p>
        </div>
    }
}
