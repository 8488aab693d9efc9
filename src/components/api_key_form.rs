use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands;

/// Keychain-backed secret field. `on_change` fires after a save or delete.
#[component]
pub fn ApiKeyForm(
    #[prop(into)] label: String,
    /// Keyring service, e.g. "vitalwatch-firebase-api"
    #[prop(into)]
    service: String,
    #[prop(into)] placeholder: String,
    #[prop(optional)] on_change: Option<Callback<()>>,
) -> impl IntoView {
    let (key_value, set_key_value) = signal(String::new());
    let (is_saved, set_is_saved) = signal(false);
    let (is_loading, set_is_loading) = signal(false);
    let (error_message, set_error_message) = signal::<Option<String>>(None);

    let notify = move || {
        if let Some(cb) = on_change {
            cb.run(());
        }
    };

    let service_check = service.clone();
    Effect::new(move |_| {
        let service = service_check.clone();
        spawn_local(async move {
            match commands::get_api_key(&service).await {
                Ok(key) => set_is_saved.set(key.is_some()),
                Err(e) => set_error_message.set(Some(format!("Failed to check key: {}", e))),
            }
        });
    });

    let service_save = service.clone();
    let save_key = move |_| {
        let service = service_save.clone();
        let key = key_value.get();
        if key.trim().is_empty() {
            set_error_message.set(Some("Please enter an API key".to_string()));
            return;
        }
        set_is_loading.set(true);
        set_error_message.set(None);
        spawn_local(async move {
            match commands::set_api_key(&service, &key).await {
                Ok(()) => {
                    set_is_saved.set(true);
                    set_key_value.set(String::new());
                    notify();
                }
                Err(e) => set_error_message.set(Some(format!("Failed to save: {}", e))),
            }
            set_is_loading.set(false);
        });
    };

    let service_delete = service;
    let delete_key = move |_| {
        let service = service_delete.clone();
        set_is_loading.set(true);
        set_error_message.set(None);
        spawn_local(async move {
            match commands::delete_api_key(&service).await {
                Ok(()) => {
                    set_is_saved.set(false);
                    notify();
                }
                Err(e) => set_error_message.set(Some(format!("Failed to delete: {}", e))),
            }
            set_is_loading.set(false);
        });
    };

    view! {
        <div class="form-group api-key-form">
            <label>{label}</label>
            <div class="input-row">
                <input
                    type="password"
                    placeholder=placeholder
                    class="input input-password"
                    prop:value=move || key_value.get()
                    on:input=move |ev| set_key_value.set(event_target_value(&ev))
                    disabled=move || is_loading.get()
                />
                <button class="btn btn-save" on:click=save_key disabled=move || is_loading.get()>
                    {move || if is_loading.get() { "Saving..." } else { "Save" }}
                </button>
                <Show when=move || is_saved.get()>
                    <button class="btn btn-delete" on:click=delete_key.clone() disabled=move || is_loading.get()>
                        "Delete"
                    </button>
                </Show>
            </div>
            <div class="key-status-row">
                {move || match (error_message.get(), is_saved.get()) {
                    (Some(err), _) => view! { <span class="status-text status-error">{err}</span> }.into_any(),
                    (None, true) => view! { <span class="status-text status-saved">"Saved to Keychain"</span> }.into_any(),
                    (None, false) => view! { <span class="status-text status-not-set">"Not configured"</span> }.into_any(),
                }}
            </div>
        </div>
    }
}
