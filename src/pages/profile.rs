use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, Profile, ProfileForm};
use crate::session::SessionHandle;

fn form_from(profile: &Profile) -> ProfileForm {
    ProfileForm {
        first_name: profile.first_name.clone(),
        middle_name: profile.middle_name.clone(),
        last_name: profile.last_name.clone(),
        email: profile.email.clone(),
        threshold: profile.preferences.threshold.to_string(),
        notifications: profile.preferences.notifications,
    }
}

#[component]
pub fn ProfilePage(session: SessionHandle) -> impl IntoView {
    let form = RwSignal::new(None::<ProfileForm>);
    let (status, set_status) = signal::<Option<String>>(None);
    let (error, set_error) = signal::<Option<String>>(None);
    let (saving, set_saving) = signal(false);

    // Seed from the session, then replace with a fresh read.
    if let Some(profile) = session.profile() {
        form.set(Some(form_from(&profile)));
    }
    Effect::new(move |_| {
        spawn_local(async move {
            match commands::get_profile().await {
                Ok(profile) => form.set(Some(form_from(&profile))),
                Err(e) => set_error.set(Some(e)),
            }
        });
    });

    let save = move |_| {
        let Some(data) = form.get() else { return };
        set_saving.set(true);
        set_status.set(None);
        set_error.set(None);
        spawn_local(async move {
            match commands::save_profile(&data).await {
                Ok(profile) => {
                    form.set(Some(form_from(&profile)));
                    set_status.set(Some("Profile updated.".to_string()));
                }
                Err(e) => set_error.set(Some(e)),
            }
            set_saving.set(false);
        });
    };

    let text_field = move |id: &'static str, label: &'static str, get: fn(&ProfileForm) -> String, set: fn(&mut ProfileForm, String)| {
        view! {
            <div class="form-group">
                <label for=id>{label}</label>
                <input
                    id=id
                    type="text"
                    class="input"
                    prop:value=move || form.with(|f| f.as_ref().map(get).unwrap_or_default())
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        form.update(|f| {
                            if let Some(f) = f.as_mut() {
                                set(f, value);
                            }
                        });
                    }
                />
            </div>
        }
    };

    view! {
        <div class="page profile-page">
            <h2>"Profile"</h2>
            <Show
                when=move || form.with(|f| f.is_some())
                fallback=move || view! {
                    <p class="loading">{move || error.get().unwrap_or_else(|| "Loading profile...".to_string())}</p>
                }
            >
                <section class="settings-section">
                    <h3>"Personal Details"</h3>
                    {text_field("profile-first", "First Name", |f| f.first_name.clone(), |f, v| f.first_name = v)}
                    {text_field("profile-middle", "Middle Name", |f| f.middle_name.clone(), |f, v| f.middle_name = v)}
                    {text_field("profile-last", "Last Name", |f| f.last_name.clone(), |f, v| f.last_name = v)}
                    {text_field("profile-email", "Email", |f| f.email.clone(), |f, v| f.email = v)}
                </section>
                <section class="settings-section">
                    <h3>"Alert Preferences"</h3>
                    {text_field("profile-threshold", "Alert Threshold", |f| f.threshold.clone(), |f, v| f.threshold = v)}
                    <div class="form-group checkbox-row">
                        <input
                            id="profile-notifications"
                            type="checkbox"
                            prop:checked=move || form.with(|f| f.as_ref().is_some_and(|f| f.notifications))
                            on:change=move |ev| {
                                let checked = event_target_checked(&ev);
                                form.update(|f| {
                                    if let Some(f) = f.as_mut() {
                                        f.notifications = checked;
                                    }
                                });
                            }
                        />
                        <label for="profile-notifications">"Email notifications"</label>
                    </div>
                </section>
                {move || error.get().map(|e| view! { <p class="status-text status-error">{e}</p> })}
                {move || status.get().map(|s| view! { <p class="status-text status-saved">{s}</p> })}
                <button class="btn btn-primary" on:click=save disabled=move || saving.get()>
                    {move || if saving.get() { "Saving..." } else { "Save Profile" }}
                </button>
            </Show>
        </div>
    }
}
