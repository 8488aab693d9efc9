use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use wasm_bindgen_futures::spawn_local;

use crate::commands;
use crate::guard::Route;
use crate::session::SessionHandle;

#[component]
pub fn Navbar(session: SessionHandle) -> impl IntoView {
    let navigate = use_navigate();
    let (error, set_error) = signal::<Option<String>>(None);

    let logout = move |_| {
        let navigate = navigate.clone();
        set_error.set(None);
        spawn_local(async move {
            match commands::sign_out().await {
                Ok(state) => {
                    session.replace(state);
                    navigate(Route::Login.path(), Default::default());
                }
                Err(e) => set_error.set(Some(e)),
            }
        });
    };

    view! {
        <nav class="navbar">
            <div class="navbar-brand">
                <h1 class="navbar-title">"VitalWatch"</h1>
            </div>
            <ul class="nav-list">
                <li class="nav-item">
                    <a href=Route::Alerts.path() class="nav-link">"Alerts"</a>
                </li>
                <li class="nav-item">
                    <a href=Route::Tests.path() class="nav-link">"Diagnostic Tests"</a>
                </li>
                <li class="nav-item">
                    <a href=Route::Profile.path() class="nav-link">"Profile"</a>
                </li>
                <li class="nav-item">
                    <a href=Route::Settings.path() class="nav-link">"Settings"</a>
                </li>
            </ul>
            <div class="navbar-user">
                <span class="navbar-email">{move || session.email().unwrap_or_default()}</span>
                <button class="btn btn-secondary" on:click=logout>"Logout"</button>
                {move || error.get().map(|e| view! { <span class="status-text status-error">{e}</span> })}
            </div>
        </nav>
    }
}
