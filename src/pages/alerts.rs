use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, AlertsDashboard};
use crate::components::alert_card::AlertCard;

#[component]
pub fn AlertsPage() -> impl IntoView {
    let (dashboard, set_dashboard) = signal::<Option<AlertsDashboard>>(None);
    let (error, set_error) = signal::<Option<String>>(None);
    let (is_loading, set_is_loading) = signal(false);

    let load = move || {
        set_is_loading.set(true);
        spawn_local(async move {
            match commands::list_alerts().await {
                Ok(d) => {
                    set_dashboard.set(Some(d));
                    set_error.set(None);
                }
                Err(e) => set_error.set(Some(e)),
            }
            set_is_loading.set(false);
        });
    };

    Effect::new(move |_| load());

    // Debug builds only.
    let seed = move |_| {
        set_error.set(None);
        spawn_local(async move {
            match commands::seed_demo_alerts().await {
                Ok(_) => load(),
                Err(e) => set_error.set(Some(e)),
            }
        });
    };

    view! {
        <div class="page alerts-page">
            <h2>"Health Alerts"</h2>
            {move || error.get().map(|e| view! { <p class="status-text status-error">{e}</p> })}
            <Show when=move || cfg!(debug_assertions)>
                <button class="btn btn-secondary" on:click=seed>"Seed demo alerts"</button>
            </Show>
            {move || {
                if is_loading.get() && dashboard.with(|d| d.is_none()) {
                    return view! { <p class="loading">"Loading alerts..."</p> }.into_any();
                }
                let Some(d) = dashboard.get() else {
                    return ().into_any();
                };
                if d.alerts.is_empty() {
                    return view! { <p class="empty-state">"No alerts."</p> }.into_any();
                }
                let s = d.summary;
                view! {
                    <div class="alert-summary">
                        <span class="summary-item status-critical">{format!("{} critical", s.critical)}</span>
                        <span class="summary-item status-warning">{format!("{} warning", s.warning)}</span>
                        <span class="summary-item status-info">{format!("{} info", s.info)}</span>
                        {(s.other > 0).then(|| view! {
                            <span class="summary-item status-other">{format!("{} other", s.other)}</span>
                        })}
                    </div>
                    <div class="alert-list">
                        {d.alerts.into_iter().map(|alert| view! { <AlertCard alert=alert /> }).collect_view()}
                    </div>
                }.into_any()
            }}
        </div>
    }
}
