use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::commands::{self, HealthReport};
use crate::components::status_badge::{CheckStatus, StatusBadge};

#[component]
pub fn HealthPage() -> impl IntoView {
    let (checking, set_checking) = signal(false);
    let (report, set_report) = signal::<Option<HealthReport>>(None);
    let (error, set_error) = signal::<Option<String>>(None);

    let do_health_check = move || {
        set_checking.set(true);
        set_error.set(None);
        spawn_local(async move {
            match commands::run_health_check().await {
                Ok(r) => set_report.set(Some(r)),
                Err(e) => set_error.set(Some(format!("Health check failed: {}", e))),
            }
            set_checking.set(false);
        });
    };

    Effect::new(move |_| do_health_check());

    view! {
        <div class="page health-page">
            <h2>"Connection Check"</h2>
            <p class="page-description">"Verify that VitalWatch can reach its backend."</p>

            <button class="btn btn-primary" on:click=move |_| do_health_check() disabled=move || checking.get()>
                {move || if checking.get() { "Checking..." } else { "Run Check" }}
            </button>

            {move || error.get().map(|e| view! {
                <div class="health-error">
                    <span class="status-text status-error">{e}</span>
                </div>
            })}

            {move || report.get().map(|r| {
                let HealthReport { backend_mode, api_key_set, project_id_set, auth_reachable, signed_in, restart_required } = r;
                let memory = backend_mode == "memory";
                let needed = if memory { vec![auth_reachable] } else { vec![api_key_set, project_id_set, auth_reachable] };
                let passed = needed.iter().filter(|&&ok| ok).count();
                let summary_class = if passed == needed.len() { "summary-all-pass" } else if passed == 0 { "summary-all-fail" } else { "summary-partial" };
                let configured = |ok: bool| if ok { "Configured" } else { "Not configured" };

                view! {
                    <div class="health-results">
                        <StatusBadge label="Backend" status=CheckStatus::Pass detail=backend_mode />
                        <Show when=move || !memory>
                            <StatusBadge label="Firebase API Key" status=CheckStatus::from_bool(api_key_set) detail=configured(api_key_set) />
                            <StatusBadge label="Project ID" status=CheckStatus::from_bool(project_id_set) detail=configured(project_id_set) />
                        </Show>
                        <StatusBadge
                            label="Auth Service"
                            status=CheckStatus::from_bool(auth_reachable)
                            detail=if auth_reachable { "Reachable" } else { "Unreachable" }
                        />
                        <StatusBadge
                            label="Session"
                            status=CheckStatus::Pass
                            detail=if signed_in { "Signed in" } else { "Signed out" }
                        />
                        <Show when=move || restart_required>
                            <StatusBadge label="Settings" status=CheckStatus::Warn detail="Saved changes apply after a restart" />
                        </Show>
                        <div class=format!("health-summary {}", summary_class)>
                            {format!("{} of {} checks passed", passed, needed.len())}
                        </div>
                    </div>
                }
            })}
        </div>
    }
}
