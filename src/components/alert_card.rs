use leptos::prelude::*;
use wasm_bindgen::JsValue;

use crate::commands::Alert;

/// RFC 3339 timestamp rendered in the user's locale.
fn local_time(timestamp: &str) -> String {
    let date = js_sys::Date::new(&JsValue::from_str(timestamp));
    if date.get_time().is_nan() {
        return timestamp.to_string();
    }
    date.to_locale_string("default", &JsValue::UNDEFINED).into()
}

fn status_class(status: &str) -> &'static str {
    match status.to_ascii_lowercase().as_str() {
        "critical" => "alert-status status-critical",
        "warning" => "alert-status status-warning",
        "info" => "alert-status status-info",
        _ => "alert-status status-other",
    }
}

#[component]
pub fn AlertCard(alert: Alert) -> impl IntoView {
    let class = status_class(&alert.status);
    let when = alert
        .timestamp
        .as_deref()
        .map(local_time)
        .unwrap_or_else(|| "Unknown time".to_string());

    view! {
        <div class="alert-card">
            <div class="alert-header">
                <span class="alert-title">{alert.title}</span>
                <span class=class>{alert.status}</span>
            </div>
            <div class="alert-time">{when}</div>
            {alert.description.map(|d| view! { <p class="alert-description">{d}</p> })}
        </div>
    }
}
