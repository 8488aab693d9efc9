use leptos::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
}

impl CheckStatus {
    pub fn from_bool(ok: bool) -> Self {
        if ok {
            CheckStatus::Pass
        } else {
            CheckStatus::Fail
        }
    }
}

/// One line of the connection check.
#[component]
pub fn StatusBadge(
    #[prop(into)] label: String,
    status: CheckStatus,
    #[prop(optional, into)] detail: Option<String>,
) -> impl IntoView {
    let (icon, class) = match status {
        CheckStatus::Pass => ("\u{2713}", "status-badge status-pass"),
        CheckStatus::Fail => ("\u{2717}", "status-badge status-fail"),
        CheckStatus::Warn => ("!", "status-badge status-warn"),
    };

    view! {
        <div class="health-item">
            <span class=class>{icon}</span>
            <span class="health-name">{label}</span>
            <span class="health-detail">{detail.unwrap_or_default()}</span>
        </div>
    }
}
