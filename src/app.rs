use leptos::prelude::*;
use leptos_router::components::*;
use leptos_router::hooks::use_navigate;
use leptos_router::path;

use crate::components::navbar::Navbar;
use crate::guard::{guard, GuardDecision, Route as Page};
use crate::pages::alerts::AlertsPage;
use crate::pages::diagnostic_tests::DiagnosticTestsPage;
use crate::pages::forgot_password::ForgotPasswordPage;
use crate::pages::health::HealthPage;
use crate::pages::login::LoginPage;
use crate::pages::profile::ProfilePage;
use crate::pages::register::RegisterPage;
use crate::pages::settings::SettingsPage;
use crate::session::SessionHandle;

/// Renders `children` only when the guard allows `target`, otherwise navigates
/// to where the guard points.
#[component]
fn Guarded(session: SessionHandle, target: Page, children: ChildrenFn) -> impl IntoView {
    let navigate = use_navigate();
    let decision = move || guard(session.signed_in(), target);

    Effect::new(move |_| {
        if let GuardDecision::Redirect(to) = decision() {
            navigate(to.path(), Default::default());
        }
    });

    view! {
        <Show when=move || matches!(decision(), GuardDecision::Render(_))>
            {children()}
        </Show>
    }
}

#[component]
pub fn App() -> impl IntoView {
    let session = SessionHandle::new();
    session.start();

    view! {
        <Router>
            <div class="app-layout">
                <Show when=move || !session.loading() && session.signed_in()>
                    <Navbar session=session />
                </Show>
                <main class="content">
                    <Show
                        when=move || !session.loading()
                        fallback=|| view! { <p class="loading">"Loading..."</p> }
                    >
                        <Routes fallback=move || view! { <LoginPage session=session /> }>
                            <Route path=path!("/login") view=move || view! { <LoginPage session=session /> } />
                            <Route path=path!("/register") view=move || view! { <RegisterPage session=session /> } />
                            <Route path=path!("/forgot-password") view=ForgotPasswordPage />
                            <Route path=path!("/settings") view=SettingsPage />
                            <Route path=path!("/health") view=HealthPage />
                            <Route
                                path=path!("/profile")
                                view=move || view! {
                                    <Guarded session=session target=Page::Profile>
                                        <ProfilePage session=session />
                                    </Guarded>
                                }
                            />
                            <Route
                                path=path!("/alerts")
                                view=move || view! {
                                    <Guarded session=session target=Page::Alerts>
                                        <AlertsPage />
                                    </Guarded>
                                }
                            />
                            <Route
                                path=path!("/tests")
                                view=move || view! {
                                    <Guarded session=session target=Page::Tests>
                                        <DiagnosticTestsPage />
                                    </Guarded>
                                }
                            />
                        </Routes>
                    </Show>
                </main>
            </div>
        </Router>
    }
}
