/// Views reachable by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    ForgotPassword,
    Profile,
    Alerts,
    Tests,
    Settings,
    Health,
}

impl Route {
    /// Unknown paths fall back to the login view.
    pub fn from_path(path: &str) -> Self {
        let path = path.trim_end_matches('/');
        match path {
            "/register" => Route::Register,
            "/forgot-password" => Route::ForgotPassword,
            "/profile" => Route::Profile,
            "/alerts" => Route::Alerts,
            "/tests" => Route::Tests,
            "/settings" => Route::Settings,
            "/health" => Route::Health,
            _ => Route::Login,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::ForgotPassword => "/forgot-password",
            Route::Profile => "/profile",
            Route::Alerts => "/alerts",
            Route::Tests => "/tests",
            Route::Settings => "/settings",
            Route::Health => "/health",
        }
    }

    /// Settings and Health stay public so the backend can be configured
    /// before anyone can sign in.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Profile | Route::Alerts | Route::Tests)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect(Route),
}

pub fn guard(signed_in: bool, target: Route) -> GuardDecision {
    if target.is_protected() && !signed_in {
        GuardDecision::Redirect(Route::Login)
    } else {
        GuardDecision::Render(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_without_session_redirects_to_login() {
        let decision = guard(false, Route::from_path("/profile"));
        assert_eq!(decision, GuardDecision::Redirect(Route::Login));
        if let GuardDecision::Redirect(to) = decision {
            assert_eq!(to.path(), "/login");
        }
    }

    #[test]
    fn test_profile_with_session_renders() {
        assert_eq!(
            guard(true, Route::from_path("/profile")),
            GuardDecision::Render(Route::Profile)
        );
    }

    #[test]
    fn test_public_routes_render_without_session() {
        for path in ["/login", "/register", "/forgot-password", "/settings", "/health"] {
            let route = Route::from_path(path);
            assert_eq!(guard(false, route), GuardDecision::Render(route));
        }
    }

    #[test]
    fn test_all_protected_routes_redirect() {
        for route in [Route::Profile, Route::Alerts, Route::Tests] {
            assert_eq!(guard(false, route), GuardDecision::Redirect(Route::Login));
        }
    }

    #[test]
    fn test_unknown_path_falls_back_to_login() {
        assert_eq!(Route::from_path("/nowhere"), Route::Login);
        assert_eq!(Route::from_path("/"), Route::Login);
        assert_eq!(Route::from_path("/alerts/"), Route::Alerts);
    }

    #[test]
    fn test_paths_round_trip() {
        for route in [
            Route::Login,
            Route::Register,
            Route::ForgotPassword,
            Route::Profile,
            Route::Alerts,
            Route::Tests,
            Route::Settings,
            Route::Health,
        ] {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }
}
