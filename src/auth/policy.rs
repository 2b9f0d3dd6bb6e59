use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::accounts::repo_types::Identity;
use crate::auth::jwt::JwtKeys;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/auth/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// Everything under `/dashboard`.
    Protected,
    /// Sign-in, sign-up, refresh and sign-out.
    Login,
    /// Landing and other public pages.
    Public,
}

impl Area {
    pub fn classify(path: &str) -> Self {
        let under = |prefix: &str| {
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        };
        if under(DASHBOARD_PATH) {
            Area::Protected
        } else if under("/auth") {
            Area::Login
        } else {
            Area::Public
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToLogin,
    RedirectToDashboard,
}

/// Boundary check only. Approval status is enforced inside the protected area.
pub fn decide(identity: Option<&Identity>, area: Area) -> Decision {
    match (identity, area) {
        (None, Area::Protected) => Decision::RedirectToLogin,
        (Some(_), Area::Protected) => Decision::Allow,
        (Some(_), Area::Public) => Decision::RedirectToDashboard,
        _ => Decision::Allow,
    }
}

pub async fn access_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let keys = JwtKeys::from_ref(&state);
    let identity = keys.identity_from_headers(req.headers());
    let area = Area::classify(req.uri().path());

    match decide(identity.as_ref(), area) {
        Decision::Allow => next.run(req).await,
        Decision::RedirectToLogin => {
            debug!(path = %req.uri().path(), "anonymous request to protected area");
            Redirect::to(LOGIN_PATH).into_response()
        }
        Decision::RedirectToDashboard => {
            debug!(path = %req.uri().path(), "signed-in request to public page");
            Redirect::to(DASHBOARD_PATH).into_response()
        }
    }
}
