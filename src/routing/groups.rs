//! Handler groups owned by external collaborators.
//!
//! Each group is a plain `axum::Router` mounted under its prefix. The prefix is
//! stripped before dispatch, so a group defines `/login` rather than
//! `/api/auth/login`.

use axum::{http::StatusCode, response::IntoResponse, Json, Router};
use serde_json::json;

/// The delegated API surface.
#[derive(Clone)]
pub struct HandlerGroups {
    pub auth: Router,
    pub chat: Router,
    pub news: Router,
    pub countries: Router,
    /// Mounted behind the authentication gate.
    pub users: Router,
    pub analytics: Router,
}

impl HandlerGroups {
    /// Groups that answer 501 until real collaborators are wired in.
    pub fn unmounted() -> Self {
        Self {
            auth: unmounted("auth"),
            chat: unmounted("chat"),
            news: unmounted("news"),
            countries: unmounted("countries"),
            users: unmounted("users"),
            analytics: unmounted("analytics"),
        }
    }

    /// `(name, prefix, router, gated)` in mount order.
    pub fn into_mounts(self) -> Vec<(&'static str, &'static str, Router, bool)> {
        vec![
            ("auth", "/api/auth", self.auth, false),
            ("chat", "/api/chat", self.chat, false),
            ("news", "/api/news", self.news, false),
            ("countries", "/api/countries", self.countries, false),
            ("users", "/api/users", self.users, true),
            ("analytics", "/api/analytics", self.analytics, false),
        ]
    }
}

impl Default for HandlerGroups {
    fn default() -> Self {
        Self::unmounted()
    }
}

fn unmounted(group: &'static str) -> Router {
    let handler = move || async move {
        (
            StatusCode::NOT_IMPLEMENTED,
            Json(json!({
                "error": format!("The {group} service is not available"),
                "code": "not_implemented",
            })),
        )
            .into_response()
    };
    Router::new().fallback(handler)
}
