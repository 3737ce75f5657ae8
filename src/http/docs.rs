//! `/api/docs` endpoint directory.

use axum::Json;
use serde_json::{json, Value};

/// Static description of the public API surface.
pub fn directory() -> Value {
    json!({
        "name": "KwachaNow API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "African Economic & Cultural Platform API",
        "endpoints": {
            "auth": {
                "POST /api/auth/register": "Register new user",
                "POST /api/auth/login": "User login",
                "POST /api/auth/logout": "User logout",
                "GET /api/auth/profile": "Get user profile",
            },
            "chat": {
                "POST /api/chat": "AI chat functionality",
                "GET /api/chat/sessions": "Get chat sessions",
                "GET /api/chat/sessions/:id": "Get specific chat session",
            },
            "news": {
                "GET /api/news": "Get news articles",
                "GET /api/news?country=:code": "Get country-specific news",
            },
            "countries": {
                "GET /api/countries": "List all African countries",
                "GET /api/countries/:code": "Get specific country data",
                "GET /api/countries/:code/economic": "Get economic data",
                "GET /api/countries/:code/cultural": "Get cultural data",
            },
            "users": {
                "GET /api/users/profile": "Get user profile",
                "PUT /api/users/profile": "Update user profile",
                "GET /api/users/saved": "Get saved content",
                "POST /api/users/save": "Save content",
            },
            "analytics": {
                "GET /api/analytics": "Platform analytics",
            },
            "health": {
                "GET /health": "Service health and database connectivity",
            },
        },
    })
}

pub async fn docs() -> Json<Value> {
    Json(directory())
}
