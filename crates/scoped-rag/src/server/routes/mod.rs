//! API routes for the server

pub mod admin;
pub mod chat;

use axum::{
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/user-info", get(chat::user_info))
        .route("/chat", post(chat::chat))
        .route("/admin/refresh", post(admin::refresh))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "scoped-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Role-scoped question answering over departmental documents",
        "endpoints": {
            "GET /health": "Liveness probe",
            "GET /ready": "200 once indexes are built",
            "GET /api/user-info": "Authenticated user and role",
            "POST /api/chat": "Ask a question under your role",
            "POST /api/admin/refresh": "Re-ingest documents and rebuild indexes",
            "GET /api/info": "This document"
        },
        "authentication": "HTTP Basic"
    }))
}
