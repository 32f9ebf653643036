//! User-facing endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{Query, QueryResponse};

/// Chat request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The question
    pub message: String,
}

/// GET /api/user-info - Who am I
pub async fn user_info(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}

/// POST /api/chat - Answer a question under the caller's role
pub async fn chat(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<QueryResponse>> {
    let query = Query::new(request.message, user.role).with_username(user.username);
    let response = state.engine().answer(&query).await?;
    Ok(Json(response))
}
