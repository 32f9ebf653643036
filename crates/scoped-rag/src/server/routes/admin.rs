//! Administrative endpoints

use axum::{extract::State, Json};

use crate::auth::AuthenticatedUser;
use crate::engine::RefreshSummary;
use crate::error::{Error, Result};
use crate::server::state::AppState;

/// POST /api/admin/refresh - Re-ingest and rebuild every index
///
/// Only roles permitted to read every department may trigger a rebuild.
pub async fn refresh(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<RefreshSummary>> {
    if !state.engine().policy().has_full_access(&user.role) {
        tracing::warn!(target: "audit", user = %user.username, role = %user.role, "Refresh denied");
        return Err(Error::Forbidden(format!(
            "role '{}' may not rebuild indexes",
            user.role
        )));
    }

    tracing::info!(
        target: "audit",
        user = %user.username,
        "Refresh requested for {}",
        state.engine().data_dir().display()
    );
    let summary = state.engine().refresh().await?;
    Ok(Json(summary))
}
