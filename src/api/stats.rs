//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::DashboardStats, AppState};

use super::AuthenticatedUser;

/// Dashboard counters
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard counters", body = DashboardStats),
        (status = 403, description = "Staff only", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<DashboardStats>> {
    claims.require_staff()?;

    let stats = state.services.stats.dashboard().await?;
    Ok(Json(stats))
}
