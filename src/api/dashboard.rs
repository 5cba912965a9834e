//! Dashboard endpoint

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{error::AppResult, models::dashboard::DashboardStats};

use super::AuthenticatedUser;

/// Library dashboard statistics
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard snapshot", body = DashboardStats),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.dashboard.summary(Utc::now()).await?;
    Ok(Json(stats))
}
