//! User dashboard handler.

use axum::extract::State;
use axum::Json;

use crate::auth::AuthIdentity;
use crate::error::ApiResult;
use crate::services::dashboard::{self, DashboardOverview};
use crate::AppState;

pub async fn overview(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> ApiResult<Json<DashboardOverview>> {
    Ok(Json(dashboard::overview(&state, &identity).await?))
}
