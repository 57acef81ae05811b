//! Auth and profile handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::auth::AuthIdentity;
use crate::error::ApiResult;
use crate::services::accounts::{
    self, AuthResponse, ChangePasswordInput, LoginInput, RegisterInput, UpdateProfileInput,
};
use crate::AppState;
use givehub_core::{Account, AccountStats};

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let response = accounts::register(&state, input).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(accounts::login(&state, input).await?))
}

pub async fn me(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> ApiResult<Json<Account>> {
    Ok(Json(accounts::me(&state, &identity).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(input): Json<UpdateProfileInput>,
) -> ApiResult<Json<Account>> {
    Ok(Json(accounts::update_me(&state, &identity, input).await?))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(input): Json<ChangePasswordInput>,
) -> ApiResult<StatusCode> {
    accounts::change_password(&state, &identity, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deactivate(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> ApiResult<StatusCode> {
    accounts::deactivate_me(&state, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_stats(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> ApiResult<Json<AccountStats>> {
    Ok(Json(
        accounts::stats_for(&state, &identity.account_id).await?,
    ))
}
