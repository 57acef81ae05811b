//! Donation listing handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::{AuthIdentity, MaybeIdentity};
use crate::error::ApiResult;
use crate::routes::{ListResponse, PageQuery};
use crate::services::donations::{
    self, CreateDonationInput, ListDonationsInput, UpdateDonationInput,
};
use crate::AppState;
use givehub_core::{Donation, Transaction};

pub async fn create(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(input): Json<CreateDonationInput>,
) -> ApiResult<(StatusCode, Json<Donation>)> {
    let donation = donations::create(&state, &identity, input).await?;
    Ok((StatusCode::CREATED, Json(donation)))
}

pub async fn list(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Query(input): Query<ListDonationsInput>,
) -> ApiResult<Json<ListResponse<Donation>>> {
    let page = donations::list(&state, identity.as_ref(), input).await?;
    Ok(Json(page.into()))
}

pub async fn mine(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<ListResponse<Donation>>> {
    let rows = donations::mine(&state, &identity, page.to_page()).await?;
    Ok(Json(rows.into()))
}

pub async fn get(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<Donation>> {
    Ok(Json(donations::get(&state, identity.as_ref(), &id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(input): Json<UpdateDonationInput>,
) -> ApiResult<Json<Donation>> {
    Ok(Json(donations::update(&state, &identity, &id, input).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    donations::delete(&state, &identity, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn request(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let tx = donations::request(&state, &identity, &id).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn favorite(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let (favorited, favorites) = donations::toggle_favorite(&state, &identity, &id).await?;
    Ok(Json(json!({ "favorited": favorited, "favorites": favorites })))
}
