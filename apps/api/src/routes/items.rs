//! Marketplace item handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::{AuthIdentity, MaybeIdentity};
use crate::error::ApiResult;
use crate::routes::{ListResponse, PageQuery};
use crate::services::items::{self, CreateItemInput, ListItemsInput, UpdateItemInput};
use crate::AppState;
use givehub_core::{Item, Transaction};

pub async fn create(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(input): Json<CreateItemInput>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let item = items::create(&state, &identity, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Query(input): Query<ListItemsInput>,
) -> ApiResult<Json<ListResponse<Item>>> {
    let page = items::list(&state, identity.as_ref(), input).await?;
    Ok(Json(page.into()))
}

pub async fn mine(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<ListResponse<Item>>> {
    let rows = items::mine(&state, &identity, page.to_page()).await?;
    Ok(Json(rows.into()))
}

pub async fn get(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<Item>> {
    Ok(Json(items::get(&state, identity.as_ref(), &id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(input): Json<UpdateItemInput>,
) -> ApiResult<Json<Item>> {
    Ok(Json(items::update(&state, &identity, &id, input).await?))
}

pub async fn publish(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<Item>> {
    Ok(Json(items::publish(&state, &identity, &id).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    items::delete(&state, &identity, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn purchase(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let tx = items::purchase(&state, &identity, &id).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn favorite(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let (favorited, favorites) = items::toggle_favorite(&state, &identity, &id).await?;
    Ok(Json(json!({ "favorited": favorited, "favorites": favorites })))
}
