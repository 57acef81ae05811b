//! Transaction handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::AuthIdentity;
use crate::error::ApiResult;
use crate::routes::{ListResponse, PageQuery};
use crate::services::transactions::{
    self, AddMessageInput, SubmitRatingInput, TransactionDetail, UpdateStatusInput,
};
use crate::AppState;
use givehub_core::{Transaction, TransactionMessage};

pub async fn list_mine(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<ListResponse<Transaction>>> {
    let rows = transactions::list_mine(&state, &identity, page.to_page()).await?;
    Ok(Json(rows.into()))
}

pub async fn get(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<TransactionDetail>> {
    Ok(Json(transactions::get(&state, &identity, &id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(input): Json<UpdateStatusInput>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(
        transactions::update_status(&state, &identity, &id, input.status).await?,
    ))
}

pub async fn messages(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<TransactionMessage>>> {
    let detail = transactions::get(&state, &identity, &id).await?;
    Ok(Json(detail.messages))
}

pub async fn add_message(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(input): Json<AddMessageInput>,
) -> ApiResult<(StatusCode, Json<TransactionMessage>)> {
    let message = transactions::add_message(&state, &identity, &id, &input.message).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn submit_rating(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
    Json(input): Json<SubmitRatingInput>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(
        transactions::submit_rating(&state, &identity, &id, input).await?,
    ))
}
