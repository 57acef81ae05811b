//! Notification handlers. Client-pull consumption: list, mark read, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthIdentity;
use crate::error::ApiResult;
use crate::routes::ListResponse;
use crate::AppState;
use givehub_core::Notification;
use givehub_db::repository::{Page, DEFAULT_PAGE_LIMIT};

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<ListResponse<Notification>>> {
    let page = Page::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    );

    let rows = state
        .db
        .notifications()
        .list(
            &identity.account_id,
            query.unread_only.unwrap_or(false),
            page,
        )
        .await?;

    Ok(Json(rows.into()))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .db
        .notifications()
        .mark_read(&id, &identity.account_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> ApiResult<Json<Value>> {
    let marked = state
        .db
        .notifications()
        .mark_all_read(&identity.account_id)
        .await?;
    Ok(Json(json!({ "marked": marked })))
}

pub async fn remove(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .db
        .notifications()
        .delete(&id, &identity.account_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
