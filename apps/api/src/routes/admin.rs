//! Admin panel handlers. Every route requires the admin role via
//! [`AdminIdentity`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::AdminIdentity;
use crate::error::ApiResult;
use crate::routes::ListResponse;
use crate::services::admin::{self, AdminOverviewResponse, SetStatusInput, UpdateUserInput};
use crate::services::transactions;
use crate::AppState;
use givehub_core::{
    Account, Donation, DonationKind, DonationStatus, Item, ItemCategory, ItemStatus, Role,
    Transaction, TransactionKind, TransactionStatus,
};
use givehub_db::repository::account::AccountFilter;
use givehub_db::repository::donation::DonationFilter;
use givehub_db::repository::item::ItemFilter;
use givehub_db::repository::transaction::TransactionFilter;
use givehub_db::repository::{Page, DEFAULT_PAGE_LIMIT};

fn page_of(page: Option<u32>, limit: Option<u32>) -> Page {
    Page::new(page.unwrap_or(1), limit.unwrap_or(DEFAULT_PAGE_LIMIT))
}

// =============================================================================
// Overview
// =============================================================================

pub async fn overview(
    State(state): State<AppState>,
    AdminIdentity(_): AdminIdentity,
) -> ApiResult<Json<AdminOverviewResponse>> {
    Ok(Json(admin::overview(&state).await?))
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AdminUsersQuery {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminIdentity(_): AdminIdentity,
    Query(query): Query<AdminUsersQuery>,
) -> ApiResult<Json<ListResponse<Account>>> {
    let filter = AccountFilter {
        search: query.search,
        role: query.role,
        is_active: query.is_active,
        ..Default::default()
    };
    let rows = admin::list_users(&state, &filter, page_of(query.page, query.limit)).await?;
    Ok(Json(rows.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    AdminIdentity(_): AdminIdentity,
    Path(id): Path<String>,
    Json(input): Json<UpdateUserInput>,
) -> ApiResult<Json<Account>> {
    Ok(Json(admin::update_user(&state, &id, input).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminIdentity(identity): AdminIdentity,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    admin::delete_user(&state, &identity, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Donations
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AdminDonationsQuery {
    pub kind: Option<DonationKind>,
    pub status: Option<DonationStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list_donations(
    State(state): State<AppState>,
    AdminIdentity(_): AdminIdentity,
    Query(query): Query<AdminDonationsQuery>,
) -> ApiResult<Json<ListResponse<Donation>>> {
    let filter = DonationFilter {
        kind: query.kind,
        status: query.status,
        search: query.search,
        ..Default::default()
    };
    let rows = admin::list_donations(&state, &filter, page_of(query.page, query.limit)).await?;
    Ok(Json(rows.into()))
}

pub async fn set_donation_status(
    State(state): State<AppState>,
    AdminIdentity(_): AdminIdentity,
    Path(id): Path<String>,
    Json(input): Json<SetStatusInput<DonationStatus>>,
) -> ApiResult<Json<Donation>> {
    Ok(Json(
        admin::set_donation_status(&state, &id, input.status).await?,
    ))
}

// =============================================================================
// Items
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AdminItemsQuery {
    pub category: Option<ItemCategory>,
    pub status: Option<ItemStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list_items(
    State(state): State<AppState>,
    AdminIdentity(_): AdminIdentity,
    Query(query): Query<AdminItemsQuery>,
) -> ApiResult<Json<ListResponse<Item>>> {
    let filter = ItemFilter {
        category: query.category,
        status: query.status,
        search: query.search,
        ..Default::default()
    };
    let rows = admin::list_items(&state, &filter, page_of(query.page, query.limit)).await?;
    Ok(Json(rows.into()))
}

pub async fn set_item_status(
    State(state): State<AppState>,
    AdminIdentity(_): AdminIdentity,
    Path(id): Path<String>,
    Json(input): Json<SetStatusInput<ItemStatus>>,
) -> ApiResult<Json<Item>> {
    Ok(Json(admin::set_item_status(&state, &id, input.status).await?))
}

// =============================================================================
// Transactions
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AdminTransactionsQuery {
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub account_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    AdminIdentity(_): AdminIdentity,
    Query(query): Query<AdminTransactionsQuery>,
) -> ApiResult<Json<ListResponse<Transaction>>> {
    let filter = TransactionFilter {
        kind: query.kind,
        status: query.status,
        account_id: query.account_id,
        ..Default::default()
    };
    let rows = admin::list_transactions(&state, &filter, page_of(query.page, query.limit)).await?;
    Ok(Json(rows.into()))
}

pub async fn set_transaction_status(
    State(state): State<AppState>,
    AdminIdentity(identity): AdminIdentity,
    Path(id): Path<String>,
    Json(input): Json<SetStatusInput<TransactionStatus>>,
) -> ApiResult<Json<Transaction>> {
    // Same lifecycle and side effects as the user-facing path; admins pass
    // the recipient-or-admin authorization check by role.
    Ok(Json(
        transactions::update_status(&state, &identity, &id, input.status).await?,
    ))
}
