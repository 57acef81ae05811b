//! Admin service: platform overview, account management, listing
//! moderation, transaction oversight.
//!
//! Callers reach these operations through the [`crate::auth::AdminIdentity`]
//! extractor, so every function here can assume an admin actor; the one
//! remaining rule it must still apply itself is the admin self-protection
//! rule on account deletion.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::services::notify;
use crate::AppState;
use givehub_core::{
    authorize, lifecycle, Account, CoreError, Donation, DonationStatus, Identity, Item,
    ItemStatus, NotificationKind, NotificationPriority, Role,
};
use givehub_db::repository::account::AccountFilter;
use givehub_db::repository::donation::DonationFilter;
use givehub_db::repository::item::ItemFilter;
use givehub_db::repository::stats::AdminOverview;
use givehub_db::repository::transaction::TransactionFilter;
use givehub_db::repository::{Page, Paginated};

// =============================================================================
// Inputs / Outputs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusInput<S> {
    pub status: S,
}

/// Platform stats plus recent activity for the admin landing page.
#[derive(Debug, Serialize)]
pub struct AdminOverviewResponse {
    pub stats: AdminOverview,
    pub recent_users: Vec<Account>,
    pub recent_donations: Vec<Donation>,
}

// =============================================================================
// Overview
// =============================================================================

/// Computes the platform overview on demand.
pub async fn overview(state: &AppState) -> ApiResult<AdminOverviewResponse> {
    let stats = state.db.stats().admin_overview().await?;

    let recent = Page::new(1, 5);
    let recent_users = state
        .db
        .accounts()
        .list(&AccountFilter::default(), recent)
        .await?
        .rows;
    let recent_donations = state
        .db
        .donations()
        .list(&DonationFilter::default(), recent)
        .await?
        .rows;

    Ok(AdminOverviewResponse {
        stats,
        recent_users,
        recent_donations,
    })
}

// =============================================================================
// Accounts
// =============================================================================

/// Lists accounts with filters.
pub async fn list_users(
    state: &AppState,
    filter: &AccountFilter,
    page: Page,
) -> ApiResult<Paginated<Account>> {
    Ok(state.db.accounts().list(filter, page).await?)
}

/// Updates an account's role or active flag.
pub async fn update_user(
    state: &AppState,
    id: &str,
    input: UpdateUserInput,
) -> ApiResult<Account> {
    let accounts = state.db.accounts();

    if accounts.get_by_id(id).await?.is_none() {
        return Err(CoreError::not_found("Account", id).into());
    }

    if let Some(role) = input.role {
        accounts.set_role(id, role).await?;
    }
    if let Some(is_active) = input.is_active {
        accounts.set_active(id, is_active).await?;
    }

    accounts
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Account", id).into())
}

/// Hard-deletes an account. Admin accounts are protected from this path.
pub async fn delete_user(state: &AppState, actor: &Identity, id: &str) -> ApiResult<()> {
    let target = state
        .db
        .accounts()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Account", id))?;

    authorize::can_delete_account(actor, target.role)?;
    state.db.accounts().delete(id).await?;

    info!(account_id = %id, "Account deleted by admin");
    Ok(())
}

// =============================================================================
// Donations
// =============================================================================

/// Lists donations, any status.
pub async fn list_donations(
    state: &AppState,
    filter: &DonationFilter,
    page: Page,
) -> ApiResult<Paginated<Donation>> {
    Ok(state.db.donations().list(filter, page).await?)
}

/// Moves a donation to a new status along a legal edge.
///
/// Approval and rejection notify the donor; other admin transitions are
/// silent.
pub async fn set_donation_status(
    state: &AppState,
    id: &str,
    new_status: DonationStatus,
) -> ApiResult<Donation> {
    let donation = state
        .db
        .donations()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Donation", id))?;

    lifecycle::donation_transition(donation.status, new_status)?;

    let completed_date =
        (new_status == DonationStatus::Completed).then(Utc::now);

    let moved = state
        .db
        .donations()
        .set_status(
            state.db.pool(),
            id,
            donation.status,
            new_status,
            completed_date,
        )
        .await?;

    if !moved {
        return Err(ApiError::Conflict(
            "donation was updated concurrently".to_string(),
        ));
    }

    info!(
        donation_id = %id,
        from = donation.status.as_str(),
        to = new_status.as_str(),
        "Donation moderated"
    );

    let kind = match new_status {
        DonationStatus::Approved => Some(NotificationKind::DonationApproved),
        DonationStatus::Rejected => Some(NotificationKind::DonationRejected),
        _ => None,
    };
    if let Some(kind) = kind {
        notify::dispatch(
            state,
            notify::notification(
                &donation.donor_id,
                kind,
                format!("Donation {}", new_status.as_str()),
                format!(
                    "Your donation \"{}\" has been {}",
                    donation.title,
                    new_status.as_str()
                ),
                Some(json!({ "donation_id": donation.id.clone() })),
                NotificationPriority::Medium,
            ),
        )
        .await;
    }

    state
        .db
        .donations()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Donation", id).into())
}

// =============================================================================
// Items
// =============================================================================

/// Lists items, any status.
pub async fn list_items(
    state: &AppState,
    filter: &ItemFilter,
    page: Page,
) -> ApiResult<Paginated<Item>> {
    Ok(state.db.items().list(filter, page).await?)
}

/// Sets an item's status. Admins may take any edge (dispute resolution,
/// relisting, expiry).
pub async fn set_item_status(
    state: &AppState,
    id: &str,
    new_status: ItemStatus,
) -> ApiResult<Item> {
    let items = state.db.items();

    if items.get_by_id(id).await?.is_none() {
        return Err(CoreError::not_found("Item", id).into());
    }

    items.force_status(id, new_status).await?;

    info!(item_id = %id, to = new_status.as_str(), "Item status overridden");

    items
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Item", id).into())
}

// =============================================================================
// Transactions
// =============================================================================

/// Lists transactions with filters.
pub async fn list_transactions(
    state: &AppState,
    filter: &TransactionFilter,
    page: Page,
) -> ApiResult<Paginated<givehub_core::Transaction>> {
    Ok(state.db.transactions().list(filter, page).await?)
}
