//! User dashboard: a read-only aggregation over the caller's own records.
//!
//! Nothing here persists state; every number is recomputed from the entity
//! tables on each request.

use serde::Serialize;

use crate::error::ApiResult;
use crate::services::accounts;
use crate::AppState;
use givehub_core::{AccountStats, Donation, Identity, Item, Notification, Transaction};
use givehub_db::repository::donation::DonationFilter;
use givehub_db::repository::item::ItemFilter;
use givehub_db::repository::stats::KindBreakdown;
use givehub_db::repository::transaction::TransactionFilter;
use givehub_db::repository::Page;
use givehub_core::TransactionStatus;

/// Everything the dashboard screen needs in one response.
#[derive(Debug, Serialize)]
pub struct DashboardOverview {
    pub stats: AccountStats,
    pub recent_donations: Vec<Donation>,
    pub recent_items: Vec<Item>,
    pub recent_transactions: Vec<Transaction>,
    /// Incoming transactions awaiting this account's action.
    pub pending_requests: Vec<Transaction>,
    pub recent_notifications: Vec<Notification>,
    pub donation_breakdown: Vec<KindBreakdown>,
    pub unread_notifications: i64,
}

/// Assembles the dashboard for the calling account.
pub async fn overview(state: &AppState, identity: &Identity) -> ApiResult<DashboardOverview> {
    let account_id = &identity.account_id;
    let recent = Page::new(1, 10);

    let stats = accounts::stats_for(state, account_id).await?;

    let recent_donations = state
        .db
        .donations()
        .list(
            &DonationFilter {
                donor_id: Some(account_id.clone()),
                ..Default::default()
            },
            recent,
        )
        .await?
        .rows;

    let recent_items = state
        .db
        .items()
        .list(
            &ItemFilter {
                seller_id: Some(account_id.clone()),
                ..Default::default()
            },
            recent,
        )
        .await?
        .rows;

    let recent_transactions = state
        .db
        .transactions()
        .list_for_account(account_id, recent)
        .await?
        .rows;

    let pending_requests = state
        .db
        .transactions()
        .list(
            &TransactionFilter {
                recipient_id: Some(account_id.clone()),
                status: Some(TransactionStatus::Pending),
                ..Default::default()
            },
            Page::new(1, 5),
        )
        .await?
        .rows;

    let recent_notifications = state
        .db
        .notifications()
        .list(account_id, false, recent)
        .await?
        .rows;

    let donation_breakdown = state.db.stats().donation_kind_breakdown(account_id).await?;
    let unread_notifications = state.db.notifications().unread_count(account_id).await?;

    Ok(DashboardOverview {
        stats,
        recent_donations,
        recent_items,
        recent_transactions,
        pending_requests,
        recent_notifications,
        donation_breakdown,
        unread_notifications,
    })
}
