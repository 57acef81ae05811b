//! Transaction service: status lifecycle, message threads, ratings.
//!
//! ## Completion / Cancellation Side Effects
//! ```text
//! completed + purchase  → referenced item marked sold (sold_date stamped)
//! completed + donation  → referenced donation reserved → completed
//! cancelled + purchase  → item unit restored (quantity +1, active, buyer cleared)
//! cancelled + donation  → reservation released (approved, recipient cleared)
//!
//! Each pair runs inside ONE database transaction with the status change
//! itself, so a crash cannot leave the listing and the transaction
//! disagreeing.
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::notify;
use crate::AppState;
use givehub_core::{
    authorize, lifecycle, validation, CoreError, DonationStatus, Identity, NotificationKind,
    NotificationPriority, Transaction, TransactionKind, TransactionMessage, TransactionStatus,
};
use givehub_db::repository::{generate_id, Page, Paginated};
use givehub_db::DbError;

// =============================================================================
// Inputs / Outputs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: TransactionStatus,
}

#[derive(Debug, Deserialize)]
pub struct AddMessageInput {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRatingInput {
    pub rating: i64,
    #[serde(default)]
    pub review: Option<String>,
}

/// A transaction together with its message thread.
#[derive(Debug, Serialize)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub messages: Vec<TransactionMessage>,
}

// =============================================================================
// Operations
// =============================================================================

/// Lists the transactions where the caller is either party.
pub async fn list_mine(
    state: &AppState,
    identity: &Identity,
    page: Page,
) -> ApiResult<Paginated<Transaction>> {
    Ok(state
        .db
        .transactions()
        .list_for_account(&identity.account_id, page)
        .await?)
}

/// Loads one transaction with its messages. Participants and admins only.
pub async fn get(state: &AppState, identity: &Identity, id: &str) -> ApiResult<TransactionDetail> {
    let tx = load(state, id).await?;
    authorize::can_view_transaction(identity, &tx)?;

    let messages = state.db.transactions().get_messages(id).await?;

    Ok(TransactionDetail {
        transaction: tx,
        messages,
    })
}

/// Advances a transaction's status.
///
/// Only the recipient or an admin may advance it; the edge must be legal;
/// the write is guarded on the expected prior status so concurrent updates
/// conflict instead of double-applying side effects.
pub async fn update_status(
    state: &AppState,
    identity: &Identity,
    id: &str,
    new_status: TransactionStatus,
) -> ApiResult<Transaction> {
    let tx = load(state, id).await?;

    authorize::can_update_transaction_status(identity, &tx)?;
    lifecycle::transaction_transition(tx.status, new_status)?;

    let now = Utc::now();
    let mut dbtx = state.db.pool().begin().await.map_err(DbError::from)?;

    let moved = state
        .db
        .transactions()
        .set_status(&mut *dbtx, &tx.id, tx.status, new_status, now)
        .await?;

    if !moved {
        dbtx.rollback().await.map_err(DbError::from)?;
        return Err(ApiError::Conflict(
            "transaction was updated concurrently".to_string(),
        ));
    }

    // Listing side effects ride in the same database transaction.
    match (new_status, tx.kind) {
        (TransactionStatus::Completed, TransactionKind::Purchase) => {
            if let Some(item_id) = &tx.item_id {
                state.db.items().mark_sold(&mut *dbtx, item_id, now).await?;
            }
        }
        (TransactionStatus::Completed, TransactionKind::Donation) => {
            if let Some(donation_id) = &tx.donation_id {
                let moved = state
                    .db
                    .donations()
                    .set_status(
                        &mut *dbtx,
                        donation_id,
                        DonationStatus::Reserved,
                        DonationStatus::Completed,
                        Some(now),
                    )
                    .await?;
                if !moved {
                    warn!(donation_id = %donation_id, "Donation was not reserved at completion");
                }
            }
        }
        (TransactionStatus::Cancelled, TransactionKind::Purchase) => {
            if let Some(item_id) = &tx.item_id {
                state.db.items().restore_unit(&mut *dbtx, item_id).await?;
            }
        }
        (TransactionStatus::Cancelled, TransactionKind::Donation) => {
            if let Some(donation_id) = &tx.donation_id {
                let released = state.db.donations().release(&mut *dbtx, donation_id).await?;
                if !released {
                    warn!(donation_id = %donation_id, "Donation was not reserved at cancellation");
                }
            }
        }
        _ => {}
    }

    dbtx.commit().await.map_err(DbError::from)?;

    info!(
        transaction_id = %id,
        from = tx.status.as_str(),
        to = new_status.as_str(),
        "Transaction status updated"
    );

    // Notify every party that did not initiate the change.
    for party in [&tx.donor_id, &tx.recipient_id] {
        if *party != identity.account_id {
            notify::dispatch(
                state,
                notify::notification(
                    party,
                    NotificationKind::TransactionUpdate,
                    "Transaction Status Updated",
                    format!("Transaction #{} has been {}", tx.id, new_status.as_str()),
                    Some(json!({ "transaction_id": tx.id.clone(), "status": new_status })),
                    NotificationPriority::Medium,
                ),
            )
            .await;
        }
    }

    load(state, id).await
}

/// Appends a message to the transaction thread. Participants only.
pub async fn add_message(
    state: &AppState,
    identity: &Identity,
    id: &str,
    body: &str,
) -> ApiResult<TransactionMessage> {
    let tx = load(state, id).await?;

    authorize::can_message_transaction(identity, &tx)?;
    validation::validate_message_body(body)?;

    let message = TransactionMessage {
        id: generate_id(),
        transaction_id: tx.id.clone(),
        sender_id: identity.account_id.clone(),
        body: body.trim().to_string(),
        created_at: Utc::now(),
    };

    state.db.transactions().add_message(&message).await?;

    if let Some(other_party) = tx.counterparty(&identity.account_id) {
        notify::dispatch(
            state,
            notify::notification(
                other_party,
                NotificationKind::MessageReceived,
                "New Message",
                format!("You have a new message regarding transaction #{}", tx.id),
                Some(json!({ "transaction_id": tx.id.clone(), "message_id": message.id.clone() })),
                NotificationPriority::Medium,
            ),
        )
        .await;
    }

    Ok(message)
}

/// Submits a rating of the counterpart.
///
/// Legal only on completed transactions; each side rates the other role
/// exactly once, so resubmission conflicts instead of overwriting.
pub async fn submit_rating(
    state: &AppState,
    identity: &Identity,
    id: &str,
    input: SubmitRatingInput,
) -> ApiResult<Transaction> {
    let tx = load(state, id).await?;

    authorize::can_rate_transaction(identity, &tx)?;
    lifecycle::transaction_ratable(tx.status)?;
    validation::validate_rating(input.rating)?;

    let review = input.review.as_deref();

    // The donor rates the recipient; the recipient rates the donor.
    let written = if tx.donor_id == identity.account_id {
        state
            .db
            .transactions()
            .set_recipient_rating(&tx.id, input.rating, review)
            .await?
    } else {
        state
            .db
            .transactions()
            .set_donor_rating(&tx.id, input.rating, review)
            .await?
    };

    if !written {
        return Err(ApiError::Conflict(
            "rating already submitted for this transaction".to_string(),
        ));
    }

    info!(transaction_id = %id, rater = %identity.account_id, "Rating submitted");

    load(state, id).await
}

async fn load(state: &AppState, id: &str) -> ApiResult<Transaction> {
    state
        .db
        .transactions()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Transaction", id).into())
}
