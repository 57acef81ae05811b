//! Notification dispatch.
//!
//! One-way fan-out: every state transition that affects a counterparty
//! persists exactly one notification row per affected account. Never
//! batched, never deduplicated, never retried. Persistence failures are
//! logged and swallowed so a notification failure can never roll back or
//! block the primary operation.

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use crate::AppState;
use givehub_core::{Notification, NotificationKind, NotificationPriority};
use givehub_db::repository::generate_id;

/// Builds a notification row.
pub fn notification(
    account_id: &str,
    kind: NotificationKind,
    title: impl Into<String>,
    message: impl Into<String>,
    payload: Option<Value>,
    priority: NotificationPriority,
) -> Notification {
    Notification {
        id: generate_id(),
        account_id: account_id.to_string(),
        kind,
        title: title.into(),
        message: message.into(),
        payload,
        is_read: false,
        priority,
        created_at: Utc::now(),
    }
}

/// Persists a notification, swallowing failures.
pub async fn dispatch(state: &AppState, notification: Notification) {
    if let Err(err) = state.db.notifications().insert(&notification).await {
        warn!(
            account_id = %notification.account_id,
            kind = ?notification.kind,
            %err,
            "Failed to persist notification"
        );
    }
}
