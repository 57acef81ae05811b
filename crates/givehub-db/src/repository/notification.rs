//! # Notification Repository
//!
//! Database operations for notifications. Rows are write-once: after insert
//! only the read flag changes, until the owner deletes them.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{Page, Paginated};
use givehub_core::Notification;

/// Repository for notification database operations.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Inserts a notification.
    pub async fn insert(&self, notification: &Notification) -> DbResult<()> {
        debug!(
            account_id = %notification.account_id,
            kind = ?notification.kind,
            "Inserting notification"
        );

        let payload = notification
            .payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, account_id, kind, title, message, payload,
                is_read, priority, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.account_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(payload)
        .bind(notification.is_read)
        .bind(notification.priority)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists notifications for an account, newest first.
    pub async fn list(
        &self,
        account_id: &str,
        unread_only: bool,
        page: Page,
    ) -> DbResult<Paginated<Notification>> {
        let read_clause = if unread_only { " AND is_read = 0" } else { "" };

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM notifications WHERE account_id = ?1{read_clause}"
        ))
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT * FROM notifications
            WHERE account_id = ?1{read_clause}
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#
        ))
        .bind(account_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let notifications = rows
            .iter()
            .map(row_to_notification)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Paginated::new(notifications, total, page))
    }

    /// Number of unread notifications for an account.
    pub async fn unread_count(&self, account_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE account_id = ?1 AND is_read = 0",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Marks one notification read. Owner-scoped.
    pub async fn mark_read(&self, id: &str, account_id: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?1 AND account_id = ?2")
                .bind(id)
                .bind(account_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }

        Ok(())
    }

    /// Marks every notification of an account read.
    ///
    /// ## Returns
    /// Number of rows flipped.
    pub async fn mark_all_read(&self, account_id: &str) -> DbResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE account_id = ?1 AND is_read = 0")
                .bind(account_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    /// Deletes one notification. Owner-scoped.
    pub async fn delete(&self, id: &str, account_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?1 AND account_id = ?2")
            .bind(id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }

        Ok(())
    }
}

/// Maps a notifications row to the domain type.
fn row_to_notification(row: &SqliteRow) -> DbResult<Notification> {
    let payload: Option<String> = row.try_get("payload")?;

    Ok(Notification {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        kind: row.try_get("kind")?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        payload: payload.as_deref().map(serde_json::from_str).transpose()?,
        is_read: row.try_get("is_read")?,
        priority: row.try_get("priority")?,
        created_at: row.try_get("created_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use chrono::Utc;
    use givehub_core::{Account, NotificationKind, NotificationPriority, Role};

    async fn seed_account(db: &Database, email: &str) -> Account {
        let now = Utc::now();
        let account = Account {
            id: generate_id(),
            email: email.to_string(),
            password_hash: "hash".into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            phone: None,
            bio: None,
            avatar_url: None,
            location: None,
            role: Role::User,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login: None,
        };
        db.accounts().insert(&account).await.unwrap();
        account
    }

    fn sample_notification(account_id: &str, kind: NotificationKind) -> Notification {
        Notification {
            id: generate_id(),
            account_id: account_id.to_string(),
            kind,
            title: "Donation approved".into(),
            message: "Your donation \"O+ blood\" has been approved".into(),
            payload: Some(serde_json::json!({ "donation_id": "d-1" })),
            is_read: false,
            priority: NotificationPriority::Medium,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_list_and_read_flag() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let account = seed_account(&db, "user@example.com").await;
        let repo = db.notifications();

        let n1 = sample_notification(&account.id, NotificationKind::DonationApproved);
        let n2 = sample_notification(&account.id, NotificationKind::System);
        repo.insert(&n1).await.unwrap();
        repo.insert(&n2).await.unwrap();

        assert_eq!(repo.unread_count(&account.id).await.unwrap(), 2);

        repo.mark_read(&n1.id, &account.id).await.unwrap();
        assert_eq!(repo.unread_count(&account.id).await.unwrap(), 1);

        let unread = repo
            .list(&account.id, true, Page::default())
            .await
            .unwrap();
        assert_eq!(unread.total, 1);
        assert_eq!(unread.rows[0].id, n2.id);

        let all = repo.list(&account.id, false, Page::default()).await.unwrap();
        assert_eq!(all.total, 2);
        // Payload survives the round trip
        assert!(all.rows.iter().any(|n| n.payload.is_some()));
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let owner = seed_account(&db, "owner@example.com").await;
        let other = seed_account(&db, "other@example.com").await;
        let repo = db.notifications();

        let n = sample_notification(&owner.id, NotificationKind::System);
        repo.insert(&n).await.unwrap();

        // Another account can neither flip nor delete it
        assert!(repo.mark_read(&n.id, &other.id).await.is_err());
        assert!(repo.delete(&n.id, &other.id).await.is_err());

        repo.delete(&n.id, &owner.id).await.unwrap();
        assert_eq!(repo.unread_count(&owner.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let account = seed_account(&db, "user@example.com").await;
        let repo = db.notifications();

        for _ in 0..3 {
            repo.insert(&sample_notification(&account.id, NotificationKind::System))
                .await
                .unwrap();
        }

        let flipped = repo.mark_all_read(&account.id).await.unwrap();
        assert_eq!(flipped, 3);
        assert_eq!(repo.unread_count(&account.id).await.unwrap(), 0);
    }
}
