//! # Transaction Repository
//!
//! Database operations for transactions, their message threads and ratings.
//!
//! ## Transaction Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Transaction Lifecycle                               │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── insert() → Transaction { status: Pending }                     │
//! │         (purchase path: same DB transaction as the item unit claim)    │
//! │                                                                         │
//! │  2. ADVANCE                                                             │
//! │     └── set_status() → guarded on the expected current status          │
//! │         completed: stamps completed_date (+ item marked sold)          │
//! │         cancelled: stamps cancelled_date (+ item unit restored)        │
//! │                                                                         │
//! │  3. MESSAGES / RATINGS                                                  │
//! │     └── add_message() append-only thread                               │
//! │     └── set_*_rating() writes once, second write reports a conflict    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{Page, Paginated};
use givehub_core::{Transaction, TransactionKind, TransactionMessage, TransactionStatus};

/// Filters for the admin transaction listing.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    /// Restrict to transactions where this account is a party.
    pub account_id: Option<String>,
    /// Restrict to transactions where this account is the recipient.
    pub recipient_id: Option<String>,
}

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Inserts a transaction.
    ///
    /// Takes an executor so the purchase path can run it inside the same
    /// database transaction as the item unit claim.
    pub async fn insert(
        &self,
        exec: impl SqliteExecutor<'_>,
        tx: &Transaction,
    ) -> DbResult<()> {
        debug!(id = %tx.id, kind = ?tx.kind, "Inserting transaction");

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, donor_id, recipient_id, kind, donation_id, item_id,
                amount_cents, status,
                donor_rating, donor_review, recipient_rating, recipient_review,
                completed_date, cancelled_date, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.donor_id)
        .bind(&tx.recipient_id)
        .bind(tx.kind)
        .bind(&tx.donation_id)
        .bind(&tx.item_id)
        .bind(tx.amount_cents)
        .bind(tx.status)
        .bind(tx.donor_rating)
        .bind(&tx.donor_review)
        .bind(tx.recipient_rating)
        .bind(&tx.recipient_review)
        .bind(tx.completed_date)
        .bind(tx.cancelled_date)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(exec)
        .await?;

        Ok(())
    }

    /// Gets a transaction by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let row = sqlx::query("SELECT * FROM transactions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_transaction).transpose()
    }

    /// Moves a transaction between statuses, guarded on the expected current
    /// status, stamping completion or cancellation dates as appropriate.
    ///
    /// Takes an executor so completion/cancellation can update the referenced
    /// item in the same database transaction.
    ///
    /// ## Returns
    /// `true` if the row moved.
    pub async fn set_status(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        from: TransactionStatus,
        to: TransactionStatus,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, from = from.as_str(), to = to.as_str(), "Transaction status change");

        let completed = (to == TransactionStatus::Completed).then_some(at);
        let cancelled = (to == TransactionStatus::Cancelled).then_some(at);

        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                status = ?3,
                completed_date = COALESCE(?4, completed_date),
                cancelled_date = COALESCE(?5, cancelled_date),
                updated_at = ?6
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(completed)
        .bind(cancelled)
        .bind(at)
        .execute(exec)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists the transactions where the account is either party.
    pub async fn list_for_account(
        &self,
        account_id: &str,
        page: Page,
    ) -> DbResult<Paginated<Transaction>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE donor_id = ?1 OR recipient_id = ?1",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE donor_id = ?1 OR recipient_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(account_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let txs = rows
            .iter()
            .map(row_to_transaction)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Paginated::new(txs, total, page))
    }

    /// Lists transactions with admin filters.
    pub async fn list(
        &self,
        filter: &TransactionFilter,
        page: Page,
    ) -> DbResult<Paginated<Transaction>> {
        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM transactions WHERE 1=1");
        apply_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM transactions WHERE 1=1");
        apply_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC");
        qb.push(" LIMIT ").push_bind(page.limit());
        qb.push(" OFFSET ").push_bind(page.offset());

        let rows = qb.build().fetch_all(&self.pool).await?;
        let txs = rows
            .iter()
            .map(row_to_transaction)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Paginated::new(txs, total, page))
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Appends a message to a transaction thread.
    pub async fn add_message(&self, message: &TransactionMessage) -> DbResult<()> {
        debug!(transaction_id = %message.transaction_id, "Appending transaction message");

        sqlx::query(
            r#"
            INSERT INTO transaction_messages (id, transaction_id, sender_id, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&message.id)
        .bind(&message.transaction_id)
        .bind(&message.sender_id)
        .bind(&message.body)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets the ordered message thread of a transaction.
    pub async fn get_messages(&self, transaction_id: &str) -> DbResult<Vec<TransactionMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM transaction_messages
            WHERE transaction_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect()
    }

    // =========================================================================
    // Ratings
    // =========================================================================

    /// Writes the rating given TO the donor (submitted by the recipient).
    ///
    /// Guarded on the rating still being unset, so a resubmission reports a
    /// conflict instead of silently overwriting.
    ///
    /// ## Returns
    /// `true` if the rating was written.
    pub async fn set_donor_rating(
        &self,
        id: &str,
        rating: i64,
        review: Option<&str>,
    ) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                donor_rating = ?2,
                donor_review = ?3,
                updated_at = ?4
            WHERE id = ?1 AND donor_rating IS NULL
            "#,
        )
        .bind(id)
        .bind(rating)
        .bind(review)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Writes the rating given TO the recipient (submitted by the donor).
    ///
    /// ## Returns
    /// `true` if the rating was written.
    pub async fn set_recipient_rating(
        &self,
        id: &str,
        rating: i64,
        review: Option<&str>,
    ) -> DbResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                recipient_rating = ?2,
                recipient_review = ?3,
                updated_at = ?4
            WHERE id = ?1 AND recipient_rating IS NULL
            "#,
        )
        .bind(id)
        .bind(rating)
        .bind(review)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

fn apply_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &TransactionFilter) {
    if let Some(kind) = filter.kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(account_id) = &filter.account_id {
        qb.push(" AND (donor_id = ")
            .push_bind(account_id.clone())
            .push(" OR recipient_id = ")
            .push_bind(account_id.clone())
            .push(")");
    }
    if let Some(recipient_id) = &filter.recipient_id {
        qb.push(" AND recipient_id = ").push_bind(recipient_id.clone());
    }
}

/// Maps a transactions row to the domain type.
fn row_to_transaction(row: &SqliteRow) -> DbResult<Transaction> {
    Ok(Transaction {
        id: row.try_get("id")?,
        donor_id: row.try_get("donor_id")?,
        recipient_id: row.try_get("recipient_id")?,
        kind: row.try_get("kind")?,
        donation_id: row.try_get("donation_id")?,
        item_id: row.try_get("item_id")?,
        amount_cents: row.try_get("amount_cents")?,
        status: row.try_get("status")?,
        donor_rating: row.try_get("donor_rating")?,
        donor_review: row.try_get("donor_review")?,
        recipient_rating: row.try_get("recipient_rating")?,
        recipient_review: row.try_get("recipient_review")?,
        completed_date: row.try_get("completed_date")?,
        cancelled_date: row.try_get("cancelled_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Maps a transaction_messages row to the domain type.
fn row_to_message(row: &SqliteRow) -> DbResult<TransactionMessage> {
    Ok(TransactionMessage {
        id: row.try_get("id")?,
        transaction_id: row.try_get("transaction_id")?,
        sender_id: row.try_get("sender_id")?,
        body: row.try_get("body")?,
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
    use givehub_core::{Account, Role};

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

    fn purchase_tx(donor_id: &str, recipient_id: &str) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: generate_id(),
            donor_id: donor_id.to_string(),
            recipient_id: recipient_id.to_string(),
            kind: TransactionKind::Purchase,
            donation_id: None,
            item_id: None,
            amount_cents: 1000,
            status: TransactionStatus::Pending,
            donor_rating: None,
            donor_review: None,
            recipient_rating: None,
            recipient_review: None,
            completed_date: None,
            cancelled_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_for_account() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let buyer = seed_account(&db, "buyer@example.com").await;
        let seller = seed_account(&db, "seller@example.com").await;
        let outsider = seed_account(&db, "outsider@example.com").await;
        let repo = db.transactions();

        let tx = purchase_tx(&buyer.id, &seller.id);
        repo.insert(db.pool(), &tx).await.unwrap();

        let for_buyer = repo
            .list_for_account(&buyer.id, Page::default())
            .await
            .unwrap();
        assert_eq!(for_buyer.total, 1);

        let for_seller = repo
            .list_for_account(&seller.id, Page::default())
            .await
            .unwrap();
        assert_eq!(for_seller.total, 1);

        let for_outsider = repo
            .list_for_account(&outsider.id, Page::default())
            .await
            .unwrap();
        assert_eq!(for_outsider.total, 0);
    }

    #[tokio::test]
    async fn test_set_status_stamps_dates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let buyer = seed_account(&db, "buyer@example.com").await;
        let seller = seed_account(&db, "seller@example.com").await;
        let repo = db.transactions();

        let tx = purchase_tx(&buyer.id, &seller.id);
        repo.insert(db.pool(), &tx).await.unwrap();

        let now = Utc::now();
        assert!(repo
            .set_status(
                db.pool(),
                &tx.id,
                TransactionStatus::Pending,
                TransactionStatus::Completed,
                now
            )
            .await
            .unwrap());

        let fetched = repo.get_by_id(&tx.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, TransactionStatus::Completed);
        assert!(fetched.completed_date.is_some());
        assert!(fetched.cancelled_date.is_none());

        // Guard: the row is no longer pending
        assert!(!repo
            .set_status(
                db.pool(),
                &tx.id,
                TransactionStatus::Pending,
                TransactionStatus::Cancelled,
                now
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_message_thread_ordered() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let buyer = seed_account(&db, "buyer@example.com").await;
        let seller = seed_account(&db, "seller@example.com").await;
        let repo = db.transactions();

        let tx = purchase_tx(&buyer.id, &seller.id);
        repo.insert(db.pool(), &tx).await.unwrap();

        for (i, body) in ["hello", "is it available?", "yes"].iter().enumerate() {
            repo.add_message(&TransactionMessage {
                id: format!("m-{i}"),
                transaction_id: tx.id.clone(),
                sender_id: buyer.id.clone(),
                body: body.to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        }

        let thread = repo.get_messages(&tx.id).await.unwrap();
        assert_eq!(thread.len(), 3);
        assert_eq!(thread[0].body, "hello");
        assert_eq!(thread[2].body, "yes");
    }

    #[tokio::test]
    async fn test_rating_written_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let buyer = seed_account(&db, "buyer@example.com").await;
        let seller = seed_account(&db, "seller@example.com").await;
        let repo = db.transactions();

        let tx = purchase_tx(&buyer.id, &seller.id);
        repo.insert(db.pool(), &tx).await.unwrap();

        assert!(repo
            .set_donor_rating(&tx.id, 5, Some("great"))
            .await
            .unwrap());
        // Second write loses
        assert!(!repo.set_donor_rating(&tx.id, 1, None).await.unwrap());

        let fetched = repo.get_by_id(&tx.id).await.unwrap().unwrap();
        assert_eq!(fetched.donor_rating, Some(5));
        assert_eq!(fetched.donor_review.as_deref(), Some("great"));

        // The other side is independent
        assert!(repo.set_recipient_rating(&tx.id, 4, None).await.unwrap());
    }
}
