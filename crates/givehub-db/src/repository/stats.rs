//! # Aggregation Repository
//!
//! Derived read models computed on demand from source-of-truth rows.
//!
//! ## Why On Demand?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stored counters need a writer at every code path that touches a       │
//! │  donation, item or transaction, and drift the first time one is        │
//! │  missed. These aggregates are plain SQL over the entity tables, so     │
//! │  they are correct whenever they are read and hold no state of their    │
//! │  own.                                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::error::DbResult;
use givehub_core::{AccountStats, DonationKind};

/// Platform-wide counters for the admin overview.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminOverview {
    pub total_users: i64,
    pub active_users: i64,
    pub total_donations: i64,
    pub pending_donations: i64,
    pub total_items: i64,
    pub active_items: i64,
    pub total_transactions: i64,
    pub pending_transactions: i64,
    /// Sum of completed purchase amounts, in cents.
    pub total_revenue_cents: i64,
}

/// Donation counts per kind for the user dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct KindBreakdown {
    pub kind: DonationKind,
    pub count: i64,
    pub total_quantity: i64,
}

/// Repository for aggregate (read-model) queries.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Creates a new StatsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Computes the derived statistics of one account.
    pub async fn account_stats(&self, account_id: &str) -> DbResult<AccountStats> {
        let total_donations: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM donations WHERE donor_id = ?1")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;

        let total_items_listed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE seller_id = ?1")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;

        // Completed purchases where the account was the buyer (the paying,
        // "donor" side of a purchase transaction).
        let total_items_received: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE donor_id = ?1 AND kind = 'purchase' AND status = 'completed'
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        let total_teaching_sessions: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM donations
            WHERE donor_id = ?1 AND kind = 'knowledge' AND status = 'completed'
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        let total_amount_donated_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0) FROM transactions
            WHERE donor_id = ?1 AND status = 'completed'
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        // Ratings received on either side of completed exchanges.
        let rating_row = sqlx::query(
            r#"
            SELECT AVG(r) AS rating, COUNT(*) AS review_count FROM (
                SELECT donor_rating AS r FROM transactions
                WHERE donor_id = ?1 AND donor_rating IS NOT NULL
                UNION ALL
                SELECT recipient_rating FROM transactions
                WHERE recipient_id = ?1 AND recipient_rating IS NOT NULL
            )
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        let rating: Option<f64> = rating_row.try_get("rating")?;
        let review_count: i64 = rating_row.try_get("review_count")?;

        Ok(AccountStats {
            total_donations,
            total_items_listed,
            total_items_received,
            total_teaching_sessions,
            total_amount_donated_cents,
            rating: rating.unwrap_or(0.0),
            review_count,
        })
    }

    /// Computes the platform-wide admin overview.
    pub async fn admin_overview(&self) -> DbResult<AdminOverview> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        let active_users: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;
        let total_donations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM donations")
            .fetch_one(&self.pool)
            .await?;
        let pending_donations: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM donations WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;
        let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        let active_items: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await?;
        let total_transactions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        let pending_transactions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await?;
        let total_revenue_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0) FROM transactions
            WHERE kind = 'purchase' AND status = 'completed'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminOverview {
            total_users,
            active_users,
            total_donations,
            pending_donations,
            total_items,
            active_items,
            total_transactions,
            pending_transactions,
            total_revenue_cents,
        })
    }

    /// Donation counts per kind for one donor (approved and completed only).
    pub async fn donation_kind_breakdown(
        &self,
        account_id: &str,
    ) -> DbResult<Vec<KindBreakdown>> {
        let rows = sqlx::query(
            r#"
            SELECT kind, COUNT(*) AS count, COALESCE(SUM(quantity), 0) AS total_quantity
            FROM donations
            WHERE donor_id = ?1 AND status IN ('approved', 'completed')
            GROUP BY kind
            ORDER BY count DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(KindBreakdown {
                    kind: row.try_get("kind")?,
                    count: row.try_get("count")?,
                    total_quantity: row.try_get("total_quantity")?,
                })
            })
            .collect()
    }
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
    use givehub_core::details::DonationDetails;
    use givehub_core::{
        Account, Donation, DonationStatus, Role, Transaction, TransactionKind, TransactionStatus,
    };

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

    fn knowledge_donation(donor_id: &str, status: DonationStatus) -> Donation {
        let now = Utc::now();
        Donation {
            id: generate_id(),
            donor_id: donor_id.to_string(),
            kind: givehub_core::DonationKind::Knowledge,
            title: "Algebra lessons".into(),
            description: "One hour a week".into(),
            details: DonationDetails::Knowledge {
                subject: "Algebra".into(),
                expertise_level: None,
                duration_hours: Some(1),
                format: None,
            },
            quantity: 1,
            location: "Springfield".into(),
            tags: vec![],
            images: vec![],
            status,
            recipient_id: None,
            scheduled_date: None,
            completed_date: None,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn completed_purchase(donor_id: &str, recipient_id: &str, amount: i64) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: generate_id(),
            donor_id: donor_id.to_string(),
            recipient_id: recipient_id.to_string(),
            kind: TransactionKind::Purchase,
            donation_id: None,
            item_id: None,
            amount_cents: amount,
            status: TransactionStatus::Completed,
            donor_rating: Some(4),
            donor_review: None,
            recipient_rating: Some(5),
            recipient_review: None,
            completed_date: Some(now),
            cancelled_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_account_stats_recomputed_from_rows() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donor = seed_account(&db, "donor@example.com").await;
        let seller = seed_account(&db, "seller@example.com").await;

        db.donations()
            .insert(&knowledge_donation(&donor.id, DonationStatus::Completed))
            .await
            .unwrap();
        db.donations()
            .insert(&knowledge_donation(&donor.id, DonationStatus::Pending))
            .await
            .unwrap();

        db.transactions()
            .insert(db.pool(), &completed_purchase(&donor.id, &seller.id, 1500))
            .await
            .unwrap();
        db.transactions()
            .insert(db.pool(), &completed_purchase(&donor.id, &seller.id, 500))
            .await
            .unwrap();

        let stats = db.stats().account_stats(&donor.id).await.unwrap();
        assert_eq!(stats.total_donations, 2);
        assert_eq!(stats.total_teaching_sessions, 1);
        assert_eq!(stats.total_items_received, 2);
        assert_eq!(stats.total_amount_donated_cents, 2000);
        // Ratings received as donor: two 4s
        assert_eq!(stats.review_count, 2);
        assert!((stats.rating - 4.0).abs() < f64::EPSILON);

        // The seller received two 5s
        let seller_stats = db.stats().account_stats(&seller.id).await.unwrap();
        assert_eq!(seller_stats.review_count, 2);
        assert!((seller_stats.rating - 5.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_admin_overview_counts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donor = seed_account(&db, "donor@example.com").await;
        let seller = seed_account(&db, "seller@example.com").await;

        db.accounts().set_active(&seller.id, false).await.unwrap();
        db.donations()
            .insert(&knowledge_donation(&donor.id, DonationStatus::Pending))
            .await
            .unwrap();
        db.transactions()
            .insert(db.pool(), &completed_purchase(&donor.id, &seller.id, 1000))
            .await
            .unwrap();

        let overview = db.stats().admin_overview().await.unwrap();
        assert_eq!(overview.total_users, 2);
        assert_eq!(overview.active_users, 1);
        assert_eq!(overview.total_donations, 1);
        assert_eq!(overview.pending_donations, 1);
        assert_eq!(overview.total_transactions, 1);
        assert_eq!(overview.pending_transactions, 0);
        assert_eq!(overview.total_revenue_cents, 1000);
    }

    #[tokio::test]
    async fn test_kind_breakdown_filters_statuses() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donor = seed_account(&db, "donor@example.com").await;

        db.donations()
            .insert(&knowledge_donation(&donor.id, DonationStatus::Completed))
            .await
            .unwrap();
        db.donations()
            .insert(&knowledge_donation(&donor.id, DonationStatus::Rejected))
            .await
            .unwrap();

        let breakdown = db.stats().donation_kind_breakdown(&donor.id).await.unwrap();
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].count, 1);
        assert_eq!(breakdown[0].kind, givehub_core::DonationKind::Knowledge);
    }
}
