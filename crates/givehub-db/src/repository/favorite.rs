//! # Favorite Repository
//!
//! Membership relation between accounts and listings. No lifecycle of its
//! own: rows are created and deleted by the idempotent toggle.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use givehub_core::ListingKind;

/// Repository for favorite membership operations.
#[derive(Debug, Clone)]
pub struct FavoriteRepository {
    pool: SqlitePool,
}

impl FavoriteRepository {
    /// Creates a new FavoriteRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FavoriteRepository { pool }
    }

    /// Toggles membership for (listing, account).
    ///
    /// ## Returns
    /// `true` if the listing is favorited after the call, `false` if the
    /// toggle removed it. Two calls always return to the original state.
    pub async fn toggle(
        &self,
        kind: ListingKind,
        listing_id: &str,
        account_id: &str,
    ) -> DbResult<bool> {
        debug!(listing_id = %listing_id, account_id = %account_id, "Toggling favorite");

        let removed = sqlx::query(
            r#"
            DELETE FROM favorites
            WHERE listing_kind = ?1 AND listing_id = ?2 AND account_id = ?3
            "#,
        )
        .bind(kind)
        .bind(listing_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO favorites (listing_kind, listing_id, account_id, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(kind)
        .bind(listing_id)
        .bind(account_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Whether the account has favorited the listing.
    pub async fn is_favorited(
        &self,
        kind: ListingKind,
        listing_id: &str,
        account_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM favorites
            WHERE listing_kind = ?1 AND listing_id = ?2 AND account_id = ?3
            "#,
        )
        .bind(kind)
        .bind(listing_id)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Number of accounts that favorited the listing.
    pub async fn count_for_listing(&self, kind: ListingKind, listing_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM favorites WHERE listing_kind = ?1 AND listing_id = ?2",
        )
        .bind(kind)
        .bind(listing_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Listing ids of the account's favorites of the given kind.
    pub async fn list_for_account(
        &self,
        kind: ListingKind,
        account_id: &str,
    ) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT listing_id FROM favorites
            WHERE listing_kind = ?1 AND account_id = ?2
            ORDER BY created_at DESC
            "#,
        )
        .bind(kind)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
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

    #[tokio::test]
    async fn test_toggle_is_idempotent_pairwise() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let account = seed_account(&db, "fan@example.com").await;
        let repo = db.favorites();

        // Toggle on
        assert!(repo
            .toggle(ListingKind::Donation, "d-1", &account.id)
            .await
            .unwrap());
        assert!(repo
            .is_favorited(ListingKind::Donation, "d-1", &account.id)
            .await
            .unwrap());

        // Toggle off returns to the original state
        assert!(!repo
            .toggle(ListingKind::Donation, "d-1", &account.id)
            .await
            .unwrap());
        assert!(!repo
            .is_favorited(ListingKind::Donation, "d-1", &account.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_counts_and_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = seed_account(&db, "a@example.com").await;
        let b = seed_account(&db, "b@example.com").await;
        let repo = db.favorites();

        repo.toggle(ListingKind::Item, "i-1", &a.id).await.unwrap();
        repo.toggle(ListingKind::Item, "i-1", &b.id).await.unwrap();
        repo.toggle(ListingKind::Item, "i-2", &a.id).await.unwrap();

        assert_eq!(
            repo.count_for_listing(ListingKind::Item, "i-1").await.unwrap(),
            2
        );

        let mine = repo
            .list_for_account(ListingKind::Item, &a.id)
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        // Donation and item favorites are separate namespaces
        assert_eq!(
            repo.count_for_listing(ListingKind::Donation, "i-1")
                .await
                .unwrap(),
            0
        );
    }
}
