//! # Donation Repository
//!
//! Database operations for donation listings.
//!
//! ## Reservation Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              "At most one active recipient" invariant                   │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write                                              │
//! │     SELECT status FROM donations WHERE id = ?   -- both racers pass    │
//! │     UPDATE donations SET recipient_id = ...     -- second overwrites   │
//! │                                                                         │
//! │  ✅ CORRECT: conditional update                                         │
//! │     UPDATE donations SET status = 'reserved', recipient_id = ?         │
//! │     WHERE id = ? AND status = 'approved' AND recipient_id IS NULL      │
//! │                                                                         │
//! │  Exactly one racer sees rows_affected = 1; the other classifies        │
//! │  the zero into Conflict / InvalidState / NotFound.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{sort_column, Page, Paginated, SortOrder};
use givehub_core::{Donation, DonationKind, DonationStatus};

/// Filters for donation list queries.
#[derive(Debug, Clone, Default)]
pub struct DonationFilter {
    pub kind: Option<DonationKind>,
    /// Explicit status filter requested by the caller.
    pub status: Option<DonationStatus>,
    /// Visibility restriction applied on top of `status` for non-admins.
    /// `None` means no restriction (admin caller).
    pub visible_statuses: Option<Vec<DonationStatus>>,
    pub donor_id: Option<String>,
    /// Case-insensitive substring over location.
    pub location: Option<String>,
    pub min_quantity: Option<i64>,
    pub max_quantity: Option<i64>,
    /// Free-text search over title, description, location and tags.
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

/// Repository for donation database operations.
#[derive(Debug, Clone)]
pub struct DonationRepository {
    pool: SqlitePool,
}

impl DonationRepository {
    /// Creates a new DonationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DonationRepository { pool }
    }

    /// Inserts a new donation.
    pub async fn insert(&self, donation: &Donation) -> DbResult<()> {
        debug!(id = %donation.id, kind = %donation.kind.as_str(), "Inserting donation");

        sqlx::query(
            r#"
            INSERT INTO donations (
                id, donor_id, kind, title, description, details,
                quantity, location, tags, images, status, recipient_id,
                scheduled_date, completed_date, views, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17
            )
            "#,
        )
        .bind(&donation.id)
        .bind(&donation.donor_id)
        .bind(donation.kind)
        .bind(&donation.title)
        .bind(&donation.description)
        .bind(serde_json::to_string(&donation.details)?)
        .bind(donation.quantity)
        .bind(&donation.location)
        .bind(serde_json::to_string(&donation.tags)?)
        .bind(serde_json::to_string(&donation.images)?)
        .bind(donation.status)
        .bind(&donation.recipient_id)
        .bind(donation.scheduled_date)
        .bind(donation.completed_date)
        .bind(donation.views)
        .bind(donation.created_at)
        .bind(donation.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a donation by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Donation>> {
        let row = sqlx::query("SELECT * FROM donations WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_donation).transpose()
    }

    /// Updates the editable fields of a donation.
    ///
    /// Status, recipient and view counter have dedicated operations and are
    /// not touched here.
    pub async fn update(&self, donation: &Donation) -> DbResult<()> {
        debug!(id = %donation.id, "Updating donation");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE donations SET
                title = ?2,
                description = ?3,
                details = ?4,
                quantity = ?5,
                location = ?6,
                tags = ?7,
                images = ?8,
                scheduled_date = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&donation.id)
        .bind(&donation.title)
        .bind(&donation.description)
        .bind(serde_json::to_string(&donation.details)?)
        .bind(donation.quantity)
        .bind(&donation.location)
        .bind(serde_json::to_string(&donation.tags)?)
        .bind(serde_json::to_string(&donation.images)?)
        .bind(donation.scheduled_date)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Donation", &donation.id));
        }

        Ok(())
    }

    /// Deletes a donation.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM donations WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Donation", id));
        }

        Ok(())
    }

    /// Moves a donation between statuses, guarded on the expected current
    /// status.
    ///
    /// Takes an executor so callers can run it inside the same database
    /// transaction as a related transaction-row update.
    ///
    /// ## Returns
    /// `true` if the row moved, `false` if it was not in `from` (someone else
    /// transitioned it first, or it never was).
    pub async fn set_status(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        from: DonationStatus,
        to: DonationStatus,
        completed_date: Option<DateTime<Utc>>,
    ) -> DbResult<bool> {
        debug!(id = %id, from = from.as_str(), to = to.as_str(), "Donation status change");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE donations SET
                status = ?3,
                completed_date = COALESCE(?4, completed_date),
                updated_at = ?5
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(completed_date)
        .bind(now)
        .execute(exec)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Atomically reserves an approved donation for a recipient.
    ///
    /// Compare-and-swap on `status = 'approved' AND recipient_id IS NULL`;
    /// exactly one concurrent requester can win. Takes an executor so the
    /// caller can create the matching transaction row in the same database
    /// transaction.
    ///
    /// ## Returns
    /// `true` if this caller won the reservation.
    pub async fn reserve(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        recipient_id: &str,
    ) -> DbResult<bool> {
        debug!(id = %id, recipient_id = %recipient_id, "Reserving donation");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE donations SET
                status = 'reserved',
                recipient_id = ?2,
                updated_at = ?3
            WHERE id = ?1 AND status = 'approved' AND recipient_id IS NULL
            "#,
        )
        .bind(id)
        .bind(recipient_id)
        .bind(now)
        .execute(exec)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Releases a reservation: status back to approved, recipient cleared.
    ///
    /// Guarded on `status = 'reserved'`; the compensating half of a
    /// cancelled donation transaction.
    ///
    /// ## Returns
    /// `true` if a reservation was released.
    pub async fn release(&self, exec: impl SqliteExecutor<'_>, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Releasing donation reservation");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE donations SET
                status = 'approved',
                recipient_id = NULL,
                updated_at = ?2
            WHERE id = ?1 AND status = 'reserved'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(exec)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Fire-and-forget view counter bump.
    ///
    /// Delta update rather than read-modify-write so concurrent reads
    /// never lose counts.
    pub async fn increment_views(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE donations SET views = views + 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Lists donations with filters, pagination and sorting.
    pub async fn list(&self, filter: &DonationFilter, page: Page) -> DbResult<Paginated<Donation>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM donations WHERE 1=1");
        apply_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM donations WHERE 1=1");
        apply_filters(&mut qb, filter);

        let col = sort_column(
            filter.sort_by.as_deref(),
            &["created_at", "views", "quantity", "title"],
        );
        qb.push(format!(" ORDER BY {} {}", col, filter.order.as_sql()));
        qb.push(" LIMIT ").push_bind(page.limit());
        qb.push(" OFFSET ").push_bind(page.offset());

        let rows = qb.build().fetch_all(&self.pool).await?;
        let donations = rows
            .iter()
            .map(row_to_donation)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Paginated::new(donations, total, page))
    }
}

fn apply_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &DonationFilter) {
    if let Some(kind) = filter.kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(visible) = &filter.visible_statuses {
        qb.push(" AND status IN (");
        let mut sep = qb.separated(", ");
        for status in visible {
            sep.push_bind(*status);
        }
        qb.push(")");
    }
    if let Some(donor_id) = &filter.donor_id {
        qb.push(" AND donor_id = ").push_bind(donor_id.clone());
    }
    if let Some(location) = &filter.location {
        qb.push(" AND location LIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(min) = filter.min_quantity {
        qb.push(" AND quantity >= ").push_bind(min);
    }
    if let Some(max) = filter.max_quantity {
        qb.push(" AND quantity <= ").push_bind(max);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR description LIKE ")
            .push_bind(pattern.clone())
            .push(" OR location LIKE ")
            .push_bind(pattern.clone())
            .push(" OR tags LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Maps a donations row to the domain type, parsing JSON columns.
fn row_to_donation(row: &SqliteRow) -> DbResult<Donation> {
    let details: String = row.try_get("details")?;
    let tags: String = row.try_get("tags")?;
    let images: String = row.try_get("images")?;

    Ok(Donation {
        id: row.try_get("id")?,
        donor_id: row.try_get("donor_id")?,
        kind: row.try_get("kind")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        details: serde_json::from_str(&details)?,
        quantity: row.try_get("quantity")?,
        location: row.try_get("location")?,
        tags: serde_json::from_str(&tags)?,
        images: serde_json::from_str(&images)?,
        status: row.try_get("status")?,
        recipient_id: row.try_get("recipient_id")?,
        scheduled_date: row.try_get("scheduled_date")?,
        completed_date: row.try_get("completed_date")?,
        views: row.try_get("views")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
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
    use givehub_core::details::{BloodGroup, DonationDetails};
    use givehub_core::{Account, Role};

    async fn seed_account(db: &Database, email: &str) -> Account {
        let now = Utc::now();
        let account = Account {
            id: generate_id(),
            email: email.to_string(),
            password_hash: "hash".into(),
            first_name: "Test".into(),
            last_name: "Donor".into(),
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

    fn blood_donation(donor_id: &str) -> Donation {
        let now = Utc::now();
        Donation {
            id: generate_id(),
            donor_id: donor_id.to_string(),
            kind: DonationKind::Blood,
            title: "O+ blood".into(),
            description: "Healthy donor".into(),
            details: DonationDetails::Blood {
                blood_group: BloodGroup::OPositive,
                last_donation_date: None,
                health_conditions: vec![],
                hemoglobin_level: Some(14.2),
                eligible_to_donate: true,
            },
            quantity: 1,
            location: "Springfield".into(),
            tags: vec!["urgent".into()],
            images: vec![],
            status: DonationStatus::Pending,
            recipient_id: None,
            scheduled_date: None,
            completed_date: None,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_round_trips_details() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donor = seed_account(&db, "donor@example.com").await;
        let repo = db.donations();

        let donation = blood_donation(&donor.id);
        repo.insert(&donation).await.unwrap();

        let fetched = repo.get_by_id(&donation.id).await.unwrap().unwrap();
        assert_eq!(fetched.details, donation.details);
        assert_eq!(fetched.kind, DonationKind::Blood);
        assert_eq!(fetched.tags, vec!["urgent".to_string()]);
        assert_eq!(fetched.status, DonationStatus::Pending);
    }

    #[tokio::test]
    async fn test_status_cas() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donor = seed_account(&db, "donor@example.com").await;
        let repo = db.donations();

        let donation = blood_donation(&donor.id);
        repo.insert(&donation).await.unwrap();

        // Approve succeeds from pending
        assert!(repo
            .set_status(
                db.pool(),
                &donation.id,
                DonationStatus::Pending,
                DonationStatus::Approved,
                None
            )
            .await
            .unwrap());

        // A second approval keyed on pending loses
        assert!(!repo
            .set_status(
                db.pool(),
                &donation.id,
                DonationStatus::Pending,
                DonationStatus::Approved,
                None
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_reserve_single_winner() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donor = seed_account(&db, "donor@example.com").await;
        let first = seed_account(&db, "first@example.com").await;
        let second = seed_account(&db, "second@example.com").await;
        let repo = db.donations();

        let donation = blood_donation(&donor.id);
        repo.insert(&donation).await.unwrap();
        repo.set_status(
            db.pool(),
            &donation.id,
            DonationStatus::Pending,
            DonationStatus::Approved,
            None,
        )
        .await
        .unwrap();

        assert!(repo
            .reserve(db.pool(), &donation.id, &first.id)
            .await
            .unwrap());
        // Second requester loses the race
        assert!(!repo
            .reserve(db.pool(), &donation.id, &second.id)
            .await
            .unwrap());

        let fetched = repo.get_by_id(&donation.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, DonationStatus::Reserved);
        assert_eq!(fetched.recipient_id.as_deref(), Some(first.id.as_str()));
    }

    #[tokio::test]
    async fn test_reserve_requires_approved() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donor = seed_account(&db, "donor@example.com").await;
        let other = seed_account(&db, "other@example.com").await;
        let repo = db.donations();

        let donation = blood_donation(&donor.id);
        repo.insert(&donation).await.unwrap();

        // Still pending: reservation must not go through
        assert!(!repo
            .reserve(db.pool(), &donation.id, &other.id)
            .await
            .unwrap());
        let fetched = repo.get_by_id(&donation.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, DonationStatus::Pending);
        assert!(fetched.recipient_id.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_views() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donor = seed_account(&db, "donor@example.com").await;
        let repo = db.donations();

        let mut a = blood_donation(&donor.id);
        a.title = "Blood drive".into();
        let mut b = blood_donation(&donor.id);
        b.id = generate_id();
        b.kind = DonationKind::Books;
        b.title = "Paperback novels".into();
        b.details = DonationDetails::Books {
            book_title: "Assorted".into(),
            author: None,
            isbn: None,
            genre: None,
            condition: None,
        };
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let books = repo
            .list(
                &DonationFilter {
                    kind: Some(DonationKind::Books),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(books.total, 1);
        assert_eq!(books.rows[0].id, b.id);

        let searched = repo
            .list(
                &DonationFilter {
                    search: Some("novels".into()),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(searched.total, 1);

        repo.increment_views(&a.id).await.unwrap();
        repo.increment_views(&a.id).await.unwrap();
        let fetched = repo.get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(fetched.views, 2);
    }

    #[tokio::test]
    async fn test_visibility_restriction() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let donor = seed_account(&db, "donor@example.com").await;
        let repo = db.donations();

        let visible = blood_donation(&donor.id);
        let mut hidden = blood_donation(&donor.id);
        hidden.id = generate_id();
        hidden.status = DonationStatus::Rejected;
        repo.insert(&visible).await.unwrap();
        repo.insert(&hidden).await.unwrap();

        let public = repo
            .list(
                &DonationFilter {
                    visible_statuses: Some(vec![
                        DonationStatus::Pending,
                        DonationStatus::Approved,
                        DonationStatus::Completed,
                    ]),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(public.total, 1);
        assert_eq!(public.rows[0].id, visible.id);
    }
}
