//! # Item Repository
//!
//! Database operations for marketplace items.
//!
//! ## Purchase Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Purchase inside one DB transaction                      │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    UPDATE items SET quantity = quantity - 1, buyer_id = ?,             │
//! │           status = CASE WHEN quantity - 1 <= 0                         │
//! │                         THEN 'pending' ELSE status END                 │
//! │    WHERE id = ? AND status = 'active' AND quantity >= 1                │
//! │       │                                                                 │
//! │       ├── 0 rows → ROLLBACK (sold out / not active / gone)             │
//! │       │                                                                 │
//! │    INSERT INTO transactions (...)    -- same transaction               │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  A crash between the two writes rolls both back; the item and its      │
//! │  transaction can never disagree.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{sort_column, Page, Paginated, SortOrder};
use givehub_core::{Item, ItemCategory, ItemCondition, ItemStatus};

/// Filters for item list queries.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub category: Option<ItemCategory>,
    pub condition: Option<ItemCondition>,
    /// Explicit status filter requested by the caller.
    pub status: Option<ItemStatus>,
    /// Visibility restriction applied on top of `status` for non-admins.
    pub visible_statuses: Option<Vec<ItemStatus>>,
    pub seller_id: Option<String>,
    pub location: Option<String>,
    pub is_free: Option<bool>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    /// Free-text search over title, description, location and tags.
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts a new item.
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, title = %item.title, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, seller_id, title, description, category,
                price_cents, original_price_cents, is_free, condition,
                quantity, location, tags, images, status, buyer_id,
                sold_date, views, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.seller_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.category)
        .bind(item.price_cents)
        .bind(item.original_price_cents)
        .bind(item.is_free)
        .bind(item.condition)
        .bind(item.quantity)
        .bind(&item.location)
        .bind(serde_json::to_string(&item.tags)?)
        .bind(serde_json::to_string(&item.images)?)
        .bind(item.status)
        .bind(&item.buyer_id)
        .bind(item.sold_date)
        .bind(item.views)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query("SELECT * FROM items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    /// Updates the editable fields of an item.
    pub async fn update(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, "Updating item");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET
                title = ?2,
                description = ?3,
                category = ?4,
                price_cents = ?5,
                original_price_cents = ?6,
                is_free = ?7,
                condition = ?8,
                quantity = ?9,
                location = ?10,
                tags = ?11,
                images = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.category)
        .bind(item.price_cents)
        .bind(item.original_price_cents)
        .bind(item.is_free)
        .bind(item.condition)
        .bind(item.quantity)
        .bind(&item.location)
        .bind(serde_json::to_string(&item.tags)?)
        .bind(serde_json::to_string(&item.images)?)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id));
        }

        Ok(())
    }

    /// Deletes an item.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Moves an item between statuses, guarded on the expected current status.
    ///
    /// ## Returns
    /// `true` if the row moved.
    pub async fn set_status(
        &self,
        id: &str,
        from: ItemStatus,
        to: ItemStatus,
    ) -> DbResult<bool> {
        debug!(id = %id, from = from.as_str(), to = to.as_str(), "Item status change");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE items SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Sets an item status without a guard. Admin override path only.
    pub async fn force_status(&self, id: &str, to: ItemStatus) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE items SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(to)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Atomically claims one unit of an active item for a buyer.
    ///
    /// Conditional on `status = 'active' AND quantity >= 1`, so concurrent
    /// purchases of the last unit have exactly one winner. When the claimed
    /// unit is the last one the item moves to `pending` in the same
    /// statement, awaiting transaction completion.
    ///
    /// Takes an executor so the caller can run it inside the same database
    /// transaction that inserts the purchase record.
    ///
    /// ## Returns
    /// `true` if this caller claimed a unit.
    pub async fn claim_unit(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        buyer_id: &str,
    ) -> DbResult<bool> {
        debug!(id = %id, buyer_id = %buyer_id, "Claiming item unit");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET
                quantity = quantity - 1,
                buyer_id = ?2,
                status = CASE WHEN quantity - 1 <= 0 THEN 'pending' ELSE status END,
                updated_at = ?3
            WHERE id = ?1 AND status = 'active' AND quantity >= 1
            "#,
        )
        .bind(id)
        .bind(buyer_id)
        .bind(now)
        .execute(exec)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Marks an item sold after its purchase transaction completes.
    pub async fn mark_sold(
        &self,
        exec: impl SqliteExecutor<'_>,
        id: &str,
        sold_date: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, "Marking item sold");

        let result = sqlx::query(
            "UPDATE items SET status = 'sold', sold_date = ?2, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(sold_date)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Restores an item after its purchase transaction is cancelled:
    /// quantity back up by one, buyer cleared, status back to active.
    pub async fn restore_unit(&self, exec: impl SqliteExecutor<'_>, id: &str) -> DbResult<()> {
        debug!(id = %id, "Restoring item unit after cancellation");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET
                quantity = quantity + 1,
                status = 'active',
                buyer_id = NULL,
                sold_date = NULL,
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(exec)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Fire-and-forget view counter bump.
    pub async fn increment_views(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE items SET views = views + 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Lists items with filters, pagination and sorting.
    pub async fn list(&self, filter: &ItemFilter, page: Page) -> DbResult<Paginated<Item>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM items WHERE 1=1");
        apply_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM items WHERE 1=1");
        apply_filters(&mut qb, filter);

        let col = sort_column(
            filter.sort_by.as_deref(),
            &["created_at", "price_cents", "views", "title"],
        );
        qb.push(format!(" ORDER BY {} {}", col, filter.order.as_sql()));
        qb.push(" LIMIT ").push_bind(page.limit());
        qb.push(" OFFSET ").push_bind(page.offset());

        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows.iter().map(row_to_item).collect::<DbResult<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }
}

fn apply_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ItemFilter) {
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(condition) = filter.condition {
        qb.push(" AND condition = ").push_bind(condition);
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
    if let Some(seller_id) = &filter.seller_id {
        qb.push(" AND seller_id = ").push_bind(seller_id.clone());
    }
    if let Some(location) = &filter.location {
        qb.push(" AND location LIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(is_free) = filter.is_free {
        qb.push(" AND is_free = ").push_bind(is_free);
    }
    if let Some(min) = filter.min_price_cents {
        qb.push(" AND price_cents >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price_cents {
        qb.push(" AND price_cents <= ").push_bind(max);
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

/// Maps an items row to the domain type, parsing JSON columns.
fn row_to_item(row: &SqliteRow) -> DbResult<Item> {
    let tags: String = row.try_get("tags")?;
    let images: String = row.try_get("images")?;

    Ok(Item {
        id: row.try_get("id")?,
        seller_id: row.try_get("seller_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        price_cents: row.try_get("price_cents")?,
        original_price_cents: row.try_get("original_price_cents")?,
        is_free: row.try_get("is_free")?,
        condition: row.try_get("condition")?,
        quantity: row.try_get("quantity")?,
        location: row.try_get("location")?,
        tags: serde_json::from_str(&tags)?,
        images: serde_json::from_str(&images)?,
        status: row.try_get("status")?,
        buyer_id: row.try_get("buyer_id")?,
        sold_date: row.try_get("sold_date")?,
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
    use givehub_core::{Account, Role};

    async fn seed_account(db: &Database, email: &str) -> Account {
        let now = Utc::now();
        let account = Account {
            id: generate_id(),
            email: email.to_string(),
            password_hash: "hash".into(),
            first_name: "Test".into(),
            last_name: "Seller".into(),
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

    pub(crate) fn sample_item(seller_id: &str, price_cents: i64, quantity: i64) -> Item {
        let now = Utc::now();
        Item {
            id: generate_id(),
            seller_id: seller_id.to_string(),
            title: "Desk lamp".into(),
            description: "Works fine".into(),
            category: ItemCategory::Furniture,
            price_cents,
            original_price_cents: None,
            is_free: price_cents == 0,
            condition: ItemCondition::Good,
            quantity,
            location: "Springfield".into(),
            tags: vec![],
            images: vec![],
            status: ItemStatus::Active,
            buyer_id: None,
            sold_date: None,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seller = seed_account(&db, "seller@example.com").await;
        let repo = db.items();

        let item = sample_item(&seller.id, 1000, 2);
        repo.insert(&item).await.unwrap();

        let fetched = repo.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(fetched.price_cents, 1000);
        assert_eq!(fetched.status, ItemStatus::Active);
        assert!(!fetched.is_free);
    }

    #[tokio::test]
    async fn test_claim_unit_decrements_and_pends() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seller = seed_account(&db, "seller@example.com").await;
        let buyer = seed_account(&db, "buyer@example.com").await;
        let repo = db.items();

        let item = sample_item(&seller.id, 1000, 2);
        repo.insert(&item).await.unwrap();

        // First unit: quantity 2 -> 1, stays active
        assert!(repo.claim_unit(db.pool(), &item.id, &buyer.id).await.unwrap());
        let fetched = repo.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(fetched.quantity, 1);
        assert_eq!(fetched.status, ItemStatus::Active);

        // Last unit: quantity 1 -> 0, moves to pending
        assert!(repo.claim_unit(db.pool(), &item.id, &buyer.id).await.unwrap());
        let fetched = repo.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(fetched.quantity, 0);
        assert_eq!(fetched.status, ItemStatus::Pending);
        assert_eq!(fetched.buyer_id.as_deref(), Some(buyer.id.as_str()));

        // Sold out: no further claims
        assert!(!repo.claim_unit(db.pool(), &item.id, &buyer.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_restore_unit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seller = seed_account(&db, "seller@example.com").await;
        let buyer = seed_account(&db, "buyer@example.com").await;
        let repo = db.items();

        let item = sample_item(&seller.id, 1000, 1);
        repo.insert(&item).await.unwrap();

        assert!(repo.claim_unit(db.pool(), &item.id, &buyer.id).await.unwrap());
        repo.restore_unit(db.pool(), &item.id).await.unwrap();

        let fetched = repo.get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(fetched.quantity, 1);
        assert_eq!(fetched.status, ItemStatus::Active);
        assert!(fetched.buyer_id.is_none());
    }

    #[tokio::test]
    async fn test_list_price_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let seller = seed_account(&db, "seller@example.com").await;
        let repo = db.items();

        let cheap = sample_item(&seller.id, 0, 1);
        let pricey = sample_item(&seller.id, 5000, 1);
        repo.insert(&cheap).await.unwrap();
        repo.insert(&pricey).await.unwrap();

        let free = repo
            .list(
                &ItemFilter {
                    is_free: Some(true),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(free.total, 1);
        assert_eq!(free.rows[0].id, cheap.id);

        let expensive = repo
            .list(
                &ItemFilter {
                    min_price_cents: Some(1000),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(expensive.total, 1);
        assert_eq!(expensive.rows[0].id, pricey.id);
    }
}
