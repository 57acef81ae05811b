//! # Account Repository
//!
//! Database operations for accounts.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{sort_column, Page, Paginated, SortOrder};
use givehub_core::{Account, Role};

/// Filters for the admin account listing.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Case-insensitive substring over first name, last name and email.
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Inserts a new account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn insert(&self, account: &Account) -> DbResult<()> {
        debug!(email = %account.email, "Inserting account");

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, password_hash, first_name, last_name,
                phone, bio, avatar_url, location,
                role, is_active, created_at, updated_at, last_login
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.phone)
        .bind(&account.bio)
        .bind(&account.avatar_url)
        .bind(&account.location)
        .bind(account.role)
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .bind(account.last_login)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an account by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Gets an account by email (stored lowercased).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Updates the profile fields of an account.
    pub async fn update_profile(&self, account: &Account) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                first_name = ?2,
                last_name = ?3,
                phone = ?4,
                bio = ?5,
                avatar_url = ?6,
                location = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&account.id)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.phone)
        .bind(&account.bio)
        .bind(&account.avatar_url)
        .bind(&account.location)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", &account.id));
        }

        Ok(())
    }

    /// Replaces the stored password hash.
    pub async fn update_password(&self, id: &str, password_hash: &str) -> DbResult<()> {
        let now = Utc::now();

        let result =
            sqlx::query("UPDATE accounts SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(password_hash)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    /// Sets the active flag (soft deactivation / reactivation).
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        debug!(id = %id, is_active = is_active, "Setting account active flag");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE accounts SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(is_active)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    /// Sets the role (admin promotion/demotion).
    pub async fn set_role(&self, id: &str, role: Role) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE accounts SET role = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(role)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    /// Stamps the last successful login time.
    pub async fn touch_last_login(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query("UPDATE accounts SET last_login = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Hard-deletes an account row.
    ///
    /// The admin-protection rule (admins cannot be deleted) is enforced in
    /// the authorization layer before this is reached.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    /// Lists accounts with filters and pagination (admin surface).
    pub async fn list(&self, filter: &AccountFilter, page: Page) -> DbResult<Paginated<Account>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM accounts WHERE 1=1");
        apply_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM accounts WHERE 1=1");
        apply_filters(&mut qb, filter);

        let col = sort_column(filter.sort_by.as_deref(), &["created_at", "email", "last_login"]);
        qb.push(format!(" ORDER BY {} {}", col, filter.order.as_sql()));
        qb.push(" LIMIT ").push_bind(page.limit());
        qb.push(" OFFSET ").push_bind(page.offset());

        let rows = qb.build().fetch_all(&self.pool).await?;
        let accounts = rows
            .iter()
            .map(row_to_account)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Paginated::new(accounts, total, page))
    }
}

fn apply_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &AccountFilter) {
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR email LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role);
    }
    if let Some(active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(active);
    }
}

/// Maps an accounts row to the domain type.
fn row_to_account(row: &SqliteRow) -> DbResult<Account> {
    Ok(Account {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone: row.try_get("phone")?,
        bio: row.try_get("bio")?,
        avatar_url: row.try_get("avatar_url")?,
        location: row.try_get("location")?,
        role: row.try_get("role")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        last_login: row.try_get("last_login")?,
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

    pub(crate) fn sample_account(email: &str, role: Role) -> Account {
        let now = Utc::now();
        Account {
            id: generate_id(),
            email: email.to_string(),
            password_hash: "argon2-hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            bio: None,
            avatar_url: None,
            location: Some("Springfield".to_string()),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.accounts();

        let account = sample_account("ada@example.com", Role::User);
        repo.insert(&account).await.unwrap();

        let fetched = repo.get_by_id(&account.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "ada@example.com");
        assert_eq!(fetched.role, Role::User);
        assert!(fetched.is_active);

        let by_email = repo.get_by_email("ada@example.com").await.unwrap();
        assert!(by_email.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.accounts();

        repo.insert(&sample_account("dup@example.com", Role::User))
            .await
            .unwrap();
        let err = repo
            .insert(&sample_account("dup@example.com", Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deactivate_and_list_filter() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.accounts();

        let a = sample_account("a@example.com", Role::User);
        let b = sample_account("b@example.com", Role::Admin);
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        repo.set_active(&a.id, false).await.unwrap();

        let inactive = repo
            .list(
                &AccountFilter {
                    is_active: Some(false),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(inactive.total, 1);
        assert_eq!(inactive.rows[0].id, a.id);

        let admins = repo
            .list(
                &AccountFilter {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(admins.total, 1);
        assert_eq!(admins.rows[0].id, b.id);
    }
}
