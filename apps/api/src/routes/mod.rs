//! HTTP routes.
//!
//! Handlers are thin: parse parameters, hand off to the service layer,
//! shape the JSON response. All policy lives in givehub-core and the
//! services.

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod donations;
pub mod items;
pub mod notifications;
pub mod transactions;

use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::AppState;
use givehub_db::repository::{Page, Paginated, DEFAULT_PAGE_LIMIT};

// =============================================================================
// Router Assembly
// =============================================================================

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Auth & profile
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/me", get(auth::me).put(auth::update_me))
        .route("/api/me/password", put(auth::change_password))
        .route("/api/me/deactivate", post(auth::deactivate))
        .route("/api/me/stats", get(auth::my_stats))
        // Donations
        .route(
            "/api/donations",
            get(donations::list).post(donations::create),
        )
        .route("/api/donations/mine", get(donations::mine))
        .route(
            "/api/donations/:id",
            get(donations::get)
                .put(donations::update)
                .delete(donations::remove),
        )
        .route("/api/donations/:id/request", post(donations::request))
        .route("/api/donations/:id/favorite", post(donations::favorite))
        // Items
        .route("/api/items", get(items::list).post(items::create))
        .route("/api/items/mine", get(items::mine))
        .route(
            "/api/items/:id",
            get(items::get).put(items::update).delete(items::remove),
        )
        .route("/api/items/:id/publish", post(items::publish))
        .route("/api/items/:id/purchase", post(items::purchase))
        .route("/api/items/:id/favorite", post(items::favorite))
        // Transactions
        .route("/api/transactions", get(transactions::list_mine))
        .route("/api/transactions/:id", get(transactions::get))
        .route(
            "/api/transactions/:id/status",
            put(transactions::update_status),
        )
        .route(
            "/api/transactions/:id/messages",
            get(transactions::messages).post(transactions::add_message),
        )
        .route(
            "/api/transactions/:id/rating",
            post(transactions::submit_rating),
        )
        // Notifications
        .route("/api/notifications", get(notifications::list))
        .route(
            "/api/notifications/read-all",
            put(notifications::mark_all_read),
        )
        .route("/api/notifications/:id/read", put(notifications::mark_read))
        .route("/api/notifications/:id", delete(notifications::remove))
        // Dashboard
        .route("/api/dashboard", get(dashboard::overview))
        // Admin
        .route("/api/admin/overview", get(admin::overview))
        .route("/api/admin/users", get(admin::list_users))
        .route(
            "/api/admin/users/:id",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/api/admin/donations", get(admin::list_donations))
        .route(
            "/api/admin/donations/:id/status",
            put(admin::set_donation_status),
        )
        .route("/api/admin/items", get(admin::list_items))
        .route("/api/admin/items/:id/status", put(admin::set_item_status))
        .route("/api/admin/transactions", get(admin::list_transactions))
        .route(
            "/api/admin/transactions/:id/status",
            put(admin::set_transaction_status),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

// =============================================================================
// Shared Response Shapes
// =============================================================================

/// Pagination metadata returned alongside every list.
#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: i64,
}

/// A page of items plus its pagination metadata.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> From<Paginated<T>> for ListResponse<T> {
    fn from(paginated: Paginated<T>) -> Self {
        let pages = paginated.pages();
        ListResponse {
            pagination: PageMeta {
                total: paginated.total,
                page: paginated.page,
                limit: paginated.limit,
                pages,
            },
            items: paginated.rows,
        }
    }
}

/// Plain page/limit query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn to_page(&self) -> Page {
        Page::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        )
    }
}
