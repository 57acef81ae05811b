//! # givehub-db: Database Layer for GiveHub
//!
//! This crate provides database access for the GiveHub system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GiveHub Data Flow                                │
//! │                                                                         │
//! │  API service (request_donation, purchase_item, ...)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     givehub-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (donation.rs) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ DonationRepo  │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │◄───│ ItemRepo      │    │              │  │   │
//! │  │   │ Management    │    │ TxRepo ...    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                       SQLite Database (WAL)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (account, donation, item, ...)
//!
//! ## Concurrency Guards
//!
//! Status transitions with invariants (reserving a donation, decrementing an
//! item's quantity) are conditional UPDATEs keyed on the expected prior
//! status, so read-then-write races cannot double-bind a recipient or
//! oversell stock. Multi-row operations (purchase + transaction insert,
//! completion + item update) run inside sqlx database transactions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use givehub_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/givehub.db")).await?;
//! let donation = db.donations().get_by_id("uuid-here").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::account::AccountRepository;
pub use repository::donation::DonationRepository;
pub use repository::favorite::FavoriteRepository;
pub use repository::item::ItemRepository;
pub use repository::notification::NotificationRepository;
pub use repository::stats::StatsRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::{Page, Paginated};
