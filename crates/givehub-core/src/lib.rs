//! # givehub-core: Pure Business Logic for GiveHub
//!
//! This crate is the **heart** of GiveHub. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GiveHub Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                       HTTP Clients                              │   │
//! │  │    Browse ──► Request/Purchase ──► Messages ──► Ratings        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST (axum)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api services                            │   │
//! │  │    create_donation, request_donation, purchase_item, ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ givehub-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ lifecycle │  │ authorize │  │ validation│  │   │
//! │  │   │  Donation │  │  status   │  │ ownership │  │   rules   │  │   │
//! │  │   │   Item    │  │  machines │  │   roles   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    givehub-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Account, Donation, Item, Transaction, ...)
//! - [`details`] - Tagged union of donation-kind specific details
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`lifecycle`] - Legal status transitions for listings and transactions
//! - [`authorize`] - Ownership/role authorization rules
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod authorize;
pub mod details;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use givehub_core::Money` instead of
// `use givehub_core::money::Money`

pub use authorize::Identity;
pub use details::DonationDetails;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity for a single listing (donation or item).
///
/// ## Business Reason
/// Prevents accidental over-listing (e.g., typing 1000 instead of 10).
pub const MAX_LISTING_QUANTITY: i64 = 999;

/// Maximum length of a listing title.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of an account bio.
pub const MAX_BIO_LEN: usize = 500;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Rating scale bounds (inclusive).
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
