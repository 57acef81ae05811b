//! # Domain Types
//!
//! Core domain types used throughout GiveHub.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Donation     │   │      Item       │   │  Transaction    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  donor_id       │   │  seller_id      │   │  donor_id       │       │
//! │  │  kind + details │   │  price_cents    │   │  recipient_id   │       │
//! │  │  status         │   │  status         │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Account      │   │  Notification   │   │ DonationStatus  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  email (unique) │   │  account_id     │   │  Pending        │       │
//! │  │  role           │   │  kind, is_read  │   │  Approved       │       │
//! │  │  is_active      │   │  write-once     │   │  Reserved ...   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity Pattern
//! Every entity id is a UUID v4 string - immutable, used for relations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::details::DonationDetails;
use crate::money::Money;

// =============================================================================
// Account
// =============================================================================

/// Account role. Admins bypass all ownership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Email address - unique, stored lowercased.
    pub email: String,

    /// Argon2 hash of the password. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,

    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,

    /// Free-text home location used to pre-fill listings.
    pub location: Option<String>,

    pub role: Role,

    /// Soft-delete flag. Inactive accounts cannot log in.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Derived account statistics.
///
/// This is a read-model computed on demand from listings and transactions,
/// never stored. Recomputing from source-of-truth rows means the numbers
/// cannot drift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountStats {
    /// Donations listed by this account.
    pub total_donations: i64,
    /// Marketplace items listed by this account.
    pub total_items_listed: i64,
    /// Completed purchases where this account was the buyer.
    pub total_items_received: i64,
    /// Completed knowledge donations by this account.
    pub total_teaching_sessions: i64,
    /// Sum of completed transaction amounts as donor, in cents.
    pub total_amount_donated_cents: i64,
    /// Average rating received across completed transactions.
    pub rating: f64,
    /// Number of reviews received.
    pub review_count: i64,
}

// =============================================================================
// Listings: shared pieces
// =============================================================================

/// An image attached to a listing.
///
/// The URL points at an external object store; this system carries only the
/// reference and which image is the primary one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingImage {
    pub url: String,
    #[serde(default)]
    pub is_primary: bool,
}

/// Which listing table a favorite or lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Donation,
    Item,
}

// =============================================================================
// Donation
// =============================================================================

/// The six supported donation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum DonationKind {
    Blood,
    Cash,
    Food,
    Books,
    Knowledge,
    Items,
}

impl DonationKind {
    /// Lowercase name as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationKind::Blood => "blood",
            DonationKind::Cash => "cash",
            DonationKind::Food => "food",
            DonationKind::Books => "books",
            DonationKind::Knowledge => "knowledge",
            DonationKind::Items => "items",
        }
    }
}

/// The status of a donation listing.
///
/// ```text
///            ┌──► approved ──┬──► reserved ──┬──► completed
///  pending ──┤               │               └──► cancelled
///            └──► rejected   ├──► completed
///                            └──► cancelled
/// ```
///
/// `reserved` carries a bound recipient and is treated like `approved` for
/// visibility purposes. `rejected`, `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    /// Awaiting admin moderation.
    Pending,
    /// Approved by an admin, open for requests.
    Approved,
    /// Rejected by an admin.
    Rejected,
    /// A recipient requested it; recipient is bound.
    Reserved,
    /// Fulfilled.
    Completed,
    /// Withdrawn by the donor or an admin.
    Cancelled,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Approved => "approved",
            DonationStatus::Rejected => "rejected",
            DonationStatus::Reserved => "reserved",
            DonationStatus::Completed => "completed",
            DonationStatus::Cancelled => "cancelled",
        }
    }

    /// No transitions leave a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DonationStatus::Rejected | DonationStatus::Completed | DonationStatus::Cancelled
        )
    }

    /// Statuses visible in public lists to non-admin callers.
    pub fn is_publicly_listed(&self) -> bool {
        matches!(
            self,
            DonationStatus::Pending | DonationStatus::Approved | DonationStatus::Completed
        )
    }
}

impl Default for DonationStatus {
    fn default() -> Self {
        DonationStatus::Pending
    }
}

/// A donation listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: String,

    /// Owning account ("donor"). Exclusive mutation rights, admins excepted.
    pub donor_id: String,

    pub kind: DonationKind,
    pub title: String,
    pub description: String,

    /// Kind-specific details. The variant always matches `kind`.
    pub details: DonationDetails,

    /// Offered quantity, at least 1.
    pub quantity: i64,

    pub location: String,
    pub tags: Vec<String>,
    pub images: Vec<ListingImage>,

    pub status: DonationStatus,

    /// Bound when a request reserves this donation. At most one at a time.
    pub recipient_id: Option<String>,

    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,

    /// Read counter. Analytics only, no invariant depends on it.
    pub views: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donation {
    /// Whether a request operation is currently legal.
    pub fn is_requestable(&self) -> bool {
        self.status == DonationStatus::Approved && self.recipient_id.is_none()
    }
}

// =============================================================================
// Item
// =============================================================================

/// Marketplace item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Clothing,
    Electronics,
    Furniture,
    Books,
    Food,
    Services,
    Other,
}

/// Physical condition of a marketplace item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum ItemCondition {
    New,
    LikeNew,
    Good,
    Fair,
    Poor,
}

impl Default for ItemCondition {
    fn default() -> Self {
        ItemCondition::Good
    }
}

/// The status of a marketplace item.
///
/// ```text
///  draft ──► active ──┬──► pending ──┬──► sold
///                     │              └──► active (purchase cancelled)
///                     ├──► sold
///                     ├──► expired
///                     └──► cancelled
/// ```
///
/// Items go live immediately on creation (`active`), unlike donations which
/// require admin approval. `sold`, `expired` and `cancelled` are terminal for
/// ordinary users; admins may override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Saved but not yet published.
    Draft,
    /// Live and purchasable.
    Active,
    /// Last unit purchase in flight, awaiting transaction completion.
    Pending,
    /// Sold out and completed.
    Sold,
    /// Listing window lapsed.
    Expired,
    /// Withdrawn.
    Cancelled,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Draft => "draft",
            ItemStatus::Active => "active",
            ItemStatus::Pending => "pending",
            ItemStatus::Sold => "sold",
            ItemStatus::Expired => "expired",
            ItemStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal for ordinary users. Admins may still override.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemStatus::Sold | ItemStatus::Expired | ItemStatus::Cancelled
        )
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Active
    }
}

/// A marketplace item listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,

    /// Owning account ("seller").
    pub seller_id: String,

    pub title: String,
    pub description: String,
    pub category: ItemCategory,

    /// Price in cents. Zero for free items.
    pub price_cents: i64,
    pub original_price_cents: Option<i64>,

    /// True when the item is given away (price is forced to zero).
    pub is_free: bool,

    pub condition: ItemCondition,

    /// Units remaining, decremented on purchase.
    pub quantity: i64,

    pub location: String,
    pub tags: Vec<String>,
    pub images: Vec<ListingImage>,

    pub status: ItemStatus,

    /// Bound by the in-flight purchase of the last unit.
    pub buyer_id: Option<String>,
    pub sold_date: Option<DateTime<Utc>>,

    pub views: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether a purchase operation is currently legal.
    pub fn is_available(&self) -> bool {
        self.status == ItemStatus::Active && self.quantity >= 1
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// What kind of exchange a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Fulfillment of a donation listing.
    Donation,
    /// Purchase of a marketplace item.
    Purchase,
}

/// The status of a transaction.
///
/// ```text
///            ┌──► processing ──┬──► completed ──► refunded
///  pending ──┼──► completed    ├──► cancelled
///            └──► cancelled    └──► refunded
/// ```
///
/// `cancelled` and `refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Refunded => "refunded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Cancelled | TransactionStatus::Refunded
        )
    }
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

/// A recorded exchange between two accounts.
///
/// For purchases the `donor` is the buyer (the party giving money) and the
/// `recipient` is the seller. For donations the `donor` is the listing owner
/// and the `recipient` is the requester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,

    pub donor_id: String,
    pub recipient_id: String,

    pub kind: TransactionKind,

    /// Exactly one of these is set, matching `kind`.
    pub donation_id: Option<String>,
    pub item_id: Option<String>,

    /// Exchange amount in cents, zero for non-monetary donations.
    pub amount_cents: i64,

    pub status: TransactionStatus,

    /// Rating given TO the donor (submitted by the recipient).
    pub donor_rating: Option<i64>,
    pub donor_review: Option<String>,

    /// Rating given TO the recipient (submitted by the donor).
    pub recipient_rating: Option<i64>,
    pub recipient_review: Option<String>,

    pub completed_date: Option<DateTime<Utc>>,
    pub cancelled_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns the amount as a Money type.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Whether the given account is one of the two parties.
    pub fn is_participant(&self, account_id: &str) -> bool {
        self.donor_id == account_id || self.recipient_id == account_id
    }

    /// Returns the other party relative to `account_id`, if a participant.
    pub fn counterparty(&self, account_id: &str) -> Option<&str> {
        if self.donor_id == account_id {
            Some(&self.recipient_id)
        } else if self.recipient_id == account_id {
            Some(&self.donor_id)
        } else {
            None
        }
    }
}

/// A message inside a transaction thread.
///
/// Append-only: messages are never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionMessage {
    pub id: String,
    pub transaction_id: String,
    pub sender_id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Notification
// =============================================================================

/// Notification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DonationRequest,
    DonationApproved,
    DonationRejected,
    ItemSold,
    MessageReceived,
    TransactionUpdate,
    System,
}

/// Notification priority. Presentation hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

impl Default for NotificationPriority {
    fn default() -> Self {
        NotificationPriority::Medium
    }
}

/// A persisted one-way message to a single account.
///
/// Created as a side effect of state transitions, consumed by client pull.
/// Write-once: only `is_read` is ever mutated afterwards. Never triggers
/// further side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub account_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,

    /// Opaque payload (referenced entity ids and the like).
    pub payload: Option<serde_json::Value>,

    pub is_read: bool,
    pub priority: NotificationPriority,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::details::DonationDetails;

    fn sample_donation(status: DonationStatus, recipient: Option<&str>) -> Donation {
        Donation {
            id: "d-1".into(),
            donor_id: "a-1".into(),
            kind: DonationKind::Books,
            title: "Paperbacks".into(),
            description: "A box of novels".into(),
            details: DonationDetails::Books {
                book_title: "Assorted".into(),
                author: None,
                isbn: None,
                genre: None,
                condition: None,
            },
            quantity: 1,
            location: "Springfield".into(),
            tags: vec![],
            images: vec![],
            status,
            recipient_id: recipient.map(String::from),
            scheduled_date: None,
            completed_date: None,
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_donation_requestable() {
        assert!(sample_donation(DonationStatus::Approved, None).is_requestable());
        assert!(!sample_donation(DonationStatus::Pending, None).is_requestable());
        assert!(!sample_donation(DonationStatus::Approved, Some("a-2")).is_requestable());
    }

    #[test]
    fn test_donation_status_terminal() {
        assert!(DonationStatus::Rejected.is_terminal());
        assert!(DonationStatus::Completed.is_terminal());
        assert!(DonationStatus::Cancelled.is_terminal());
        assert!(!DonationStatus::Reserved.is_terminal());
    }

    #[test]
    fn test_donation_status_public_listing() {
        assert!(DonationStatus::Pending.is_publicly_listed());
        assert!(DonationStatus::Approved.is_publicly_listed());
        assert!(DonationStatus::Completed.is_publicly_listed());
        assert!(!DonationStatus::Rejected.is_publicly_listed());
        assert!(!DonationStatus::Reserved.is_publicly_listed());
        assert!(!DonationStatus::Cancelled.is_publicly_listed());
    }

    #[test]
    fn test_item_availability() {
        let mut item = Item {
            id: "i-1".into(),
            seller_id: "a-1".into(),
            title: "Desk lamp".into(),
            description: "Works fine".into(),
            category: ItemCategory::Furniture,
            price_cents: 1000,
            original_price_cents: None,
            is_free: false,
            condition: ItemCondition::Good,
            quantity: 1,
            location: "Springfield".into(),
            tags: vec![],
            images: vec![],
            status: ItemStatus::Active,
            buyer_id: None,
            sold_date: None,
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(item.is_available());

        item.quantity = 0;
        assert!(!item.is_available());

        item.quantity = 1;
        item.status = ItemStatus::Sold;
        assert!(!item.is_available());
    }

    #[test]
    fn test_transaction_counterparty() {
        let tx = Transaction {
            id: "t-1".into(),
            donor_id: "a-1".into(),
            recipient_id: "a-2".into(),
            kind: TransactionKind::Purchase,
            donation_id: None,
            item_id: Some("i-1".into()),
            amount_cents: 1000,
            status: TransactionStatus::Pending,
            donor_rating: None,
            donor_review: None,
            recipient_rating: None,
            recipient_review: None,
            completed_date: None,
            cancelled_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(tx.is_participant("a-1"));
        assert!(tx.is_participant("a-2"));
        assert!(!tx.is_participant("a-3"));
        assert_eq!(tx.counterparty("a-1"), Some("a-2"));
        assert_eq!(tx.counterparty("a-2"), Some("a-1"));
        assert_eq!(tx.counterparty("a-3"), None);
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&DonationStatus::Reserved).unwrap(),
            "\"reserved\""
        );
        assert_eq!(
            serde_json::to_string(&ItemCondition::LikeNew).unwrap(),
            "\"like-new\""
        );
        assert_eq!(
            serde_json::to_string(&NotificationKind::DonationRequest).unwrap(),
            "\"donation_request\""
        );
    }
}
