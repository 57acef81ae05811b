//! # Lifecycle Module
//!
//! Legal status transitions for donations, items and transactions.
//!
//! ## How This Is Used
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Two-Layer Enforcement                               │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (pure rules)                                     │
//! │  ├── donation_transition(current, next)?                               │
//! │  ├── item_transition(current, next, is_admin)?                         │
//! │  └── transaction_transition(current, next)?                            │
//! │       Illegal edge → CoreError::InvalidState, nothing written          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (conditional writes)                                │
//! │  └── UPDATE ... WHERE status = <expected current>                      │
//! │       Zero rows affected → a concurrent writer moved first             │
//! │                                                                         │
//! │  Layer 1 rejects requests that could never succeed; layer 2 makes      │
//! │  the race-free guarantee.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{DonationStatus, ItemStatus, TransactionStatus};

// =============================================================================
// Donation Transitions
// =============================================================================

/// Checks that a donation may move from `current` to `next`.
///
/// ## Legal Edges
/// ```text
/// pending  → approved | rejected
/// approved → reserved | completed | cancelled
/// reserved → completed | cancelled
/// ```
/// `rejected`, `completed` and `cancelled` are terminal for everyone,
/// admins included: a fulfilled or withdrawn donation never comes back.
pub fn donation_transition(current: DonationStatus, next: DonationStatus) -> CoreResult<()> {
    use DonationStatus::*;

    let legal = match current {
        Pending => matches!(next, Approved | Rejected),
        Approved => matches!(next, Reserved | Completed | Cancelled),
        Reserved => matches!(next, Completed | Cancelled),
        Rejected | Completed | Cancelled => false,
    };

    if legal {
        Ok(())
    } else {
        Err(CoreError::invalid_state(
            "Donation",
            current.as_str(),
            format!("move to {}", next.as_str()),
        ))
    }
}

// =============================================================================
// Item Transitions
// =============================================================================

/// Checks that an item may move from `current` to `next`.
///
/// ## Legal Edges
/// ```text
/// draft   → active | cancelled
/// active  → pending | sold | expired | cancelled
/// pending → active | sold
/// ```
/// `sold`, `expired` and `cancelled` are terminal for ordinary users.
/// Admins may override any edge (dispute resolution, relisting).
pub fn item_transition(current: ItemStatus, next: ItemStatus, is_admin: bool) -> CoreResult<()> {
    use ItemStatus::*;

    if is_admin {
        return Ok(());
    }

    let legal = match current {
        Draft => matches!(next, Active | Cancelled),
        Active => matches!(next, Pending | Sold | Expired | Cancelled),
        Pending => matches!(next, Active | Sold),
        Sold | Expired | Cancelled => false,
    };

    if legal {
        Ok(())
    } else {
        Err(CoreError::invalid_state(
            "Item",
            current.as_str(),
            format!("move to {}", next.as_str()),
        ))
    }
}

// =============================================================================
// Transaction Transitions
// =============================================================================

/// Checks that a transaction may move from `current` to `next`.
///
/// ## Legal Edges
/// ```text
/// pending    → processing | completed | cancelled
/// processing → completed | cancelled | refunded
/// completed  → refunded
/// ```
/// `cancelled` and `refunded` are terminal. `completed → refunded` is the
/// remediation path after a completed exchange goes bad.
pub fn transaction_transition(
    current: TransactionStatus,
    next: TransactionStatus,
) -> CoreResult<()> {
    use TransactionStatus::*;

    let legal = match current {
        Pending => matches!(next, Processing | Completed | Cancelled),
        Processing => matches!(next, Completed | Cancelled | Refunded),
        Completed => matches!(next, Refunded),
        Cancelled | Refunded => false,
    };

    if legal {
        Ok(())
    } else {
        Err(CoreError::invalid_state(
            "Transaction",
            current.as_str(),
            format!("move to {}", next.as_str()),
        ))
    }
}

// =============================================================================
// Mutation Guards
// =============================================================================

/// Checks that a donation may still be edited by its owner.
///
/// Completed donations are frozen for non-admins so the fulfilled record
/// stays what both parties saw.
pub fn donation_editable(status: DonationStatus, is_admin: bool) -> CoreResult<()> {
    if !is_admin && status == DonationStatus::Completed {
        return Err(CoreError::invalid_state(
            "Donation",
            status.as_str(),
            "update",
        ));
    }
    Ok(())
}

/// Checks that an item may still be edited (or deleted) by its owner.
///
/// Sold items are frozen for non-admins.
pub fn item_editable(status: ItemStatus, is_admin: bool) -> CoreResult<()> {
    if !is_admin && status == ItemStatus::Sold {
        return Err(CoreError::invalid_state("Item", status.as_str(), "update"));
    }
    Ok(())
}

/// Checks that ratings may be submitted for a transaction.
///
/// Ratings are only meaningful once the exchange actually happened.
pub fn transaction_ratable(status: TransactionStatus) -> CoreResult<()> {
    if status != TransactionStatus::Completed {
        return Err(CoreError::invalid_state(
            "Transaction",
            status.as_str(),
            "rate",
        ));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donation_legal_edges() {
        use DonationStatus::*;

        assert!(donation_transition(Pending, Approved).is_ok());
        assert!(donation_transition(Pending, Rejected).is_ok());
        assert!(donation_transition(Approved, Reserved).is_ok());
        assert!(donation_transition(Approved, Completed).is_ok());
        assert!(donation_transition(Approved, Cancelled).is_ok());
        assert!(donation_transition(Reserved, Completed).is_ok());
        assert!(donation_transition(Reserved, Cancelled).is_ok());
    }

    #[test]
    fn test_donation_illegal_edges() {
        use DonationStatus::*;

        // Cannot skip moderation
        assert!(donation_transition(Pending, Reserved).is_err());
        assert!(donation_transition(Pending, Completed).is_err());
        // Terminal states stay terminal
        assert!(donation_transition(Rejected, Approved).is_err());
        assert!(donation_transition(Completed, Cancelled).is_err());
        assert!(donation_transition(Cancelled, Approved).is_err());
        // No un-reserving back to approved
        assert!(donation_transition(Reserved, Approved).is_err());
    }

    #[test]
    fn test_item_edges() {
        use ItemStatus::*;

        assert!(item_transition(Draft, Active, false).is_ok());
        assert!(item_transition(Active, Pending, false).is_ok());
        assert!(item_transition(Pending, Active, false).is_ok());
        assert!(item_transition(Pending, Sold, false).is_ok());
        assert!(item_transition(Active, Expired, false).is_ok());

        assert!(item_transition(Sold, Active, false).is_err());
        assert!(item_transition(Cancelled, Active, false).is_err());
        assert!(item_transition(Draft, Sold, false).is_err());

        // Admin override
        assert!(item_transition(Sold, Active, true).is_ok());
    }

    #[test]
    fn test_transaction_edges() {
        use TransactionStatus::*;

        assert!(transaction_transition(Pending, Processing).is_ok());
        assert!(transaction_transition(Pending, Completed).is_ok());
        assert!(transaction_transition(Pending, Cancelled).is_ok());
        assert!(transaction_transition(Processing, Completed).is_ok());
        assert!(transaction_transition(Processing, Refunded).is_ok());
        assert!(transaction_transition(Completed, Refunded).is_ok());

        assert!(transaction_transition(Pending, Refunded).is_err());
        assert!(transaction_transition(Cancelled, Pending).is_err());
        assert!(transaction_transition(Refunded, Completed).is_err());
        assert!(transaction_transition(Completed, Cancelled).is_err());
    }

    #[test]
    fn test_illegal_edge_reports_state() {
        let err = donation_transition(DonationStatus::Pending, DonationStatus::Reserved)
            .unwrap_err();
        match err {
            CoreError::InvalidState { current, .. } => assert_eq!(current, "pending"),
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn test_mutation_guards() {
        assert!(donation_editable(DonationStatus::Pending, false).is_ok());
        assert!(donation_editable(DonationStatus::Completed, false).is_err());
        assert!(donation_editable(DonationStatus::Completed, true).is_ok());

        assert!(item_editable(ItemStatus::Active, false).is_ok());
        assert!(item_editable(ItemStatus::Sold, false).is_err());
        assert!(item_editable(ItemStatus::Sold, true).is_ok());

        assert!(transaction_ratable(TransactionStatus::Completed).is_ok());
        assert!(transaction_ratable(TransactionStatus::Pending).is_err());
        assert!(transaction_ratable(TransactionStatus::Cancelled).is_err());
    }
}
