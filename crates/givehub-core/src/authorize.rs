//! # Authorization Module
//!
//! Stateless per-request authorization rules.
//!
//! ## Rule Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   (caller identity, role, resource ownership, resource status)          │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                      { allow, deny }                                    │
//! │                                                                         │
//! │  - Mutation: owning party or admin                                      │
//! │  - Non-public read: owner, bound counterparty, or admin                 │
//! │  - Anonymous: public reads only                                         │
//! │  - Admins bypass ownership but cannot be hard-deleted                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identity is an explicit parameter (`Option<&Identity>` on public reads),
//! never an ambient side-read. The caller resolves the bearer token once and
//! threads the result through.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Donation, DonationStatus, Item, ItemStatus, Role, Transaction};

// =============================================================================
// Identity
// =============================================================================

/// A verified (account id, role) pair resolved from a bearer credential.
///
/// The core trusts this pair unconditionally; resolving it is the identity
/// collaborator's job (JWT validation in the API layer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub account_id: String,
    pub role: Role,
}

impl Identity {
    pub fn new(account_id: impl Into<String>, role: Role) -> Self {
        Identity {
            account_id: account_id.into(),
            role,
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resolves an optional identity into a required one.
///
/// Anonymous callers get `Unauthenticated`, never `Forbidden`: the caller
/// could not be identified at all, which is a different failure from being
/// identified and lacking rights.
pub fn require_identity(identity: Option<&Identity>) -> CoreResult<&Identity> {
    identity.ok_or(CoreError::Unauthenticated)
}

/// Requires an admin identity.
pub fn require_admin(identity: &Identity) -> CoreResult<()> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden("admin role required".to_string()))
    }
}

// =============================================================================
// Listing Rules
// =============================================================================

/// Mutating a listing: allowed for the owning party or an admin.
pub fn can_mutate_listing(identity: &Identity, owner_id: &str) -> CoreResult<()> {
    if identity.is_admin() || identity.account_id == owner_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "not the owner of this listing".to_string(),
        ))
    }
}

/// Reading a single donation.
///
/// Approved donations are public. Outside that, only the donor, the bound
/// recipient and admins may see it.
pub fn can_view_donation(identity: Option<&Identity>, donation: &Donation) -> CoreResult<()> {
    if donation.status == DonationStatus::Approved {
        return Ok(());
    }

    match identity {
        Some(id) if id.is_admin() => Ok(()),
        Some(id) if id.account_id == donation.donor_id => Ok(()),
        Some(id) if donation.recipient_id.as_deref() == Some(id.account_id.as_str()) => Ok(()),
        Some(_) => Err(CoreError::Forbidden(
            "donation is not publicly visible".to_string(),
        )),
        None => Err(CoreError::Forbidden(
            "donation is not publicly visible".to_string(),
        )),
    }
}

/// Reading a single item.
///
/// Active items are public. Outside that, only the seller, the bound buyer
/// and admins may see it.
pub fn can_view_item(identity: Option<&Identity>, item: &Item) -> CoreResult<()> {
    if item.status == ItemStatus::Active {
        return Ok(());
    }

    match identity {
        Some(id) if id.is_admin() => Ok(()),
        Some(id) if id.account_id == item.seller_id => Ok(()),
        Some(id) if item.buyer_id.as_deref() == Some(id.account_id.as_str()) => Ok(()),
        _ => Err(CoreError::Forbidden(
            "item is not publicly visible".to_string(),
        )),
    }
}

/// Requesting a donation: any authenticated account except the donor.
pub fn can_request_donation(identity: &Identity, donation: &Donation) -> CoreResult<()> {
    if identity.account_id == donation.donor_id {
        return Err(CoreError::Forbidden(
            "cannot request your own donation".to_string(),
        ));
    }
    Ok(())
}

/// Purchasing an item: any authenticated account except the seller.
pub fn can_purchase_item(identity: &Identity, item: &Item) -> CoreResult<()> {
    if identity.account_id == item.seller_id {
        return Err(CoreError::Forbidden(
            "cannot purchase your own item".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// Transaction Rules
// =============================================================================

/// Reading a transaction: participants and admins only.
pub fn can_view_transaction(identity: &Identity, tx: &Transaction) -> CoreResult<()> {
    if identity.is_admin() || tx.is_participant(&identity.account_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "not a participant in this transaction".to_string(),
        ))
    }
}

/// Advancing transaction status: the recipient (the counterparty receiving
/// the request) or an admin.
pub fn can_update_transaction_status(identity: &Identity, tx: &Transaction) -> CoreResult<()> {
    if identity.is_admin() || tx.recipient_id == identity.account_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "only the recipient may update this transaction".to_string(),
        ))
    }
}

/// Messaging inside a transaction: participants only (admins excluded, the
/// thread belongs to the two parties).
pub fn can_message_transaction(identity: &Identity, tx: &Transaction) -> CoreResult<()> {
    if tx.is_participant(&identity.account_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "not a participant in this transaction".to_string(),
        ))
    }
}

/// Rating inside a transaction: participants only.
pub fn can_rate_transaction(identity: &Identity, tx: &Transaction) -> CoreResult<()> {
    if tx.is_participant(&identity.account_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "not a participant in this transaction".to_string(),
        ))
    }
}

// =============================================================================
// Account Rules
// =============================================================================

/// Hard-deleting an account: admin only, and admin accounts are protected
/// from the ordinary deletion path.
pub fn can_delete_account(actor: &Identity, target_role: Role) -> CoreResult<()> {
    require_admin(actor)?;
    if target_role == Role::Admin {
        return Err(CoreError::Forbidden(
            "admin accounts cannot be deleted".to_string(),
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
    use crate::details::DonationDetails;
    use crate::types::{DonationKind, ItemCategory, ItemCondition, TransactionKind,
        TransactionStatus};
    use chrono::Utc;

    fn user(id: &str) -> Identity {
        Identity::new(id, Role::User)
    }

    fn admin() -> Identity {
        Identity::new("admin-1", Role::Admin)
    }

    fn donation(status: DonationStatus, recipient: Option<&str>) -> Donation {
        Donation {
            id: "d-1".into(),
            donor_id: "owner".into(),
            kind: DonationKind::Cash,
            title: "Fund".into(),
            description: "desc".into(),
            details: DonationDetails::Cash {
                amount_cents: 100,
                currency: "USD".into(),
                payment_method: None,
            },
            quantity: 1,
            location: "here".into(),
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

    fn item(status: ItemStatus, buyer: Option<&str>) -> Item {
        Item {
            id: "i-1".into(),
            seller_id: "owner".into(),
            title: "Chair".into(),
            description: "desc".into(),
            category: ItemCategory::Furniture,
            price_cents: 100,
            original_price_cents: None,
            is_free: false,
            condition: ItemCondition::Good,
            quantity: 1,
            location: "here".into(),
            tags: vec![],
            images: vec![],
            status,
            buyer_id: buyer.map(String::from),
            sold_date: None,
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tx() -> Transaction {
        Transaction {
            id: "t-1".into(),
            donor_id: "donor".into(),
            recipient_id: "recipient".into(),
            kind: TransactionKind::Purchase,
            donation_id: None,
            item_id: Some("i-1".into()),
            amount_cents: 100,
            status: TransactionStatus::Pending,
            donor_rating: None,
            donor_review: None,
            recipient_rating: None,
            recipient_review: None,
            completed_date: None,
            cancelled_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_identity() {
        assert!(matches!(
            require_identity(None).unwrap_err(),
            CoreError::Unauthenticated
        ));
        let id = user("a-1");
        assert_eq!(require_identity(Some(&id)).unwrap().account_id, "a-1");
    }

    #[test]
    fn test_mutate_listing() {
        assert!(can_mutate_listing(&user("owner"), "owner").is_ok());
        assert!(can_mutate_listing(&admin(), "owner").is_ok());
        assert!(matches!(
            can_mutate_listing(&user("stranger"), "owner").unwrap_err(),
            CoreError::Forbidden(_)
        ));
    }

    #[test]
    fn test_view_donation_visibility() {
        let approved = donation(DonationStatus::Approved, None);
        assert!(can_view_donation(None, &approved).is_ok());

        let pending = donation(DonationStatus::Pending, None);
        assert!(can_view_donation(None, &pending).is_err());
        assert!(can_view_donation(Some(&user("stranger")), &pending).is_err());
        assert!(can_view_donation(Some(&user("owner")), &pending).is_ok());
        assert!(can_view_donation(Some(&admin()), &pending).is_ok());

        // Bound recipient can see the reservation
        let reserved = donation(DonationStatus::Reserved, Some("requester"));
        assert!(can_view_donation(Some(&user("requester")), &reserved).is_ok());
        assert!(can_view_donation(Some(&user("stranger")), &reserved).is_err());
    }

    #[test]
    fn test_view_item_visibility() {
        let active = item(ItemStatus::Active, None);
        assert!(can_view_item(None, &active).is_ok());

        let sold = item(ItemStatus::Sold, Some("buyer"));
        assert!(can_view_item(None, &sold).is_err());
        assert!(can_view_item(Some(&user("owner")), &sold).is_ok());
        assert!(can_view_item(Some(&user("buyer")), &sold).is_ok());
        assert!(can_view_item(Some(&user("stranger")), &sold).is_err());
    }

    #[test]
    fn test_self_dealing_rejected() {
        let d = donation(DonationStatus::Approved, None);
        assert!(can_request_donation(&user("owner"), &d).is_err());
        assert!(can_request_donation(&user("other"), &d).is_ok());

        let i = item(ItemStatus::Active, None);
        assert!(can_purchase_item(&user("owner"), &i).is_err());
        assert!(can_purchase_item(&user("other"), &i).is_ok());
    }

    #[test]
    fn test_transaction_rules() {
        let t = tx();

        assert!(can_view_transaction(&user("donor"), &t).is_ok());
        assert!(can_view_transaction(&user("recipient"), &t).is_ok());
        assert!(can_view_transaction(&admin(), &t).is_ok());
        assert!(can_view_transaction(&user("stranger"), &t).is_err());

        // Only the recipient side (or admin) advances status
        assert!(can_update_transaction_status(&user("recipient"), &t).is_ok());
        assert!(can_update_transaction_status(&admin(), &t).is_ok());
        assert!(can_update_transaction_status(&user("donor"), &t).is_err());

        // Both parties may message; admins may not
        assert!(can_message_transaction(&user("donor"), &t).is_ok());
        assert!(can_message_transaction(&user("recipient"), &t).is_ok());
        assert!(can_message_transaction(&admin(), &t).is_err());
    }

    #[test]
    fn test_admin_delete_protection() {
        assert!(can_delete_account(&admin(), Role::User).is_ok());
        assert!(can_delete_account(&admin(), Role::Admin).is_err());
        assert!(can_delete_account(&user("a-1"), Role::User).is_err());
    }
}
