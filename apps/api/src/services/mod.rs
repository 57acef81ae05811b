//! Domain services.
//!
//! Each service orchestrates one flow: load the entity, apply the core
//! authorization and lifecycle rules, write through the repositories
//! (atomically where more than one row is involved), then dispatch
//! best-effort notifications.

pub mod accounts;
pub mod admin;
pub mod dashboard;
pub mod donations;
pub mod items;
pub mod notify;
pub mod transactions;
