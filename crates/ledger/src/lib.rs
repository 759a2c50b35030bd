//! Stock ledger domain module.
//!
//! This crate contains the business rules for inventory movements, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). The one
//! rule that matters lives here: how a movement kind applies its quantity to a
//! product's on-hand count.

pub mod movement;

pub use movement::{
    Movement, MovementDraft, MovementKind, REASON_ORDER_RELEASE, REASON_ORDER_RESERVATION,
};
