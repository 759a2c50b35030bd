//! Reservation domain module.
//!
//! A reservation is a short-lived hold of stock against an order. The state
//! machine is small and strict: `Active` is the only live state, and both
//! `Released` and `Fulfilled` are terminal.

pub mod reservation;

pub use reservation::{Reservation, ReservationOutcome, ReservationStatus};
