//! Alert evaluation.
//!
//! Alerts are derived, point-in-time signals computed from the current product
//! snapshot. They are plain value types: recomputed on demand, never stored,
//! never ORM-backed.

pub mod evaluator;

pub use evaluator::{evaluate, Alert, AlertKind};
