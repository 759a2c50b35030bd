//! `khata-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the domain error taxonomy, and the product
//! catalog snapshot consumed by the inventory core.

pub mod error;
pub mod id;
pub mod product;

pub use error::{DomainError, DomainResult};
pub use id::{MovementId, OrderId, ProductId, ReservationId, WebsiteId};
pub use product::ProductRecord;
