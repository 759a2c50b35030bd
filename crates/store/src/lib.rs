//! Storage and orchestration for the inventory core.
//!
//! Storage sits behind three narrow traits (`ProductStore`, `MovementLog`,
//! `ReservationStore`) with in-memory implementations for dev/test; persistent
//! backends can be slotted in without touching the service. `InventoryService`
//! is the only writer of `product.on_hand` and owns the per-product
//! serialization that keeps concurrent reservations from overselling.

pub mod inventory;
pub mod movement_log;
pub mod product_store;
pub mod reporting;
pub mod reservation_store;

pub use inventory::{
    BulkAdjustEntry, BulkReceiveEntry, InventoryError, InventoryResult, InventoryService,
};
pub use movement_log::{InMemoryMovementLog, MovementLog, StoredMovement};
pub use product_store::{InMemoryProductStore, ProductStore};
pub use reporting::{InventoryAnalytics, StockReportRow, TopMover};
pub use reservation_store::{InMemoryReservationStore, ReservationStore};

use thiserror::Error;

/// Storage-layer error. Infrastructure failures only; domain failures live in
/// `khata_core::DomainError`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("website isolation violation: {0}")]
    WebsiteIsolation(String),
}
