//! Store wiring behind the inventory service.
//!
//! In-memory stores only for now; persistent backends slot in behind the
//! `ProductStore`/`MovementLog`/`ReservationStore` traits without touching
//! the handlers.

use std::sync::Arc;

use khata_store::{
    InMemoryMovementLog, InMemoryProductStore, InMemoryReservationStore, InventoryService,
};

pub type AppInventoryService = InventoryService<
    Arc<InMemoryProductStore>,
    Arc<InMemoryMovementLog>,
    Arc<InMemoryReservationStore>,
>;

pub struct AppServices {
    pub inventory: AppInventoryService,
}

pub fn build_services() -> AppServices {
    let products = Arc::new(InMemoryProductStore::new());
    let movements = Arc::new(InMemoryMovementLog::new());
    let reservations = Arc::new(InMemoryReservationStore::new());

    AppServices {
        inventory: InventoryService::new(products, movements, reservations),
    }
}
