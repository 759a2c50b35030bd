use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use khata_core::{OrderId, ProductId, ReservationId, WebsiteId};
use khata_reservations::{Reservation, ReservationOutcome};

use crate::StoreError;

/// Website-isolated reservation persistence.
pub trait ReservationStore: Send + Sync {
    fn insert(&self, reservation: Reservation) -> Result<(), StoreError>;

    /// Atomically claim an ACTIVE reservation and close it with `outcome`.
    ///
    /// Returns the closed reservation, or `None` when the hold is missing or
    /// already terminal. The check-and-transition must be one atomic step so
    /// that concurrent release/fulfill callers resolve a hold exactly once.
    fn close_if_active(
        &self,
        website_id: WebsiteId,
        id: ReservationId,
        outcome: ReservationOutcome,
        now: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StoreError>;

    /// Remove a reservation outright. Only used to roll a hold back when the
    /// paired ledger write fails; reservations are never deleted otherwise.
    fn remove(&self, website_id: WebsiteId, id: ReservationId) -> Result<(), StoreError>;

    /// All reservations for an order, oldest first.
    fn list_for_order(
        &self,
        website_id: WebsiteId,
        order_id: OrderId,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Sum of ACTIVE reservation quantities for a product.
    fn sum_active_for_product(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
    ) -> Result<i64, StoreError>;
}

impl<S> ReservationStore for Arc<S>
where
    S: ReservationStore + ?Sized,
{
    fn insert(&self, reservation: Reservation) -> Result<(), StoreError> {
        (**self).insert(reservation)
    }

    fn close_if_active(
        &self,
        website_id: WebsiteId,
        id: ReservationId,
        outcome: ReservationOutcome,
        now: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StoreError> {
        (**self).close_if_active(website_id, id, outcome, now)
    }

    fn remove(&self, website_id: WebsiteId, id: ReservationId) -> Result<(), StoreError> {
        (**self).remove(website_id, id)
    }

    fn list_for_order(
        &self,
        website_id: WebsiteId,
        order_id: OrderId,
    ) -> Result<Vec<Reservation>, StoreError> {
        (**self).list_for_order(website_id, order_id)
    }

    fn sum_active_for_product(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
    ) -> Result<i64, StoreError> {
        (**self).sum_active_for_product(website_id, product_id)
    }
}

/// In-memory reservation store for dev/test.
#[derive(Debug, Default)]
pub struct InMemoryReservationStore {
    inner: RwLock<HashMap<(WebsiteId, ReservationId), Reservation>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReservationStore for InMemoryReservationStore {
    fn insert(&self, reservation: Reservation) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        map.insert((reservation.website_id(), reservation.id()), reservation);
        Ok(())
    }

    fn close_if_active(
        &self,
        website_id: WebsiteId,
        id: ReservationId,
        outcome: ReservationOutcome,
        now: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let Some(reservation) = map.get_mut(&(website_id, id)) else {
            return Ok(None);
        };
        if reservation.close(outcome, now) {
            Ok(Some(reservation.clone()))
        } else {
            Ok(None)
        }
    }

    fn remove(&self, website_id: WebsiteId, id: ReservationId) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        map.remove(&(website_id, id));
        Ok(())
    }

    fn list_for_order(
        &self,
        website_id: WebsiteId,
        order_id: OrderId,
    ) -> Result<Vec<Reservation>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let mut reservations: Vec<Reservation> = map
            .values()
            .filter(|r| r.website_id() == website_id && r.order_id() == order_id)
            .cloned()
            .collect();
        reservations.sort_by_key(|r| (r.created_at(), *r.id().as_uuid()));
        Ok(reservations)
    }

    fn sum_active_for_product(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
    ) -> Result<i64, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(map
            .values()
            .filter(|r| {
                r.website_id() == website_id && r.product_id() == product_id && r.is_active()
            })
            .map(|r| r.quantity())
            .sum())
    }
}
