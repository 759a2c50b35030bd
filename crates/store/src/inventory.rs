use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use thiserror::Error;

use khata_core::{DomainError, OrderId, ProductId, ProductRecord, WebsiteId};
use khata_ledger::{
    Movement, MovementDraft, MovementKind, REASON_ORDER_RELEASE, REASON_ORDER_RESERVATION,
};
use khata_reservations::{Reservation, ReservationOutcome};

use crate::movement_log::{MovementLog, StoredMovement};
use crate::product_store::ProductStore;
use crate::reservation_store::ReservationStore;
use crate::StoreError;

/// Default page size for movement listings.
pub const DEFAULT_MOVEMENT_LIMIT: usize = 50;
/// Hard cap for movement listings.
pub const MAX_MOVEMENT_LIMIT: usize = 500;

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Error surface of the inventory service.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("product not found")]
    ProductNotFound,

    #[error("inventory tracking is disabled for this product")]
    TrackingDisabled,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("inventory transaction failed: {0}")]
    TransactionFailed(String),
}

impl From<StoreError> for InventoryError {
    fn from(err: StoreError) -> Self {
        InventoryError::TransactionFailed(err.to_string())
    }
}

impl From<DomainError> for InventoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound => InventoryError::ProductNotFound,
            DomainError::TrackingDisabled => InventoryError::TrackingDisabled,
            other => InventoryError::Validation(other.to_string()),
        }
    }
}

/// One entry of a bulk stock-take (ADJUSTMENT movements).
#[derive(Debug, Clone)]
pub struct BulkAdjustEntry {
    pub product_id: ProductId,
    pub quantity: i64,
    pub reason: Option<String>,
}

/// One entry of a bulk goods receipt (IN movements).
#[derive(Debug, Clone)]
pub struct BulkReceiveEntry {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_cost: Option<u64>,
    pub reference: Option<String>,
}

/// Inventory orchestration: the sole writer of `product.on_hand`.
///
/// Every stock mutation for a product runs under that product's mutex, so the
/// availability check and the reservation + ledger write of `reserve` form one
/// critical section and concurrent reservations cannot oversell. Reads
/// (alerts, reporting, listings) take no lock.
pub struct InventoryService<P, M, R>
where
    P: ProductStore,
    M: MovementLog,
    R: ReservationStore,
{
    products: P,
    movements: M,
    reservations: R,
    product_locks: Mutex<HashMap<(WebsiteId, ProductId), Arc<Mutex<()>>>>,
}

impl<P, M, R> InventoryService<P, M, R>
where
    P: ProductStore,
    M: MovementLog,
    R: ReservationStore,
{
    pub fn new(products: P, movements: M, reservations: R) -> Self {
        Self {
            products,
            movements,
            reservations,
            product_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn products(&self) -> &P {
        &self.products
    }

    pub fn movements(&self) -> &M {
        &self.movements
    }

    pub fn reservations(&self) -> &R {
        &self.reservations
    }

    fn product_lock(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
    ) -> InventoryResult<Arc<Mutex<()>>> {
        let mut locks = self
            .product_locks
            .lock()
            .map_err(|e| InventoryError::TransactionFailed(format!("lock registry poisoned: {e}")))?;
        Ok(locks.entry((website_id, product_id)).or_default().clone())
    }

    fn acquire<'a>(lock: &'a Mutex<()>) -> InventoryResult<MutexGuard<'a, ()>> {
        lock.lock()
            .map_err(|e| InventoryError::TransactionFailed(format!("product lock poisoned: {e}")))
    }

    // ---------------------------------------------------------------
    // Stock ledger
    // ---------------------------------------------------------------

    /// Record a movement and apply it to the product's on-hand counter.
    ///
    /// The ledger append and the counter update happen in the same per-product
    /// critical section. Alert evaluation afterwards is best-effort and never
    /// fails the call.
    pub fn record_movement(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
        draft: MovementDraft,
    ) -> InventoryResult<StoredMovement> {
        let lock = self.product_lock(website_id, product_id)?;
        let stored = {
            let _guard = Self::acquire(&lock)?;
            self.record_locked(website_id, product_id, draft)?
        };
        self.refresh_alerts(website_id, product_id);
        Ok(stored)
    }

    /// Append + apply, assuming the caller holds the product lock.
    fn record_locked(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
        draft: MovementDraft,
    ) -> InventoryResult<StoredMovement> {
        let mut product = self
            .products
            .get(website_id, &product_id)?
            .ok_or(InventoryError::ProductNotFound)?;
        if !product.track_inventory {
            return Err(InventoryError::TrackingDisabled);
        }

        let movement = Movement::record(website_id, product_id, draft, Utc::now());
        let stored = self.movements.append(movement)?;

        product.on_hand = stored.movement.apply_to(product.on_hand);
        self.products.upsert(website_id, product)?;

        Ok(stored)
    }

    /// Bulk stock-take: every entry becomes an ADJUSTMENT movement, the whole
    /// batch is all-or-nothing.
    pub fn bulk_adjust(
        &self,
        website_id: WebsiteId,
        entries: Vec<BulkAdjustEntry>,
    ) -> InventoryResult<Vec<StoredMovement>> {
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut draft = MovementDraft::new(MovementKind::Adjustment, entry.quantity)?;
            if let Some(reason) = entry.reason {
                draft = draft.with_reason(reason);
            }
            items.push((entry.product_id, draft));
        }
        self.bulk_record(website_id, items)
    }

    /// Bulk goods receipt: every entry becomes an IN movement, the whole batch
    /// is all-or-nothing.
    pub fn bulk_receive(
        &self,
        website_id: WebsiteId,
        entries: Vec<BulkReceiveEntry>,
    ) -> InventoryResult<Vec<StoredMovement>> {
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut draft = MovementDraft::new(MovementKind::In, entry.quantity)?;
            if let Some(unit_cost) = entry.unit_cost {
                draft = draft.with_unit_cost(unit_cost);
            }
            if let Some(reference) = entry.reference {
                draft = draft.with_reference(reference);
            }
            items.push((entry.product_id, draft));
        }
        self.bulk_record(website_id, items)
    }

    fn bulk_record(
        &self,
        website_id: WebsiteId,
        items: Vec<(ProductId, MovementDraft)>,
    ) -> InventoryResult<Vec<StoredMovement>> {
        if items.is_empty() {
            return Ok(vec![]);
        }

        // Locks are acquired in sorted product order so two overlapping bulk
        // calls cannot deadlock.
        let mut product_ids: Vec<ProductId> = items.iter().map(|(p, _)| *p).collect();
        product_ids.sort();
        product_ids.dedup();

        let locks = product_ids
            .iter()
            .map(|p| self.product_lock(website_id, *p))
            .collect::<InventoryResult<Vec<_>>>()?;
        let _guards = locks
            .iter()
            .map(|l| Self::acquire(l))
            .collect::<InventoryResult<Vec<_>>>()?;

        // Stage everything before the first append: any invalid entry fails
        // the batch with no ledger writes at all.
        let now = Utc::now();
        let mut counters: HashMap<ProductId, ProductRecord> = HashMap::new();
        let mut staged = Vec::with_capacity(items.len());
        for (product_id, draft) in items {
            if !counters.contains_key(&product_id) {
                let product = self
                    .products
                    .get(website_id, &product_id)?
                    .ok_or(InventoryError::ProductNotFound)?;
                if !product.track_inventory {
                    return Err(InventoryError::TrackingDisabled);
                }
                counters.insert(product_id, product);
            }
            staged.push(Movement::record(website_id, product_id, draft, now));
        }

        let stored = self.movements.append_batch(staged)?;

        for sm in &stored {
            if let Some(product) = counters.get_mut(&sm.movement.product_id) {
                product.on_hand = sm.movement.apply_to(product.on_hand);
            }
        }
        for product in counters.into_values() {
            self.products.upsert(website_id, product)?;
        }

        for product_id in product_ids {
            self.refresh_alerts(website_id, product_id);
        }
        Ok(stored)
    }

    /// Most recent movements for a product, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_MOVEMENT_LIMIT`] and is capped at
    /// [`MAX_MOVEMENT_LIMIT`].
    pub fn list_movements(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
        limit: Option<usize>,
    ) -> InventoryResult<Vec<StoredMovement>> {
        if self.products.get(website_id, &product_id)?.is_none() {
            return Err(InventoryError::ProductNotFound);
        }
        let limit = limit.unwrap_or(DEFAULT_MOVEMENT_LIMIT).min(MAX_MOVEMENT_LIMIT);
        Ok(self.movements.list_recent(website_id, product_id, limit)?)
    }

    /// Re-derive the on-hand counter from the movement log.
    ///
    /// ADJUSTMENT entries act as checkpoints (absolute set), so a replay from
    /// sequence 1 always converges on the audited value.
    pub fn replay_product(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
    ) -> InventoryResult<i64> {
        let lock = self.product_lock(website_id, product_id)?;
        let _guard = Self::acquire(&lock)?;

        let mut product = self
            .products
            .get(website_id, &product_id)?
            .ok_or(InventoryError::ProductNotFound)?;

        let stream = self.movements.load_stream(website_id, product_id)?;
        let on_hand = stream
            .iter()
            .fold(0i64, |acc, sm| sm.movement.apply_to(acc));

        product.on_hand = on_hand;
        self.products.upsert(website_id, product)?;
        Ok(on_hand)
    }

    // ---------------------------------------------------------------
    // Reservations
    // ---------------------------------------------------------------

    /// Try to hold `quantity` units of a product for an order.
    ///
    /// Soft-fails with `Ok(false)` when the quantity is non-positive, the
    /// product is unknown or untracked, or stock is insufficient; the order
    /// workflow branches on the boolean. Only infrastructure failures return
    /// `Err`. On success the stock decrement has already happened (an OUT
    /// movement referencing the order).
    ///
    /// Every call opens its own hold: reserving again for the same
    /// `(order, product)` pair stacks an additional ACTIVE reservation rather
    /// than topping up the first one. Callers retrying a reservation must not
    /// repeat the call for a pair that already holds stock.
    pub fn reserve(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
        quantity: i64,
        order_id: OrderId,
    ) -> InventoryResult<bool> {
        if quantity <= 0 {
            return Ok(false);
        }

        let lock = self.product_lock(website_id, product_id)?;
        let reserved = {
            let _guard = Self::acquire(&lock)?;

            let Some(mut product) = self.products.get(website_id, &product_id)? else {
                return Ok(false);
            };
            if !product.track_inventory || product.on_hand < quantity {
                return Ok(false);
            }

            let now = Utc::now();
            let reservation = Reservation::open(website_id, product_id, order_id, quantity, now)
                .map_err(InventoryError::from)?;
            self.reservations.insert(reservation.clone())?;

            let draft = MovementDraft::new(MovementKind::Out, quantity)?
                .with_reason(REASON_ORDER_RESERVATION)
                .with_reference(order_id.to_string());
            let movement = Movement::record(website_id, product_id, draft, now);

            let stored = match self.movements.append(movement) {
                Ok(stored) => stored,
                Err(err) => {
                    // The hold must not outlive a failed ledger write.
                    if let Err(cleanup) = self.reservations.remove(website_id, reservation.id()) {
                        tracing::error!(
                            reservation_id = %reservation.id(),
                            error = %cleanup,
                            "failed to roll back reservation after ledger write failure"
                        );
                    }
                    return Err(err.into());
                }
            };

            product.on_hand = stored.movement.apply_to(product.on_hand);
            self.products.upsert(website_id, product)?;
            true
        };

        self.refresh_alerts(website_id, product_id);
        Ok(reserved)
    }

    /// Release every ACTIVE reservation of an order, recording a compensating
    /// RETURN movement per hold.
    ///
    /// Idempotent: terminal reservations are skipped, an order with no ACTIVE
    /// reservations is a no-op success. Per-reservation failures are logged
    /// and skipped (best-effort); the return value is the number of holds
    /// actually released.
    pub fn release(&self, website_id: WebsiteId, order_id: OrderId) -> InventoryResult<usize> {
        let mut released = 0;
        let mut touched = Vec::new();

        for reservation in self.reservations.list_for_order(website_id, order_id)? {
            if !reservation.is_active() {
                continue;
            }
            match self.release_one(website_id, &reservation) {
                // Lost the claim to a concurrent release/fulfill; nothing to do.
                Ok(false) => {}
                Ok(true) => {
                    released += 1;
                    touched.push(reservation.product_id());
                }
                Err(err) => {
                    tracing::warn!(
                        order_id = %order_id,
                        product_id = %reservation.product_id(),
                        error = %err,
                        "skipped a reservation during release"
                    );
                }
            }
        }

        for product_id in touched {
            self.refresh_alerts(website_id, product_id);
        }
        Ok(released)
    }

    /// Claim the hold first, then compensate. The store-level claim is the
    /// atomic step, so two racing releases of the same hold record exactly one
    /// RETURN between them.
    fn release_one(
        &self,
        website_id: WebsiteId,
        reservation: &Reservation,
    ) -> InventoryResult<bool> {
        let lock = self.product_lock(website_id, reservation.product_id())?;
        let _guard = Self::acquire(&lock)?;

        let Some(closed) = self.reservations.close_if_active(
            website_id,
            reservation.id(),
            ReservationOutcome::Released,
            Utc::now(),
        )?
        else {
            return Ok(false);
        };

        let draft = MovementDraft::new(MovementKind::Return, closed.quantity())?
            .with_reason(REASON_ORDER_RELEASE)
            .with_reference(closed.order_id().to_string());
        self.record_locked(website_id, closed.product_id(), draft)?;
        Ok(true)
    }

    /// Mark every ACTIVE reservation of an order fulfilled.
    ///
    /// No movement is recorded: the decrement happened at reserve time. Same
    /// idempotency and best-effort semantics as [`release`](Self::release).
    pub fn fulfill(&self, website_id: WebsiteId, order_id: OrderId) -> InventoryResult<usize> {
        let mut fulfilled = 0;

        for reservation in self.reservations.list_for_order(website_id, order_id)? {
            if !reservation.is_active() {
                continue;
            }
            // No stock mutation here, so the atomic store claim is enough.
            match self.reservations.close_if_active(
                website_id,
                reservation.id(),
                ReservationOutcome::Fulfilled,
                Utc::now(),
            ) {
                Ok(Some(_)) => fulfilled += 1,
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        order_id = %order_id,
                        product_id = %reservation.product_id(),
                        error = %err,
                        "skipped a reservation during fulfillment"
                    );
                }
            }
        }

        Ok(fulfilled)
    }

    // ---------------------------------------------------------------
    // Alerts
    // ---------------------------------------------------------------

    /// Point-in-time alerts for one product.
    pub fn alerts_for_product(
        &self,
        website_id: WebsiteId,
        product_id: ProductId,
    ) -> InventoryResult<Vec<khata_alerts::Alert>> {
        let product = self
            .products
            .get(website_id, &product_id)?
            .ok_or(InventoryError::ProductNotFound)?;
        Ok(khata_alerts::evaluate(&product))
    }

    /// Alerts across every tracked product of a website.
    ///
    /// Products are visited in id order, so the result is deterministic.
    pub fn alerts(&self, website_id: WebsiteId) -> InventoryResult<Vec<khata_alerts::Alert>> {
        let mut all = Vec::new();
        for product in self.products.list(website_id)? {
            all.extend(khata_alerts::evaluate(&product));
        }
        Ok(all)
    }

    /// Best-effort alert pass after a mutation. Failures are logged, never
    /// propagated to the mutating caller.
    fn refresh_alerts(&self, website_id: WebsiteId, product_id: ProductId) {
        match self.products.get(website_id, &product_id) {
            Ok(Some(product)) => {
                for alert in khata_alerts::evaluate(&product) {
                    tracing::info!(
                        product_id = %alert.product_id,
                        kind = ?alert.kind,
                        "stock alert: {}",
                        alert.message
                    );
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    product_id = %product_id,
                    error = %err,
                    "alert evaluation skipped after mutation"
                );
            }
        }
    }
}
