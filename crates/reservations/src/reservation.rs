use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use khata_core::{DomainError, DomainResult, OrderId, ProductId, ReservationId, WebsiteId};

/// Reservation status lifecycle.
///
/// ```text
/// (none) --open--> Active --fulfill--> Fulfilled [terminal]
///                       \----release--> Released  [terminal]
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Active,
    Released,
    Fulfilled,
}

impl ReservationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReservationStatus::Released | ReservationStatus::Fulfilled)
    }
}

/// Terminal outcome a hold can be closed with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReservationOutcome {
    Fulfilled,
    Released,
}

impl From<ReservationOutcome> for ReservationStatus {
    fn from(outcome: ReservationOutcome) -> Self {
        match outcome {
            ReservationOutcome::Fulfilled => ReservationStatus::Fulfilled,
            ReservationOutcome::Released => ReservationStatus::Released,
        }
    }
}

/// A hold of stock against an order, one row per (order, product) reserve call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    website_id: WebsiteId,
    product_id: ProductId,
    order_id: OrderId,
    quantity: i64,
    status: ReservationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Open a new hold. Quantity must be strictly positive.
    pub fn open(
        website_id: WebsiteId,
        product_id: ProductId,
        order_id: OrderId,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("reservation quantity must be positive"));
        }
        Ok(Self {
            id: ReservationId::new(),
            website_id,
            product_id,
            order_id,
            quantity,
            status: ReservationStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn website_id(&self) -> WebsiteId {
        self.website_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    /// Close the hold as fulfilled. The stock decrement already happened when
    /// the hold was opened, so fulfillment records no movement.
    pub fn fulfill(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.close_strict(ReservationOutcome::Fulfilled, now)
    }

    /// Close the hold as released. The caller is responsible for recording the
    /// compensating RETURN movement.
    pub fn release(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.close_strict(ReservationOutcome::Released, now)
    }

    /// Claim-style close: transition an ACTIVE hold to a terminal outcome.
    ///
    /// Returns `false` and changes nothing when the hold is already terminal,
    /// so a store can run it under its own lock as a one-shot claim.
    pub fn close(&mut self, outcome: ReservationOutcome, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = outcome.into();
        self.updated_at = now;
        true
    }

    fn close_strict(&mut self, outcome: ReservationOutcome, now: DateTime<Utc>) -> DomainResult<()> {
        let prior = self.status;
        if self.close(outcome, now) {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "reservation {} is terminal ({:?}) and cannot transition to {:?}",
                self.id, prior, outcome
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_reservation(quantity: i64) -> DomainResult<Reservation> {
        Reservation::open(
            WebsiteId::new(),
            ProductId::new(),
            OrderId::new(),
            quantity,
            Utc::now(),
        )
    }

    #[test]
    fn open_creates_an_active_hold() {
        let r = open_test_reservation(3).unwrap();
        assert_eq!(r.status(), ReservationStatus::Active);
        assert!(r.is_active());
        assert_eq!(r.quantity(), 3);
    }

    #[test]
    fn open_rejects_non_positive_quantities() {
        assert!(matches!(
            open_test_reservation(0),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            open_test_reservation(-2),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn fulfill_is_terminal() {
        let mut r = open_test_reservation(1).unwrap();
        r.fulfill(Utc::now()).unwrap();
        assert_eq!(r.status(), ReservationStatus::Fulfilled);

        let err = r.release(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(r.status(), ReservationStatus::Fulfilled);
    }

    #[test]
    fn release_is_terminal() {
        let mut r = open_test_reservation(1).unwrap();
        r.release(Utc::now()).unwrap();
        assert_eq!(r.status(), ReservationStatus::Released);

        let err = r.fulfill(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(r.status(), ReservationStatus::Released);
    }

    #[test]
    fn close_claims_an_active_hold_exactly_once() {
        let mut r = open_test_reservation(2).unwrap();

        assert!(r.close(ReservationOutcome::Released, Utc::now()));
        assert_eq!(r.status(), ReservationStatus::Released);

        // Second close loses the claim and leaves the outcome untouched.
        assert!(!r.close(ReservationOutcome::Fulfilled, Utc::now()));
        assert_eq!(r.status(), ReservationStatus::Released);
    }

    #[test]
    fn transitions_touch_updated_at() {
        let mut r = open_test_reservation(1).unwrap();
        let later = Utc::now() + chrono::Duration::seconds(30);
        r.fulfill(later).unwrap();
        assert_eq!(r.updated_at(), later);
        assert!(r.created_at() < r.updated_at());
    }
}
