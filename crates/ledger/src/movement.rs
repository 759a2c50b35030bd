use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use khata_core::{DomainError, DomainResult, MovementId, ProductId, WebsiteId};

/// Reason string attached to movements created by the reservation workflow.
pub const REASON_ORDER_RESERVATION: &str = "ORDER_RESERVATION";
/// Reason string attached to compensating movements created by a release.
pub const REASON_ORDER_RELEASE: &str = "ORDER_RELEASE";

/// Kind of a stock movement. Quantity is always a non-negative magnitude;
/// the kind decides direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    In,
    Out,
    Adjustment,
    Return,
    Damage,
    Loss,
}

impl MovementKind {
    /// Apply this movement's quantity to an on-hand count.
    ///
    /// - `In`/`Return` add.
    /// - `Out`/`Damage`/`Loss` subtract, clamped at zero.
    /// - `Adjustment` is an absolute set (not a delta), floored at zero.
    pub fn apply_to(self, on_hand: i64, quantity: i64) -> i64 {
        match self {
            MovementKind::In | MovementKind::Return => on_hand.saturating_add(quantity),
            MovementKind::Out | MovementKind::Damage | MovementKind::Loss => {
                (on_hand.saturating_sub(quantity)).max(0)
            }
            MovementKind::Adjustment => quantity.max(0),
        }
    }

    pub fn is_inbound(self) -> bool {
        matches!(self, MovementKind::In | MovementKind::Return)
    }

    pub fn is_outbound(self) -> bool {
        matches!(self, MovementKind::Out | MovementKind::Damage | MovementKind::Loss)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::In => "IN",
            MovementKind::Out => "OUT",
            MovementKind::Adjustment => "ADJUSTMENT",
            MovementKind::Return => "RETURN",
            MovementKind::Damage => "DAMAGE",
            MovementKind::Loss => "LOSS",
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated input for a movement that has not been recorded yet.
///
/// Drafts carry everything the caller decides; identity, timestamps and
/// sequence numbers are assigned when the ledger records the movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    /// Unit cost in the smallest currency unit, for receiving flows.
    pub unit_cost: Option<u64>,
}

impl MovementDraft {
    /// Create a draft, rejecting negative quantities.
    ///
    /// A zero quantity is legal: `ADJUSTMENT 0` is the documented way to set a
    /// product's stock to zero.
    pub fn new(kind: MovementKind, quantity: i64) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(Self {
            kind,
            quantity,
            reason: None,
            reference: None,
            notes: None,
            unit_cost: None,
        })
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: u64) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }
}

/// A recorded stock movement. Immutable once created; the ledger never updates
/// or deletes entries in normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub website_id: WebsiteId,
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub unit_cost: Option<u64>,
    pub recorded_at: DateTime<Utc>,
}

impl Movement {
    /// Materialize a draft into a recorded movement.
    pub fn record(
        website_id: WebsiteId,
        product_id: ProductId,
        draft: MovementDraft,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            website_id,
            product_id,
            kind: draft.kind,
            quantity: draft.quantity,
            reason: draft.reason,
            reference: draft.reference,
            notes: draft.notes,
            unit_cost: draft.unit_cost,
            recorded_at,
        }
    }

    /// Apply this movement to an on-hand count.
    pub fn apply_to(&self, on_hand: i64) -> i64 {
        self.kind.apply_to(on_hand, self.quantity)
    }
}
