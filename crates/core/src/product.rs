//! Product catalog snapshot.
//!
//! Products are owned by the catalog subsystem; the inventory core consumes
//! this record and mutates only `on_hand`, and only through the stock ledger's
//! apply-movement path.

use serde::{Deserialize, Serialize};

use crate::id::ProductId;

/// Snapshot of a catalog product as seen by the inventory core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub sku: Option<String>,
    /// When false, every ledger/reservation operation is rejected or a no-op.
    pub track_inventory: bool,
    /// Cached on-hand quantity. Never negative. Sole writer: the stock ledger.
    pub on_hand: i64,
    /// Low-stock alert threshold (inclusive).
    pub low_stock_threshold: i64,
    /// Unit price in the smallest currency unit (e.g. paisa). None if unpriced.
    pub unit_price: Option<u64>,
}

impl ProductRecord {
    pub fn new(id: ProductId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sku: None,
            track_inventory: true,
            on_hand: 0,
            low_stock_threshold: 0,
            unit_price: None,
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn with_unit_price(mut self, unit_price: u64) -> Self {
        self.unit_price = Some(unit_price);
        self
    }

    pub fn with_tracking(mut self, track_inventory: bool) -> Self {
        self.track_inventory = track_inventory;
        self
    }

    /// Stock value of this product (on-hand × unit price), if priced.
    pub fn stock_value(&self) -> Option<u64> {
        self.unit_price.map(|price| {
            if self.on_hand > 0 {
                (self.on_hand as u64).saturating_mul(price)
            } else {
                0
            }
        })
    }
}
