use serde::{Deserialize, Serialize};

use khata_core::{ProductId, ProductRecord};

/// Overstock fires above `low_stock_threshold * OVERSTOCK_FACTOR`.
const OVERSTOCK_FACTOR: i64 = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    LowStock,
    OutOfStock,
    Overstock,
    /// Reserved for products carrying expiry metadata. The catalog snapshot has
    /// no expiry date today, so the evaluator never emits this kind; it stays
    /// in the taxonomy for wire compatibility.
    Expiring,
}

/// A derived stock alert. Value type, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub product_id: ProductId,
    pub kind: AlertKind,
    pub message: String,
    pub threshold: Option<i64>,
    pub current_stock: Option<i64>,
}

/// Evaluate all alert rules for one product snapshot.
///
/// Rules are independent; more than one alert can fire for the same product
/// (e.g. a zero threshold product at zero stock only fires OUT_OF_STOCK, but a
/// product can never be both out of stock and low stock). Products that do not
/// track inventory produce no alerts.
pub fn evaluate(product: &ProductRecord) -> Vec<Alert> {
    if !product.track_inventory {
        return Vec::new();
    }

    let mut alerts = Vec::new();
    let on_hand = product.on_hand;
    let threshold = product.low_stock_threshold;

    if on_hand == 0 {
        alerts.push(Alert {
            product_id: product.id,
            kind: AlertKind::OutOfStock,
            message: format!("{} is out of stock", product.name),
            threshold: None,
            current_stock: Some(0),
        });
    }

    if on_hand > 0 && on_hand <= threshold {
        alerts.push(Alert {
            product_id: product.id,
            kind: AlertKind::LowStock,
            message: format!(
                "{} is low on stock ({on_hand} left, threshold {threshold})",
                product.name
            ),
            threshold: Some(threshold),
            current_stock: Some(on_hand),
        });
    }

    if on_hand > threshold.saturating_mul(OVERSTOCK_FACTOR) {
        alerts.push(Alert {
            product_id: product.id,
            kind: AlertKind::Overstock,
            message: format!(
                "{} looks overstocked ({on_hand} on hand, threshold {threshold})",
                product.name
            ),
            threshold: Some(threshold),
            current_stock: Some(on_hand),
        });
    }

    alerts
}
