//! Read-only aggregations over the catalog snapshot and the movement log.
//!
//! Nothing here mutates state or takes product locks; reports are
//! point-in-time views and may trail in-flight writes.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use khata_core::{ProductId, WebsiteId};

use crate::inventory::{InventoryResult, InventoryService};
use crate::movement_log::MovementLog;
use crate::product_store::ProductStore;
use crate::reservation_store::ReservationStore;

/// How many products the analytics top-movers list carries.
const TOP_MOVERS: usize = 5;

/// One row of the per-product stock report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReportRow {
    pub product_id: ProductId,
    pub product_name: String,
    pub current_stock: i64,
    /// Sum of ACTIVE reservation quantities.
    pub reserved_stock: i64,
    /// `current_stock - reserved_stock`.
    pub available_stock: i64,
    pub low_stock_threshold: i64,
    /// `current_stock * unit_price`, absent when the product has no price.
    pub total_value: Option<u64>,
    pub last_movement: Option<DateTime<Utc>>,
    pub movements_count: u64,
}

/// A product ranked by movement activity within the analytics window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopMover {
    pub product_id: ProductId,
    pub product_name: String,
    pub movements: u64,
    /// Sum of movement quantity magnitudes.
    pub quantity_moved: i64,
}

/// Website-wide inventory analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryAnalytics {
    pub total_products: u64,
    /// Sum of `current_stock * unit_price` over priced, tracked products.
    pub total_value: u64,
    pub low_stock_products: u64,
    pub out_of_stock_products: u64,
    pub total_movements: u64,
    pub movements_by_kind: BTreeMap<String, u64>,
    pub top_moving_products: Vec<TopMover>,
}

impl<P, M, R> InventoryService<P, M, R>
where
    P: ProductStore,
    M: MovementLog,
    R: ReservationStore,
{
    /// Per-product stock report for a website, ordered by product id.
    ///
    /// Untracked products are listed too: the report is a catalog view, the
    /// tracking flag only gates mutations and alerts.
    pub fn stock_report(&self, website_id: WebsiteId) -> InventoryResult<Vec<StockReportRow>> {
        let mut rows = Vec::new();
        for product in self.products().list(website_id)? {
            let reserved = self
                .reservations()
                .sum_active_for_product(website_id, product.id)?;
            let stream = self.movements().load_stream(website_id, product.id)?;

            rows.push(StockReportRow {
                product_id: product.id,
                product_name: product.name.clone(),
                current_stock: product.on_hand,
                reserved_stock: reserved,
                available_stock: product.on_hand - reserved,
                low_stock_threshold: product.low_stock_threshold,
                total_value: product.stock_value(),
                last_movement: stream.last().map(|sm| sm.movement.recorded_at),
                movements_count: stream.len() as u64,
            });
        }
        Ok(rows)
    }

    /// Website-wide analytics, with movement counts restricted to the
    /// optional `recorded_at` window.
    pub fn analytics(
        &self,
        website_id: WebsiteId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> InventoryResult<InventoryAnalytics> {
        let products = self.products().list(website_id)?;

        let mut total_value: u64 = 0;
        let mut low_stock: u64 = 0;
        let mut out_of_stock: u64 = 0;
        let mut names: HashMap<ProductId, String> = HashMap::with_capacity(products.len());
        for product in &products {
            names.insert(product.id, product.name.clone());
            if let Some(value) = product.stock_value() {
                total_value = total_value.saturating_add(value);
            }
            if !product.track_inventory {
                continue;
            }
            if product.on_hand == 0 {
                out_of_stock += 1;
            } else if product.on_hand <= product.low_stock_threshold {
                low_stock += 1;
            }
        }

        let movements = self.movements().list_range(website_id, from, to)?;
        let mut by_kind: BTreeMap<String, u64> = BTreeMap::new();
        let mut per_product: HashMap<ProductId, (u64, i64)> = HashMap::new();
        for sm in &movements {
            *by_kind.entry(sm.movement.kind.as_str().to_string()).or_default() += 1;
            let entry = per_product.entry(sm.movement.product_id).or_default();
            entry.0 += 1;
            entry.1 = entry.1.saturating_add(sm.movement.quantity);
        }

        let mut top: Vec<TopMover> = per_product
            .into_iter()
            .map(|(product_id, (movements, quantity_moved))| TopMover {
                product_id,
                product_name: names
                    .get(&product_id)
                    .cloned()
                    .unwrap_or_else(|| product_id.to_string()),
                movements,
                quantity_moved,
            })
            .collect();
        top.sort_by_key(|t| (std::cmp::Reverse(t.quantity_moved), *t.product_id.as_uuid()));
        top.truncate(TOP_MOVERS);

        Ok(InventoryAnalytics {
            total_products: products.len() as u64,
            total_value,
            low_stock_products: low_stock,
            out_of_stock_products: out_of_stock,
            total_movements: movements.len() as u64,
            movements_by_kind: by_kind,
            top_moving_products: top,
        })
    }
}
