use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use khata_core::{OrderId, ProductId};
use khata_ledger::MovementKind;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    pub product_id: String,
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub unit_cost: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub product_id: String,
    pub quantity: i64,
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderActionRequest {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkAdjustEntryRequest {
    pub product_id: String,
    pub quantity: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkAdjustRequest {
    pub entries: Vec<BulkAdjustEntryRequest>,
}

#[derive(Debug, Deserialize)]
pub struct BulkReceiveEntryRequest {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost: Option<u64>,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkReceiveRequest {
    pub entries: Vec<BulkReceiveEntryRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: Option<String>,
    pub track_inventory: Option<bool>,
    pub low_stock_threshold: Option<i64>,
    pub unit_price: Option<u64>,
    pub initial_stock: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MovementsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// -------------------------
// Id parsing (envelope-shaped validation errors)
// -------------------------

pub fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "invalid product id")
    })
}

pub fn parse_order_id(raw: &str) -> Result<OrderId, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "invalid order id")
    })
}
