use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use khata_ledger::MovementDraft;
use khata_store::{BulkAdjustEntry, BulkReceiveEntry};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::WebsiteContext;

pub fn router() -> Router {
    Router::new()
        .route("/transactions", post(record_movement))
        .route("/reserve", post(reserve))
        .route("/release", post(release))
        .route("/fulfill", post(fulfill))
        .route("/bulk-adjust", post(bulk_adjust))
        .route("/bulk-receive", post(bulk_receive))
        .route("/movements/:product_id", get(list_movements))
        .route("/replay/:product_id", post(replay))
        .route("/alerts", get(alerts))
        .route("/report", get(report))
        .route("/analytics", get(analytics))
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Json(body): Json<dto::RecordMovementRequest>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&body.product_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut draft = match MovementDraft::new(body.kind, body.quantity) {
        Ok(d) => d,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
    };
    if let Some(reason) = body.reason {
        draft = draft.with_reason(reason);
    }
    if let Some(reference) = body.reference {
        draft = draft.with_reference(reference);
    }
    if let Some(notes) = body.notes {
        draft = draft.with_notes(notes);
    }
    if let Some(unit_cost) = body.unit_cost {
        draft = draft.with_unit_cost(unit_cost);
    }

    match services
        .inventory
        .record_movement(website.website_id(), product_id, draft)
    {
        Ok(stored) => errors::json_created(json!(stored)),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn reserve(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Json(body): Json<dto::ReserveRequest>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&body.product_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let order_id = match dto::parse_order_id(&body.order_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .inventory
        .reserve(website.website_id(), product_id, body.quantity, order_id)
    {
        Ok(true) => errors::json_ok(json!({
            "reserved": true,
            "product_id": product_id,
            "order_id": order_id,
            "quantity": body.quantity,
        })),
        // Soft precondition failure: insufficient stock, unknown product,
        // untracked product, or non-positive quantity.
        Ok(false) => errors::json_error(
            StatusCode::CONFLICT,
            "RESERVATION_REJECTED",
            "reservation could not be granted",
        ),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn release(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Json(body): Json<dto::OrderActionRequest>,
) -> axum::response::Response {
    let order_id = match dto::parse_order_id(&body.order_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.inventory.release(website.website_id(), order_id) {
        Ok(released) => errors::json_ok(json!({
            "order_id": order_id,
            "released": released,
        })),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn fulfill(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Json(body): Json<dto::OrderActionRequest>,
) -> axum::response::Response {
    let order_id = match dto::parse_order_id(&body.order_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.inventory.fulfill(website.website_id(), order_id) {
        Ok(fulfilled) => errors::json_ok(json!({
            "order_id": order_id,
            "fulfilled": fulfilled,
        })),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn bulk_adjust(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Json(body): Json<dto::BulkAdjustRequest>,
) -> axum::response::Response {
    let mut entries = Vec::with_capacity(body.entries.len());
    for entry in body.entries {
        let product_id = match dto::parse_product_id(&entry.product_id) {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        entries.push(BulkAdjustEntry {
            product_id,
            quantity: entry.quantity,
            reason: entry.reason,
        });
    }

    match services.inventory.bulk_adjust(website.website_id(), entries) {
        Ok(stored) => errors::json_created(json!({
            "count": stored.len(),
            "movements": stored,
        })),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn bulk_receive(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Json(body): Json<dto::BulkReceiveRequest>,
) -> axum::response::Response {
    let mut entries = Vec::with_capacity(body.entries.len());
    for entry in body.entries {
        let product_id = match dto::parse_product_id(&entry.product_id) {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        entries.push(BulkReceiveEntry {
            product_id,
            quantity: entry.quantity,
            unit_cost: entry.unit_cost,
            reference: entry.reference,
        });
    }

    match services.inventory.bulk_receive(website.website_id(), entries) {
        Ok(stored) => errors::json_created(json!({
            "count": stored.len(),
            "movements": stored,
        })),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Path(product_id): Path<String>,
    Query(query): Query<dto::MovementsQuery>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&product_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .inventory
        .list_movements(website.website_id(), product_id, query.limit)
    {
        Ok(movements) => errors::json_ok(json!({
            "product_id": product_id,
            "movements": movements,
        })),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn replay(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&product_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .inventory
        .replay_product(website.website_id(), product_id)
    {
        Ok(on_hand) => errors::json_ok(json!({
            "product_id": product_id,
            "on_hand": on_hand,
        })),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
) -> axum::response::Response {
    match services.inventory.alerts(website.website_id()) {
        Ok(alerts) => errors::json_ok(json!({
            "count": alerts.len(),
            "alerts": alerts,
        })),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
) -> axum::response::Response {
    match services.inventory.stock_report(website.website_id()) {
        Ok(rows) => errors::json_ok(json!({ "report": rows })),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn analytics(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Query(query): Query<dto::AnalyticsQuery>,
) -> axum::response::Response {
    match services
        .inventory
        .analytics(website.website_id(), query.from, query.to)
    {
        Ok(analytics) => errors::json_ok(json!(analytics)),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
