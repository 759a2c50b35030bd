//! The persisted response contract: every endpoint answers with
//! `{success, data?|error?, timestamp}`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;

use khata_store::InventoryError;

/// 200 envelope.
pub fn json_ok(data: serde_json::Value) -> axum::response::Response {
    envelope(StatusCode::OK, data)
}

/// 201 envelope.
pub fn json_created(data: serde_json::Value) -> axum::response::Response {
    envelope(StatusCode::CREATED, data)
}

fn envelope(status: StatusCode, data: serde_json::Value) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": true,
            "data": data,
            "timestamp": Utc::now(),
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": message.into(),
            },
            "timestamp": Utc::now(),
        })),
    )
        .into_response()
}

pub fn inventory_error_to_response(err: InventoryError) -> axum::response::Response {
    match err {
        InventoryError::ProductNotFound => {
            json_error(StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND", "product not found")
        }
        InventoryError::TrackingDisabled => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "TRACKING_DISABLED",
            "inventory tracking is disabled for this product",
        ),
        InventoryError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
        }
        InventoryError::TransactionFailed(msg) => {
            tracing::error!("inventory transaction failed: {msg}");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INVENTORY_TRANSACTION_FAILED",
                "inventory transaction failed",
            )
        }
    }
}
