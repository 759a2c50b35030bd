//! Minimal catalog surface so the service is operable standalone. The
//! inventory core itself only ever mutates `on_hand` on these records.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use khata_core::{ProductId, ProductRecord};
use khata_store::ProductStore;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::WebsiteContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    if body.name.trim().is_empty() {
        return errors::json_error(
            axum::http::StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "name must not be empty",
        );
    }

    let mut product = ProductRecord::new(ProductId::new(), body.name.trim());
    if let Some(sku) = body.sku {
        product = product.with_sku(sku);
    }
    if let Some(track) = body.track_inventory {
        product = product.with_tracking(track);
    }
    if let Some(threshold) = body.low_stock_threshold {
        if threshold < 0 {
            return errors::json_error(
                axum::http::StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "low_stock_threshold must not be negative",
            );
        }
        product = product.with_low_stock_threshold(threshold);
    }
    if let Some(unit_price) = body.unit_price {
        product = product.with_unit_price(unit_price);
    }
    if let Some(initial_stock) = body.initial_stock {
        if initial_stock < 0 {
            return errors::json_error(
                axum::http::StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "initial_stock must not be negative",
            );
        }
        product.on_hand = initial_stock;
    }

    match services
        .inventory
        .products()
        .upsert(website.website_id(), product.clone())
    {
        Ok(()) => errors::json_created(json!(product)),
        Err(e) => {
            tracing::error!("product upsert failed: {e}");
            errors::json_error(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INVENTORY_TRANSACTION_FAILED",
                "failed to store product",
            )
        }
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
) -> axum::response::Response {
    match services.inventory.products().list(website.website_id()) {
        Ok(products) => errors::json_ok(json!({ "products": products })),
        Err(e) => {
            tracing::error!("product list failed: {e}");
            errors::json_error(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INVENTORY_TRANSACTION_FAILED",
                "failed to list products",
            )
        }
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(website): Extension<WebsiteContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id = match dto::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .inventory
        .products()
        .get(website.website_id(), &product_id)
    {
        Ok(Some(product)) => errors::json_ok(json!(product)),
        Ok(None) => errors::json_error(
            axum::http::StatusCode::NOT_FOUND,
            "PRODUCT_NOT_FOUND",
            "product not found",
        ),
        Err(e) => {
            tracing::error!("product get failed: {e}");
            errors::json_error(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INVENTORY_TRANSACTION_FAILED",
                "failed to load product",
            )
        }
    }
}
