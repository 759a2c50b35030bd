use khata_core::WebsiteId;
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = khata_api::app::build_app();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_product(
    client: &reqwest::Client,
    srv: &TestServer,
    website: WebsiteId,
    body: serde_json::Value,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/products", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["success"], true);
    envelope["data"].clone()
}

#[tokio::test]
async fn health_needs_no_website_header() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn website_header_is_required_for_scoped_routes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/inventory/report", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/inventory/report", srv.base_url))
        .header("x-website-id", "not-a-uuid")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn product_catalog_round_trip() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let website = WebsiteId::new();

    let product = create_product(
        &client,
        &srv,
        website,
        json!({
            "name": "Tapal Danedar 950g",
            "sku": "TAP-950",
            "low_stock_threshold": 5,
            "unit_price": 1250,
            "initial_stock": 40,
        }),
    )
    .await;

    let id = product["id"].as_str().unwrap();
    assert_eq!(product["on_hand"], 40);

    let res = client
        .get(format!("{}/products/{}", srv.base_url, id))
        .header("x-website-id", website.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["sku"], "TAP-950");

    // Another website cannot see the product.
    let res = client
        .get(format!("{}/products/{}", srv.base_url, id))
        .header("x-website-id", WebsiteId::new().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["error"]["code"], "PRODUCT_NOT_FOUND");
}

#[tokio::test]
async fn movement_lifecycle_record_list_and_counter() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let website = WebsiteId::new();

    let product = create_product(
        &client,
        &srv,
        website,
        json!({ "name": "Basmati 5kg", "initial_stock": 10, "low_stock_threshold": 3 }),
    )
    .await;
    let id = product["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/inventory/transactions", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({
            "product_id": id,
            "kind": "OUT",
            "quantity": 4,
            "reason": "counter sale",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["sequence"], 1);
    assert_eq!(envelope["data"]["kind"], "OUT");

    let res = client
        .get(format!("{}/products/{}", srv.base_url, id))
        .header("x-website-id", website.to_string())
        .send()
        .await
        .unwrap();
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["on_hand"], 6);

    let res = client
        .get(format!("{}/inventory/movements/{}?limit=10", srv.base_url, id))
        .header("x-website-id", website.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["movements"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn movement_validation_and_not_found_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let website = WebsiteId::new();

    // Malformed product id.
    let res = client
        .post(format!("{}/inventory/transactions", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({ "product_id": "garbage", "kind": "IN", "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["error"]["code"], "VALIDATION_ERROR");

    // Well-formed id, unknown product.
    let res = client
        .post(format!("{}/inventory/transactions", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({
            "product_id": uuid::Uuid::now_v7().to_string(),
            "kind": "IN",
            "quantity": 1,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["error"]["code"], "PRODUCT_NOT_FOUND");

    // Negative quantity.
    let product = create_product(
        &client,
        &srv,
        website,
        json!({ "name": "Match box", "initial_stock": 5 }),
    )
    .await;
    let res = client
        .post(format!("{}/inventory/transactions", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({
            "product_id": product["id"],
            "kind": "IN",
            "quantity": -2,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn untracked_product_rejects_movements() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let website = WebsiteId::new();

    let product = create_product(
        &client,
        &srv,
        website,
        json!({ "name": "Shopping bag", "track_inventory": false }),
    )
    .await;

    let res = client
        .post(format!("{}/inventory/transactions", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({ "product_id": product["id"], "kind": "IN", "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["error"]["code"], "TRACKING_DISABLED");
}

#[tokio::test]
async fn reserve_release_fulfill_over_http() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let website = WebsiteId::new();

    let product = create_product(
        &client,
        &srv,
        website,
        json!({ "name": "Nido 900g", "initial_stock": 10, "low_stock_threshold": 2 }),
    )
    .await;
    let id = product["id"].as_str().unwrap().to_string();
    let order = uuid::Uuid::now_v7().to_string();

    let res = client
        .post(format!("{}/inventory/reserve", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({ "product_id": id, "quantity": 4, "order_id": order }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["reserved"], true);

    // Oversized second reservation is rejected with 409.
    let res = client
        .post(format!("{}/inventory/reserve", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({ "product_id": id, "quantity": 100, "order_id": order }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["error"]["code"], "RESERVATION_REJECTED");

    let res = client
        .post(format!("{}/inventory/release", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({ "order_id": order }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["released"], 1);

    // Stock is back; fulfilling the released order resolves nothing.
    let res = client
        .get(format!("{}/products/{}", srv.base_url, id))
        .header("x-website-id", website.to_string())
        .send()
        .await
        .unwrap();
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["on_hand"], 10);

    let res = client
        .post(format!("{}/inventory/fulfill", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({ "order_id": order }))
        .send()
        .await
        .unwrap();
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["fulfilled"], 0);
}

#[tokio::test]
async fn bulk_receive_rolls_back_on_bad_entry() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let website = WebsiteId::new();

    let product = create_product(
        &client,
        &srv,
        website,
        json!({ "name": "Dalda 1L", "initial_stock": 2 }),
    )
    .await;
    let id = product["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/inventory/bulk-receive", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({
            "entries": [
                { "product_id": id, "quantity": 10, "unit_cost": 550 },
                { "product_id": uuid::Uuid::now_v7().to_string(), "quantity": 3 },
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // First entry must not have been applied.
    let res = client
        .get(format!("{}/products/{}", srv.base_url, id))
        .header("x-website-id", website.to_string())
        .send()
        .await
        .unwrap();
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["on_hand"], 2);
}

#[tokio::test]
async fn report_alerts_and_analytics_round_trip() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let website = WebsiteId::new();

    let product = create_product(
        &client,
        &srv,
        website,
        json!({
            "name": "Rooh Afza 800ml",
            "initial_stock": 10,
            "low_stock_threshold": 5,
            "unit_price": 480,
        }),
    )
    .await;
    let id = product["id"].as_str().unwrap().to_string();
    let order = uuid::Uuid::now_v7().to_string();

    // Drop to 3: LOW_STOCK territory.
    let res = client
        .post(format!("{}/inventory/reserve", srv.base_url))
        .header("x-website-id", website.to_string())
        .json(&json!({ "product_id": id, "quantity": 7, "order_id": order }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/inventory/alerts", srv.base_url))
        .header("x-website-id", website.to_string())
        .send()
        .await
        .unwrap();
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["count"], 1);
    assert_eq!(envelope["data"]["alerts"][0]["kind"], "LOW_STOCK");

    let res = client
        .get(format!("{}/inventory/report", srv.base_url))
        .header("x-website-id", website.to_string())
        .send()
        .await
        .unwrap();
    let envelope: serde_json::Value = res.json().await.unwrap();
    let row = &envelope["data"]["report"][0];
    assert_eq!(row["current_stock"], 3);
    assert_eq!(row["reserved_stock"], 7);
    assert_eq!(row["available_stock"], -4);
    assert_eq!(row["movements_count"], 1);

    let res = client
        .get(format!("{}/inventory/analytics", srv.base_url))
        .header("x-website-id", website.to_string())
        .send()
        .await
        .unwrap();
    let envelope: serde_json::Value = res.json().await.unwrap();
    assert_eq!(envelope["data"]["total_products"], 1);
    assert_eq!(envelope["data"]["low_stock_products"], 1);
    assert_eq!(envelope["data"]["total_movements"], 1);
    assert_eq!(envelope["data"]["movements_by_kind"]["OUT"], 1);
}
