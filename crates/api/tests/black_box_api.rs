use std::sync::Arc;

use kirana_api::app::{build_app, build_services};
use kirana_api::config::AppConfig;
use kirana_core::SystemClock;
use kirana_infra::{InMemoryMailer, Stores};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    mailer: Arc<InMemoryMailer>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory stores, bound to an ephemeral port.
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let mailer = Arc::new(InMemoryMailer::new());
        let services = build_services(
            Stores::in_memory(),
            mailer.clone(),
            Arc::new(SystemClock),
            &config,
        );
        let app = build_app(services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            mailer,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn delete(&self, path: &str) -> StatusCode {
        self.client.delete(self.url(path)).send().await.unwrap().status()
    }

    async fn create_item(&self, name: &str, quantity: i64, minimum_stock: i64, price: f64) -> String {
        let (status, body) = self
            .post(
                "/inventory",
                json!({
                    "name": name,
                    "category": "Groceries",
                    "quantity": quantity,
                    "unit": "kg",
                    "price": price,
                    "minimum_stock": minimum_stock,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_supplier(&self, name: &str, email: &str) {
        let (status, body) = self
            .post(
                "/suppliers",
                json!({ "name": name, "email": email, "phone": "9876543210", "branch": "Main" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn inventory_lifecycle_create_adjust_query() {
    let srv = TestServer::spawn().await;
    let id = srv.create_item("Toor Dal", 20, 5, 120.5).await;

    let (status, item) = srv.get(&format!("/inventory/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["name"], "Toor Dal");
    assert_eq!(item["price"].as_f64(), Some(120.5));
    assert_eq!(item["is_low_stock"], false);

    // Adjust down to the threshold
    let (status, item) = srv
        .post(&format!("/inventory/{id}/adjust"), json!({ "delta": -15 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["quantity"], 5);
    assert_eq!(item["is_low_stock"], true);

    let (_, low) = srv.get("/inventory/low-stock").await;
    assert_eq!(low["items"].as_array().unwrap().len(), 1);

    let (_, groceries) = srv.get("/inventory/category/Groceries").await;
    assert_eq!(groceries["items"].as_array().unwrap().len(), 1);
    let (_, snacks) = srv.get("/inventory/category/Snacks").await;
    assert!(snacks["items"].as_array().unwrap().is_empty());

    // Stock never goes negative
    let (status, body) = srv
        .post(&format!("/inventory/{id}/adjust"), json!({ "delta": -6 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invariant_violation");

    let (status, item) = srv
        .put(&format!("/inventory/{id}"), json!({ "minimum_stock": 2 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["is_low_stock"], false);

    assert_eq!(srv.delete(&format!("/inventory/{id}")).await, StatusCode::OK);
    let (status, _) = srv.get(&format!("/inventory/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inventory_validation_and_conflicts() {
    let srv = TestServer::spawn().await;
    srv.create_item("Sugar", 10, 2, 45.0).await;

    let (status, body) = srv
        .post(
            "/inventory",
            json!({
                "name": "sugar",
                "category": "Groceries",
                "quantity": 1,
                "unit": "kg",
                "price": 45,
                "minimum_stock": 1,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = srv
        .post(
            "/inventory",
            json!({
                "name": "Salt",
                "category": "Groceries",
                "quantity": 1,
                "unit": "kg",
                "price": 19.999,
                "minimum_stock": 1,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_body");

    let (status, body) = srv.get("/inventory/not-an-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, _) = srv.get("/inventory/category/Furniture").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn auto_create_orders_shortfall_once_and_emails_suppliers() {
    let srv = TestServer::spawn().await;
    srv.create_supplier("Balaji Traders", "orders@balaji.in").await;
    let low = srv.create_item("Poha", 2, 10, 5.0).await;
    let boundary = srv.create_item("Besan", 10, 10, 60.0).await;
    srv.create_item("Rice", 50, 10, 80.0).await;

    let (status, outcome) = srv.post("/orders/auto-create", json!({})).await;
    assert_eq!(status, StatusCode::CREATED, "{outcome}");
    assert_eq!(outcome["outcome"], "order_created");

    let order = &outcome["order"];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["notes"], "Automatic order created for low stock items");
    assert!(order["order_number"].as_str().unwrap().starts_with("ORD"));

    let lines = order["items"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    let poha = lines.iter().find(|l| l["item_id"] == low.as_str()).unwrap();
    assert_eq!(poha["quantity"], 8);
    assert_eq!(poha["price"].as_f64(), Some(5.0));
    let besan = lines.iter().find(|l| l["item_id"] == boundary.as_str()).unwrap();
    assert_eq!(besan["quantity"], 1);
    assert_eq!(order["total_amount"].as_f64(), Some(100.0));

    let sent = srv.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "orders@balaji.in");
    assert!(sent[0].subject.starts_with("New Order Notification - Order ID: ORD"));

    // Everything low is already pending now.
    let (status, outcome) = srv.post("/orders/auto-create", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "nothing_to_order");

    let (_, orders) = srv.get("/orders").await;
    assert_eq!(orders["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn auto_create_without_low_stock_creates_nothing() {
    let srv = TestServer::spawn().await;
    srv.create_item("Atta", 40, 10, 50.0).await;

    let (status, outcome) = srv.post("/orders/auto-create", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "no_low_stock");

    let (_, orders) = srv.get("/orders").await;
    assert!(orders["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn manual_order_lifecycle_restocks_on_completion() {
    let srv = TestServer::spawn().await;
    srv.create_supplier("Anand Stores", "anand@suppliers.in").await;
    let item = srv.create_item("Ghee", 1, 5, 550.0).await;

    // Price omitted: the item's current price is captured.
    let (status, order) = srv
        .post("/orders", json!({ "items": [{ "item_id": item, "quantity": 4 }] }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["total_amount"].as_f64(), Some(2200.0));
    assert_eq!(order["notification"]["sent"][0], "anand@suppliers.in");
    let id = order["id"].as_str().unwrap().to_string();

    let (status, order) = srv
        .put(&format!("/orders/{id}"), json!({ "status": "Email Sent" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "sent");
    assert_eq!(srv.mailer.sent().len(), 2);

    // Lines are frozen once the order has left Pending.
    let (status, _) = srv
        .put(
            &format!("/orders/{id}"),
            json!({ "items": [{ "item_id": item, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, order) = srv
        .put(&format!("/orders/{id}"), json!({ "status": "completed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "completed");
    assert_eq!(order["restocked"][0]["quantity"], 5);

    let (_, stock) = srv.get(&format!("/inventory/{item}")).await;
    assert_eq!(stock["quantity"], 5);

    // Completed is terminal.
    let (status, body) = srv
        .put(&format!("/orders/{id}"), json!({ "status": "pending" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invariant_violation");

    let (_, completed) = srv.get("/orders?status=completed").await;
    assert_eq!(completed["items"].as_array().unwrap().len(), 1);
    let (_, pending) = srv.get("/orders?status=pending").await;
    assert!(pending["items"].as_array().unwrap().is_empty());
    let (status, _) = srv.get("/orders?status=lost").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, stats) = srv.get("/dashboard/stats").await;
    assert_eq!(stats["total_sales"].as_f64(), Some(2200.0));
    assert_eq!(stats["total_orders"], 1);
    assert_eq!(stats["total_inventory"], 1);
    assert_eq!(stats["low_stock_items"], 1);

    assert_eq!(srv.delete(&format!("/orders/{id}")).await, StatusCode::OK);
    assert_eq!(srv.delete(&format!("/orders/{id}")).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orders_reject_unknown_items_and_empty_lines() {
    let srv = TestServer::spawn().await;

    let (status, _) = srv.post("/orders", json!({ "items": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = srv
        .post(
            "/orders",
            json!({ "items": [{ "item_id": kirana_core::ItemId::new(), "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn suppliers_are_listed_by_name_and_soft_deleted() {
    let srv = TestServer::spawn().await;
    srv.create_supplier("Zeta Foods", "zeta@foods.in").await;
    srv.create_supplier("Alpha Agencies", "alpha@agencies.in").await;

    let (_, list) = srv.get("/suppliers").await;
    let items = list["items"].as_array().unwrap();
    assert_eq!(items[0]["name"], "Alpha Agencies");
    let id = items[1]["id"].as_str().unwrap().to_string();

    assert_eq!(srv.delete(&format!("/suppliers/{id}")).await, StatusCode::OK);
    let (_, list) = srv.get("/suppliers").await;
    assert_eq!(list["items"].as_array().unwrap().len(), 1);

    // The record is kept, only deactivated.
    let (status, supplier) = srv.get(&format!("/suppliers/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(supplier["is_active"], false);

    let (status, _) = srv
        .post(
            "/suppliers",
            json!({ "name": "Bad", "email": "nope", "phone": "1", "branch": "Main" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customers_are_assigned_a_salesperson() {
    let srv = TestServer::spawn().await;

    // Nobody to assign yet.
    let (status, body) = srv
        .post("/customers", json!({ "name": "Meera", "phone": "9000000001" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, cashier) = srv
        .post(
            "/staff",
            json!({ "name": "Ravi", "email": "ravi@shop.in", "role": "Cashier" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cashier["staff_code"], "STF0001");

    let (status, seller) = srv
        .post("/staff", json!({ "name": "Priya", "email": "priya@shop.in" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(seller["staff_code"], "STF0002");
    assert_eq!(seller["role"], "Salesperson");

    let (status, _) = srv
        .post("/staff", json!({ "name": "Dup", "email": "PRIYA@shop.in" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, available) = srv.get("/customers/available-salespersons").await;
    assert_eq!(available["items"].as_array().unwrap().len(), 1);

    let (status, customer) = srv
        .post("/customers", json!({ "name": "Meera", "phone": "9000000001" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{customer}");
    assert!(customer["token_number"].as_str().unwrap().starts_with("TKN"));
    assert_eq!(customer["assigned_staff"]["id"], seller["id"]);
    let customer_id = customer["id"].as_str().unwrap().to_string();

    // Cashiers cannot be assigned.
    let (status, body) = srv
        .put(
            &format!("/customers/{customer_id}"),
            json!({ "assigned_staff": cashier["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Salesperson"));

    let (status, customer) = srv
        .put(&format!("/customers/{customer_id}"), json!({ "notes": "prefers delivery" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customer["notes"], "prefers delivery");
    assert_eq!(customer["assigned_staff"]["id"], seller["id"]);

    let (_, list) = srv.get("/customers").await;
    assert_eq!(list["items"].as_array().unwrap().len(), 1);

    assert_eq!(srv.delete(&format!("/customers/{customer_id}")).await, StatusCode::OK);
    let (status, _) = srv.get(&format!("/customers/{customer_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
