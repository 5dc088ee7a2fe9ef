//! Integration tests for the storefront server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use metrics_exporter_prometheus::PrometheusHandle;
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let config = api::config::Config::default();
    let state =
        api::create_state(InMemoryStore::new(), &config).expect("failed to build state");
    api::create_app(state, get_metrics_handle())
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn form_post_authed(uri: &str, body: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Logs in as the default staff account and returns the token.
async fn staff_token(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(form_post("/store_login", "username=admin&password=admin"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"].as_str().unwrap().to_string()
}

/// Registers and logs in a customer, returning the token.
async fn customer_token(app: &axum::Router, username: &str) -> String {
    let creds = format!("username={username}&password=hunter2");
    let response = app
        .clone()
        .oneshot(form_post("/customer_register", &creds))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(form_post("/customer_login", &creds))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"].as_str().unwrap().to_string()
}

async fn add_product(app: &axum::Router, token: &str, name: &str, stock: i64) {
    let body = format!("name={name}&price=9.99&stock={stock}&category=tools");
    let response = app
        .clone()
        .oneshot(form_post_authed("/product", &body, token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_gated_staff_route_redirects_to_login() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/product")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/store_login");
}

#[tokio::test]
async fn test_gated_customer_route_redirects_to_login() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/product_view")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/customer_login");
}

#[tokio::test]
async fn test_customer_token_does_not_open_staff_routes() {
    let app = setup();
    let token = customer_token(&app, "mallory").await;

    let response = app.clone().oneshot(get("/product", &token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/store_login");
}

#[tokio::test]
async fn test_staff_login_rejects_bad_password() {
    let app = setup();

    let response = app
        .oneshot(form_post("/store_login", "username=admin&password=wrong"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_staff_logout_revokes_token() {
    let app = setup();
    let token = staff_token(&app).await;

    let response = app
        .clone()
        .oneshot(get("/store_logout", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/product", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_product_create_and_list() {
    let app = setup();
    let token = staff_token(&app).await;
    add_product(&app, &token, "Hammer", 4).await;

    let response = app.clone().oneshot(get("/product", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total_items"], 1);
    assert_eq!(json["items"][0]["name"], "Hammer");
    assert_eq!(json["items"][0]["stock"], 4);
}

#[tokio::test]
async fn test_duplicate_product_is_conflict() {
    let app = setup();
    let token = staff_token(&app).await;
    add_product(&app, &token, "Hammer", 4).await;

    let body = "name=Hammer&price=9.99&stock=1&category=tools";
    let response = app
        .clone()
        .oneshot(form_post_authed("/product", body, &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_product_is_bad_request() {
    let app = setup();
    let token = staff_token(&app).await;

    let body = "name=&price=9.99&stock=1&category=tools";
    let response = app
        .clone()
        .oneshot(form_post_authed("/product", body, &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_customer_register_then_dashboard() {
    let app = setup();
    let token = customer_token(&app, "ada").await;

    let response = app
        .clone()
        .oneshot(get("/customer_dashboard", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["username"], "ada");
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let app = setup();
    let _ = customer_token(&app, "ada").await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/customer_register",
            "username=ada&password=other",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_place_order_decrements_stock() {
    let app = setup();
    let staff = staff_token(&app).await;
    add_product(&app, &staff, "Lamp", 5).await;
    let customer = customer_token(&app, "ada").await;

    let body = "phone=555-0101&address=1+Loop+Rd&product_id=1&quantity=2";
    let response = app
        .clone()
        .oneshot(form_post_authed("/ordering", body, &customer))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["order"]["customer"], "ada");
    assert_eq!(json["order"]["status"], "pending");
    assert_eq!(json["item"]["quantity"], 2);

    let response = app
        .clone()
        .oneshot(get("/product_view", &customer))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["items"][0]["stock"], 3);
}

#[tokio::test]
async fn test_order_over_stock_is_conflict_and_changes_nothing() {
    let app = setup();
    let staff = staff_token(&app).await;
    add_product(&app, &staff, "Lamp", 1).await;
    let customer = customer_token(&app, "ada").await;

    let body = "phone=555-0101&address=1+Loop+Rd&product_id=1&quantity=3";
    let response = app
        .clone()
        .oneshot(form_post_authed("/ordering", body, &customer))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Stock untouched, no order recorded.
    let response = app
        .clone()
        .oneshot(get("/product_view", &customer))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["items"][0]["stock"], 1);

    let response = app.clone().oneshot(get("/order", &staff)).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total_items"], 0);
}

#[tokio::test]
async fn test_order_view_shows_only_own_orders() {
    let app = setup();
    let staff = staff_token(&app).await;
    add_product(&app, &staff, "Lamp", 10).await;
    let ada = customer_token(&app, "ada").await;
    let bob = customer_token(&app, "bob").await;

    let body = "phone=555-0101&address=1+Loop+Rd&product_id=1&quantity=1";
    for token in [&ada, &bob] {
        let response = app
            .clone()
            .oneshot(form_post_authed("/ordering", body, token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.clone().oneshot(get("/order_view", &ada)).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total_items"], 1);
    assert_eq!(json["items"][0]["order"]["customer"], "ada");
}

#[tokio::test]
async fn test_update_order_status_forward_then_backward() {
    let app = setup();
    let staff = staff_token(&app).await;
    add_product(&app, &staff, "Lamp", 5).await;
    let customer = customer_token(&app, "ada").await;

    let body = "phone=555-0101&address=1+Loop+Rd&product_id=1&quantity=1";
    let response = app
        .clone()
        .oneshot(form_post_authed("/ordering", body, &customer))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(form_post_authed(
            "/update_order_status/1",
            "status=shipped",
            &staff,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Regressing to an earlier status must be rejected.
    let response = app
        .clone()
        .oneshot(form_post_authed(
            "/update_order_status/1",
            "status=processing",
            &staff,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_ordered_product_is_conflict() {
    let app = setup();
    let staff = staff_token(&app).await;
    add_product(&app, &staff, "Lamp", 5).await;
    let customer = customer_token(&app, "ada").await;

    let body = "phone=555-0101&address=1+Loop+Rd&product_id=1&quantity=1";
    let response = app
        .clone()
        .oneshot(form_post_authed("/ordering", body, &customer))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(form_post_authed("/delete_product/1", "", &staff))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_purchase_ledger_roundtrip() {
    let app = setup();
    let staff = staff_token(&app).await;

    let body = "owner=Depot&phone=555-0199&address=9+Dock+St&product_name=Cable\
                &product_price=2.25&product_category=parts&product_quantity=0";
    let response = app
        .clone()
        .oneshot(form_post_authed("/purchase", body, &staff))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.clone().oneshot(get("/purchase", &staff)).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total_items"], 1);
    assert_eq!(json["items"][0]["owner"], "Depot");
    assert_eq!(json["items"][0]["product_quantity"], 0);
    assert_eq!(json["items"][0]["status"], "pending");
}

#[tokio::test]
async fn test_export_product_csv_attachment() {
    let app = setup();
    let staff = staff_token(&app).await;
    add_product(&app, &staff, "Hammer", 4).await;

    let response = app
        .clone()
        .oneshot(get("/export?data_type=product", &staff))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"data.csv\""
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("name,price,stock,category,created_at"));
    assert!(text.contains("Hammer"));
}

#[tokio::test]
async fn test_export_rejects_unknown_data_type() {
    let app = setup();
    let staff = staff_token(&app).await;

    let response = app
        .clone()
        .oneshot(get("/export?data_type=invoice", &staff))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() {
    let app = setup();
    let staff = staff_token(&app).await;
    add_product(&app, &staff, "Hammer", 4).await;

    let response = app
        .clone()
        .oneshot(get("/product?page=4294967295", &staff))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total_items"], 1);
    assert_eq!(json["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_search_filters_product_listing() {
    let app = setup();
    let staff = staff_token(&app).await;
    add_product(&app, &staff, "Hammer", 4).await;
    add_product(&app, &staff, "Lamp", 2).await;

    let response = app
        .clone()
        .oneshot(get("/product?search=ham", &staff))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total_items"], 1);
    assert_eq!(json["items"][0]["name"], "Hammer");
}
