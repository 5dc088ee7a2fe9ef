//! HTTP server for the storefront.
//!
//! Two portals share one router: staff routes manage the catalog, the
//! order queue, and the purchase ledger; customer routes cover account
//! registration, browsing, and order placement. Both are gated by
//! bearer-token sessions, and the whole surface gets structured
//! logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{AccountService, CatalogService, DomainError, OrderService, PurchaseService};
use export::ExportService;
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::SessionStore;
use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub catalog: CatalogService<S>,
    pub orders: OrderService<S>,
    pub purchases: PurchaseService<S>,
    pub accounts: AccountService<S>,
    pub export: ExportService<S>,
    pub sessions: SessionStore,
    pub staff_username: String,
    pub staff_password_hash: String,
}

/// Builds the application state over the given store.
///
/// A pre-hashed staff credential from the config is used as-is;
/// otherwise the plaintext password is hashed here once. Only the hash
/// is kept for the lifetime of the process.
pub fn create_state<S: Store>(store: S, config: &Config) -> Result<Arc<AppState<S>>, DomainError> {
    let staff_password_hash = match &config.staff_password_hash {
        Some(hash) => hash.clone(),
        None => domain::hash_password(&config.staff_password)?,
    };
    Ok(Arc::new(AppState {
        catalog: CatalogService::new(store.clone()),
        orders: OrderService::new(store.clone()),
        purchases: PurchaseService::new(store.clone()),
        accounts: AccountService::new(store.clone()),
        export: ExportService::new(store),
        sessions: SessionStore::new(),
        staff_username: config.staff_username.clone(),
        staff_password_hash,
    }))
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Staff portal
        .route("/store_login", post(routes::staff::login::<S>))
        .route("/store_logout", get(routes::staff::logout::<S>))
        .route("/store_dashboard", get(routes::staff::dashboard::<S>))
        .route(
            "/product",
            get(routes::staff::list_products::<S>).post(routes::staff::create_product::<S>),
        )
        .route(
            "/delete_product/{id}",
            post(routes::staff::delete_product::<S>),
        )
        .route("/order", get(routes::staff::list_orders::<S>))
        .route(
            "/update_order_status/{id}",
            post(routes::staff::update_order_status::<S>),
        )
        .route("/delete_order/{id}", post(routes::staff::delete_order::<S>))
        .route(
            "/purchase",
            get(routes::staff::list_purchases::<S>).post(routes::staff::create_purchase::<S>),
        )
        .route(
            "/update_purchase_status/{id}",
            post(routes::staff::update_purchase_status::<S>),
        )
        .route(
            "/delete_purchase/{id}",
            post(routes::staff::delete_purchase::<S>),
        )
        .route("/export", get(routes::staff::export_csv::<S>))
        // Customer portal
        .route("/customer_register", post(routes::customer::register::<S>))
        .route("/customer_login", post(routes::customer::login::<S>))
        .route("/customer_logout", get(routes::customer::logout::<S>))
        .route(
            "/customer_dashboard",
            get(routes::customer::dashboard::<S>),
        )
        .route("/product_view", get(routes::customer::product_view::<S>))
        .route(
            "/ordering",
            get(routes::customer::ordering_page::<S>).post(routes::customer::place_order::<S>),
        )
        .route("/order_view", get(routes::customer::order_view::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
