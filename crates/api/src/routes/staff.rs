//! Staff portal: catalog management, order queue, purchase ledger,
//! and the CSV export.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use common::{OrderId, Page, PageRequest, ProductId, PurchaseId};
use domain::{DomainError, NewProductInput, NewPurchaseInput};
use serde::{Deserialize, Serialize};
use store::{OrderWithItems, Product, Purchase, Store};
use uuid::Uuid;

use crate::AppState;
use crate::auth::{Identity, StaffSession};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub category: String,
}

#[derive(Deserialize)]
pub struct PurchaseForm {
    pub owner: String,
    pub phone: String,
    pub address: String,
    pub product_name: String,
    pub product_price: f64,
    pub product_category: String,
    pub product_quantity: i64,
}

#[derive(Deserialize)]
pub struct StatusForm {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub data_type: String,
    pub start_date: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: Uuid,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

// -- Handlers --

/// POST /store_login — exchanges staff credentials for a session token.
#[tracing::instrument(skip_all)]
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    axum::Form(form): axum::Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let ok = form.username == state.staff_username
        && domain::verify_password(&form.password, &state.staff_password_hash);
    if !ok {
        metrics::counter!("logins_rejected_total", "portal" => "staff").increment(1);
        return Err(DomainError::InvalidCredentials.into());
    }

    let token = state.sessions.issue(Identity::Staff);
    metrics::counter!("logins_total", "portal" => "staff").increment(1);
    tracing::info!("staff logged in");
    Ok(Json(TokenResponse { token }))
}

/// GET /store_logout — revokes the staff session token.
pub async fn logout<S: Store>(
    session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
) -> Json<StatusResponse> {
    state.sessions.revoke(&session.token);
    Json(StatusResponse { status: "logged out" })
}

/// GET /store_dashboard — first page of the catalog, the staff landing view.
pub async fn dashboard<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    Query(req): Query<PageRequest>,
) -> Result<Json<Page<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products(&req).await?))
}

/// GET /product — paginated catalog, filterable by name substring.
pub async fn list_products<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    Query(req): Query<PageRequest>,
) -> Result<Json<Page<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products(&req).await?))
}

/// POST /product — adds a product to the catalog.
#[tracing::instrument(skip_all, fields(name = %form.name))]
pub async fn create_product<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    axum::Form(form): axum::Form<ProductForm>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state
        .catalog
        .create_product(NewProductInput {
            name: form.name,
            price: form.price,
            stock: form.stock,
            category: form.category,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// POST /delete_product/{id} — removes a product that no order references.
pub async fn delete_product<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.catalog.delete_product(ProductId::new(id)).await?;
    Ok(Json(StatusResponse { status: "deleted" }))
}

/// GET /order — paginated orders with their line items, filterable by
/// product name.
pub async fn list_orders<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    Query(req): Query<PageRequest>,
) -> Result<Json<Page<OrderWithItems>>, ApiError> {
    Ok(Json(state.orders.list_orders(&req).await?))
}

/// POST /update_order_status/{id} — advances an order's status.
pub async fn update_order_status<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    axum::Form(form): axum::Form<StatusForm>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .orders
        .update_status(OrderId::new(id), &form.status)
        .await?;
    Ok(Json(StatusResponse { status: "updated" }))
}

/// POST /delete_order/{id} — deletes an order and its line items.
pub async fn delete_order<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.orders.delete_order(OrderId::new(id)).await?;
    Ok(Json(StatusResponse { status: "deleted" }))
}

/// GET /purchase — paginated purchase ledger, filterable by product name.
pub async fn list_purchases<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    Query(req): Query<PageRequest>,
) -> Result<Json<Page<Purchase>>, ApiError> {
    Ok(Json(state.purchases.list(&req).await?))
}

/// POST /purchase — records a restock purchase. The product fields are
/// a snapshot; the catalog is not touched.
#[tracing::instrument(skip_all, fields(product = %form.product_name))]
pub async fn create_purchase<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    axum::Form(form): axum::Form<PurchaseForm>,
) -> Result<(StatusCode, Json<Purchase>), ApiError> {
    let purchase = state
        .purchases
        .create(NewPurchaseInput {
            owner: form.owner,
            phone: form.phone,
            address: form.address,
            product_name: form.product_name,
            product_price: form.product_price,
            product_category: form.product_category,
            product_quantity: form.product_quantity,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// POST /update_purchase_status/{id} — advances a purchase's status.
pub async fn update_purchase_status<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    axum::Form(form): axum::Form<StatusForm>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .purchases
        .update_status(PurchaseId::new(id), &form.status)
        .await?;
    Ok(Json(StatusResponse { status: "updated" }))
}

/// POST /delete_purchase/{id} — removes a ledger entry.
pub async fn delete_purchase<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.purchases.delete(PurchaseId::new(id)).await?;
    Ok(Json(StatusResponse { status: "deleted" }))
}

/// GET /export — streams a CSV attachment of products, orders, or
/// purchases, optionally bounded by a start date.
#[tracing::instrument(skip(_session, state))]
pub async fn export_csv<S: Store>(
    _session: StaffSession,
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state
        .export
        .export_csv(&query.data_type, query.start_date.as_deref())
        .await?;
    metrics::counter!("exports_total", "data_type" => query.data_type).increment(1);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"data.csv\"",
            ),
        ],
        bytes,
    ))
}
