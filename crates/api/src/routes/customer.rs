//! Customer portal: registration, login, browsing, and order placement.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use common::{CustomerId, Page, PageRequest, ProductId};
use domain::PlaceOrderInput;
use serde::{Deserialize, Serialize};
use store::{OrderWithItems, PlacedOrder, Product, Store};
use uuid::Uuid;

use crate::AppState;
use crate::auth::{CustomerSession, Identity};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct OrderForm {
    pub phone: String,
    pub address: String,
    pub product_id: i64,
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: Uuid,
}

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: CustomerId,
    pub username: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

// -- Handlers --

/// POST /customer_register — creates an account. The password is
/// stored only as a salted hash.
#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    axum::Form(form): axum::Form<CredentialsForm>,
) -> Result<(StatusCode, Json<CustomerResponse>), ApiError> {
    let customer = state
        .accounts
        .register(&form.username, &form.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CustomerResponse {
            id: customer.id,
            username: customer.username,
        }),
    ))
}

/// POST /customer_login — exchanges credentials for a session token.
#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    axum::Form(form): axum::Form<CredentialsForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let customer = match state
        .accounts
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(customer) => customer,
        Err(err) => {
            metrics::counter!("logins_rejected_total", "portal" => "customer").increment(1);
            return Err(err.into());
        }
    };

    let token = state.sessions.issue(Identity::Customer {
        id: customer.id,
        username: customer.username,
    });
    metrics::counter!("logins_total", "portal" => "customer").increment(1);
    Ok(Json(TokenResponse { token }))
}

/// GET /customer_logout — revokes the customer session token.
pub async fn logout<S: Store>(
    session: CustomerSession,
    State(state): State<Arc<AppState<S>>>,
) -> Json<StatusResponse> {
    state.sessions.revoke(&session.token);
    Json(StatusResponse { status: "logged out" })
}

/// GET /customer_dashboard — who the session belongs to.
pub async fn dashboard<S: Store>(
    session: CustomerSession,
    State(_state): State<Arc<AppState<S>>>,
) -> Json<CustomerResponse> {
    Json(CustomerResponse {
        id: session.customer_id,
        username: session.username,
    })
}

/// GET /product_view — the catalog as customers browse it.
pub async fn product_view<S: Store>(
    _session: CustomerSession,
    State(state): State<Arc<AppState<S>>>,
    Query(req): Query<PageRequest>,
) -> Result<Json<Page<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products(&req).await?))
}

/// GET /ordering — same catalog view, from the order form.
pub async fn ordering_page<S: Store>(
    _session: CustomerSession,
    State(state): State<Arc<AppState<S>>>,
    Query(req): Query<PageRequest>,
) -> Result<Json<Page<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products(&req).await?))
}

/// POST /ordering — places an order for one product.
///
/// The customer name on the order comes from the session, not the
/// form, so orders always land under the account that placed them.
#[tracing::instrument(skip_all, fields(username = %session.username, product_id = form.product_id))]
pub async fn place_order<S: Store>(
    session: CustomerSession,
    State(state): State<Arc<AppState<S>>>,
    axum::Form(form): axum::Form<OrderForm>,
) -> Result<(StatusCode, Json<PlacedOrder>), ApiError> {
    let placed = state
        .orders
        .place_order(PlaceOrderInput {
            customer: session.username,
            phone: form.phone,
            address: form.address,
            product_id: ProductId::new(form.product_id),
            quantity: form.quantity,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// GET /order_view — the session owner's orders under the usual
/// pagination.
pub async fn order_view<S: Store>(
    session: CustomerSession,
    State(state): State<Arc<AppState<S>>>,
    Query(req): Query<PageRequest>,
) -> Result<Json<Page<OrderWithItems>>, ApiError> {
    Ok(Json(
        state
            .orders
            .list_for_customer(&session.username, &req)
            .await?,
    ))
}
