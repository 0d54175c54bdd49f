//! Order-saga ingress endpoints: `create_order` and `cancel_order`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use bus::MessageBus;
use common::{Email, LineItem, Money, PaymentMethod, ProductId};
use saga::SagaCoordinator;
use saga::coordinator::StartOrderRequest;
use serde::{Deserialize, Serialize};
use store::SagaStore;

use crate::auth::{AuthError, Principal, TokenValidator, bearer_token};
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, B> {
    pub coordinator: Arc<SagaCoordinator<S, B>>,
    pub token_validator: Arc<dyn TokenValidator>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_email: String,
    pub vendor_email: String,
    pub delivery_address: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Accepted for wire compatibility but ignored: a saga always starts in
    /// `Pending` regardless of what the caller sends here.
    #[serde(default)]
    pub status: Option<String>,
    pub payment_method: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderQuery {
    pub order_id: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct AckResponse {
    pub status: &'static str,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub message: String,
}

async fn authenticate(headers: &HeaderMap, validator: &dyn TokenValidator) -> Result<Principal, ApiError> {
    let header = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = bearer_token(header)?;
    Ok(validator.authenticate(token).await?)
}

/// POST /orders/create_order — validates and mints a new saga.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create_order<S, B>(
    State(state): State<Arc<AppState<S, B>>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<AckResponse>, ApiError>
where
    S: SagaStore + 'static,
    B: MessageBus + 'static,
{
    authenticate(&headers, state.token_validator.as_ref()).await?;

    let user_email = Email::parse(req.user_email).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let vendor_email = Email::parse(req.vendor_email).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let payment_method = PaymentMethod::parse(&req.payment_method)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid payment method: {}", req.payment_method)))?;
    let items = req
        .items
        .into_iter()
        .map(|i| LineItem::new(ProductId::new(i.product_id), i.quantity, Money::from_decimal(i.unit_price)))
        .collect();

    let start = StartOrderRequest {
        user_email,
        vendor_email,
        delivery_address: req.delivery_address,
        description: req.description,
        payment_method,
        items,
    };

    let tid = state.coordinator.start_order(start).await?;

    Ok(Json(AckResponse {
        status: "success",
        message: "Order fulfillment started".to_string(),
        data: Some(serde_json::json!({ "transaction_id": tid.to_string() })),
    }))
}

/// POST /orders/cancel_order?order_id=<id> — admin-gated cancellation.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel_order<S, B>(
    State(state): State<Arc<AppState<S, B>>>,
    headers: HeaderMap,
    Query(query): Query<CancelOrderQuery>,
) -> Result<Json<CancelResponse>, ApiError>
where
    S: SagaStore + 'static,
    B: MessageBus + 'static,
{
    let principal = authenticate(&headers, state.token_validator.as_ref()).await?;
    if principal != Principal::Admin {
        return Err(AuthError::Rejected.into());
    }

    state.coordinator.cancel_order(&query.order_id).await?;

    Ok(Json(CancelResponse {
        message: "Order cancellation started".to_string(),
    }))
}
