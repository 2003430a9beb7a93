use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::handlers::common::{created_response, success_response, validate_input};
use crate::services::checkout::{CheckoutItem, InitiateCheckoutRequest};
use crate::services::orders::OrderResponse;
use crate::{ApiResponse, AppState, errors::ServiceError};

/// Creates the router for checkout endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkout/initiate", post(initiate_checkout))
        .route("/checkout/capture", post(capture_payment))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InitiateCheckoutBody {
    pub user_id: Uuid,
    pub cart_id: Uuid,
    #[validate(length(min = 1, message = "cart must contain at least one item"))]
    pub cart_items: Vec<CheckoutItemBody>,
    /// Opaque shipping/billing payload, stored with the order as-is
    #[schema(value_type = Object)]
    pub address_info: serde_json::Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutItemBody {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutInitiatedResponse {
    pub success: bool,
    pub approval_url: String,
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CaptureBody {
    pub order_id: Uuid,
    pub payment_id: String,
    pub payer_id: String,
}

/// Price the submitted cart, register a payment intent, and create a
/// pending order.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/initiate",
    request_body = InitiateCheckoutBody,
    responses(
        (status = 201, description = "Pending order created; redirect the customer to the approval URL", body = CheckoutInitiatedResponse),
        (status = 400, description = "Malformed or empty cart"),
        (status = 500, description = "Payment gateway rejected or unreachable; nothing was persisted")
    ),
    tag = "Checkout"
)]
pub async fn initiate_checkout(
    State(state): State<AppState>,
    Json(body): Json<InitiateCheckoutBody>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&body)?;

    let initiated = state
        .services
        .checkout
        .initiate(InitiateCheckoutRequest {
            user_id: body.user_id,
            cart_id: body.cart_id,
            items: body
                .cart_items
                .into_iter()
                .map(|item| CheckoutItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            address_info: body.address_info,
        })
        .await?;

    Ok(created_response(CheckoutInitiatedResponse {
        success: true,
        approval_url: initiated.approval_url,
        order_id: initiated.order_id,
    }))
}

/// Finalize a paid order. Safe to call more than once: a settled order is
/// returned unchanged without re-applying side effects.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/capture",
    request_body = CaptureBody,
    responses(
        (status = 200, description = "Order confirmed (or already settled)", body = OrderResponse),
        (status = 404, description = "Unknown order")
    ),
    tag = "Checkout"
)]
pub async fn capture_payment(
    State(state): State<AppState>,
    Json(body): Json<CaptureBody>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .checkout
        .capture(body.order_id, body.payment_id, body.payer_id)
        .await?;

    Ok(success_response(ApiResponse::success(order)))
}
