use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::handlers::common::success_response;
use crate::services::orders::OrderResponse;
use crate::{ApiResponse, AppState, errors::ServiceError};

/// Creates the router for order read endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders/:id", get(get_order))
        .route("/orders/user/:user_id", get(list_orders_for_user))
}

/// Fetch a single order with its item snapshot.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Unknown order")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(success_response(ApiResponse::success(order)))
}

/// All orders for a customer, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/orders/user/{user_id}",
    params(("user_id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Orders for the customer", body = [OrderResponse])
    ),
    tag = "Orders"
)]
pub async fn list_orders_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.list_orders_for_user(user_id).await?;
    Ok(success_response(ApiResponse::success(orders)))
}
