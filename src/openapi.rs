use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "storefront-api",
        description = "Checkout orchestration, order capture, and inventory reconciliation"
    ),
    paths(
        crate::handlers::checkout::initiate_checkout,
        crate::handlers::checkout::capture_payment,
        crate::handlers::orders::get_order,
        crate::handlers::orders::list_orders_for_user,
    ),
    components(schemas(
        crate::handlers::checkout::InitiateCheckoutBody,
        crate::handlers::checkout::CheckoutItemBody,
        crate::handlers::checkout::CheckoutInitiatedResponse,
        crate::handlers::checkout::CaptureBody,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderItemResponse,
    )),
    tags(
        (name = "Checkout", description = "Order/payment lifecycle"),
        (name = "Orders", description = "Order lookups")
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
