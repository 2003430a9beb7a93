use async_trait::async_trait;
use rust_decimal::Decimal;

pub mod paypal;
pub mod sandbox;

pub use paypal::PaypalGateway;
pub use sandbox::SandboxGateway;

/// One line of the itemized list sent to the gateway.
#[derive(Debug, Clone)]
pub struct LineItem {
    pub title: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Payment-intent request. Amounts are already in the fixed settlement
/// currency and rounded to minor-unit precision.
#[derive(Debug, Clone)]
pub struct IntentRequest {
    pub items: Vec<LineItem>,
    pub total: Decimal,
    pub currency: String,
    pub description: String,
}

/// Provisional payment registered with the gateway, awaiting customer
/// approval out-of-band.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub approval_url: String,
}

/// Gateway failures. The detail strings are for server-side logs only and
/// must not be forwarded verbatim to the end user.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway rejected the payment request: {0}")]
    Rejected(String),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// External payment processor boundary.
///
/// Implementations perform no internal retries; retry policy belongs to the
/// orchestrator, which only ever creates one intent per order.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError>;
}
