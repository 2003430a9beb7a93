use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use super::{GatewayError, IntentRequest, PaymentGateway, PaymentIntent};

/// Deterministic in-process gateway for development and tests. Issues
/// intents without any network I/O and counts how many were created.
pub struct SandboxGateway {
    mode: SandboxMode,
    issued: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
enum SandboxMode {
    Approve,
    Reject,
    Unavailable,
}

impl SandboxGateway {
    pub fn approving() -> Self {
        Self {
            mode: SandboxMode::Approve,
            issued: AtomicU64::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            mode: SandboxMode::Reject,
            issued: AtomicU64::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            mode: SandboxMode::Unavailable,
            issued: AtomicU64::new(0),
        }
    }

    /// Number of intents issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError> {
        if request.total <= Decimal::ZERO {
            return Err(GatewayError::Rejected(format!(
                "invalid amount {}",
                request.total
            )));
        }

        match self.mode {
            SandboxMode::Approve => {
                self.issued.fetch_add(1, Ordering::SeqCst);
                let intent_id = format!("SANDBOX-{}", Uuid::new_v4().simple());
                Ok(PaymentIntent {
                    approval_url: format!(
                        "https://sandbox.gateway.invalid/approve/{}",
                        intent_id
                    ),
                    intent_id,
                })
            }
            SandboxMode::Reject => Err(GatewayError::Rejected(
                "sandbox gateway configured to reject".to_string(),
            )),
            SandboxMode::Unavailable => Err(GatewayError::Unavailable(
                "sandbox gateway configured to be unreachable".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(total: Decimal) -> IntentRequest {
        IntentRequest {
            items: vec![],
            total,
            currency: "USD".to_string(),
            description: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn approving_mode_issues_distinct_intents() {
        let gateway = SandboxGateway::approving();
        let first = gateway.create_intent(request(dec!(10.00))).await.unwrap();
        let second = gateway.create_intent(request(dec!(10.00))).await.unwrap();
        assert_ne!(first.intent_id, second.intent_id);
        assert!(first.approval_url.contains(&first.intent_id));
        assert_eq!(gateway.issued(), 2);
    }

    #[tokio::test]
    async fn zero_total_is_rejected_in_any_mode() {
        let gateway = SandboxGateway::approving();
        let err = gateway.create_intent(request(dec!(0))).await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));
        assert_eq!(gateway.issued(), 0);
    }

    #[tokio::test]
    async fn rejecting_and_unavailable_modes_fail() {
        let err = SandboxGateway::rejecting()
            .create_intent(request(dec!(5.00)))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected(_)));

        let err = SandboxGateway::unavailable()
            .create_intent(request(dec!(5.00)))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }
}
