use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::{PaymentGateway, PaymentReceipt};
use crate::models::PaymentMethod;

/// Stand-in gateway: waits a fixed delay, then approves unconditionally.
/// Dropping the future mid-delay abandons the charge with no side effects.
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(
        &self,
        method: PaymentMethod,
        _info: &str,
        amount: u32,
    ) -> anyhow::Result<PaymentReceipt> {
        tokio::time::sleep(self.delay).await;

        let receipt = PaymentReceipt {
            transaction_id: Uuid::new_v4().to_string(),
            amount,
        };
        tracing::info!(
            method = method.as_str(),
            amount,
            transaction_id = %receipt.transaction_id,
            "simulated payment approved"
        );
        Ok(receipt)
    }
}
