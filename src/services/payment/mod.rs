pub mod mock;

use async_trait::async_trait;

use crate::models::PaymentMethod;

#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub amount: u32,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(
        &self,
        method: PaymentMethod,
        info: &str,
        amount: u32,
    ) -> anyhow::Result<PaymentReceipt>;
}
