use crate::domain::money::{Amount, Currency};
use crate::domain::ports::{
    GatewayRefund, GatewayStatus, IntentMetadata, PaymentGateway, PaymentIntent,
};
use crate::domain::transaction::PaymentMethod;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use tracing::{info, warn};

/// How the simulated provider answers confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewayMode {
    #[default]
    Approve,
    Decline,
    /// Every call fails as if the provider were unreachable.
    Offline,
}

const CARD_PREFIX: &str = "pi_";
const COD_PREFIX: &str = "cod_";
const REFUND_PREFIX: &str = "re_";

/// Deterministic stand-in for the payment provider.
///
/// Keeps no state: intent ids are derived from the order id, so intents opened by an
/// earlier process can still be confirmed and refunded. Cash-on-delivery intents get
/// a `cod_` prefix and are never refundable through the gateway; everything else gets
/// a `pi_` prefix.
#[derive(Debug, Default)]
pub struct SimulatedGateway {
    mode: GatewayMode,
}

impl SimulatedGateway {
    pub fn new(mode: GatewayMode) -> Self {
        Self { mode }
    }

    fn ensure_online(&self) -> Result<()> {
        if self.mode == GatewayMode::Offline {
            warn!("payment gateway unreachable");
            return Err(LedgerError::Dependency(
                "Payment gateway unavailable".to_string(),
            ));
        }
        Ok(())
    }

    /// What a confirmation of `intent_id` resolves to in the current mode.
    fn verdict(&self, intent_id: &str) -> Result<GatewayStatus> {
        if !intent_id.starts_with(CARD_PREFIX) && !intent_id.starts_with(COD_PREFIX) {
            return Err(LedgerError::Dependency(
                "Unknown payment intent".to_string(),
            ));
        }
        Ok(match self.mode {
            GatewayMode::Decline => GatewayStatus::Failed,
            _ => GatewayStatus::Succeeded,
        })
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn create_intent(
        &self,
        amount: Amount,
        currency: Currency,
        method: PaymentMethod,
        metadata: &IntentMetadata,
    ) -> Result<PaymentIntent> {
        self.ensure_online()?;
        let prefix = if method.is_gateway_backed() {
            CARD_PREFIX
        } else {
            COD_PREFIX
        };
        let intent_id = format!("{}{}", prefix, metadata.order_id.simple());
        let status = GatewayStatus::RequiresConfirmation;

        info!(
            intent_id = %intent_id,
            order_id = %metadata.order_id,
            amount = %amount,
            currency = %currency,
            "payment intent created"
        );
        Ok(PaymentIntent { intent_id, status })
    }

    async fn confirm(&self, intent_id: &str) -> Result<GatewayStatus> {
        self.ensure_online()?;
        self.verdict(intent_id)
    }

    async fn refund(&self, intent_id: &str, amount: Option<Amount>) -> Result<GatewayRefund> {
        self.ensure_online()?;
        if intent_id.starts_with(COD_PREFIX) {
            return Err(LedgerError::Dependency(
                "COD refunds must be processed manually".to_string(),
            ));
        }
        if self.verdict(intent_id)? != GatewayStatus::Succeeded {
            return Err(LedgerError::Dependency(
                "Payment has not been captured".to_string(),
            ));
        }

        let refund_id = intent_id.replacen(CARD_PREFIX, REFUND_PREFIX, 1);
        info!(refund_id = %refund_id, intent_id, amount = ?amount, "refund issued");
        Ok(GatewayRefund {
            refund_id,
            status: GatewayStatus::Succeeded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn metadata() -> IntentMetadata {
        IntentMetadata {
            order_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_card_intent_lifecycle() {
        let gateway = SimulatedGateway::default();
        let amount = Amount::new(dec!(122.50)).unwrap();
        let intent = gateway
            .create_intent(amount, Currency::Aed, PaymentMethod::Card, &metadata())
            .await
            .unwrap();
        assert!(intent.intent_id.starts_with("pi_"));
        assert_eq!(intent.status, GatewayStatus::RequiresConfirmation);

        let status = gateway.confirm(&intent.intent_id).await.unwrap();
        assert_eq!(status, GatewayStatus::Succeeded);

        let refund = gateway.refund(&intent.intent_id, None).await.unwrap();
        assert!(refund.refund_id.starts_with("re_"));
    }

    #[tokio::test]
    async fn test_intents_survive_a_new_gateway() {
        let meta = metadata();
        let amount = Amount::new(dec!(60.00)).unwrap();
        let intent = SimulatedGateway::default()
            .create_intent(amount, Currency::Aed, PaymentMethod::Wallet, &meta)
            .await
            .unwrap();
        assert_eq!(intent.intent_id, format!("pi_{}", meta.order_id.simple()));

        let restarted = SimulatedGateway::default();
        assert_eq!(
            restarted.confirm(&intent.intent_id).await.unwrap(),
            GatewayStatus::Succeeded
        );
        let refund = restarted.refund(&intent.intent_id, Some(amount)).await.unwrap();
        assert_eq!(refund.refund_id, format!("re_{}", meta.order_id.simple()));

        let unknown = restarted.confirm("ch_123").await;
        assert!(matches!(unknown, Err(LedgerError::Dependency(_))));
    }

    #[tokio::test]
    async fn test_cod_cannot_be_refunded() {
        let gateway = SimulatedGateway::default();
        let intent = gateway
            .create_intent(Amount::ZERO, Currency::Aed, PaymentMethod::Cod, &metadata())
            .await
            .unwrap();
        assert!(intent.intent_id.starts_with("cod_"));
        gateway.confirm(&intent.intent_id).await.unwrap();

        let result = gateway.refund(&intent.intent_id, None).await;
        assert!(matches!(result, Err(LedgerError::Dependency(_))));
    }

    #[tokio::test]
    async fn test_decline_and_offline_modes() {
        let declining = SimulatedGateway::new(GatewayMode::Decline);
        let intent = declining
            .create_intent(Amount::ZERO, Currency::Aed, PaymentMethod::Card, &metadata())
            .await
            .unwrap();
        assert_eq!(
            declining.confirm(&intent.intent_id).await.unwrap(),
            GatewayStatus::Failed
        );
        assert!(matches!(
            declining.refund(&intent.intent_id, None).await,
            Err(LedgerError::Dependency(_))
        ));

        let offline = SimulatedGateway::new(GatewayMode::Offline);
        let result = offline
            .create_intent(Amount::ZERO, Currency::Aed, PaymentMethod::Card, &metadata())
            .await;
        assert!(matches!(result, Err(LedgerError::Dependency(_))));
    }
}
