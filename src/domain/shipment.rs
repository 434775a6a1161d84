use super::money::{Amount, Currency};
use super::{OrderId, ShipmentId};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    LabelCreated,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Failed,
    Returned,
}

impl ShipmentStatus {
    /// Still moving towards the buyer.
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            ShipmentStatus::Delivered | ShipmentStatus::Failed | ShipmentStatus::Returned
        )
    }
}

/// One physical fulfillment attempt for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub carrier: String,
    pub tracking_number: String,
    pub cost: Amount,
    pub currency: Currency,
    pub status: ShipmentStatus,
    pub label_url: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Carrier-side details of a parcel handed over by the seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handover {
    pub carrier: String,
    pub tracking_number: String,
    pub label_url: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl Shipment {
    /// A parcel the carrier has just collected from the seller.
    pub fn picked_up(
        order_id: OrderId,
        handover: Handover,
        cost: Amount,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if handover.tracking_number.trim().is_empty() {
            return Err(LedgerError::ValidationError(
                "Tracking number is required".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            order_id,
            carrier: handover.carrier,
            tracking_number: handover.tracking_number,
            cost,
            currency,
            status: ShipmentStatus::PickedUp,
            label_url: handover.label_url,
            estimated_delivery: handover.estimated_delivery,
            actual_delivery: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// The single mutation a shipment admits after creation.
    pub fn mark_delivered(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.status.is_active() {
            return Err(LedgerError::InvalidTransition(
                "Shipment is no longer in transit".to_string(),
            ));
        }
        self.status = ShipmentStatus::Delivered;
        self.actual_delivery = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn handover(tracking: &str) -> Handover {
        Handover {
            carrier: "Aramex".to_string(),
            tracking_number: tracking.to_string(),
            label_url: None,
            estimated_delivery: None,
        }
    }

    #[test]
    fn test_picked_up_then_delivered() {
        let now = Utc::now();
        let mut shipment = Shipment::picked_up(
            Uuid::new_v4(),
            handover("VUE1"),
            Amount::new(dec!(15.00)).unwrap(),
            Currency::Aed,
            now,
        )
        .unwrap();
        assert_eq!(shipment.status, ShipmentStatus::PickedUp);

        shipment.mark_delivered(now).unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Delivered);
        assert_eq!(shipment.actual_delivery, Some(now));
        assert!(shipment.mark_delivered(now).is_err());
    }

    #[test]
    fn test_blank_tracking_rejected() {
        let result = Shipment::picked_up(
            Uuid::new_v4(),
            handover("  "),
            Amount::ZERO,
            Currency::Aed,
            Utc::now(),
        );
        assert!(matches!(result, Err(LedgerError::ValidationError(_))));
    }
}
