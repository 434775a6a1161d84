use crate::domain::ports::{
    CarrierShipment, ShipmentRequest, ShippingCarrier, TrackingEvent, TrackingReport,
};
use crate::domain::shipment::ShipmentStatus;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::info;

const LABEL_BASE_URL: &str = "https://labels.example.ae";

/// Deterministic stand-in for the courier integration.
///
/// Tracking numbers look like `VUE1A2B3C4D5E6F` and are derived from the order id, so
/// they stay unique across restarts. Every parcel is due two days after it is booked.
#[derive(Debug, Default)]
pub struct SimulatedCarrier;

impl SimulatedCarrier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ShippingCarrier for SimulatedCarrier {
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<CarrierShipment> {
        let order_ref = request.order_id.simple().to_string().to_uppercase();
        let tracking_number = format!("VUE{}", &order_ref[..12]);
        info!(
            order_id = %request.order_id,
            carrier = %request.carrier,
            tracking_number = %tracking_number,
            "shipment booked"
        );
        Ok(CarrierShipment {
            label_url: Some(format!("{}/{}.pdf", LABEL_BASE_URL, tracking_number)),
            tracking_number,
            status: ShipmentStatus::LabelCreated,
            estimated_delivery: Some(Utc::now() + Duration::days(2)),
        })
    }

    async fn track(&self, tracking_number: &str) -> Result<TrackingReport> {
        if tracking_number.trim().is_empty() {
            return Err(LedgerError::Dependency(
                "Tracking number is required".to_string(),
            ));
        }

        let now = Utc::now();
        let events = vec![
            TrackingEvent {
                status: ShipmentStatus::PickedUp,
                description: "Package picked up from seller".to_string(),
                location: "Dubai, UAE".to_string(),
                timestamp: now - Duration::hours(24),
            },
            TrackingEvent {
                status: ShipmentStatus::InTransit,
                description: "Package in transit".to_string(),
                location: "Abu Dhabi Hub".to_string(),
                timestamp: now - Duration::hours(12),
            },
        ];
        Ok(TrackingReport {
            tracking_number: tracking_number.to_string(),
            status: ShipmentStatus::InTransit,
            estimated_delivery: Some(now + Duration::days(1)),
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Amount, Currency};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_tracking_numbers_follow_the_order() {
        let request = ShipmentRequest {
            order_id: Uuid::new_v4(),
            carrier: "Aramex".to_string(),
            cost: Amount::ZERO,
            currency: Currency::Aed,
        };
        let first = SimulatedCarrier::new()
            .create_shipment(&request)
            .await
            .unwrap();
        let restarted = SimulatedCarrier::new()
            .create_shipment(&request)
            .await
            .unwrap();
        let other = SimulatedCarrier::new()
            .create_shipment(&ShipmentRequest {
                order_id: Uuid::new_v4(),
                ..request.clone()
            })
            .await
            .unwrap();

        assert!(first.tracking_number.starts_with("VUE"));
        assert_eq!(first.tracking_number.len(), 15);
        assert_eq!(first.tracking_number, restarted.tracking_number);
        assert_ne!(first.tracking_number, other.tracking_number);
        assert!(
            first
                .label_url
                .as_deref()
                .unwrap()
                .contains(&first.tracking_number)
        );
    }

    #[tokio::test]
    async fn test_track_reports_events() {
        let report = SimulatedCarrier::new().track("VUE1A2B3C4D5E6F").await.unwrap();
        assert_eq!(report.events.len(), 2);
        assert_eq!(report.status, ShipmentStatus::InTransit);
        assert!(SimulatedCarrier::new().track(" ").await.is_err());
    }
}
