// src/services/ride_announcer.rs
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    batch::settle_all,
    errors::{SparrowError, SparrowResult},
    models::{DRIVERS_COLLECTION, Driver, NotificationMessage, RideAnnouncement, driver::fields},
    push::PushGateway,
    store::{Filter, RecordStore},
    triggers::{TriggerEvent, TriggerHandler},
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Dispatch {
    Skipped,
    Sent { success_count: usize },
}

/// What one announcement did, by driver id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnounceReport {
    pub notified: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
    pub delivered: usize, // Tokens the gateway reported as delivered
}

/// Tells every verified driver about a newly created ride. Best effort only.
pub struct RideAnnouncer {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn PushGateway>,
}

impl RideAnnouncer {
    pub fn new(store: Arc<dyn RecordStore>, gateway: Arc<dyn PushGateway>) -> Self {
        Self { store, gateway }
    }

    /// Never fails: errors are logged and the ride is not announced again.
    pub async fn announce(&self, ride: &RideAnnouncement) -> AnnounceReport {
        match self.try_announce(ride).await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(ride_id = %ride.id, error = %err, "Ride announcement failed");
                AnnounceReport::default()
            }
        }
    }

    async fn try_announce(&self, ride: &RideAnnouncement) -> SparrowResult<AnnounceReport> {
        let documents = self
            .store
            .query(DRIVERS_COLLECTION, &[Filter::eq(fields::IS_VERIFIED, true)])
            .await?;

        let mut report = AnnounceReport::default();
        let mut drivers = Vec::with_capacity(documents.len());
        for document in documents {
            match document.decode::<Driver>() {
                Ok(driver) => drivers.push(Driver { id: document.id, ..driver }),
                Err(err) => {
                    tracing::warn!(driver_id = %document.id, error = %err, "Skipping undecodable driver");
                    report.failed.push(document.id);
                }
            }
        }

        let outcome = settle_all(drivers.into_iter().map(|driver| {
            let key = driver.id.clone();
            (key, async move { self.dispatch_to(&driver, ride).await })
        }))
        .await;

        for (driver_id, dispatch) in outcome.succeeded {
            match dispatch {
                Dispatch::Skipped => report.skipped.push(driver_id),
                Dispatch::Sent { success_count } => {
                    report.delivered += success_count;
                    report.notified.push(driver_id);
                }
            }
        }
        for (driver_id, err) in outcome.failed {
            tracing::error!(driver_id = %driver_id, error = %err, "Failed to notify driver");
            report.failed.push(driver_id);
        }

        tracing::info!(
            ride_id = %ride.id,
            notified = report.notified.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Ride announcement finished"
        );
        Ok(report)
    }

    async fn dispatch_to(&self, driver: &Driver, ride: &RideAnnouncement) -> SparrowResult<Dispatch> {
        if !driver.is_verified {
            return Ok(Dispatch::Skipped);
        }
        let Some(message) = NotificationMessage::for_driver(ride, driver) else {
            tracing::debug!(driver_id = %driver.id, "Driver has no FCM tokens");
            return Ok(Dispatch::Skipped);
        };

        let response = self.gateway.send_multicast(&message).await?;
        tracing::info!(
            driver_id = %driver.id,
            success_count = response.success_count,
            "{} messages were sent successfully",
            response.success_count
        );
        if !response.failed_tokens.is_empty() {
            tracing::warn!(driver_id = %driver.id, failed_tokens = ?response.failed_tokens, "Some tokens were not delivered");
        }

        Ok(Dispatch::Sent {
            success_count: response.success_count,
        })
    }
}

#[async_trait]
impl TriggerHandler for RideAnnouncer {
    fn name(&self) -> &'static str {
        "ride_announcer"
    }

    async fn handle(&self, event: &TriggerEvent) -> SparrowResult<()> {
        let TriggerEvent::Created { id, data, .. } = event else {
            return Err(SparrowError::bad_request("Ride announcer only handles creation events"));
        };

        // Only the places are read; the rest of the ride is not needed to announce it
        match serde_json::from_value::<RideAnnouncement>(data.clone()) {
            Ok(ride) => {
                self.announce(&RideAnnouncement { id: id.clone(), ..ride }).await;
            }
            Err(err) => {
                tracing::error!(ride_id = %id, error = %err, "Created ride could not be decoded");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::SystemClock, push::MockPushGateway, store::MemoryRecordStore};
    use serde_json::json;

    fn setup() -> (Arc<MemoryRecordStore>, Arc<MockPushGateway>, RideAnnouncer) {
        let store = Arc::new(MemoryRecordStore::new(Arc::new(SystemClock)));
        let gateway = Arc::new(MockPushGateway::new());
        let announcer = RideAnnouncer::new(store.clone(), gateway.clone());
        (store, gateway, announcer)
    }

    fn ride() -> RideAnnouncement {
        RideAnnouncement::new("r1", "A", "B")
    }

    #[tokio::test]
    async fn test_only_verified_drivers_with_tokens_are_notified() {
        let (store, gateway, announcer) = setup();
        store
            .put("drivers", "d1", json!({ "isVerified": true, "fcmTokens": ["t1", "t2"] }))
            .await
            .unwrap();
        store
            .put("drivers", "d2", json!({ "isVerified": false, "fcmTokens": ["t3"] }))
            .await
            .unwrap();
        store.put("drivers", "d3", json!({ "fcmTokens": ["t4"] })).await.unwrap();
        store
            .put("drivers", "d4", json!({ "isVerified": true, "fcmTokens": [] }))
            .await
            .unwrap();
        store.put("drivers", "d5", json!({ "isVerified": true })).await.unwrap();

        let report = announcer.announce(&ride()).await;

        assert_eq!(report.notified, vec!["d1".to_string()]);
        assert_eq!(report.skipped, vec!["d4".to_string(), "d5".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(report.delivered, 2);

        let sent = gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].tokens, vec!["t1".to_string(), "t2".to_string()]);
    }

    #[tokio::test]
    async fn test_message_follows_driver_language() {
        let (store, gateway, announcer) = setup();
        store
            .put("drivers", "fr", json!({ "isVerified": true, "fcmTokens": ["t1"], "language": "fr" }))
            .await
            .unwrap();
        store
            .put("drivers", "xx", json!({ "isVerified": true, "fcmTokens": ["t2"] }))
            .await
            .unwrap();

        announcer.announce(&ride()).await;

        let sent = gateway.sent();
        let french = sent.iter().find(|m| m.tokens == vec!["t1".to_string()]).unwrap();
        assert_eq!(french.title, "Nouveau trajet disponible");
        assert_eq!(french.body, "De A à B");
        let default = sent.iter().find(|m| m.tokens == vec!["t2".to_string()]).unwrap();
        assert_eq!(default.title, "New ride available");
        assert_eq!(default.body, "From A to B");
    }

    #[tokio::test]
    async fn test_one_failed_send_does_not_stop_the_rest() {
        let (store, gateway, announcer) = setup();
        store
            .put("drivers", "d1", json!({ "isVerified": true, "fcmTokens": ["bad"] }))
            .await
            .unwrap();
        store
            .put("drivers", "d2", json!({ "isVerified": true, "fcmTokens": ["good", "stale"] }))
            .await
            .unwrap();
        gateway.reject_calls_for("bad");
        gateway.mark_undeliverable("stale");

        let report = announcer.announce(&ride()).await;
        assert_eq!(report.failed, vec!["d1".to_string()]);
        assert_eq!(report.notified, vec!["d2".to_string()]);
        assert_eq!(report.delivered, 1);
    }

    #[tokio::test]
    async fn test_query_failure_is_swallowed() {
        let (store, gateway, announcer) = setup();
        store.fail_queries_on("drivers").await;

        let report = announcer.announce(&ride()).await;
        assert_eq!(report, AnnounceReport::default());
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_ride_without_usable_timestamp_is_still_announced() {
        let (store, gateway, announcer) = setup();
        store
            .put("drivers", "d1", json!({ "isVerified": true, "fcmTokens": ["t1"] }))
            .await
            .unwrap();

        for data in [
            json!({ "startPlace": "A", "endPlace": "B" }),
            json!({ "creationTimestamp": 1714564800000.0, "startPlace": "A", "endPlace": "B" }),
        ] {
            let event = TriggerEvent::created("rides", "r1", data);
            assert!(announcer.handle(&event).await.is_ok());
        }

        let sent = gateway.sent();
        assert_eq!(sent.len(), 2);
        for message in sent {
            assert_eq!(message.body, "From A to B");
            assert_eq!(message.tokens, vec!["t1".to_string()]);
        }
    }

    #[tokio::test]
    async fn test_handle_acknowledges_undecodable_ride() {
        let (_store, gateway, announcer) = setup();
        let event = TriggerEvent::created("rides", "r1", json!(["not", "a", "ride"]));

        assert!(announcer.handle(&event).await.is_ok());
        assert!(gateway.sent().is_empty());
    }
}
