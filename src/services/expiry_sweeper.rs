// src/services/expiry_sweeper.rs
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    batch::settle_all,
    clock::Clock,
    errors::SparrowResult,
    models::{RIDES_COLLECTION, RideRequest, ride::fields},
    store::{FieldUpdates, FieldValue, Filter, RecordStore},
    triggers::{TriggerEvent, TriggerHandler},
};

pub const DEFAULT_EXPIRY_MINUTES: f64 = 5.0;

/// What one sweep did, by ride id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub expired: Vec<String>,
    pub live: Vec<String>,
    pub failed: Vec<String>,
}

/// Marks unresolved rides as expired once they outlive the grace window.
///
/// Safe to run repeatedly: an expired ride no longer matches the
/// unresolved filter, and a ride whose update failed is picked up again on
/// the next tick.
pub struct ExpirySweeper {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    expire_after_minutes: f64,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, expire_after_minutes: f64) -> Self {
        Self {
            store,
            clock,
            expire_after_minutes,
        }
    }

    /// No driver, no passenger cancellation, no expiry yet.
    pub fn unresolved_filters() -> Vec<Filter> {
        vec![
            Filter::is_null(fields::AUTO_EXPIRED_TIMESTAMP),
            Filter::is_null(fields::CANCELLED_BY_PASSENGER_TIMESTAMP),
            Filter::is_null(fields::DRIVER_ID),
        ]
    }

    fn expiry_update() -> FieldUpdates {
        let mut update = FieldUpdates::new();
        update.insert(fields::AUTO_EXPIRED_TIMESTAMP.to_string(), FieldValue::ServerTimestamp);
        update
    }

    /// Never fails: errors are logged and left for the next tick.
    pub async fn sweep(&self) -> SweepReport {
        match self.try_sweep().await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(error = %err, "Ride expiry sweep failed");
                SweepReport::default()
            }
        }
    }

    async fn try_sweep(&self) -> SparrowResult<SweepReport> {
        let now = self.clock.now();
        let documents = self
            .store
            .query(RIDES_COLLECTION, &Self::unresolved_filters())
            .await?;

        let mut report = SweepReport::default();
        let mut stale = Vec::new();

        for document in documents {
            let ride = match document.decode::<RideRequest>() {
                Ok(ride) => RideRequest { id: document.id, ..ride },
                Err(err) => {
                    tracing::warn!(ride_id = %document.id, error = %err, "Skipping undecodable ride");
                    report.failed.push(document.id);
                    continue;
                }
            };
            // A store that cannot filter on nulls may hand back resolved rides
            if !ride.is_unresolved() {
                tracing::debug!(ride_id = %ride.id, "Ride is already resolved");
                continue;
            }

            let age_minutes = ride.age_minutes(now);
            if age_minutes > self.expire_after_minutes {
                tracing::info!(ride_id = %ride.id, age_minutes, "Ride is now expired");
                stale.push(ride.id);
            } else {
                tracing::debug!(ride_id = %ride.id, age_minutes, "Ride is still within its grace window");
                report.live.push(ride.id);
            }
        }

        let store = &self.store;
        let outcome = settle_all(stale.into_iter().map(|ride_id| {
            let key = ride_id.clone();
            let update = async move {
                store
                    .update(RIDES_COLLECTION, &ride_id, Self::expiry_update())
                    .await
            };
            (key, update)
        }))
        .await;

        for (ride_id, err) in outcome.failed {
            tracing::error!(ride_id = %ride_id, error = %err, "Failed to expire ride");
            report.failed.push(ride_id);
        }
        report.expired = outcome.succeeded.into_iter().map(|(ride_id, _)| ride_id).collect();

        tracing::info!(
            expired = report.expired.len(),
            live = report.live.len(),
            failed = report.failed.len(),
            "Ride expiry sweep finished"
        );
        Ok(report)
    }
}

#[async_trait]
impl TriggerHandler for ExpirySweeper {
    fn name(&self) -> &'static str {
        "expiry_sweeper"
    }

    async fn handle(&self, _event: &TriggerEvent) -> SparrowResult<()> {
        self.sweep().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        store::{Document, MemoryRecordStore},
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::{Value, json};

    /// Returns the whole collection whatever the filters say.
    struct UnfilteredStore(Arc<MemoryRecordStore>);

    #[async_trait]
    impl RecordStore for UnfilteredStore {
        async fn query(&self, collection: &str, _filters: &[Filter]) -> SparrowResult<Vec<Document>> {
            self.0.query(collection, &[]).await
        }

        async fn update(&self, collection: &str, id: &str, fields: FieldUpdates) -> SparrowResult<()> {
            self.0.update(collection, id, fields).await
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn setup() -> (Arc<MemoryRecordStore>, Arc<FixedClock>, ExpirySweeper) {
        let clock = Arc::new(FixedClock::new(start()));
        let store = Arc::new(MemoryRecordStore::new(clock.clone()));
        let sweeper = ExpirySweeper::new(store.clone(), clock.clone(), DEFAULT_EXPIRY_MINUTES);
        (store, clock, sweeper)
    }

    fn ride_created(at: DateTime<Utc>) -> Value {
        json!({
            "creationTimestamp": at.timestamp_millis(),
            "startPlace": "A",
            "endPlace": "B",
            "driverId": null,
            "cancelledByPassengerTimestamp": null,
            "autoExpiredTimestamp": null,
        })
    }

    #[tokio::test]
    async fn test_young_rides_are_left_alone() {
        let (store, clock, sweeper) = setup();
        store.put("rides", "r1", ride_created(start())).await.unwrap();

        // Exactly at the threshold is still within the window
        clock.advance(Duration::minutes(5));
        let report = sweeper.sweep().await;

        assert_eq!(report.live, vec!["r1".to_string()]);
        assert!(report.expired.is_empty());
        let ride = store.get("rides", "r1").await.unwrap();
        assert_eq!(ride.get("autoExpiredTimestamp"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_stale_rides_are_expired_once() {
        let (store, clock, sweeper) = setup();
        store.put("rides", "r1", ride_created(start())).await.unwrap();

        clock.advance(Duration::minutes(6));
        let expired_at = clock.now().timestamp_millis();
        let report = sweeper.sweep().await;
        assert_eq!(report.expired, vec!["r1".to_string()]);

        clock.advance(Duration::minutes(1));
        let report = sweeper.sweep().await;
        assert_eq!(report, SweepReport::default());

        let ride = store.get("rides", "r1").await.unwrap();
        assert_eq!(ride.get("autoExpiredTimestamp"), Some(&json!(expired_at)));
        assert_eq!(ride.get("driverId"), Some(&Value::Null));
        assert_eq!(ride.get("cancelledByPassengerTimestamp"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_resolved_rides_are_not_selected() {
        let (store, clock, sweeper) = setup();
        let mut matched = ride_created(start());
        matched["driverId"] = json!("drv-1");
        let mut cancelled = ride_created(start());
        cancelled["cancelledByPassengerTimestamp"] = json!(start().timestamp_millis());
        store.put("rides", "matched", matched).await.unwrap();
        store.put("rides", "cancelled", cancelled).await.unwrap();

        clock.advance(Duration::minutes(30));
        let report = sweeper.sweep().await;

        assert!(report.expired.is_empty());
        for id in ["matched", "cancelled"] {
            let ride = store.get("rides", id).await.unwrap();
            assert_eq!(ride.get("autoExpiredTimestamp"), Some(&Value::Null));
        }
    }

    #[tokio::test]
    async fn test_resolved_rides_are_skipped_when_the_store_ignores_filters() {
        let (store, clock, _sweeper) = setup();
        let sweeper = ExpirySweeper::new(
            Arc::new(UnfilteredStore(store.clone())),
            clock.clone(),
            DEFAULT_EXPIRY_MINUTES,
        );
        let mut matched = ride_created(start());
        matched["driverId"] = json!("drv-1");
        let mut expired = ride_created(start());
        expired["autoExpiredTimestamp"] = json!(start().timestamp_millis());
        store.put("rides", "matched", matched).await.unwrap();
        store.put("rides", "expired", expired).await.unwrap();
        store.put("rides", "r1", ride_created(start())).await.unwrap();

        clock.advance(Duration::minutes(30));
        let report = sweeper.sweep().await;

        assert_eq!(report.expired, vec!["r1".to_string()]);
        assert!(report.live.is_empty());
        assert!(report.failed.is_empty());
        let ride = store.get("rides", "matched").await.unwrap();
        assert_eq!(ride.get("autoExpiredTimestamp"), Some(&Value::Null));
        let ride = store.get("rides", "expired").await.unwrap();
        assert_eq!(ride.get("autoExpiredTimestamp"), Some(&json!(start().timestamp_millis())));
    }

    #[tokio::test]
    async fn test_one_failed_update_does_not_block_others() {
        let (store, clock, sweeper) = setup();
        for id in ["r1", "r2", "r3"] {
            store.put("rides", id, ride_created(start())).await.unwrap();
        }
        store.fail_updates_of("rides", "r2").await;

        clock.advance(Duration::minutes(10));
        let report = sweeper.sweep().await;
        assert_eq!(report.expired, vec!["r1".to_string(), "r3".to_string()]);
        assert_eq!(report.failed, vec!["r2".to_string()]);

        // Still unresolved, so the next tick retries it
        store.clear_faults().await;
        let report = sweeper.sweep().await;
        assert_eq!(report.expired, vec!["r2".to_string()]);
    }

    #[tokio::test]
    async fn test_query_failure_is_swallowed() {
        let (store, _clock, sweeper) = setup();
        store.fail_queries_on("rides").await;

        let report = sweeper.sweep().await;
        assert_eq!(report, SweepReport::default());
        assert!(sweeper.handle(&TriggerEvent::tick("ridesAutoExpire")).await.is_ok());
    }

    #[tokio::test]
    async fn test_undecodable_ride_is_skipped() {
        let (store, clock, sweeper) = setup();
        store.put("rides", "broken", json!({ "startPlace": "A" })).await.unwrap();
        store.put("rides", "r1", ride_created(start())).await.unwrap();

        clock.advance(Duration::minutes(6));
        let report = sweeper.sweep().await;
        assert_eq!(report.failed, vec!["broken".to_string()]);
        assert_eq!(report.expired, vec!["r1".to_string()]);
    }
}
