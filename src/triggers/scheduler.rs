// src/triggers/scheduler.rs
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{Dispatcher, TriggerEvent};

/// Fires `schedule` every `period` until the returned task is aborted.
///
/// Missed ticks are skipped rather than bunched, so a slow sweep never
/// triggers a burst of catch-up runs.
pub fn spawn_ticker(dispatcher: Arc<Dispatcher>, schedule: &'static str, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!("Schedule {} running every {:?}", schedule, period);
        loop {
            interval.tick().await;
            if let Err(err) = dispatcher.dispatch(TriggerEvent::tick(schedule)).await {
                tracing::error!(schedule, error = %err, "Scheduled trigger failed");
            }
        }
    })
}
