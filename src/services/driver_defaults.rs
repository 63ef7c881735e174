// src/services/driver_defaults.rs
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    errors::{SparrowError, SparrowResult},
    models::{DRIVERS_COLLECTION, driver::fields},
    store::{FieldUpdates, FieldValue, RecordStore},
    triggers::{TriggerEvent, TriggerHandler},
};

/// New drivers start unverified, whatever the creating client wrote.
pub struct DriverDefaults {
    store: Arc<dyn RecordStore>,
}

impl DriverDefaults {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn on_driver_created(&self, driver_id: &str) -> SparrowResult<()> {
        let mut update = FieldUpdates::new();
        update.insert(fields::IS_VERIFIED.to_string(), FieldValue::set(false));

        self.store.update(DRIVERS_COLLECTION, driver_id, update).await?;
        tracing::info!(driver_id, "Driver set as not verified");
        Ok(())
    }
}

#[async_trait]
impl TriggerHandler for DriverDefaults {
    fn name(&self) -> &'static str {
        "driver_defaults"
    }

    // Errors propagate so the trigger gets redelivered
    async fn handle(&self, event: &TriggerEvent) -> SparrowResult<()> {
        match event {
            TriggerEvent::Created { id, .. } => self.on_driver_created(id).await,
            TriggerEvent::Tick { .. } => Err(SparrowError::bad_request(
                "Driver defaults only handle creation events",
            )),
        }
    }
}
