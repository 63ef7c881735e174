// src/state.rs
use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    config::AppConfig,
    errors::SparrowResult,
    models::{DRIVERS_COLLECTION, RIDES_COLLECTION},
    push::{FcmPushGateway, MockPushGateway, PushGateway},
    services::{DriverDefaults, ExpirySweeper, RideAnnouncer},
    store::{FirebaseRecordStore, MemoryRecordStore, RecordStore},
    triggers::{Dispatcher, RIDES_AUTO_EXPIRE, TriggerKind},
};

/// Clients shared by every trigger handler. Built once by the entry point.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub gateway: Arc<dyn PushGateway>,
    pub clock: Arc<dyn Clock>,
    pub config: AppConfig,
}

impl AppState {
    pub async fn new(config: AppConfig) -> SparrowResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let store: Arc<dyn RecordStore> = match &config.firebase_url {
            Some(url) => Arc::new(FirebaseRecordStore::new(url, config.firebase_auth_token.as_deref())?),
            None => {
                tracing::warn!("FIREBASE_DATABASE_URL not set, using in-memory record store");
                Arc::new(MemoryRecordStore::new(clock.clone()))
            }
        };

        let gateway: Arc<dyn PushGateway> = match &config.fcm_server_key {
            Some(key) => Arc::new(FcmPushGateway::with_server_key(key.clone())),
            None => {
                tracing::warn!("FCM_SERVER_KEY not set, using mock push gateway");
                Arc::new(MockPushGateway::new())
            }
        };

        Ok(Self::with_backends(config, store, gateway, clock))
    }

    pub fn with_backends(
        config: AppConfig,
        store: Arc<dyn RecordStore>,
        gateway: Arc<dyn PushGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            gateway,
            clock,
            config,
        }
    }

    /// Wires each handler to the trigger that activates it.
    pub fn dispatcher(&self) -> Dispatcher {
        let sweeper = ExpirySweeper::new(
            self.store.clone(),
            self.clock.clone(),
            self.config.ride_expiry_minutes,
        );
        let announcer = RideAnnouncer::new(self.store.clone(), self.gateway.clone());
        let defaults = DriverDefaults::new(self.store.clone());

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register(TriggerKind::Schedule(RIDES_AUTO_EXPIRE.to_string()), Arc::new(sweeper))
            .register(TriggerKind::RecordCreated(RIDES_COLLECTION.to_string()), Arc::new(announcer))
            .register(TriggerKind::RecordCreated(DRIVERS_COLLECTION.to_string()), Arc::new(defaults));
        dispatcher
    }
}
