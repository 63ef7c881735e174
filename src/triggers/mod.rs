// src/triggers/mod.rs
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{SparrowError, SparrowResult};

pub mod http;
pub mod scheduler;

/// Schedule that drives the ride expiry sweep.
pub const RIDES_AUTO_EXPIRE: &str = "ridesAutoExpire";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Schedule(String),
    RecordCreated(String), // collection name
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerKind::Schedule(name) => write!(f, "schedule:{}", name),
            TriggerKind::RecordCreated(collection) => write!(f, "created:{}", collection),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    Tick {
        schedule: String,
    },
    Created {
        collection: String,
        id: String,
        data: Value,
    },
}

impl TriggerEvent {
    pub fn tick(schedule: impl Into<String>) -> Self {
        TriggerEvent::Tick {
            schedule: schedule.into(),
        }
    }

    pub fn created(collection: impl Into<String>, id: impl Into<String>, data: Value) -> Self {
        TriggerEvent::Created {
            collection: collection.into(),
            id: id.into(),
            data,
        }
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            TriggerEvent::Tick { schedule } => TriggerKind::Schedule(schedule.clone()),
            TriggerEvent::Created { collection, .. } => {
                TriggerKind::RecordCreated(collection.clone())
            }
        }
    }
}

#[async_trait]
pub trait TriggerHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &TriggerEvent) -> SparrowResult<()>;
}

/// Routes trigger events to the handlers registered for their kind.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<TriggerKind, Vec<Arc<dyn TriggerHandler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: TriggerKind, handler: Arc<dyn TriggerHandler>) -> &mut Self {
        tracing::debug!("Registering {} for {}", handler.name(), kind);
        self.handlers.entry(kind).or_default().push(handler);
        self
    }

    /// Runs every handler for the event's kind and returns the first error, if any.
    pub async fn dispatch(&self, event: TriggerEvent) -> SparrowResult<()> {
        let kind = event.kind();
        let handlers = self
            .handlers
            .get(&kind)
            .ok_or_else(|| SparrowError::UnhandledTrigger(kind.to_string()))?;

        let mut first_error = None;
        for handler in handlers {
            if let Err(err) = handler.handle(&event).await {
                tracing::error!(handler = handler.name(), trigger = %kind, error = %err, "Trigger handler failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
