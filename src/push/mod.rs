// src/push/mod.rs
use async_trait::async_trait;

use crate::{errors::SparrowResult, models::NotificationMessage};

pub mod fcm;
pub mod mock;

pub use self::fcm::{FcmConfig, FcmPushGateway};
pub use mock::MockPushGateway;

/// Result of one multicast send. Per-token failures land here instead of
/// failing the whole call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MulticastResponse {
    pub success_count: usize,
    pub failure_count: usize,
    pub failed_tokens: Vec<String>,
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send_multicast(&self, message: &NotificationMessage) -> SparrowResult<MulticastResponse>;
}
