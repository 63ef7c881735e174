// src/push/mock.rs
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use super::{MulticastResponse, PushGateway};
use crate::{
    errors::{SparrowError, SparrowResult},
    models::NotificationMessage,
};

// Mock gateway for development and testing
#[derive(Debug, Default)]
pub struct MockPushGateway {
    sent: Mutex<Vec<NotificationMessage>>,
    undeliverable_tokens: Mutex<HashSet<String>>,
    rejected_tokens: Mutex<HashSet<String>>,
}

impl MockPushGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// The token is reported as a per-token failure; the call still succeeds.
    pub fn mark_undeliverable(&self, token: &str) {
        lock(&self.undeliverable_tokens).insert(token.to_string());
    }

    /// Any call addressed to this token fails as a whole.
    pub fn reject_calls_for(&self, token: &str) {
        lock(&self.rejected_tokens).insert(token.to_string());
    }

    pub fn sent(&self) -> Vec<NotificationMessage> {
        lock(&self.sent).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PushGateway for MockPushGateway {
    async fn send_multicast(&self, message: &NotificationMessage) -> SparrowResult<MulticastResponse> {
        if let Some(token) = message
            .tokens
            .iter()
            .find(|token| lock(&self.rejected_tokens).contains(*token))
        {
            return Err(SparrowError::FcmDelivery(format!("[MOCK] rejected call for {token}")));
        }

        tracing::info!(
            "[MOCK] Would send FCM to {} tokens: {} - {}",
            message.tokens.len(),
            message.title,
            message.body
        );

        let failed_tokens: Vec<String> = {
            let undeliverable = lock(&self.undeliverable_tokens);
            message
                .tokens
                .iter()
                .filter(|token| undeliverable.contains(*token))
                .cloned()
                .collect()
        };
        lock(&self.sent).push(message.clone());

        Ok(MulticastResponse {
            success_count: message.tokens.len() - failed_tokens.len(),
            failure_count: failed_tokens.len(),
            failed_tokens,
        })
    }
}
