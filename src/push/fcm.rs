// src/push/fcm.rs
use async_trait::async_trait;
use ::fcm::{Client, MessageBuilder, NotificationBuilder};

use super::{MulticastResponse, PushGateway};
use crate::{
    errors::{SparrowError, SparrowResult},
    models::NotificationMessage,
};

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub fcm_server_key: String,
}

impl FcmConfig {
    pub fn new(fcm_server_key: impl Into<String>) -> Self {
        Self {
            fcm_server_key: fcm_server_key.into(),
        }
    }
}

pub struct FcmPushGateway {
    config: FcmConfig,
    client: Client,
}

impl FcmPushGateway {
    pub fn new(config: FcmConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn with_server_key(server_key: impl Into<String>) -> Self {
        Self::new(FcmConfig::new(server_key))
    }
}

#[async_trait]
impl PushGateway for FcmPushGateway {
    async fn send_multicast(&self, message: &NotificationMessage) -> SparrowResult<MulticastResponse> {
        if message.tokens.is_empty() {
            return Err(SparrowError::FcmInvalidToken("Empty token list".to_string()));
        }

        tracing::debug!(tokens = message.tokens.len(), "Sending FCM multicast");

        let mut notification = NotificationBuilder::new();
        notification.title(&message.title);
        notification.body(&message.body);

        let mut builder = MessageBuilder::new_multi(&self.config.fcm_server_key, &message.tokens);
        builder.notification(notification.finalize());

        let response = self
            .client
            .send(builder.finalize())
            .await
            .map_err(|e| SparrowError::FcmDelivery(format!("{e:?}")))?;

        if let Some(reason) = response.error {
            tracing::error!("FCM request failed: {:?}", reason);
            return Err(SparrowError::FcmDelivery(format!("{reason:?}")));
        }

        // Per-token results come back in the same order as registration_ids
        let failed_tokens: Vec<String> = response
            .results
            .unwrap_or_default()
            .iter()
            .zip(&message.tokens)
            .filter(|(result, _)| result.error.is_some())
            .map(|(_, token)| token.clone())
            .collect();

        Ok(MulticastResponse {
            success_count: response.success.unwrap_or(0) as usize,
            failure_count: response.failure.map_or(failed_tokens.len(), |n| n as usize),
            failed_tokens,
        })
    }
}
