// src/models/driver.rs
use serde::{Deserialize, Serialize};

pub const DRIVERS_COLLECTION: &str = "drivers";

pub mod fields {
    pub const IS_VERIFIED: &str = "isVerified";
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub fcm_tokens: Option<Vec<String>>, // Push delivery tokens, one per device
    #[serde(default)]
    pub language: Option<String>,
}

impl Driver {
    pub fn tokens(&self) -> &[String] {
        self.fcm_tokens.as_deref().unwrap_or_default()
    }

    pub fn has_tokens(&self) -> bool {
        !self.tokens().is_empty()
    }
}
