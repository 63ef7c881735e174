// src/models/ride.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const RIDES_COLLECTION: &str = "rides";

/// Field names as they appear in stored ride documents.
pub mod fields {
    pub const CREATION_TIMESTAMP: &str = "creationTimestamp";
    pub const DRIVER_ID: &str = "driverId";
    pub const CANCELLED_BY_PASSENGER_TIMESTAMP: &str = "cancelledByPassengerTimestamp";
    pub const AUTO_EXPIRED_TIMESTAMP: &str = "autoExpiredTimestamp";
}

/// A passenger's request for transport.
///
/// A ride is unresolved while `driver_id`, `cancelled_by_passenger_timestamp`
/// and `auto_expired_timestamp` are all `None`. Once any of them is set the
/// ride stays resolved along that path.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RideRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub creation_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub start_place: String,
    #[serde(default)]
    pub end_place: String,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub cancelled_by_passenger_timestamp: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub auto_expired_timestamp: Option<DateTime<Utc>>,
}

/// The part of a new ride that drivers are told about.
///
/// Decoded straight from the creation payload, so a ride with a missing or
/// oddly typed timestamp is still announced.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RideAnnouncement {
    #[serde(skip)]
    pub id: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub start_place: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub end_place: String,
}

impl RideAnnouncement {
    pub fn new(id: impl Into<String>, start_place: impl Into<String>, end_place: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start_place: start_place.into(),
            end_place: end_place.into(),
        }
    }
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RideRequest {
    pub fn new(
        id: impl Into<String>,
        creation_timestamp: DateTime<Utc>,
        start_place: impl Into<String>,
        end_place: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            creation_timestamp,
            start_place: start_place.into(),
            end_place: end_place.into(),
            driver_id: None,
            cancelled_by_passenger_timestamp: None,
            auto_expired_timestamp: None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.driver_id.is_none()
            && self.cancelled_by_passenger_timestamp.is_none()
            && self.auto_expired_timestamp.is_none()
    }

    /// Fractional minutes elapsed between creation and `now`.
    pub fn age_minutes(&self, now: DateTime<Utc>) -> f64 {
        (now - self.creation_timestamp).num_milliseconds() as f64 / 60_000.0
    }
}
