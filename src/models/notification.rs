// src/models/notification.rs
use serde::{Deserialize, Serialize};

use super::{driver::Driver, ride::RideAnnouncement};

/// Languages the ride announcement is translated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    English, // Base locale
    French,
}

impl Locale {
    /// Only the exact tag `fr` selects French; anything else falls back.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("fr") => Locale::French,
            _ => Locale::English,
        }
    }
}

/// One multicast push, addressed to every token of a single driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    pub tokens: Vec<String>,
}

impl NotificationMessage {
    pub fn new_ride(ride: &RideAnnouncement, locale: Locale, tokens: Vec<String>) -> Self {
        let (title, body) = match locale {
            Locale::English => (
                "New ride available".to_string(),
                format!("From {} to {}", ride.start_place, ride.end_place),
            ),
            Locale::French => (
                "Nouveau trajet disponible".to_string(),
                format!("De {} à {}", ride.start_place, ride.end_place),
            ),
        };

        Self { title, body, tokens }
    }

    /// `None` when the driver has nowhere to receive it.
    pub fn for_driver(ride: &RideAnnouncement, driver: &Driver) -> Option<Self> {
        if !driver.has_tokens() {
            return None;
        }
        let locale = Locale::from_tag(driver.language.as_deref());
        Some(Self::new_ride(ride, locale, driver.tokens().to_vec()))
    }
}
