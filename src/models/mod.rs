// src/models/mod.rs
pub mod driver;
pub mod notification;
pub mod ride;

pub use driver::{Driver, DRIVERS_COLLECTION};
pub use notification::{Locale, NotificationMessage};
pub use ride::{RideAnnouncement, RideRequest, RIDES_COLLECTION};
