// src/services/mod.rs
pub mod driver_defaults;
pub mod expiry_sweeper;
pub mod ride_announcer;

pub use driver_defaults::DriverDefaults;
pub use expiry_sweeper::{ExpirySweeper, SweepReport};
pub use ride_announcer::{AnnounceReport, RideAnnouncer};
