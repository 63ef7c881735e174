pub mod batch;
pub mod clock;
pub mod config;
pub mod errors;
pub mod models;
pub mod push;
pub mod services;
pub mod state;
pub mod store;
pub mod triggers;

// Re-export commonly used types
pub use errors::{SparrowError, SparrowResult};
pub use state::AppState;
