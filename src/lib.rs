pub mod api;
pub mod config;
pub mod core;

// Re-export commonly used items for convenience
pub use api::{ReportError, SessionService};
pub use config::ClientConfig;
pub use core::*;
