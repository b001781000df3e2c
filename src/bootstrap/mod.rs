//! Process bootstrap: tracing and configuration discovery.

pub mod config;
pub mod tracing;

pub use config::resolve_config;
pub use tracing::init_tracing_subscriber;
