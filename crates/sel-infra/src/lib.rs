//! # sel-infra
//!
//! Infrastructure for selkit: TOML configuration loading and headless
//! in-memory implementations of the session ports, used by the probe CLI
//! and by tests.

pub mod config;
pub mod headless;

pub use config::load_config;
pub use headless::{HeadlessSeat, InMemorySourceStreams, RecordingClientEvents, SurfaceRect};
