//! # selkit
//!
//! Selection broker for a compositor: clipboard, primary selection and
//! drag-and-drop ownership, offers and transfers, with clipboard
//! persistence. The protocol machinery lives in the `sel-*` crates; this
//! crate wires logging and configuration and hosts the headless probe.

pub mod bootstrap;
pub mod probe;

pub use probe::{run_probe, ProbeOptions, ProbeReport};
