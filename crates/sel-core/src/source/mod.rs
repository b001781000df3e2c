//! Data sources: the owner side of a selection or a drag.

mod data_source;
mod store;

pub use data_source::{DataSource, SourceUsage};
pub use store::SourceStore;
