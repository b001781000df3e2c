use std::collections::HashMap;

use crate::ids::{ClientId, SourceId};

use super::DataSource;

/// Live sources by handle. A removed handle resolves to "not found" forever.
#[derive(Debug, Default)]
pub struct SourceStore {
    sources: HashMap<SourceId, DataSource>,
}

impl SourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: DataSource) {
        self.sources.insert(source.id().clone(), source);
    }

    pub fn get(&self, id: &SourceId) -> Option<&DataSource> {
        self.sources.get(id)
    }

    pub fn get_mut(&mut self, id: &SourceId) -> Option<&mut DataSource> {
        self.sources.get_mut(id)
    }

    pub fn remove(&mut self, id: &SourceId) -> Option<DataSource> {
        self.sources.remove(id)
    }

    pub fn contains(&self, id: &SourceId) -> bool {
        self.sources.contains_key(id)
    }

    /// Ids of every source owned by `client`.
    pub fn owned_by(&self, client: &ClientId) -> Vec<SourceId> {
        self.sources
            .values()
            .filter(|source| source.client() == Some(client))
            .map(|source| source.id().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
