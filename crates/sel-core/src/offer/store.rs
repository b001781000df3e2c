use std::collections::HashMap;

use crate::ids::{ClientId, DeviceId, OfferId, SourceId};

use super::DataOffer;

/// Live offers, indexed by source so that source teardown can neutralize
/// every offer that still points at it.
#[derive(Debug, Default)]
pub struct OfferStore {
    offers: HashMap<OfferId, DataOffer>,
    by_source: HashMap<SourceId, Vec<OfferId>>,
}

impl OfferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, offer: DataOffer) {
        if let Some(source) = offer.source() {
            self.by_source
                .entry(source.clone())
                .or_default()
                .push(offer.id().clone());
        }
        self.offers.insert(offer.id().clone(), offer);
    }

    pub fn get(&self, id: &OfferId) -> Option<&DataOffer> {
        self.offers.get(id)
    }

    pub fn get_mut(&mut self, id: &OfferId) -> Option<&mut DataOffer> {
        self.offers.get_mut(id)
    }

    pub fn remove(&mut self, id: &OfferId) -> Option<DataOffer> {
        let offer = self.offers.remove(id)?;
        if let Some(source) = offer.source() {
            self.unindex(source, id);
        }
        Some(offer)
    }

    /// Offers still bound to `source`.
    pub fn offers_for_source(&self, source: &SourceId) -> Vec<OfferId> {
        self.by_source.get(source).cloned().unwrap_or_default()
    }

    /// Clear the source handle of every offer of `source`. Neutralized
    /// offers never re-acquire a source.
    pub fn neutralize_source(&mut self, source: &SourceId) -> usize {
        let ids = self.by_source.remove(source).unwrap_or_default();
        for id in &ids {
            if let Some(offer) = self.offers.get_mut(id) {
                offer.neutralize();
            }
        }
        ids.len()
    }

    /// Cut one offer loose from its source, leaving it neutralized.
    pub fn detach(&mut self, id: &OfferId) {
        let Some(offer) = self.offers.get_mut(id) else {
            return;
        };
        let Some(source) = offer.source().cloned() else {
            return;
        };
        offer.neutralize();
        self.unindex(&source, id);
    }

    pub fn remove_client(&mut self, client: &ClientId) -> Vec<DataOffer> {
        self.remove_where(|offer| offer.client() == client)
    }

    pub fn remove_device(&mut self, device: &DeviceId) -> Vec<DataOffer> {
        self.remove_where(|offer| offer.device() == device)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    fn remove_where(&mut self, predicate: impl Fn(&DataOffer) -> bool) -> Vec<DataOffer> {
        let ids: Vec<OfferId> = self
            .offers
            .values()
            .filter(|offer| predicate(offer))
            .map(|offer| offer.id().clone())
            .collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    fn unindex(&mut self, source: &SourceId, offer: &OfferId) {
        if let Some(ids) = self.by_source.get_mut(source) {
            ids.retain(|id| id != offer);
            if ids.is_empty() {
                self.by_source.remove(source);
            }
        }
    }
}
