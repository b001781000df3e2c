//! Data offers: the per-client proxy of a source.

mod data_offer;
pub mod negotiation;
mod store;

pub use data_offer::DataOffer;
pub use store::OfferStore;
