mod client;
mod types;

pub use client::{StoreClient, StoreFetchError};
pub use types::{Hit, HitsEnvelope, SearchResponse};
