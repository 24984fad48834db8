use std::sync::Arc;

use crate::services::{Catalogue, Recommender};
use crate::store::{FeatureStore, MetadataStore};

/// Shared application state.
///
/// Both stores are loaded once at startup and never mutate afterwards, so
/// state is plain `Arc`s with lock-free concurrent reads.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub catalogue: Arc<Catalogue>,
}

impl AppState {
    /// Wires the services over freshly loaded stores
    pub fn new(features: FeatureStore, metadata: MetadataStore) -> Self {
        let features = Arc::new(features);
        let metadata = Arc::new(metadata);
        Self {
            recommender: Arc::new(Recommender::new(features, Arc::clone(&metadata))),
            catalogue: Arc::new(Catalogue::new(metadata)),
        }
    }
}
