use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::{
    models::{EnrichedMovie, MovieId},
    services::catalog::MovieCatalog,
};

/// Resolves movie ids into catalog records, best effort
///
/// Lookups run concurrently, at most `concurrency` at a time, each bounded by
/// `lookup_timeout`. An id whose lookup fails or times out is logged and
/// dropped; the batch itself never fails. Output keeps the input order.
#[derive(Clone)]
pub struct Enricher {
    catalog: Arc<dyn MovieCatalog>,
    concurrency: usize,
    lookup_timeout: Duration,
}

impl Enricher {
    pub fn new(catalog: Arc<dyn MovieCatalog>, concurrency: usize, lookup_timeout: Duration) -> Self {
        Self {
            catalog,
            concurrency: concurrency.max(1),
            lookup_timeout,
        }
    }

    pub async fn resolve(&self, movie_ids: &[MovieId]) -> Vec<EnrichedMovie> {
        if movie_ids.is_empty() {
            return Vec::new();
        }

        // owned ids keep the stream's futures free of borrowed items
        let resolved: Vec<EnrichedMovie> = stream::iter(movie_ids.to_vec())
            .map(|movie_id| async move { self.resolve_one(&movie_id).await })
            .buffered(self.concurrency)
            .filter_map(|movie| async move { movie })
            .collect()
            .await;

        if resolved.len() < movie_ids.len() {
            tracing::warn!(
                requested = movie_ids.len(),
                resolved = resolved.len(),
                provider = self.catalog.name(),
                "Partial enrichment"
            );
        }

        resolved
    }

    async fn resolve_one(&self, movie_id: &str) -> Option<EnrichedMovie> {
        match tokio::time::timeout(self.lookup_timeout, self.catalog.movie_details(movie_id)).await {
            Ok(Ok(movie)) => Some(movie),
            Ok(Err(e)) => {
                tracing::warn!(
                    movie_id = %movie_id,
                    error = %e,
                    provider = self.catalog.name(),
                    "Movie lookup failed, skipping"
                );
                None
            }
            Err(_) => {
                tracing::warn!(
                    movie_id = %movie_id,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    provider = self.catalog.name(),
                    "Movie lookup timed out, skipping"
                );
                None
            }
        }
    }
}
