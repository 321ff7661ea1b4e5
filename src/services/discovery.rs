use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::{
    models::{DiscoverQuery, EnrichedMovie},
    services::catalog::MovieCatalog,
};

/// Random movie sampling from the catalog, independent of reactions
#[derive(Clone)]
pub struct Discovery {
    catalog: Arc<dyn MovieCatalog>,
    max_page: u32,
    timeout: Duration,
}

impl Discovery {
    pub fn new(catalog: Arc<dyn MovieCatalog>, max_page: u32, timeout: Duration) -> Self {
        Self {
            catalog,
            max_page: max_page.max(1),
            timeout,
        }
    }

    /// Builds the outbound query
    ///
    /// A blank genre is dropped; a missing or zero page is drawn uniformly
    /// from `1..=max_page`.
    pub fn query_for(&self, genre: Option<&str>, page: Option<u32>) -> DiscoverQuery {
        let genre = genre
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string);
        let page = page
            .filter(|p| *p > 0)
            .unwrap_or_else(|| rand::rng().random_range(1..=self.max_page));

        DiscoverQuery { genre, page }
    }

    /// Fetches one discovery page; catalog failures yield an empty list
    pub async fn sample(&self, genre: Option<&str>, page: Option<u32>) -> Vec<EnrichedMovie> {
        let query = self.query_for(genre, page);

        match tokio::time::timeout(self.timeout, self.catalog.discover(&query)).await {
            Ok(Ok(movies)) => movies,
            Ok(Err(e)) => {
                tracing::warn!(
                    page = query.page,
                    genre = ?query.genre,
                    error = %e,
                    provider = self.catalog.name(),
                    "Discovery failed"
                );
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    page = query.page,
                    genre = ?query.genre,
                    provider = self.catalog.name(),
                    "Discovery timed out"
                );
                Vec::new()
            }
        }
    }
}
