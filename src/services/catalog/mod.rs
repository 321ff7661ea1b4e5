/// External movie catalog abstraction
///
/// The catalog owns every descriptive movie record; this service only asks
/// for records by id and for discovery pages. Every call may fail (timeout,
/// not found, throttling) and callers decide how much of that to absorb.
use crate::{
    error::AppResult,
    models::{DiscoverQuery, EnrichedMovie},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Fetch the full record of one movie
    async fn movie_details(&self, movie_id: &str) -> AppResult<EnrichedMovie>;

    /// Fetch one page of the catalog's discovery listing
    ///
    /// A `None` genre must be left out of the outbound query entirely.
    async fn discover(&self, query: &DiscoverQuery) -> AppResult<Vec<EnrichedMovie>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
