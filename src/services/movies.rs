use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        EnrichedMovie, MovieId, MovieReactionRequest, MovieTally, Polarity, SimilarUser, UserId,
    },
    services::{
        catalog::MovieCatalog,
        discovery::Discovery,
        enrichment::Enricher,
        ranking,
        similarity::{recommendation_count, SimilarityEngine},
    },
    store::ReactionStore,
};

/// Tunables of the movie service
#[derive(Debug, Clone)]
pub struct MovieServiceSettings {
    pub catalog_concurrency: usize,
    /// Upper bound for one catalog lookup, retries included
    pub lookup_timeout: Duration,
    pub discover_max_page: u32,
    pub nearest_neighbors: usize,
    /// Maximum length of the best/worst/most-liked lists
    pub ranking_limit: usize,
}

impl Default for MovieServiceSettings {
    fn default() -> Self {
        Self {
            catalog_concurrency: 8,
            lookup_timeout: Duration::from_secs(5),
            discover_max_page: 100,
            nearest_neighbors: 5,
            ranking_limit: 50,
        }
    }
}

impl MovieServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        let attempts = config.catalog_max_retries + 1;
        Self {
            catalog_concurrency: config.catalog_concurrency,
            lookup_timeout: config.catalog_timeout() * attempts + Duration::from_secs(1),
            discover_max_page: config.discover_max_page,
            nearest_neighbors: config.nearest_neighbors,
            ranking_limit: config.ranking_limit,
        }
    }
}

/// Reactions, rankings, recommendations and catalog lookups behind one API
///
/// Read paths produce ordered movie ids from the store and hand them to the
/// enricher, which drops ids the catalog cannot resolve.
pub struct MovieService {
    store: Arc<dyn ReactionStore>,
    catalog: Arc<dyn MovieCatalog>,
    enricher: Enricher,
    discovery: Discovery,
    similarity: SimilarityEngine,
    ranking_limit: usize,
}

/// Rejects blank identifiers, returning the trimmed value
fn require_id<'a>(kind: &str, value: &'a str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} cannot be empty", kind)));
    }
    Ok(trimmed)
}

impl MovieService {
    pub fn new(
        store: Arc<dyn ReactionStore>,
        catalog: Arc<dyn MovieCatalog>,
        settings: MovieServiceSettings,
    ) -> Self {
        Self {
            enricher: Enricher::new(
                catalog.clone(),
                settings.catalog_concurrency,
                settings.lookup_timeout,
            ),
            discovery: Discovery::new(
                catalog.clone(),
                settings.discover_max_page,
                settings.lookup_timeout,
            ),
            similarity: SimilarityEngine::new(store.clone(), settings.nearest_neighbors),
            ranking_limit: settings.ranking_limit.max(1),
            store,
            catalog,
        }
    }

    async fn react(
        &self,
        request: &MovieReactionRequest,
        polarity: Polarity,
        set: bool,
    ) -> AppResult<()> {
        let user_id = require_id("userId", &request.user_id)?;
        let movie_id = require_id("movieId", &request.movie_id)?;

        let changed = if set {
            self.store.set_reaction(user_id, movie_id, polarity).await?
        } else {
            self.store.clear_reaction(user_id, movie_id, polarity).await?
        };

        info!(
            user_id = %user_id,
            movie_id = %movie_id,
            reaction = %polarity,
            set,
            changed,
            store = self.store.name(),
            "Reaction recorded"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn like_movie(&self, request: &MovieReactionRequest) -> AppResult<()> {
        self.react(request, Polarity::Like, true).await
    }

    #[instrument(skip(self))]
    pub async fn unlike_movie(&self, request: &MovieReactionRequest) -> AppResult<()> {
        self.react(request, Polarity::Like, false).await
    }

    #[instrument(skip(self))]
    pub async fn dislike_movie(&self, request: &MovieReactionRequest) -> AppResult<()> {
        self.react(request, Polarity::Dislike, true).await
    }

    #[instrument(skip(self))]
    pub async fn undislike_movie(&self, request: &MovieReactionRequest) -> AppResult<()> {
        self.react(request, Polarity::Dislike, false).await
    }

    /// Recommended movie ids; a missing or non-positive count means 10
    #[instrument(skip(self))]
    pub async fn recommend_ids(
        &self,
        user_id: &str,
        number_of_recs: Option<i64>,
    ) -> AppResult<Vec<MovieId>> {
        let user_id = require_id("userId", user_id)?;
        self.similarity
            .recommend_for(user_id, recommendation_count(number_of_recs))
            .await
    }

    #[instrument(skip(self))]
    pub async fn recommend_movies(
        &self,
        user_id: &str,
        number_of_recs: Option<i64>,
    ) -> AppResult<Vec<EnrichedMovie>> {
        let movie_ids = self.recommend_ids(user_id, number_of_recs).await?;
        Ok(self.enricher.resolve(&movie_ids).await)
    }

    #[instrument(skip(self))]
    pub async fn similar_users_scored(&self, user_id: &str) -> AppResult<Vec<SimilarUser>> {
        let user_id = require_id("userId", user_id)?;
        self.similarity.most_similar_users(user_id).await
    }

    pub async fn similar_users(&self, user_id: &str) -> AppResult<Vec<UserId>> {
        Ok(self
            .similar_users_scored(user_id)
            .await?
            .into_iter()
            .map(|neighbour| neighbour.user_id)
            .collect())
    }

    async fn ranked(
        &self,
        rank: fn(&[MovieTally]) -> Vec<MovieId>,
    ) -> AppResult<Vec<EnrichedMovie>> {
        let tallies = self.store.tallies().await?;
        let movie_ids: Vec<MovieId> = rank(&tallies)
            .into_iter()
            .take(self.ranking_limit)
            .collect();
        Ok(self.enricher.resolve(&movie_ids).await)
    }

    #[instrument(skip(self))]
    pub async fn best_rated_movies(&self) -> AppResult<Vec<EnrichedMovie>> {
        self.ranked(ranking::best_rated).await
    }

    #[instrument(skip(self))]
    pub async fn worst_rated_movies(&self) -> AppResult<Vec<EnrichedMovie>> {
        self.ranked(ranking::worst_rated).await
    }

    #[instrument(skip(self))]
    pub async fn most_liked_movies(&self) -> AppResult<Vec<EnrichedMovie>> {
        self.ranked(ranking::most_liked).await
    }

    #[instrument(skip(self))]
    pub async fn movie_likers(&self, movie_id: &str) -> AppResult<Vec<UserId>> {
        let movie_id = require_id("movieId", movie_id)?;
        Ok(self.store.liked_by(movie_id).await?.into_iter().collect())
    }

    #[instrument(skip(self))]
    pub async fn liked_movie_count(&self, movie_id: &str) -> AppResult<u64> {
        let movie_id = require_id("movieId", movie_id)?;
        self.store.liked_count(movie_id).await
    }

    #[instrument(skip(self))]
    pub async fn disliked_movie_count(&self, movie_id: &str) -> AppResult<u64> {
        let movie_id = require_id("movieId", movie_id)?;
        self.store.disliked_count(movie_id).await
    }

    #[instrument(skip(self))]
    pub async fn liked_movies(&self, user_id: &str) -> AppResult<Vec<EnrichedMovie>> {
        let user_id = require_id("userId", user_id)?;
        let movie_ids: Vec<MovieId> = self
            .store
            .all_liked_for(user_id)
            .await?
            .into_iter()
            .collect();
        Ok(self.enricher.resolve(&movie_ids).await)
    }

    #[instrument(skip(self))]
    pub async fn disliked_movies(&self, user_id: &str) -> AppResult<Vec<EnrichedMovie>> {
        let user_id = require_id("userId", user_id)?;
        let movie_ids: Vec<MovieId> = self
            .store
            .all_disliked_for(user_id)
            .await?
            .into_iter()
            .collect();
        Ok(self.enricher.resolve(&movie_ids).await)
    }

    #[instrument(skip(self))]
    pub async fn watched_movies(&self, user_id: &str) -> AppResult<Vec<EnrichedMovie>> {
        let user_id = require_id("userId", user_id)?;
        let movie_ids: Vec<MovieId> = self
            .store
            .all_watched_for(user_id)
            .await?
            .into_iter()
            .collect();
        Ok(self.enricher.resolve(&movie_ids).await)
    }

    /// Single catalog lookup; unlike batch reads, failures reach the caller
    #[instrument(skip(self))]
    pub async fn movie_detail(&self, movie_id: &str) -> AppResult<EnrichedMovie> {
        let movie_id = require_id("movieId", movie_id)?;
        self.catalog.movie_details(movie_id).await
    }

    #[instrument(skip(self))]
    pub async fn random_movies(
        &self,
        genre: Option<&str>,
        page: Option<u32>,
    ) -> Vec<EnrichedMovie> {
        self.discovery.sample(genre, page).await
    }
}
