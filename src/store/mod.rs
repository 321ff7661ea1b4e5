//! Reaction storage
//!
//! A reaction is a (user, movie, polarity) triple with at most one polarity
//! active per pair. Backends keep four set indices (movies per user and users
//! per movie, for each polarity) plus per-movie counters, and must update all
//! of them for one pair as a single atomic step.
use std::collections::BTreeSet;

use crate::{
    error::AppResult,
    models::{MovieId, MovieTally, Polarity, UserId},
};

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryReactionStore;
pub use redis_store::RedisReactionStore;

/// Backend holding reactions and their derived indices
///
/// Mutations report whether they changed anything, so callers can tell a
/// repeated like from a new one. Identifiers are stored as given.
#[async_trait::async_trait]
pub trait ReactionStore: Send + Sync {
    /// Sets `polarity` for the pair, clearing the opposite one if present
    async fn set_reaction(&self, user_id: &str, movie_id: &str, polarity: Polarity)
        -> AppResult<bool>;

    /// Clears `polarity` for the pair; no-op when it is not the active one
    async fn clear_reaction(
        &self,
        user_id: &str,
        movie_id: &str,
        polarity: Polarity,
    ) -> AppResult<bool>;

    /// Movies the user currently holds `polarity` on
    async fn movies_for(&self, user_id: &str, polarity: Polarity) -> AppResult<BTreeSet<MovieId>>;

    /// Users currently holding `polarity` on the movie
    async fn users_for(&self, movie_id: &str, polarity: Polarity) -> AppResult<BTreeSet<UserId>>;

    /// Number of users currently holding `polarity` on the movie
    async fn count_for(&self, movie_id: &str, polarity: Polarity) -> AppResult<u64>;

    /// Counters of every movie with at least one current reaction
    async fn tallies(&self) -> AppResult<Vec<MovieTally>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;

    async fn like(&self, user_id: &str, movie_id: &str) -> AppResult<bool> {
        self.set_reaction(user_id, movie_id, Polarity::Like).await
    }

    async fn unlike(&self, user_id: &str, movie_id: &str) -> AppResult<bool> {
        self.clear_reaction(user_id, movie_id, Polarity::Like).await
    }

    async fn dislike(&self, user_id: &str, movie_id: &str) -> AppResult<bool> {
        self.set_reaction(user_id, movie_id, Polarity::Dislike).await
    }

    async fn undislike(&self, user_id: &str, movie_id: &str) -> AppResult<bool> {
        self.clear_reaction(user_id, movie_id, Polarity::Dislike).await
    }

    async fn liked_by(&self, movie_id: &str) -> AppResult<BTreeSet<UserId>> {
        self.users_for(movie_id, Polarity::Like).await
    }

    async fn disliked_by(&self, movie_id: &str) -> AppResult<BTreeSet<UserId>> {
        self.users_for(movie_id, Polarity::Dislike).await
    }

    async fn liked_count(&self, movie_id: &str) -> AppResult<u64> {
        self.count_for(movie_id, Polarity::Like).await
    }

    async fn disliked_count(&self, movie_id: &str) -> AppResult<u64> {
        self.count_for(movie_id, Polarity::Dislike).await
    }

    async fn all_liked_for(&self, user_id: &str) -> AppResult<BTreeSet<MovieId>> {
        self.movies_for(user_id, Polarity::Like).await
    }

    async fn all_disliked_for(&self, user_id: &str) -> AppResult<BTreeSet<MovieId>> {
        self.movies_for(user_id, Polarity::Dislike).await
    }

    /// Liked and disliked movies together
    async fn all_watched_for(&self, user_id: &str) -> AppResult<BTreeSet<MovieId>> {
        let mut watched = self.movies_for(user_id, Polarity::Like).await?;
        watched.extend(self.movies_for(user_id, Polarity::Dislike).await?);
        Ok(watched)
    }
}
