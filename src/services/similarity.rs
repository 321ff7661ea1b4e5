//! Nearest-neighbour users and collaborative recommendations
//!
//! ## Algorithm
//! 1. A user's profile is their watched set (liked ∪ disliked)
//! 2. Candidate neighbours are the users who reacted to any of those movies
//! 3. Similarity is the Jaccard index of the two watched sets
//! 4. The top neighbours vote for the movies they liked, each vote weighted
//!    by their similarity; movies the user already watched are excluded
//!
//! A user without reactions has no neighbours and is served the global
//! most-liked ranking instead, restricted to movies with at least one like.
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, instrument};

use crate::{
    error::AppResult,
    models::{MovieId, MovieTally, SimilarUser, UserId},
    services::ranking,
    store::ReactionStore,
};

/// Recommendations returned when the caller gives no usable count
pub const DEFAULT_RECOMMENDATIONS: usize = 10;

/// Resolves the requested number of recommendations
///
/// Missing, zero and negative counts all fall back to
/// [`DEFAULT_RECOMMENDATIONS`].
pub fn recommendation_count(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if n > 0 => n as usize,
        _ => DEFAULT_RECOMMENDATIONS,
    }
}

/// Jaccard index |a ∩ b| / |a ∪ b|; 0 when both sets are empty
pub fn jaccard(a: &BTreeSet<MovieId>, b: &BTreeSet<MovieId>) -> f64 {
    let overlap = a.intersection(b).count();
    let union = a.len() + b.len() - overlap;
    if union == 0 {
        0.0
    } else {
        overlap as f64 / union as f64
    }
}

pub struct SimilarityEngine {
    store: Arc<dyn ReactionStore>,
    nearest_neighbors: usize,
}

impl SimilarityEngine {
    pub fn new(store: Arc<dyn ReactionStore>, nearest_neighbors: usize) -> Self {
        Self {
            store,
            nearest_neighbors: nearest_neighbors.max(1),
        }
    }

    /// Users sharing at least one watched movie, most similar first
    ///
    /// Ties are broken by ascending user id.
    #[instrument(skip(self))]
    pub async fn most_similar_users(&self, user_id: &str) -> AppResult<Vec<SimilarUser>> {
        let watched = self.store.all_watched_for(user_id).await?;
        self.neighbours(user_id, &watched).await
    }

    /// Up to `count` unwatched movies liked by the user's nearest neighbours
    #[instrument(skip(self))]
    pub async fn recommend_for(&self, user_id: &str, count: usize) -> AppResult<Vec<MovieId>> {
        let watched = self.store.all_watched_for(user_id).await?;

        if watched.is_empty() {
            let liked: Vec<MovieTally> = self
                .store
                .tallies()
                .await?
                .into_iter()
                .filter(|tally| tally.likes > 0)
                .collect();
            let popular: Vec<MovieId> = ranking::most_liked(&liked)
                .into_iter()
                .take(count)
                .collect();
            debug!(
                fallback = popular.len(),
                "No reaction history, serving most liked movies"
            );
            return Ok(popular);
        }

        let neighbours = self.neighbours(user_id, &watched).await?;
        let nearest: Vec<SimilarUser> = neighbours
            .into_iter()
            .take(self.nearest_neighbors)
            .collect();

        let liked_sets = try_join_all(
            nearest
                .iter()
                .map(|neighbour| self.store.all_liked_for(&neighbour.user_id)),
        )
        .await?;

        // movie -> (summed similarity, number of neighbours)
        let mut scores: HashMap<MovieId, (f64, usize)> = HashMap::new();
        for (neighbour, liked) in nearest.iter().zip(liked_sets) {
            for movie_id in liked.into_iter().filter(|m| !watched.contains(m)) {
                let entry = scores.entry(movie_id).or_insert((0.0, 0));
                entry.0 += neighbour.similarity;
                entry.1 += 1;
            }
        }

        let mut ranked: Vec<(MovieId, (f64, usize))> = scores.into_iter().collect();
        ranked.sort_by(|(a_id, (a_weight, a_votes)), (b_id, (b_weight, b_votes))| {
            b_weight
                .total_cmp(a_weight)
                .then_with(|| b_votes.cmp(a_votes))
                .then_with(|| a_id.cmp(b_id))
        });

        debug!(
            neighbours = nearest.len(),
            candidates = ranked.len(),
            "Recommendations scored"
        );

        Ok(ranked
            .into_iter()
            .take(count)
            .map(|(movie_id, _)| movie_id)
            .collect())
    }

    async fn neighbours(
        &self,
        user_id: &str,
        watched: &BTreeSet<MovieId>,
    ) -> AppResult<Vec<SimilarUser>> {
        if watched.is_empty() {
            return Ok(Vec::new());
        }

        let reactors = try_join_all(watched.iter().map(|movie_id| async move {
            let mut users = self.store.liked_by(movie_id).await?;
            users.extend(self.store.disliked_by(movie_id).await?);
            Ok::<_, crate::error::AppError>(users)
        }))
        .await?;

        let candidates: BTreeSet<UserId> = reactors
            .into_iter()
            .flatten()
            .filter(|candidate| candidate != user_id)
            .collect();

        let profiles = try_join_all(
            candidates
                .iter()
                .map(|candidate| self.store.all_watched_for(candidate)),
        )
        .await?;

        let mut similar: Vec<SimilarUser> = candidates
            .into_iter()
            .zip(profiles)
            .map(|(candidate, profile)| SimilarUser {
                similarity: jaccard(watched, &profile),
                user_id: candidate,
            })
            .filter(|neighbour| neighbour.similarity > 0.0)
            .collect();

        similar.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        Ok(similar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryReactionStore;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn engine(store: Arc<InMemoryReactionStore>) -> SimilarityEngine {
        SimilarityEngine::new(store, 5)
    }

    #[test]
    fn test_recommendation_count_defaults() {
        assert_eq!(recommendation_count(None), 10);
        assert_eq!(recommendation_count(Some(0)), 10);
        assert_eq!(recommendation_count(Some(-3)), 10);
        assert_eq!(recommendation_count(Some(5)), 5);
    }

    #[test]
    fn test_jaccard_is_symmetric() {
        let a = set(&["m1", "m2", "m3"]);
        let b = set(&["m2", "m3", "m4", "m5"]);
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
        assert!((jaccard(&a, &b) - 2.0 / 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_jaccard_grows_with_overlap() {
        let a = set(&["m1", "m2", "m3", "m4"]);
        let one = set(&["m1", "x1", "x2", "x3"]);
        let two = set(&["m1", "m2", "x2", "x3"]);
        assert!(jaccard(&a, &two) > jaccard(&a, &one));
        assert_eq!(jaccard(&a, &set(&[])), 0.0);
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
    }

    #[tokio::test]
    async fn test_similar_users_scenario() {
        let store = Arc::new(InMemoryReactionStore::new());
        store.like("u1", "m1").await.unwrap();
        store.like("u1", "m2").await.unwrap();
        store.like("u2", "m1").await.unwrap();

        let similar = engine(store).most_similar_users("u1").await.unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].user_id, "u2");
        assert!(similar[0].similarity > 0.0);
    }

    #[tokio::test]
    async fn test_similar_users_excludes_self_and_strangers() {
        let store = Arc::new(InMemoryReactionStore::new());
        store.like("u1", "m1").await.unwrap();
        store.dislike("u2", "m1").await.unwrap();
        store.like("u3", "m9").await.unwrap();

        let similar = engine(store).most_similar_users("u1").await.unwrap();
        let ids: Vec<&str> = similar.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u2"]);
    }

    #[tokio::test]
    async fn test_similar_users_ranked_by_overlap() {
        let store = Arc::new(InMemoryReactionStore::new());
        for movie in ["m1", "m2", "m3"] {
            store.like("u1", movie).await.unwrap();
        }
        store.like("close", "m1").await.unwrap();
        store.like("close", "m2").await.unwrap();
        store.like("far", "m1").await.unwrap();
        store.like("far", "m7").await.unwrap();
        store.like("far", "m8").await.unwrap();

        let similar = engine(store).most_similar_users("u1").await.unwrap();
        let ids: Vec<&str> = similar.iter().map(|s| s.user_id.as_str()).collect();
        assert_eq!(ids, vec!["close", "far"]);
    }

    #[tokio::test]
    async fn test_recommendations_exclude_watched() {
        let store = Arc::new(InMemoryReactionStore::new());
        store.like("u1", "m1").await.unwrap();
        store.like("u1", "m2").await.unwrap();
        store.like("u2", "m1").await.unwrap();
        store.like("u2", "m2").await.unwrap();
        store.like("u2", "m3").await.unwrap();

        let recs = engine(store).recommend_for("u1", 5).await.unwrap();
        assert_eq!(recs, vec!["m3"]);
    }

    #[tokio::test]
    async fn test_recommendations_skip_disliked_movies() {
        let store = Arc::new(InMemoryReactionStore::new());
        store.like("u1", "m1").await.unwrap();
        store.dislike("u1", "m4").await.unwrap();
        store.like("u2", "m1").await.unwrap();
        store.like("u2", "m4").await.unwrap();
        store.like("u2", "m5").await.unwrap();

        let recs = engine(store).recommend_for("u1", 5).await.unwrap();
        assert_eq!(recs, vec!["m5"]);
    }

    #[tokio::test]
    async fn test_recommendations_weighted_by_similarity() {
        let store = Arc::new(InMemoryReactionStore::new());
        store.like("u1", "m1").await.unwrap();
        store.like("u1", "m2").await.unwrap();
        // twin: identical history plus "a"
        store.like("twin", "m1").await.unwrap();
        store.like("twin", "m2").await.unwrap();
        store.like("twin", "a").await.unwrap();
        // loose: shares one movie and likes "b"
        store.like("loose", "m1").await.unwrap();
        store.like("loose", "b").await.unwrap();
        store.like("loose", "x").await.unwrap();

        let recs = engine(store).recommend_for("u1", 10).await.unwrap();
        assert_eq!(recs.first().map(String::as_str), Some("a"));
        assert!(recs.contains(&"b".to_string()));
        assert!(!recs.contains(&"m1".to_string()));
    }

    #[tokio::test]
    async fn test_recommendations_capped_at_count() {
        let store = Arc::new(InMemoryReactionStore::new());
        store.like("u1", "m0").await.unwrap();
        store.like("u2", "m0").await.unwrap();
        for i in 1..=20 {
            store.like("u2", &format!("m{:02}", i)).await.unwrap();
        }

        let recs = engine(store).recommend_for("u1", 3).await.unwrap();
        assert_eq!(recs, vec!["m01", "m02", "m03"]);
    }

    #[tokio::test]
    async fn test_cold_start_falls_back_to_most_liked() {
        let store = Arc::new(InMemoryReactionStore::new());
        store.like("u2", "m1").await.unwrap();
        store.like("u3", "m1").await.unwrap();
        store.like("u2", "m2").await.unwrap();
        store.dislike("u3", "m3").await.unwrap();

        let engine = engine(store);
        assert!(engine.most_similar_users("newcomer").await.unwrap().is_empty());

        let recs = engine.recommend_for("newcomer", 2).await.unwrap();
        assert_eq!(recs, vec!["m1", "m2"]);

        // m3 only has a dislike
        let recs = engine.recommend_for("newcomer", 10).await.unwrap();
        assert_eq!(recs, vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_cold_start_with_only_dislikes_is_empty() {
        let store = Arc::new(InMemoryReactionStore::new());
        store.dislike("u2", "m1").await.unwrap();
        store.dislike("u3", "m2").await.unwrap();

        let recs = engine(store).recommend_for("newcomer", 10).await.unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_cold_start_on_empty_store_is_empty() {
        let store = Arc::new(InMemoryReactionStore::new());
        let recs = engine(store).recommend_for("newcomer", 10).await.unwrap();
        assert!(recs.is_empty());
    }
}
