//! Reaction store kept in process memory
//!
//! Both indices are sharded `DashMap`s, so writes to unrelated users and
//! movies proceed in parallel. A mutation holds the user's entry and then the
//! movie's entry, always in that order, and changes both before releasing
//! either; readers only ever take a single entry.
use std::collections::{BTreeSet, HashMap};

use dashmap::DashMap;

use crate::{
    error::AppResult,
    models::{MovieId, MovieTally, Polarity, UserId},
    store::ReactionStore,
};

/// Reactions on one movie plus its counters
#[derive(Debug, Default)]
struct MovieReactions {
    users: HashMap<UserId, Polarity>,
    likes: u64,
    dislikes: u64,
}

impl MovieReactions {
    fn counter(&mut self, polarity: Polarity) -> &mut u64 {
        match polarity {
            Polarity::Like => &mut self.likes,
            Polarity::Dislike => &mut self.dislikes,
        }
    }

    fn add(&mut self, user_id: &str, polarity: Polarity) {
        self.users.insert(user_id.to_string(), polarity);
        *self.counter(polarity) += 1;
    }

    fn drop_reaction(&mut self, user_id: &str, polarity: Polarity) {
        if self.users.remove(user_id).is_some() {
            let counter = self.counter(polarity);
            *counter = counter.saturating_sub(1);
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReactionStore {
    /// user -> movie -> active polarity
    by_user: DashMap<UserId, HashMap<MovieId, Polarity>>,
    /// movie -> users and counters; entries dropped once empty
    by_movie: DashMap<MovieId, MovieReactions>,
}

impl InMemoryReactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ReactionStore for InMemoryReactionStore {
    async fn set_reaction(
        &self,
        user_id: &str,
        movie_id: &str,
        polarity: Polarity,
    ) -> AppResult<bool> {
        let mut movies = self.by_user.entry(user_id.to_string()).or_default();
        let previous = movies.get(movie_id).copied();
        if previous == Some(polarity) {
            return Ok(false);
        }

        let mut movie = self.by_movie.entry(movie_id.to_string()).or_default();
        if let Some(active) = previous {
            movie.drop_reaction(user_id, active);
        }
        movie.add(user_id, polarity);
        movies.insert(movie_id.to_string(), polarity);

        Ok(true)
    }

    async fn clear_reaction(
        &self,
        user_id: &str,
        movie_id: &str,
        polarity: Polarity,
    ) -> AppResult<bool> {
        let Some(mut movies) = self.by_user.get_mut(user_id) else {
            return Ok(false);
        };
        if movies.get(movie_id) != Some(&polarity) {
            return Ok(false);
        }

        if let Some(mut movie) = self.by_movie.get_mut(movie_id) {
            movie.drop_reaction(user_id, polarity);
            let emptied = movie.users.is_empty();
            drop(movie);
            if emptied {
                self.by_movie
                    .remove_if(movie_id, |_, movie| movie.users.is_empty());
            }
        }
        movies.remove(movie_id);
        let emptied = movies.is_empty();
        drop(movies);
        if emptied {
            self.by_user
                .remove_if(user_id, |_, movies| movies.is_empty());
        }

        Ok(true)
    }

    async fn movies_for(&self, user_id: &str, polarity: Polarity) -> AppResult<BTreeSet<MovieId>> {
        Ok(self
            .by_user
            .get(user_id)
            .map(|movies| {
                movies
                    .iter()
                    .filter(|(_, p)| **p == polarity)
                    .map(|(movie_id, _)| movie_id.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn users_for(&self, movie_id: &str, polarity: Polarity) -> AppResult<BTreeSet<UserId>> {
        Ok(self
            .by_movie
            .get(movie_id)
            .map(|movie| {
                movie
                    .users
                    .iter()
                    .filter(|(_, p)| **p == polarity)
                    .map(|(user_id, _)| user_id.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count_for(&self, movie_id: &str, polarity: Polarity) -> AppResult<u64> {
        Ok(self
            .by_movie
            .get(movie_id)
            .map(|movie| match polarity {
                Polarity::Like => movie.likes,
                Polarity::Dislike => movie.dislikes,
            })
            .unwrap_or_default())
    }

    async fn tallies(&self) -> AppResult<Vec<MovieTally>> {
        let mut tallies: Vec<MovieTally> = self
            .by_movie
            .iter()
            .filter(|entry| entry.likes + entry.dislikes > 0)
            .map(|entry| MovieTally {
                movie_id: entry.key().clone(),
                likes: entry.likes,
                dislikes: entry.dislikes,
            })
            .collect();
        tallies.sort_by(|a, b| a.movie_id.cmp(&b.movie_id));
        Ok(tallies)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_like_updates_both_indices() {
        let store = InMemoryReactionStore::new();

        assert!(store.like("u1", "m1").await.unwrap());

        assert_eq!(store.all_liked_for("u1").await.unwrap(), set(&["m1"]));
        assert_eq!(store.liked_by("m1").await.unwrap(), set(&["u1"]));
        assert_eq!(store.liked_count("m1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_like_clears_previous_dislike() {
        let store = InMemoryReactionStore::new();
        store.dislike("u1", "m1").await.unwrap();
        assert_eq!(store.disliked_count("m1").await.unwrap(), 1);

        store.like("u1", "m1").await.unwrap();

        assert_eq!(store.disliked_count("m1").await.unwrap(), 0);
        assert!(store.all_disliked_for("u1").await.unwrap().is_empty());
        assert!(store.disliked_by("m1").await.unwrap().is_empty());
        assert_eq!(store.liked_count("m1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dislike_after_like_is_mutually_exclusive() {
        let store = InMemoryReactionStore::new();
        store.like("u1", "m1").await.unwrap();
        store.dislike("u1", "m1").await.unwrap();

        assert!(!store.all_liked_for("u1").await.unwrap().contains("m1"));
        assert!(store.all_disliked_for("u1").await.unwrap().contains("m1"));
        assert_eq!(store.liked_count("m1").await.unwrap(), 0);
        assert_eq!(store.disliked_count("m1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let store = InMemoryReactionStore::new();
        assert!(store.like("u1", "m1").await.unwrap());
        assert!(!store.like("u1", "m1").await.unwrap());

        assert_eq!(store.liked_count("m1").await.unwrap(), 1);
        assert_eq!(store.all_liked_for("u1").await.unwrap(), set(&["m1"]));
        assert_eq!(
            store.tallies().await.unwrap(),
            vec![MovieTally {
                movie_id: "m1".to_string(),
                likes: 1,
                dislikes: 0
            }]
        );
    }

    #[tokio::test]
    async fn test_unlike_without_like_is_noop() {
        let store = InMemoryReactionStore::new();
        store.dislike("u1", "m1").await.unwrap();

        assert!(!store.unlike("u1", "m1").await.unwrap());
        assert!(!store.unlike("u2", "m2").await.unwrap());

        assert_eq!(store.all_disliked_for("u1").await.unwrap(), set(&["m1"]));
        assert_eq!(store.disliked_count("m1").await.unwrap(), 1);
        assert_eq!(store.tallies().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_undislike_clears_dislike() {
        let store = InMemoryReactionStore::new();
        store.dislike("u1", "m1").await.unwrap();

        assert!(store.undislike("u1", "m1").await.unwrap());
        assert!(store.all_watched_for("u1").await.unwrap().is_empty());
        assert!(store.tallies().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watched_is_union_of_liked_and_disliked() {
        let store = InMemoryReactionStore::new();
        store.like("u1", "m1").await.unwrap();
        store.like("u1", "m2").await.unwrap();
        store.dislike("u1", "m3").await.unwrap();
        store.dislike("u1", "m2").await.unwrap();

        let liked = store.all_liked_for("u1").await.unwrap();
        let disliked = store.all_disliked_for("u1").await.unwrap();
        let watched = store.all_watched_for("u1").await.unwrap();

        assert_eq!(watched, liked.union(&disliked).cloned().collect());
        assert_eq!(watched, set(&["m1", "m2", "m3"]));
    }

    #[tokio::test]
    async fn test_liked_count_drops_after_unlike() {
        let store = InMemoryReactionStore::new();
        store.like("u1", "m1").await.unwrap();
        store.like("u2", "m1").await.unwrap();
        assert_eq!(store.liked_count("m1").await.unwrap(), 2);

        store.unlike("u2", "m1").await.unwrap();
        assert_eq!(store.liked_count("m1").await.unwrap(), 1);
        assert_eq!(store.liked_by("m1").await.unwrap(), set(&["u1"]));
    }

    #[tokio::test]
    async fn test_tallies_exclude_movies_without_reactions() {
        let store = InMemoryReactionStore::new();
        store.like("u1", "m1").await.unwrap();
        store.dislike("u2", "m1").await.unwrap();
        store.like("u1", "m2").await.unwrap();
        store.unlike("u1", "m2").await.unwrap();

        let tallies = store.tallies().await.unwrap();
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].movie_id, "m1");
        assert_eq!(tallies[0].net_score(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_writes_on_same_pair_leave_one_polarity() {
        let store = Arc::new(InMemoryReactionStore::new());

        let mut tasks = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    store.like("u1", "m1").await.unwrap();
                } else {
                    store.dislike("u1", "m1").await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let likes = store.liked_count("m1").await.unwrap();
        let dislikes = store.disliked_count("m1").await.unwrap();
        assert_eq!(likes + dislikes, 1);
        assert_eq!(store.all_watched_for("u1").await.unwrap(), set(&["m1"]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_writes_on_distinct_keys_all_land() {
        let store = Arc::new(InMemoryReactionStore::new());

        let mut tasks = Vec::new();
        for u in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for m in 0..20 {
                    let user_id = format!("u{}", u);
                    let movie_id = format!("m{}", m);
                    if (u + m) % 3 == 0 {
                        store.dislike(&user_id, &movie_id).await.unwrap();
                    } else {
                        store.like(&user_id, &movie_id).await.unwrap();
                    }
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let tallies = store.tallies().await.unwrap();
        assert_eq!(tallies.len(), 20);
        for tally in &tallies {
            assert_eq!(tally.likes + tally.dislikes, 8);
            assert_eq!(
                store.liked_by(&tally.movie_id).await.unwrap().len() as u64,
                tally.likes
            );
        }
        for u in 0..8 {
            let watched = store.all_watched_for(&format!("u{}", u)).await.unwrap();
            assert_eq!(watched.len(), 20);
        }
    }

    #[test]
    fn test_missing_user_reads_are_empty() {
        let store = InMemoryReactionStore::new();
        let watched = tokio_test::block_on(store.all_watched_for("ghost")).unwrap();
        let count = tokio_test::block_on(store.liked_count("ghost-movie")).unwrap();

        assert!(watched.is_empty());
        assert_eq!(count, 0);
    }
}
