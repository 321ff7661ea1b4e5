//! Rankings over the current per-movie counters
//!
//! Every ranking covers the movies with at least one current reaction and is
//! fully ordered: ties on the metric fall back to the movie id.
use std::cmp::Reverse;

use crate::models::{MovieId, MovieTally};

/// Descending net score (likes minus dislikes), ties by ascending movie id
pub fn best_rated(tallies: &[MovieTally]) -> Vec<MovieId> {
    let mut ranked: Vec<&MovieTally> = tallies.iter().collect();
    ranked.sort_by(|a, b| {
        b.net_score()
            .cmp(&a.net_score())
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });
    ranked.into_iter().map(|t| t.movie_id.clone()).collect()
}

/// Exact reverse of [`best_rated`]
pub fn worst_rated(tallies: &[MovieTally]) -> Vec<MovieId> {
    let mut ranked = best_rated(tallies);
    ranked.reverse();
    ranked
}

/// Descending like count alone, ties by ascending movie id
pub fn most_liked(tallies: &[MovieTally]) -> Vec<MovieId> {
    let mut ranked: Vec<&MovieTally> = tallies.iter().collect();
    ranked.sort_by(|a, b| {
        (Reverse(a.likes), &a.movie_id).cmp(&(Reverse(b.likes), &b.movie_id))
    });
    ranked.into_iter().map(|t| t.movie_id.clone()).collect()
}
