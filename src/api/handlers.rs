use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::{EnrichedMovie, MovieReactionRequest, UserId};

use super::extract::{ApiJson, ApiQuery};
use super::AppState;

// Query types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendQuery {
    /// Kept raw: `numberOfRecs=` from a form counts as missing
    pub number_of_recs: Option<String>,
}

impl RecommendQuery {
    /// Requested count; empty or non-numeric values count as missing
    pub fn count(&self) -> Option<i64> {
        self.number_of_recs
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
    }
}

#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    pub genre: Option<String>,
    pub page: Option<u32>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

pub async fn like_movie(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MovieReactionRequest>,
) -> AppResult<StatusCode> {
    state.movies.like_movie(&request).await?;
    Ok(StatusCode::CREATED)
}

pub async fn unlike_movie(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MovieReactionRequest>,
) -> AppResult<StatusCode> {
    state.movies.unlike_movie(&request).await?;
    Ok(StatusCode::CREATED)
}

pub async fn dislike_movie(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MovieReactionRequest>,
) -> AppResult<StatusCode> {
    state.movies.dislike_movie(&request).await?;
    Ok(StatusCode::CREATED)
}

pub async fn undislike_movie(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MovieReactionRequest>,
) -> AppResult<StatusCode> {
    state.movies.undislike_movie(&request).await?;
    Ok(StatusCode::CREATED)
}

/// Recommended movies; `numberOfRecs` defaults to 10
pub async fn recommend_movies(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiQuery(query): ApiQuery<RecommendQuery>,
) -> AppResult<Json<Vec<EnrichedMovie>>> {
    let movies = state
        .movies
        .recommend_movies(&user_id, query.count())
        .await?;
    Ok(Json(movies))
}

pub async fn similar_users(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<UserId>>> {
    Ok(Json(state.movies.similar_users(&user_id).await?))
}

pub async fn best_rated_movies(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EnrichedMovie>>> {
    Ok(Json(state.movies.best_rated_movies().await?))
}

pub async fn worst_rated_movies(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EnrichedMovie>>> {
    Ok(Json(state.movies.worst_rated_movies().await?))
}

pub async fn most_liked_movies(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EnrichedMovie>>> {
    Ok(Json(state.movies.most_liked_movies().await?))
}

pub async fn movie_likers(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<Vec<UserId>>> {
    Ok(Json(state.movies.movie_likers(&movie_id).await?))
}

pub async fn liked_movie_count(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<u64>> {
    Ok(Json(state.movies.liked_movie_count(&movie_id).await?))
}

pub async fn disliked_movie_count(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<u64>> {
    Ok(Json(state.movies.disliked_movie_count(&movie_id).await?))
}

pub async fn liked_movies(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<EnrichedMovie>>> {
    Ok(Json(state.movies.liked_movies(&user_id).await?))
}

pub async fn disliked_movies(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<EnrichedMovie>>> {
    Ok(Json(state.movies.disliked_movies(&user_id).await?))
}

pub async fn watched_movies(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<EnrichedMovie>>> {
    Ok(Json(state.movies.watched_movies(&user_id).await?))
}

pub async fn movie_detail(
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> AppResult<Json<EnrichedMovie>> {
    Ok(Json(state.movies.movie_detail(&movie_id).await?))
}

/// Random catalog sample, optionally filtered by genre
pub async fn random_movies(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RandomQuery>,
) -> Json<Vec<EnrichedMovie>> {
    Json(
        state
            .movies
            .random_movies(query.genre.as_deref(), query.page)
            .await,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recommend_query(raw: Option<&str>) -> RecommendQuery {
        RecommendQuery {
            number_of_recs: raw.map(str::to_string),
        }
    }

    #[test]
    fn test_recommend_count_parsing() {
        assert_eq!(recommend_query(Some("5")).count(), Some(5));
        assert_eq!(recommend_query(Some(" 7 ")).count(), Some(7));
        assert_eq!(recommend_query(Some("-2")).count(), Some(-2));
        assert_eq!(recommend_query(Some("")).count(), None);
        assert_eq!(recommend_query(Some("lots")).count(), None);
        assert_eq!(recommend_query(None).count(), None);
    }
}
