use axum::{
    http::{header::CONTENT_TYPE, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/movies", movie_routes())
        .with_state(state)
        .layer(
            // The request id must be assigned before the trace span is built
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                        .allow_headers([CONTENT_TYPE]),
                ),
        )
}

fn movie_routes() -> Router<AppState> {
    Router::new()
        // Reactions
        .route("/like", post(handlers::like_movie))
        .route("/unlike", post(handlers::unlike_movie))
        .route("/dislike", post(handlers::dislike_movie))
        .route("/undislike", post(handlers::undislike_movie))
        // Recommendations & similarity
        .route("/recommend/:user_id", get(handlers::recommend_movies))
        .route("/similar-users/:user_id", get(handlers::similar_users))
        // Rankings
        .route("/best-rated", get(handlers::best_rated_movies))
        .route("/worst-rated", get(handlers::worst_rated_movies))
        .route("/most-liked", get(handlers::most_liked_movies))
        // Per-movie reactions
        .route("/likers/:movie_id", get(handlers::movie_likers))
        .route("/liked-count/:movie_id", get(handlers::liked_movie_count))
        .route("/disliked-count/:movie_id", get(handlers::disliked_movie_count))
        // Per-user reactions
        .route("/liked/:user_id", get(handlers::liked_movies))
        .route("/disliked/:user_id", get(handlers::disliked_movies))
        .route("/watched/:user_id", get(handlers::watched_movies))
        // Catalog
        .route("/detail/:movie_id", get(handlers::movie_detail))
        .route("/random", get(handlers::random_movies))
}
