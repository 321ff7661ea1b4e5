use std::sync::Arc;

use crate::services::MovieService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub movies: Arc<MovieService>,
}

impl AppState {
    pub fn new(movies: MovieService) -> Self {
        Self {
            movies: Arc::new(movies),
        }
    }
}
