pub mod catalog;
pub mod discovery;
pub mod enrichment;
pub mod movies;
pub mod ranking;
pub mod similarity;

pub use catalog::{MovieCatalog, TmdbCatalog};
pub use movies::{MovieService, MovieServiceSettings};
