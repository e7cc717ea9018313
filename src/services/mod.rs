pub mod providers;
pub mod ranker;
pub mod recommendations;
pub mod similarity;
pub mod title_normalizer;

pub use providers::{OmdbProvider, PosterProvider};
