//! Engine crate: the async facade over the recommendation components.
//!
//! This crate owns the build-versioned caches for the similarity matrix
//! and the latent model, and exposes the engine API surface
//! (`top_popular`, `similar_items`, `recommend_for_user`, `search_titles`,
//! `replace_table`) consumed by presentation layers.

pub mod cache;
pub mod orchestrator;

pub use cache::VersionedCache;
pub use orchestrator::RecommendationEngine;
