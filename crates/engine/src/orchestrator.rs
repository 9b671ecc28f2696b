//! # Recommendation Engine
//!
//! The facade a presentation layer talks to. It coordinates:
//! 1. The immutable rating table (swappable between sessions)
//! 2. The popularity ranking (cheap, computed per query)
//! 3. The similarity matrix (expensive, version-cached)
//! 4. The latent model (expensive, version-cached)
//!
//! The two expensive artifacts go through [`VersionedCache`], so a rebuild
//! happens at most once per table version no matter how many callers race,
//! and a failed build never disturbs the artifact already being served.
//! No blocking I/O happens here; only table loading (rating-store) touches
//! storage.

use crate::cache::VersionedCache;
use anyhow::Result;
use latent::{LatentModel, Recommendation, SvdConfig, SvdTrainer, recommend};
use rankers::{PopularMovie, PopularityRanker, SimilarMovie, SimilarityMatrix};
use rating_store::{Movie, MovieId, RatingTable, UserId};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

/// Coordinates the rankers and the latent model behind one async API.
pub struct RecommendationEngine {
    table: RwLock<Arc<RatingTable>>,
    similarity: VersionedCache<SimilarityMatrix>,
    model: VersionedCache<LatentModel>,
    svd_config: SvdConfig,
}

impl RecommendationEngine {
    /// Create an engine over a loaded table with default training config.
    pub fn new(table: Arc<RatingTable>) -> Self {
        Self::with_config(table, SvdConfig::default())
    }

    pub fn with_config(table: Arc<RatingTable>, svd_config: SvdConfig) -> Self {
        Self {
            table: RwLock::new(table),
            similarity: VersionedCache::new(),
            model: VersionedCache::new(),
            svd_config,
        }
    }

    /// Snapshot of the current table
    pub async fn table(&self) -> Arc<RatingTable> {
        self.table.read().await.clone()
    }

    /// Swap in a new dataset snapshot.
    ///
    /// Derived artifacts are not rebuilt eagerly; their cached versions
    /// simply stop matching and the next query triggers a rebuild. Until
    /// a rebuild succeeds, queries against the old snapshot's artifacts
    /// are no longer served (version mismatch), never mixed.
    pub async fn replace_table(&self, table: Arc<RatingTable>) {
        let mut slot = self.table.write().await;
        info!(
            "Replacing rating table: version {} -> {}",
            slot.version(),
            table.version()
        );
        *slot = table;
    }

    /// The top `n` movies by (rating count, average rating).
    ///
    /// A single aggregation pass over the ratings; cheap enough to skip
    /// the version cache entirely.
    #[instrument(skip(self))]
    pub async fn top_popular(&self, n: usize) -> Vec<PopularMovie> {
        let table = self.table().await;
        PopularityRanker::new(table).top_n(n)
    }

    /// Up to `n` movies most similar to `movie_id`.
    ///
    /// Builds (or reuses) the similarity matrix for the current table
    /// version. An unknown movie id surfaces as [`rankers::RankError`].
    #[instrument(skip(self))]
    pub async fn similar_items(&self, movie_id: MovieId, n: usize) -> Result<Vec<SimilarMovie>> {
        let table = self.table().await;
        let build_table = table.clone();
        let matrix = self
            .similarity
            .get_or_build(table.version(), move || {
                Ok(SimilarityMatrix::build(&build_table))
            })
            .await?;
        Ok(matrix.similar_to(&table, movie_id, n)?)
    }

    /// Up to `n` personalized picks for `user_id`, unrated movies only.
    ///
    /// Trains (or reuses) the latent model for the current table version.
    /// Unknown users degrade to cold-start estimates; the only error here
    /// is a failed training run (e.g. insufficient data), which leaves any
    /// previously served model untouched.
    #[instrument(skip(self))]
    pub async fn recommend_for_user(
        &self,
        user_id: UserId,
        n: usize,
    ) -> Result<Vec<Recommendation>> {
        let table = self.table().await;
        let build_table = table.clone();
        let config = self.svd_config.clone();
        let model = self
            .model
            .get_or_build(table.version(), move || {
                Ok(SvdTrainer::new(config).train(&build_table)?)
            })
            .await?;
        Ok(recommend(&model, &table, user_id, n))
    }

    /// Case-insensitive substring title search, matches sorted by movie id.
    pub async fn search_titles(&self, query: &str) -> Vec<Movie> {
        let table = self.table().await;
        let needle = query.to_lowercase();
        let mut matches: Vec<Movie> = table
            .movies()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by_key(|m| m.id);
        matches
    }
}
