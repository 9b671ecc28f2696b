//! Benchmarks for the table-driven rankers
//!
//! Run with: cargo bench --package rankers
//!
//! Uses a synthetic table (200 movies, 500 users, ~20 ratings each) so the
//! benchmark runs without a dataset on disk.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rankers::{PopularityRanker, SimilarityMatrix};
use rating_store::{Movie, Rating, RatingScale, RatingTable};
use std::sync::Arc;

fn synthetic_table() -> Arc<RatingTable> {
    let movies: Vec<Movie> = (1..=200)
        .map(|id| Movie {
            id,
            title: format!("Movie {}", id),
            genres: vec![],
            tmdb_id: Some(id),
        })
        .collect();

    // Deterministic pseudo-random spread, no RNG needed for a benchmark
    let mut ratings = Vec::new();
    for user_id in 1..=500u32 {
        for k in 0..20u32 {
            let movie_id = (user_id * 7 + k * 13) % 200 + 1;
            let value = 0.5 + ((user_id + k) % 10) as f32 * 0.5;
            ratings.push(Rating {
                user_id,
                movie_id,
                rating: value,
                timestamp: None,
            });
        }
    }

    Arc::new(RatingTable::from_parts(movies, ratings, RatingScale::default()).unwrap())
}

fn bench_top_n(c: &mut Criterion) {
    let table = synthetic_table();
    let ranker = PopularityRanker::new(table);

    c.bench_function("popularity_top_n", |b| {
        b.iter(|| {
            let top = ranker.top_n(black_box(20));
            black_box(top)
        })
    });
}

fn bench_similarity_build(c: &mut Criterion) {
    let table = synthetic_table();

    c.bench_function("similarity_matrix_build", |b| {
        b.iter(|| {
            let matrix = SimilarityMatrix::build(black_box(&table));
            black_box(matrix)
        })
    });
}

fn bench_similar_to(c: &mut Criterion) {
    let table = synthetic_table();
    let matrix = SimilarityMatrix::build(&table);

    c.bench_function("similar_to", |b| {
        b.iter(|| {
            let similar = matrix.similar_to(&table, black_box(1), black_box(20)).unwrap();
            black_box(similar)
        })
    });
}

criterion_group!(benches, bench_top_n, bench_similarity_build, bench_similar_to);
criterion_main!(benches);
