use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use engine::RecommendationEngine;
use rating_store::{MovieId, RatingScale, RatingTable, UserId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// WBSFLIX - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "wbsflix")]
#[command(about = "Recommendation engine over a MovieLens-style ratings dataset", long_about = None)]
struct Cli {
    /// Dataset directory containing ratings.csv, movies.csv, links.csv
    #[arg(short, long, default_value = "data/ml-latest-small")]
    data_dir: PathBuf,

    /// Emit JSON instead of human-readable output
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the top rated movies
    Top {
        /// Number of movies to show
        #[arg(long, default_value = "8")]
        n: usize,
    },

    /// Show movies similar to a given movie
    Similar {
        /// Movie ID to find neighbors for
        #[arg(long)]
        movie_id: MovieId,

        /// Number of similar movies to show
        #[arg(long, default_value = "8")]
        n: usize,
    },

    /// Personalized recommendations for a user
    Recommend {
        /// User ID to recommend for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to show
        #[arg(long, default_value = "8")]
        n: usize,
    },

    /// Search for movies by title
    Search {
        /// Title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let table = RatingTable::load(
        &cli.data_dir.join("ratings.csv"),
        &cli.data_dir.join("movies.csv"),
        &cli.data_dir.join("links.csv"),
        RatingScale::default(),
    )
    .with_context(|| format!("Failed to load dataset from {}", cli.data_dir.display()))?;

    let (users, movies, ratings) = table.counts();
    println!(
        "Loaded {} users, {} movies, {} ratings in {:.2?}\n",
        users,
        movies,
        ratings,
        start.elapsed()
    );

    let engine = RecommendationEngine::new(Arc::new(table));

    match cli.command {
        Commands::Top { n } => {
            let top = engine.top_popular(n).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&top)?);
            } else {
                println!("{}", "Our Top Rated Movies".red().bold());
                for (rank, row) in top.iter().enumerate() {
                    println!(
                        "{:>3}. {} {} ({} ratings, avg {:.2})",
                        rank + 1,
                        row.title.bold(),
                        poster_hint(row.tmdb_id).dimmed(),
                        row.rating_count,
                        row.avg_rating
                    );
                }
            }
        }

        Commands::Similar { movie_id, n } => {
            let query_title = engine
                .table()
                .await
                .movie(movie_id)
                .map(|m| m.title.clone())
                .unwrap_or_else(|| format!("movie {}", movie_id));

            let similar = engine.similar_items(movie_id, n).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&similar)?);
            } else {
                println!("{} {}", "Movies similar to".red().bold(), query_title.bold());
                if similar.is_empty() {
                    println!("{}", "No recommendations available".dimmed());
                }
                for (rank, row) in similar.iter().enumerate() {
                    println!(
                        "{:>3}. {} {} (similarity {:.3})",
                        rank + 1,
                        row.title.bold(),
                        poster_hint(row.tmdb_id).dimmed(),
                        row.score
                    );
                }
            }
        }

        Commands::Recommend { user_id, n } => {
            println!("Training the recommendation model...");
            let start = Instant::now();
            let recs = engine.recommend_for_user(user_id, n).await?;
            tracing::info!("Model ready in {:.2?}", start.elapsed());

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&recs)?);
            } else {
                println!("{} {}", "Recommendations for user".red().bold(), user_id);
                if recs.is_empty() {
                    println!("{}", "No recommendations available".dimmed());
                }
                for (rank, row) in recs.iter().enumerate() {
                    println!(
                        "{:>3}. {} {} (predicted {:.2})",
                        rank + 1,
                        row.title.bold(),
                        poster_hint(row.tmdb_id).dimmed(),
                        row.estimated_rating
                    );
                }
            }
        }

        Commands::Search { title } => {
            let hits = engine.search_titles(&title).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                println!("{} '{}'", "Movies matching".red().bold(), title);
                if hits.is_empty() {
                    println!("{}", "No matches".dimmed());
                }
                for movie in &hits {
                    println!(
                        "{:>7}  {} {}",
                        movie.id,
                        movie.title.bold(),
                        movie.genres.join("|").dimmed()
                    );
                }
            }
        }
    }

    Ok(())
}

/// Short marker for whether a poster can be resolved by the asset layer
fn poster_hint(tmdb_id: Option<u32>) -> String {
    match tmdb_id {
        Some(id) => format!("[tmdb:{}]", id),
        None => "[no poster id]".to_string(),
    }
}
