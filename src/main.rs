use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use galpi::{AppState, Container, ContainerConfig};

#[derive(Parser)]
#[command(name = "galpi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, default_value = "~/.galpi")]
    data_dir: String,

    /// Run with deterministic mock embeddings instead of the remote API.
    #[arg(long, global = true)]
    mock_embeddings: bool,

    /// JSON file with `{"books": [...], "reviews": [...]}` loaded into the
    /// in-memory catalog at startup.
    #[arg(long, global = true)]
    seed: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API with background pipeline workers.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,

        #[arg(long, default_value = "2")]
        workers: usize,

        #[arg(long, default_value = "64")]
        queue_capacity: usize,
    },

    /// Run the book vector build pipeline once, inline.
    Build { isbn: String },

    /// Run the review vector update pipeline once, inline.
    Update { review_id: i64 },
}

#[derive(Deserialize, Default)]
struct SeedData {
    #[serde(default)]
    books: Vec<galpi::Book>,
    #[serde(default)]
    reviews: Vec<galpi::Review>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data_dir = expand_tilde(&cli.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let (workers, queue_capacity) = match &cli.command {
        Commands::Serve {
            workers,
            queue_capacity,
            ..
        } => (*workers, *queue_capacity),
        _ => (1, 1),
    };

    let container = Container::new(ContainerConfig {
        data_dir,
        mock_embeddings: cli.mock_embeddings,
        workers,
        queue_capacity,
    })?;

    if let Some(path) = &cli.seed {
        let data = std::fs::read_to_string(path)?;
        let seed: SeedData = serde_json::from_str(&data)?;
        info!(
            "seeded {} books and {} reviews from {path}",
            seed.books.len(),
            seed.reviews.len()
        );
        container.seed(seed.books, seed.reviews).await;
    }

    match cli.command {
        Commands::Serve { addr, .. } => {
            let state = AppState {
                recommend: std::sync::Arc::new(container.recommend_use_case()),
                queue: container.start_queue(),
            };
            galpi::serve(&addr, state).await?;
        }

        Commands::Build { isbn } => {
            let outcome = container.build_use_case().execute(&isbn).await?;
            println!("build pipeline finished: {outcome:?}");
        }

        Commands::Update { review_id } => {
            let report = container.update_use_case().execute(review_id).await?;
            println!(
                "update pipeline finished: profile_updated={} book_vector_updated={}",
                report.profile_updated, report.book_vector_updated
            );
        }
    }

    Ok(())
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn serve_accepts_worker_and_queue_flags() {
        let cli = Cli::try_parse_from([
            "galpi",
            "serve",
            "--workers",
            "4",
            "--queue-capacity",
            "128",
        ])
        .expect("flags should parse");
        match cli.command {
            Commands::Serve {
                workers,
                queue_capacity,
                ..
            } => {
                assert_eq!(workers, 4);
                assert_eq!(queue_capacity, 128);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn build_requires_an_isbn() {
        assert!(Cli::try_parse_from(["galpi", "build"]).is_err());
    }
}
