//! Grove CLI - Command-line interface for Grove
//!
//! This is the main entry point for users interacting with Grove.
//! It provides commands for analyzing a repository, ranking its components,
//! ordering its files and summarizing them.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "grove")]
#[command(author = "Grove Contributors")]
#[command(version)]
#[command(about = "Component graphs, rankings and file summaries for code repositories", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .grove/config.json
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Build, rank and render the component graph
    Analyze {
        /// Path to analyze (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file for the DOT graph (defaults to the configured output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Build the k-nearest-neighbor graph of source files
    Neighbors {
        /// Path to analyze (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Neighbors per file (defaults to the configured value)
        #[arg(short)]
        k: Option<usize>,

        /// Similarity metric: cosine or euclidean
        #[arg(long)]
        metric: Option<String>,
    },

    /// Show the most representative components
    Rank {
        /// Path to analyze (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Number of components to show (defaults to the configured value)
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Print the execution order of source files
    Sequence {
        /// Path to analyze (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Summarize files in execution order and draw the block diagram
    Summary {
        /// Path to analyze (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Export the component graph to JSON
    Export {
        /// Path to analyze (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "grove-graph.json")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Analyze { path, output, json } => {
            commands::analyze(&path, output.as_deref(), json)
        }
        Commands::Neighbors { path, k, metric } => {
            commands::neighbors(&path, k, metric.as_deref())
        }
        Commands::Rank { path, top } => commands::rank(&path, top),
        Commands::Sequence { path } => commands::sequence(&path),
        Commands::Summary { path } => commands::summary(&path),
        Commands::Export { path, output } => commands::export(&path, &output),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
