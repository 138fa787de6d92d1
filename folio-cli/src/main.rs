//! Folio CLI - Build a book from a directory of Markdown chapters

mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parse and validate jobs argument (must be at least 1)
fn parse_jobs(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if n < 1 {
        Err("jobs must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

/// Assemble a Markdown book into a single HTML page and an EPUB
#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Book root containing SUMMARY.md
    root: PathBuf,

    /// Output directory
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Number of parallel jobs (must be at least 1)
    #[arg(short, long, value_parser = parse_jobs)]
    jobs: Option<usize>,

    /// Leave remote images as links instead of downloading them
    #[arg(long)]
    no_remote: bool,

    /// Page template for the merged HTML output
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Book title (defaults to the root directory name)
    #[arg(long)]
    title: Option<String>,

    /// Book language
    #[arg(long)]
    language: Option<String>,

    /// Book author; repeat for several
    #[arg(long = "author")]
    authors: Vec<String>,

    /// Output formats (html, epub)
    #[arg(short, long, value_delimiter = ',')]
    formats: Vec<String>,

    /// Remove the output directory before building
    #[arg(long)]
    clean: bool,

    /// Print the build report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> commands::Overrides {
        commands::Overrides {
            out_dir: self.out_dir.clone(),
            jobs: self.jobs,
            no_remote: self.no_remote,
            template: self.template.clone(),
            title: self.title.clone(),
            language: self.language.clone(),
            authors: self.authors.clone(),
            formats: self.formats.clone(),
            clean: self.clean,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "folio_cli=debug,folio_core=debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "folio_cli=info,folio_core=warn".to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    commands::build(&cli.root, cli.overrides(), cli.json)
}
