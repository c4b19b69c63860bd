use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod crawl;
mod db;
mod import;
mod merge;
mod parse_text;

#[derive(Debug, Parser)]
#[command(name = "leadfarm")]
#[command(about = "Directory lead-acquisition pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl one directory region for a search query
    Run {
        /// Region code the directory expects (e.g. krasnodar)
        region: String,
        /// Search query (e.g. "ремонт квартир")
        query: String,
        /// Stop after accepting this many leads
        max_records: Option<u64>,
        /// Navigate with an item offset instead of numbered pages
        #[arg(long)]
        scroll: bool,
        /// Continue from the checkpoint of a previous run with the same
        /// region and query
        #[arg(long)]
        resume: bool,
        /// Output CSV path (defaults to a slug-named file in the data dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Crawl every city of a configured region, one session per city
    RunRegion {
        /// Region slug from the regions file (e.g. krasnodar-krai)
        region: String,
        /// Search query
        query: String,
        /// Per-city lead cap
        max_records: Option<u64>,
        /// Navigate with an item offset instead of numbered pages
        #[arg(long)]
        scroll: bool,
        /// Continue each city from its checkpoint where one exists
        #[arg(long)]
        resume: bool,
    },
    /// Merge run CSVs into one canonical company file
    Merge {
        /// Run files to merge
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Merged output path
        #[arg(long)]
        out: PathBuf,
    },
    /// Import a merged company CSV into the leads store
    Import {
        /// Merged company CSV
        file: PathBuf,
        /// Preview what would be imported without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Extract leads from a pasted directory text dump
    ParseText {
        /// Text file to parse
        file: PathBuf,
        /// Output CSV path (defaults to the input with a .csv extension)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Database administration
    Db {
        #[command(subcommand)]
        command: db::DbCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = leadfarm_core::load_app_config()?;

    match cli.command {
        Commands::Run {
            region,
            query,
            max_records,
            scroll,
            resume,
            out,
        } => crawl::run_crawl(&config, &region, &query, max_records, scroll, resume, out).await,
        Commands::RunRegion {
            region,
            query,
            max_records,
            scroll,
            resume,
        } => crawl::run_crawl_region(&config, &region, &query, max_records, scroll, resume).await,
        Commands::Merge { files, out } => merge::run_merge(&files, &out),
        Commands::Import { file, dry_run } => import::run_import(&config, &file, dry_run).await,
        Commands::ParseText { file, out } => parse_text::run_parse_text(&file, out),
        Commands::Db { command } => db::run_db(&config, command).await,
    }
}
