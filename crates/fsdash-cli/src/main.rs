mod report;

use clap::{Parser, Subcommand};
use fsdash_core::{FilterPredicate, ServiceKind};
use fsdash_feed::{FeedClient, FeedSource};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fsdash-cli")]
#[command(about = "Hong Kong fire services dashboard command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List normalized records for one kind (ambulance | fire)
    Records {
        kind: ServiceKind,
        /// Case-insensitive substring matched against name or address
        #[arg(long)]
        search: Option<String>,
        /// Keep only this district; repeat for several
        #[arg(long = "district")]
        districts: Vec<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Per-district counts and headline totals for both kinds
    Summary {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Fetch both feeds once and report status, timing and sample names
    Probe,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("fsdash-cli: choose a subcommand (records, summary, probe); see --help");
        return Ok(());
    };

    let config = fsdash_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries the report; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let client = FeedClient::from_config(&config)?;

    match command {
        Commands::Records {
            kind,
            search,
            districts,
            json,
        } => {
            let mut predicate = FilterPredicate::new().with_districts(districts);
            if let Some(search) = search {
                predicate = predicate.with_search(search);
            }
            let source = FeedSource::new(client, config.normalize_stringency);
            report::run_records(&source, kind, &predicate, json).await
        }
        Commands::Summary { json } => {
            let source = FeedSource::new(client, config.normalize_stringency);
            report::run_summary(&source, json).await
        }
        Commands::Probe => report::run_probe(&client).await,
    }
}
