use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod engine;
mod search;
mod sheet;
mod stores;

#[derive(Debug, Parser)]
#[command(name = "shopbot")]
#[command(about = "Look up shopping-list prices across grocery store websites")]
struct Cli {
    /// Log at debug level regardless of RUST_LOG / SHOPBOT_LOG_LEVEL
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search stores for each item and print what was found
    Search {
        /// Item to search for (repeatable)
        #[arg(long = "item", value_name = "QUERY")]
        items: Vec<String>,
        /// File with one item per line; blank lines and `#` comments are skipped
        #[arg(long)]
        items_file: Option<PathBuf>,
        /// Store id or display name (repeatable); defaults to every configured store
        #[arg(long = "store", value_name = "STORE")]
        stores: Vec<String>,
        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Read the shopping list from a TSV sheet, search, and write results back
    Sheet {
        /// Tab-separated sheet file
        path: PathBuf,
        /// Restrict to these stores (repeatable); defaults to every store column in the sheet
        #[arg(long = "store", value_name = "STORE")]
        stores: Vec<String>,
        /// 1-based row holding the store-name headers
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        stores_row: u32,
        /// Print the planned cell updates without saving the sheet
        #[arg(long)]
        dry_run: bool,
    },
    /// List configured store profiles
    Stores,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = shopbot_core::load_app_config()?;
    let env_filter = if cli.verbose {
        EnvFilter::try_new("debug")?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(env = %config.env, webdriver = %config.webdriver_url, "configuration loaded");
    let registry = engine::load_registry(&config)?;

    match cli.command {
        Some(Commands::Search {
            items,
            items_file,
            stores,
            json,
        }) => {
            search::run_search(
                &config,
                &registry,
                &items,
                items_file.as_deref(),
                &stores,
                json,
            )
            .await?;
        }
        Some(Commands::Sheet {
            path,
            stores,
            stores_row,
            dry_run,
        }) => {
            sheet::run_sheet(&config, &registry, &path, &stores, stores_row, dry_run).await?;
        }
        Some(Commands::Stores) => stores::print_stores(&registry),
        None => {
            println!("shopbot: pass a command (search, sheet, stores); see --help");
        }
    }

    Ok(())
}
