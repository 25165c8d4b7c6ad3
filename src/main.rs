use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use listwin::commands::{
    BrowseOptions, SearchOptions, cmd_browse, cmd_cache_clear, cmd_cache_path, cmd_cache_show,
    cmd_config_get, cmd_config_set, cmd_config_show, cmd_search,
};

#[derive(Parser)]
#[command(name = "listwin")]
#[command(about = "Browse large remote lists through a bounded window")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a window of a list, resuming where the last session left off
    #[command(visible_alias = "b")]
    Browse {
        /// Resource path relative to the API base (e.g. api/admin/users)
        resource: String,

        /// Sort ascending by id (default: descending)
        #[arg(long)]
        asc: bool,

        /// Pages to load below the first window
        #[arg(long, default_value_t = 0)]
        down: usize,

        /// Pages to load above the first window
        #[arg(long, default_value_t = 0)]
        up: usize,

        /// Ignore the cached position and start from the top
        #[arg(long)]
        refresh: bool,

        /// Serve records from a JSON file instead of the API
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search a list by keyword
    Search {
        /// Resource path relative to the API base
        resource: String,

        /// Search keyword
        keyword: String,

        /// Key of the result array inside `data` (e.g. users)
        #[arg(long)]
        key: Option<String>,

        /// Serve records from a JSON file instead of the API
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage cached list positions
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cached list positions
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Remove a cached position, or all of them
    Clear {
        /// Cache key (e.g. api_admin_users_list_cache)
        key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print the cache directory
    Path {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Print a configuration value
    Get {
        key: String,
        #[arg(long)]
        json: bool,
    },
    /// Set a configuration value
    Set {
        key: String,
        value: String,
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LISTWIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Browse {
            resource,
            asc,
            down,
            up,
            refresh,
            fixture,
            json,
        } => {
            cmd_browse(BrowseOptions {
                resource,
                asc,
                down,
                up,
                refresh,
                json,
                fixture,
            })
            .await
        }

        Commands::Search {
            resource,
            keyword,
            key,
            fixture,
            json,
        } => {
            cmd_search(SearchOptions {
                resource,
                keyword,
                search_key: key,
                json,
                fixture,
            })
            .await
        }

        Commands::Cache { action } => match action {
            CacheAction::Show { json } => cmd_cache_show(json),
            CacheAction::Clear { key, json } => cmd_cache_clear(key.as_deref(), json),
            CacheAction::Path { json } => cmd_cache_path(json),
        },

        Commands::Config { action } => match action {
            ConfigAction::Show { json } => cmd_config_show(json),
            ConfigAction::Get { key, json } => cmd_config_get(&key, json),
            ConfigAction::Set { key, value, json } => cmd_config_set(&key, &value, json),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
