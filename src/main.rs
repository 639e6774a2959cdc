// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use docsync::utils::logging::{format_error, format_info, format_success};
use docsync::{
    clean_extension_list, parse_repo_url, Config, FleetDriver, GithubClient, JsonStore,
    NewRepository, RemoteTree, SyncEngine,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "docsync")]
#[command(version)]
#[command(about = "Mirror documentation trees from GitHub repositories into aggregated documents", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a repository and run its initial sync
    Add {
        /// Repository URL, e.g. https://github.com/rust-lang/book
        url: String,

        #[arg(long, default_value = "docs")]
        docs_path: String,

        /// Comma-separated extension allow-list
        #[arg(long, default_value = "md")]
        extensions: String,

        /// Branch to track; defaults to the repository's default branch
        #[arg(long)]
        branch: Option<String>,

        #[arg(long)]
        skip_initial_sync: bool,
    },

    /// List tracked repositories and their sync state
    List,

    /// Show one tracked repository in detail
    Show {
        id: i64,
    },

    /// Stop tracking a repository
    Remove {
        id: i64,
    },

    /// Write a repository's aggregated document to a file
    Export {
        id: i64,

        #[arg(short, long, default_value = "./aggregate.txt")]
        output: PathBuf,
    },

    /// Sync one repository now
    Sync {
        id: i64,
    },

    /// Sync every tracked repository under the concurrency cap
    SyncAll,

    /// Run fleet syncs on an interval until interrupted
    Watch {
        /// Seconds between batches; defaults to the configured interval
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    docsync::utils::logging::init_logger(cli.color, cli.verbose);

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Add {
            url,
            docs_path,
            extensions,
            branch,
            skip_initial_sync,
        } => {
            cmd_add(&config, &url, &docs_path, &extensions, branch, skip_initial_sync).await?;
        }
        Commands::List => {
            cmd_list(&config).await?;
        }
        Commands::Show { id } => {
            cmd_show(&config, id).await?;
        }
        Commands::Remove { id } => {
            cmd_remove(&config, id).await?;
        }
        Commands::Export { id, output } => {
            cmd_export(&config, id, output).await?;
        }
        Commands::Sync { id } => {
            cmd_sync(&config, id).await?;
        }
        Commands::SyncAll => {
            cmd_sync_all(&config).await?;
        }
        Commands::Watch { interval } => {
            cmd_watch(&config, interval).await?;
        }
    }

    Ok(())
}

fn github_client(config: &Config) -> Result<Arc<GithubClient>> {
    let timeout = Duration::from_secs(config.sync.fetch_timeout_secs);
    Ok(Arc::new(GithubClient::new(&config.github, timeout)?))
}

async fn open_store(config: &Config) -> Result<Arc<JsonStore>> {
    let store = JsonStore::open(config.storage.path.clone())
        .await
        .context("Failed to open repository store")?;
    Ok(Arc::new(store))
}

async fn cmd_add(
    config: &Config,
    url: &str,
    docs_path: &str,
    extensions: &str,
    branch: Option<String>,
    skip_initial_sync: bool,
) -> Result<()> {
    let (owner, name) = parse_repo_url(url)?;
    let extensions = clean_extension_list(extensions)
        .context("Extension list must contain at least one entry")?;

    let client = github_client(config)?;
    let branch = match branch.filter(|b| !b.trim().is_empty()) {
        Some(branch) => branch,
        None => client
            .resolve_default_branch(&owner, &name)
            .await
            .context("Failed to resolve default branch")?,
    };
    info!("Tracking {}/{} on branch {}", owner, name, branch);

    let store = open_store(config).await?;
    let repo = store
        .create(NewRepository {
            owner,
            name,
            branch,
            docs_path: docs_path.to_string(),
            extensions,
        })
        .await?;

    println!(
        "{}",
        format_success(&format!("Tracking {} as id {}", repo.full_name(), repo.id))
    );

    if skip_initial_sync {
        println!("{}", format_info("Initial sync skipped"));
        return Ok(());
    }

    let engine = SyncEngine::new(store, client);
    match engine.run_one(repo.id).await {
        Ok(outcome) => println!(
            "{}",
            format_success(&format!(
                "Initial sync aggregated {} files ({} bytes)",
                outcome.files_aggregated, outcome.document_bytes
            ))
        ),
        Err(err) => println!(
            "{}",
            format_error(&format!("Initial sync failed: {}", err))
        ),
    }

    Ok(())
}

async fn cmd_list(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let summaries = store.list().await?;

    if summaries.is_empty() {
        println!("{}", format_info("No repositories tracked"));
        return Ok(());
    }

    for summary in summaries {
        let synced = summary
            .last_synced_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "[{}] {}/{} '{}' ({}) status: {} last synced: {}",
            summary.id,
            summary.owner,
            summary.name,
            summary.docs_path,
            summary.extensions,
            summary.last_sync_status,
            synced
        );
        if let Some(error) = summary.last_sync_error {
            println!("     {}", format_error(&error));
        }
    }

    Ok(())
}

async fn cmd_show(config: &Config, id: i64) -> Result<()> {
    let store = open_store(config).await?;
    let repo = store.get(id).await?;

    println!("Repository:  {}", repo.full_name());
    println!("Branch:      {}", repo.branch);
    println!("Docs path:   {}", repo.docs_path);
    println!("Extensions:  {}", repo.extensions);
    println!("Status:      {}", repo.last_sync_status);
    if let Some(error) = &repo.last_sync_error {
        println!("Last error:  {}", error);
    }
    if let Some(synced) = repo.last_synced_at {
        println!("Last synced: {}", synced.to_rfc3339());
    }
    let bytes = repo.aggregated_content.as_ref().map(|c| c.len()).unwrap_or(0);
    println!("Aggregate:   {} bytes", bytes);

    Ok(())
}

async fn cmd_remove(config: &Config, id: i64) -> Result<()> {
    let store = open_store(config).await?;
    store.remove(id).await?;
    println!("{}", format_success(&format!("Removed repository {}", id)));
    Ok(())
}

async fn cmd_export(config: &Config, id: i64, output: PathBuf) -> Result<()> {
    let store = open_store(config).await?;
    let repo = store.get(id).await?;

    let content = repo.aggregated_content.unwrap_or_default();
    tokio::fs::write(&output, &content)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{}",
        format_success(&format!(
            "Exported {} bytes to {}",
            content.len(),
            output.display()
        ))
    );
    Ok(())
}

async fn cmd_sync(config: &Config, id: i64) -> Result<()> {
    let store = open_store(config).await?;
    let client = github_client(config)?;
    let engine = SyncEngine::new(store, client);

    let outcome = engine.run_one(id).await?;
    println!(
        "{}",
        format_success(&format!(
            "Synced repository {}: {} of {} discovered files aggregated ({} bytes, sha256 {})",
            outcome.repository_id,
            outcome.files_aggregated,
            outcome.files_discovered,
            outcome.document_bytes,
            outcome.content_hash
        ))
    );
    Ok(())
}

async fn cmd_sync_all(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let client = github_client(config)?;
    let engine = Arc::new(SyncEngine::new(store.clone(), client));
    let driver = FleetDriver::new(engine, store, config.sync.parallel_workers);

    let stats = driver.run_all().await;
    println!(
        "{}",
        format_info(&format!(
            "Fleet sync: {} dispatched, {} succeeded, {} failed, {} skipped",
            stats.dispatched, stats.succeeded, stats.failed, stats.skipped_in_progress
        ))
    );
    Ok(())
}

async fn cmd_watch(config: &Config, interval_override: Option<u64>) -> Result<()> {
    let store = open_store(config).await?;
    let client = github_client(config)?;
    let engine = Arc::new(SyncEngine::new(store.clone(), client));
    let driver = FleetDriver::new(engine, store, config.sync.parallel_workers);

    let interval_secs = interval_override.unwrap_or(config.sync.interval_secs).max(1);
    info!("Watching fleet every {}s; press Ctrl-C to stop", interval_secs);

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        interval.tick().await;
        let stats = driver.run_all().await;
        info!(
            "Batch complete: {} succeeded, {} failed, {} skipped",
            stats.succeeded, stats.failed, stats.skipped_in_progress
        );
    }
}
