//! `lode`, an operator harness for the offline-first directory client.
//!
//! # Usage
//!
//! ```
//! lode download
//! lode query hotspots --province Benguet --search itogon
//! lode --offline query national --status Operating
//! lode login --email inspector@example.gov --password secret
//! lode drafts sync
//! ```

mod app;
mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Context as _;
use app::App;
use clap::{Args, Parser, Subcommand};
use commands::QueryArgs;
use config::CliConfig;
use lode_core::{Category, query::DirectoryFilters};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lode", version, about = "Offline-first mining-permit directory client")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "lode.toml")]
  config: PathBuf,

  /// Base URL of the remote API.
  #[arg(long, global = true, env = "LODE_URL")]
  url: Option<String>,

  /// Path of the local SQLite store.
  #[arg(long, global = true)]
  store: Option<PathBuf>,

  /// Behave as if the device had no connectivity.
  #[arg(long, global = true)]
  offline: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Download the directory for offline use.
  Download {
    /// Only this category.
    #[arg(long)]
    category: Option<Category>,
  },
  /// Query one category, from the cache or the remote.
  Query(QueryCommand),
  /// Show what has been downloaded and who is signed in.
  Status,
  /// Manage report drafts.
  #[command(subcommand)]
  Drafts(DraftsCommand),
  Login {
    #[arg(long)]
    email:    String,
    #[arg(long, env = "LODE_PASSWORD")]
    password: String,
  },
  Logout,
}

#[derive(Args, Debug)]
struct QueryCommand {
  category:       Category,
  #[arg(long)]
  search:         Option<String>,
  #[arg(long)]
  province:       Option<String>,
  #[arg(long)]
  status:         Option<String>,
  #[arg(long)]
  classification: Option<String>,
  #[arg(long = "type")]
  kind:           Option<String>,
  #[arg(long, default_value_t = 1)]
  page:           u32,
  /// Page size; defaults to the configured `default_page_size`.
  #[arg(long, default_value_t = 0)]
  limit:          u32,
}

#[derive(Subcommand, Debug)]
enum DraftsCommand {
  /// Local and remote drafts of the signed-in reporter.
  List,
  /// Push unsynced drafts once.
  Sync,
  Create {
    #[arg(long)]
    report_type: String,
    /// Form payload as a JSON object.
    #[arg(long)]
    form_data:   Option<String>,
    #[arg(long = "attachment")]
    attachments: Vec<String>,
  },
  Delete {
    id: String,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // Flags override the file and environment.
  let mut cfg = CliConfig::load(&cli.config)?;
  if let Some(url) = cli.url {
    cfg.api.base_url = url;
  }
  if let Some(store) = cli.store {
    cfg.store_path = store;
  }

  let app = App::open(cfg, !cli.offline)
    .await
    .context("failed to initialise")?;

  match cli.command {
    Command::Download { category } => commands::download(&app, category).await,
    Command::Query(q) => {
      commands::query(&app, QueryArgs {
        category: q.category,
        search:   q.search,
        filters:  DirectoryFilters {
          province:       q.province,
          status:         q.status,
          classification: q.classification,
          kind:           q.kind,
        },
        page:     q.page,
        limit:    q.limit,
      })
      .await
    }
    Command::Status => commands::status(&app).await,
    Command::Drafts(DraftsCommand::List) => commands::drafts_list(&app).await,
    Command::Drafts(DraftsCommand::Sync) => commands::drafts_sync(&app).await,
    Command::Drafts(DraftsCommand::Create { report_type, form_data, attachments }) => {
      commands::drafts_create(&app, report_type, form_data, attachments).await
    }
    Command::Drafts(DraftsCommand::Delete { id }) => commands::drafts_delete(&app, &id).await,
    Command::Login { email, password } => commands::login(&app, email, password).await,
    Command::Logout => commands::logout(&app).await,
  }
}
