//! One function per subcommand. Results are printed to stdout as JSON;
//! progress and logs go to stderr.

use std::io::Write;

use lode_core::{
  Category,
  draft::NewDraft,
  query::{DirectoryFilters, DirectoryQuery},
  session::Credentials,
  store::LocalStore,
};
use lode_sync::{SyncPhase, SyncProgress};
use serde::Serialize;
use serde_json::json;

use crate::app::App;

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

// ─── Directory ───────────────────────────────────────────────────────────────

pub async fn download(app: &App, category: Option<Category>) -> anyhow::Result<()> {
  let engine = app.engine();
  let mut progress = engine.progress();
  let mut printer = ProgressPrinter::default();
  let mut stderr = std::io::stderr();

  let run = async {
    match category {
      Some(category) => engine.download_category(category).await,
      None => engine.download_all().await,
    }
  };
  tokio::pin!(run);

  let result = loop {
    tokio::select! {
      result = &mut run => break result,
      Ok(()) = progress.changed() => {
        printer.print(&progress.borrow_and_update(), &mut stderr);
      }
    }
  };
  // The last update may land after the download future resolved.
  printer.print(&progress.borrow_and_update(), &mut stderr);

  print_json(&result?)
}

/// Writes one progress line per change in the overall percentage.
#[derive(Default)]
struct ProgressPrinter {
  last: Option<u8>,
}

impl ProgressPrinter {
  fn print(&mut self, progress: &SyncProgress, out: &mut impl Write) {
    if progress.phase == SyncPhase::Idle || self.last == Some(progress.overall) {
      return;
    }
    writeln!(out, "downloading… {:>3}%", progress.overall).ok();
    self.last = Some(progress.overall);
  }
}

pub struct QueryArgs {
  pub category: Category,
  pub search:   Option<String>,
  pub filters:  DirectoryFilters,
  pub page:     u32,
  pub limit:    u32,
}

pub async fn query(app: &App, args: QueryArgs) -> anyhow::Result<()> {
  let query = DirectoryQuery {
    search:  args.search,
    filters: args.filters,
    page:    args.page,
    limit:   args.limit,
  };

  match app.router().get_data(args.category, query).await {
    Ok(result) => print_json(&json!({
      "success": true,
      "source": result.source,
      "data": result.data,
      "pagination": result.pagination,
    })),
    Err(err) => {
      print_json(&json!({ "success": false, "data": [], "error": err.to_string() }))?;
      Err(err.into())
    }
  }
}

pub async fn status(app: &App) -> anyhow::Result<()> {
  let status = app.store.download_status().await?;
  let mut categories = Vec::new();
  for category in Category::ALL {
    categories.push(app.store.category_cache(category).await?);
  }
  let session = app.store.load_session().await?;

  print_json(&json!({
    "downloadStatus": status,
    "categories": categories,
    "signedInAs": session.map(|s| s.user.email),
  }))
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

pub async fn drafts_list(app: &App) -> anyhow::Result<()> {
  let session = app.sessions().require().await?;
  let listings = app.drafts().list_all(session.reporter_id()).await?;
  print_json(&listings)
}

pub async fn drafts_sync(app: &App) -> anyhow::Result<()> {
  let report = app.drafts().sync_signed_in().await?;
  print_json(&report)
}

pub async fn drafts_create(
  app: &App,
  report_type: String,
  form_data: Option<String>,
  attachments: Vec<String>,
) -> anyhow::Result<()> {
  let session = app.sessions().require().await?;
  let form_data = match form_data {
    Some(raw) => serde_json::from_str(&raw)?,
    None => serde_json::Value::Object(Default::default()),
  };
  let draft = app
    .drafts()
    .save(NewDraft {
      report_type,
      reporter_id: session.reporter_id().to_owned(),
      form_data,
      attachments,
    })
    .await?;
  print_json(&draft)
}

pub async fn drafts_delete(app: &App, id: &str) -> anyhow::Result<()> {
  app.drafts().delete(id).await?;
  eprintln!("deleted {id}");
  Ok(())
}

// ─── Session ─────────────────────────────────────────────────────────────────

pub async fn login(app: &App, email: String, password: String) -> anyhow::Result<()> {
  let session = app.sessions().login(&Credentials { email, password }).await?;
  eprintln!("signed in as {}", session.user.email);
  Ok(())
}

pub async fn logout(app: &App) -> anyhow::Result<()> {
  app.sessions().logout().await?;
  app.client.set_token(None);
  eprintln!("signed out");
  Ok(())
}
