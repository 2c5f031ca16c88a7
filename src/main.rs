use anyhow::Result;
use clap::Parser;

mod auth;
mod cli;
mod format;
mod github;
mod model;
mod report;

use crate::auth::ConsoleProgress;
use crate::cli::{normalize, Cli};
use crate::github::{GithubClient, HttpTransport};

fn main() -> Result<()> {
  let cli = Cli::parse();

  // Phase 1: validate and normalize flags
  let cfg = normalize(cli)?;

  // Phase 2: resolve a credential (env var -> gh CLI -> anonymous)
  let token = auth::resolve_token(&ConsoleProgress);

  // Phase 3: fetch and render
  let client = GithubClient::new(Box::new(HttpTransport::new(token)));
  let stdout = std::io::stdout();

  report::run_report(&client, &mut stdout.lock(), &cfg)
}
