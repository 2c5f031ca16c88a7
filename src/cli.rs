use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Parser, Debug)]
#[command(
    name = "agent-gh",
    version,
    about = "GitHub Agent CLI - Fetch GitHub data and display it in text format",
    long_about = None
)]
pub struct Cli {
  /// GitHub username to query
  #[arg(long)]
  pub user: Option<String>,

  /// Fetch commits
  #[arg(long)]
  pub commits: bool,

  /// Fetch pull requests
  #[arg(long)]
  pub prs: bool,

  /// Fetch repositories
  #[arg(long)]
  pub repos: bool,

  /// Start date for commits/PRs (YYYY-MM-DD)
  #[arg(long)]
  pub from: Option<String>,

  /// End date for commits/PRs (YYYY-MM-DD)
  #[arg(long)]
  pub to: Option<String>,

  /// Output format; only text is supported
  #[arg(long, default_value = "text")]
  pub format: String,
}

/// Validated configuration the orchestrator runs from.
#[derive(Debug)]
pub struct EffectiveConfig {
  pub username: String,
  pub commits: bool,
  pub prs: bool,
  pub repos: bool,
  pub from: Option<NaiveDate>,
  pub to: Option<NaiveDate>,
}

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

fn parse_bound(flag: &str, value: &str) -> Result<NaiveDate> {
  if !DATE_RE.is_match(value) {
    bail!("--{} must be in YYYY-MM-DD format.", flag);
  }
  match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
    Ok(d) => Ok(d),
    Err(_) => bail!("--{} is not a valid calendar date.", flag),
  }
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  if cli.format != "text" {
    bail!("Only \"text\" format is currently supported.");
  }

  let Some(username) = cli.user else {
    bail!("--user <username> is required.\n\nUsage: agent-gh --user <username> [options]\nRun \"agent-gh --help\" for more information.");
  };

  let from = cli.from.as_deref().map(|v| parse_bound("from", v)).transpose()?;
  let to = cli.to.as_deref().map(|v| parse_bound("to", v)).transpose()?;

  // No selection means report everything.
  let fetch_all = !cli.commits && !cli.prs && !cli.repos;

  Ok(EffectiveConfig {
    username,
    commits: fetch_all || cli.commits,
    prs: fetch_all || cli.prs,
    repos: fetch_all || cli.repos,
    from,
    to,
  })
}
