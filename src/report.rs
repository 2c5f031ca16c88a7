//! Report orchestration: which fetches to run for the selected flags,
//! in order, writing rendered blocks as results arrive. The profile is
//! always fetched first; the repository list is fetched once and shared
//! by every branch. PR totals are accumulated during the render loop
//! rather than refetched for the summary.

use std::io::Write;

use anyhow::Result;

use crate::cli::EffectiveConfig;
use crate::format;
use crate::github::{DateRange, GithubClient};

pub fn run_report(client: &GithubClient, out: &mut dyn Write, cfg: &EffectiveConfig) -> Result<()> {
  writeln!(out, "Fetching GitHub data...\n")?;

  let profile = client.user_profile(&cfg.username)?;
  out.write_all(format::user_profile(&profile).as_bytes())?;

  let range = DateRange {
    from: cfg.from,
    to: cfg.to,
  };

  // normalize() guarantees at least one flag is set, and every branch
  // walks the repository list.
  let repos = client.user_repositories(&cfg.username)?;

  if cfg.commits && !cfg.prs && !cfg.repos {
    // Commits only: repository history authored by the user, no PR indirection.
    for repo in &repos {
      let commits = client.repository_commits(&cfg.username, &repo.name, &cfg.username, range);
      if commits.is_empty() {
        continue;
      }
      out.write_all(format::repository_section(&repo.name).as_bytes())?;
      out.write_all(format::commits(&commits).as_bytes())?;
    }
  } else if cfg.prs {
    let mut total_prs = 0usize;
    let mut total_commits = 0usize;

    for repo in &repos {
      let prs = client.repository_pull_requests(&cfg.username, &repo.name, range);
      if prs.is_empty() {
        continue;
      }
      out.write_all(format::repository_section(&repo.name).as_bytes())?;
      total_prs += prs.len();

      for pr in &prs {
        let commits = if cfg.commits {
          client.pull_request_commits(&cfg.username, &repo.name, pr.number)
        } else {
          Vec::new()
        };
        total_commits += commits.len();
        out.write_all(format::pull_request(pr, &commits).as_bytes())?;
      }
    }

    let commit_total = cfg.commits.then_some(total_commits);
    out.write_all(format::summary(total_prs, commit_total).as_bytes())?;
  } else if cfg.repos {
    out.write_all(format::repositories(&repos).as_bytes())?;
  }

  Ok(())
}
