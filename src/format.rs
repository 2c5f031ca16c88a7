//! Pure text rendering for the report. Every function returns a finished
//! block (trailing newline included); nothing here does IO or fetching.

use crate::model::{Commit, PullRequest, Repository, UserProfile};

const RULE: &str = "----------------------------------------";

/// Truncate `s` to at most `max` chars, replacing the tail with `...` when
/// it does not fit. A string of exactly `max` chars is returned unchanged.
pub fn truncate(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    return s.to_string();
  }
  let head: String = s.chars().take(max - 3).collect();
  format!("{}...", head)
}

/// Format a count with a one-decimal `k` suffix from 1000 up (1234 -> "1.2k").
pub fn format_count(n: i64) -> String {
  if n >= 1000 {
    format!("{:.1}k", n as f64 / 1000.0)
  } else {
    n.to_string()
  }
}

/// Reduce an RFC3339 timestamp to its `YYYY-MM-DD` date part.
pub fn format_date(iso: &str) -> String {
  match chrono::DateTime::parse_from_rfc3339(iso) {
    Ok(dt) => dt.format("%Y-%m-%d").to_string(),
    // API timestamps are RFC3339; anything else keeps its date prefix as-is.
    Err(_) => iso.chars().take(10).collect(),
  }
}

pub fn user_profile(p: &UserProfile) -> String {
  let mut out = String::new();
  out.push_str(&format!("GitHub User: {}\n", p.login));
  out.push_str(&format!("Name: {}\n", p.name.as_deref().unwrap_or("N/A")));
  out.push_str(&format!("Public Repos: {}\n", format_count(p.public_repos)));
  out.push_str(&format!("Followers: {}\n", format_count(p.followers)));
  out.push_str(&format!("Following: {}\n", format_count(p.following)));
  out.push_str(&format!("Profile: {}\n", p.profile_url));
  out.push('\n');
  out
}

pub fn repository_section(repo_name: &str) -> String {
  format!("{}\nRepository: {}\n{}\n", RULE, repo_name, RULE)
}

fn commit_line(c: &Commit, indent: &str) -> String {
  format!(
    "{}- {} {:<40} Author: {}\n",
    indent,
    c.sha,
    truncate(&c.message, 40),
    c.author
  )
}

/// One pull request with its (possibly empty) commit list.
pub fn pull_request(pr: &PullRequest, commits: &[Commit]) -> String {
  let state = if pr.state == "open" { "Open" } else { "Closed" };
  let mut out = String::new();
  out.push_str(&format!("{} Pull Requests:\n", state));
  out.push_str(&format!(
    "#{} {:<30} Author: {:<12} Created: {}\n",
    pr.number,
    truncate(&pr.title, 30),
    pr.author,
    format_date(&pr.created_at)
  ));

  if !commits.is_empty() {
    out.push_str("    Commits:\n");
    for c in commits {
      out.push_str(&commit_line(c, "    "));
    }
  }
  out.push('\n');
  out
}

/// Flat commit list for the commits-only report branch.
pub fn commits(list: &[Commit]) -> String {
  let mut out = String::new();
  for c in list {
    out.push_str(&commit_line(c, ""));
  }
  out.push('\n');
  out
}

/// Flat repository list.
pub fn repositories(repos: &[Repository]) -> String {
  let mut out = String::new();
  out.push_str(&format!("{}\nRepositories:\n{}\n", RULE, RULE));

  for repo in repos {
    out.push_str(&format!("{}\n", repo.name));
    if let Some(desc) = &repo.description {
      out.push_str(&format!("  {}\n", desc));
    }
    let private = if repo.is_private { " | 🔒 Private" } else { "" };
    out.push_str(&format!("  ⭐ {} | 🍴 {}{}\n", repo.stars, repo.forks, private));
    out.push('\n');
  }
  out
}

pub fn summary(total_prs: usize, total_commits: Option<usize>) -> String {
  let mut out = String::new();
  out.push_str(&format!("{}\nSummary:\n", RULE));
  out.push_str(&format!("Total PRs: {}\n", total_prs));
  if let Some(n) = total_commits {
    out.push_str(&format!("Total commits in PRs: {}\n", n));
  }
  out.push_str(&format!("{}\n", RULE));
  out
}
