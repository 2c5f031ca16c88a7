//! Token resolution: GITHUB_TOKEN env var, then the `gh` CLI (with an
//! interactive consent question), then anonymous with a warning. Never
//! fails; every subprocess or IO hiccup degrades to `None`.

use std::io::{BufRead, Write};
use std::process::Command;

/// Sink for the resolver's human-readable progress lines. The caller
/// decides where they go; the binary wires stderr.
pub trait Progress {
  fn info(&self, msg: &str);
  fn warn(&self, msg: &str);
}

/// Stderr-backed progress so the report on stdout stays clean.
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
  fn info(&self, msg: &str) {
    eprintln!("{}", msg);
  }

  fn warn(&self, msg: &str) {
    eprintln!("{}", msg);
  }
}

/// Resolve a token, asking on stdin before borrowing gh credentials.
pub fn resolve_token(progress: &dyn Progress) -> Option<String> {
  resolve_token_with(progress, &mut prompt_use_gh)
}

/// Same flow with the consent answer injected.
pub fn resolve_token_with(progress: &dyn Progress, confirm: &mut dyn FnMut() -> bool) -> Option<String> {
  progress.info("[AUTH] Checking for GITHUB_TOKEN environment variable...");
  if let Ok(token) = std::env::var("GITHUB_TOKEN") {
    if !token.trim().is_empty() {
      progress.info("[AUTH] Using GITHUB_TOKEN environment variable for authentication");
      return Some(token);
    }
  }

  progress.info("[AUTH] GITHUB_TOKEN environment variable not found");
  progress.info("[AUTH] Checking for gh CLI authentication...");

  if gh_installed() {
    progress.info("[AUTH] GitHub CLI (gh) is installed");
    progress.info("[AUTH] Would you like to use gh CLI credentials for authentication?");
    progress.info("[AUTH] This will use your existing gh authentication.");

    if confirm() {
      if let Some(token) = gh_auth_token() {
        progress.info("[AUTH] Using gh CLI credentials for authentication");
        return Some(token);
      }
    } else {
      progress.info("[AUTH] Skipping gh CLI authentication");
    }
  }

  progress.warn("[AUTH] ⚠ Warning: No authentication found. Using unauthenticated requests.");
  progress.warn("[AUTH] Rate limit: 60 requests/hour (vs 5000 with authentication)");
  progress.warn(
    "[AUTH] To authenticate, either:\n    - Set GITHUB_TOKEN environment variable\n    - Install and authenticate with gh CLI (gh auth login)",
  );
  None
}

fn prompt_use_gh() -> bool {
  eprint!("  Use gh CLI? (y/n): ");
  let _ = std::io::stderr().flush();

  let mut answer = String::new();
  if std::io::stdin().lock().read_line(&mut answer).is_err() {
    return false;
  }
  matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn gh_installed() -> bool {
  Command::new("gh")
    .arg("--version")
    .output()
    .map(|o| o.status.success())
    .unwrap_or(false)
}

fn gh_auth_token() -> Option<String> {
  let out = Command::new("gh").args(["auth", "token"]).output().ok()?;
  if !out.status.success() {
    return None;
  }

  let token = String::from_utf8_lossy(&out.stdout).trim().to_string();
  (!token.is_empty()).then_some(token)
}
