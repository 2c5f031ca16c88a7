//! Value records returned by the API client. Plain data, never mutated
//! after construction; rendering and orchestration share these shapes.

/// Profile data for the queried user.
#[derive(Debug, Clone)]
pub struct UserProfile {
  pub login: String,
  pub name: Option<String>,
  pub public_repos: i64,
  pub followers: i64,
  pub following: i64,
  pub profile_url: String,
}

/// One repository owned by the queried user.
#[derive(Debug, Clone)]
pub struct Repository {
  pub name: String,
  pub full_name: String,
  pub description: Option<String>,
  pub stars: i64,
  pub forks: i64,
  pub is_private: bool,
}

/// A pull request within one repository.
#[derive(Debug, Clone)]
pub struct PullRequest {
  pub number: i64,
  pub title: String,
  pub author: String,
  pub created_at: String,
  pub state: String,
  pub url: String,
}

/// A commit, from a pull request or a repository history scan. The sha is
/// already shortened to 7 chars and the message reduced to its first line
/// by the client.
#[derive(Debug, Clone)]
pub struct Commit {
  pub sha: String,
  pub message: String,
  pub author: String,
  pub date: String,
}
