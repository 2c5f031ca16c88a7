//! GitHub REST client. A `Transport` trait seam carries the raw HTTP
//! calls so the pagination/mapping logic above it can be exercised
//! against canned responses; `HttpTransport` is the real thing.
//!
//! Profile and repository-list failures are typed and propagate.
//! Pull-request and commit fetches are best-effort: any failure becomes
//! an empty list (one broken repo must not abort a multi-repo report),
//! with the skip observable through an optional hook.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::model::{Commit, PullRequest, Repository, UserProfile};

const API_ROOT: &str = "https://api.github.com";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum GithubError {
  #[error("User \"{0}\" not found on GitHub.")]
  UserNotFound(String),
  #[error("GitHub API rate limit exceeded. Please authenticate or wait before retrying.")]
  RateLimited,
  #[error("{0}")]
  Provider(String),
}

/// Raw outcome of one HTTP round trip, before domain error mapping.
#[derive(Debug)]
pub struct TransportError {
  pub status: Option<u16>,
  pub message: String,
}

pub trait Transport {
  fn get(&self, path: &str, query: &[(&str, String)]) -> Result<serde_json::Value, TransportError>;
}

pub struct HttpTransport {
  agent: ureq::Agent,
  token: Option<String>,
}

impl HttpTransport {
  pub fn new(token: Option<String>) -> Self {
    Self {
      agent: ureq::AgentBuilder::new().build(),
      token,
    }
  }
}

impl Transport for HttpTransport {
  fn get(&self, path: &str, query: &[(&str, String)]) -> Result<serde_json::Value, TransportError> {
    let url = format!("{}{}", API_ROOT, path);
    let mut req = self
      .agent
      .get(&url)
      .set("Accept", "application/vnd.github+json")
      .set("User-Agent", "agent-gh");

    if let Some(token) = &self.token {
      req = req.set("Authorization", &format!("Bearer {}", token));
    }
    for (k, v) in query {
      req = req.query(k, v);
    }

    match req.call() {
      Ok(resp) => resp.into_json::<serde_json::Value>().map_err(|e| TransportError {
        status: None,
        message: format!("invalid JSON response: {}", e),
      }),
      Err(ureq::Error::Status(code, resp)) => Err(TransportError {
        status: Some(code),
        message: format!("HTTP {} {}", code, resp.status_text()),
      }),
      Err(e) => Err(TransportError {
        status: None,
        message: e.to_string(),
      }),
    }
  }
}

/// Inclusive date-only bounds applied client-side after fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
  pub from: Option<NaiveDate>,
  pub to: Option<NaiveDate>,
}

impl DateRange {
  /// Both bounds compare against UTC midnight, so the `to` bound admits
  /// the literal date string but excludes any later time of that day.
  fn contains(&self, iso: &str) -> bool {
    let ts = match DateTime::parse_from_rfc3339(iso) {
      Ok(ts) => ts.with_timezone(&Utc),
      // Unparseable timestamps pass through unfiltered.
      Err(_) => return true,
    };

    if let Some(from) = self.from {
      if ts < midnight_utc(from) {
        return false;
      }
    }
    if let Some(to) = self.to {
      if ts > midnight_utc(to) {
        return false;
      }
    }
    true
  }
}

fn midnight_utc(d: NaiveDate) -> DateTime<Utc> {
  d.and_time(NaiveTime::MIN).and_utc()
}

// Wire shapes: only the fields the report needs.

#[derive(Deserialize)]
struct RawUser {
  login: String,
  name: Option<String>,
  #[serde(default)]
  public_repos: i64,
  #[serde(default)]
  followers: i64,
  #[serde(default)]
  following: i64,
  #[serde(default)]
  html_url: String,
}

#[derive(Deserialize)]
struct RawRepo {
  name: String,
  full_name: String,
  description: Option<String>,
  #[serde(default)]
  stargazers_count: i64,
  #[serde(default)]
  forks_count: i64,
  #[serde(default)]
  private: bool,
}

#[derive(Deserialize)]
struct RawLogin {
  login: String,
}

#[derive(Deserialize)]
struct RawPull {
  number: i64,
  title: String,
  user: Option<RawLogin>,
  created_at: String,
  state: String,
  #[serde(default)]
  html_url: String,
}

#[derive(Deserialize)]
struct RawCommitAuthor {
  name: Option<String>,
  date: Option<String>,
}

#[derive(Deserialize)]
struct RawCommitDetail {
  message: String,
  author: Option<RawCommitAuthor>,
}

#[derive(Deserialize)]
struct RawCommitItem {
  sha: String,
  commit: RawCommitDetail,
}

fn map_err(e: TransportError, context: &str) -> GithubError {
  match e.status {
    Some(403) => GithubError::RateLimited,
    _ => GithubError::Provider(format!("{}: {}", context, e.message)),
  }
}

fn map_commit(item: serde_json::Value) -> Option<Commit> {
  let raw: RawCommitItem = serde_json::from_value(item).ok()?;
  let author = raw
    .commit
    .author
    .as_ref()
    .and_then(|a| a.name.clone())
    .unwrap_or_else(|| "unknown".to_string());
  let date = raw.commit.author.as_ref().and_then(|a| a.date.clone()).unwrap_or_default();

  Some(Commit {
    sha: raw.sha.chars().take(7).collect(),
    message: raw.commit.message.lines().next().unwrap_or("").to_string(),
    author,
    date,
  })
}

/// Called with a description of the skipped fetch and the error that
/// was downgraded to an empty result.
pub type SkipHook = Box<dyn Fn(&str, &GithubError)>;

pub struct GithubClient {
  transport: Box<dyn Transport>,
  on_skip: Option<SkipHook>,
}

impl GithubClient {
  pub fn new(transport: Box<dyn Transport>) -> Self {
    Self {
      transport,
      on_skip: None,
    }
  }

  pub fn on_skip(mut self, hook: SkipHook) -> Self {
    self.on_skip = Some(hook);
    self
  }

  fn note_skip(&self, what: &str, err: &GithubError) {
    if let Some(hook) = &self.on_skip {
      hook(what, err);
    }
  }

  /// Accumulate pages of `PAGE_SIZE` until a short or empty page.
  fn collect_pages(&self, path: &str, extra: &[(&str, String)]) -> Result<Vec<serde_json::Value>, TransportError> {
    let mut items: Vec<serde_json::Value> = Vec::new();
    let mut page = 1usize;

    loop {
      let mut query: Vec<(&str, String)> = vec![("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())];
      query.extend(extra.iter().map(|(k, v)| (*k, v.clone())));

      let value = self.transport.get(path, &query)?;
      let batch = match value.as_array() {
        Some(a) => a.clone(),
        None => {
          return Err(TransportError {
            status: None,
            message: format!("unexpected response shape from {}", path),
          })
        }
      };

      let short = batch.len() < PAGE_SIZE;
      items.extend(batch);
      if short {
        break;
      }
      page += 1;
    }

    Ok(items)
  }

  pub fn user_profile(&self, username: &str) -> Result<UserProfile, GithubError> {
    let value = self
      .transport
      .get(&format!("/users/{}", username), &[])
      .map_err(|e| match e.status {
        Some(404) => GithubError::UserNotFound(username.to_string()),
        Some(403) => GithubError::RateLimited,
        _ => GithubError::Provider(format!("Failed to fetch user profile: {}", e.message)),
      })?;

    let raw: RawUser = serde_json::from_value(value)
      .map_err(|e| GithubError::Provider(format!("Failed to fetch user profile: {}", e)))?;

    Ok(UserProfile {
      login: raw.login,
      name: raw.name,
      public_repos: raw.public_repos,
      followers: raw.followers,
      following: raw.following,
      profile_url: raw.html_url,
    })
  }

  /// All repositories for a user, most-recently-updated first.
  pub fn user_repositories(&self, username: &str) -> Result<Vec<Repository>, GithubError> {
    let extra = [("sort", "updated".to_string()), ("direction", "desc".to_string())];
    let items = self
      .collect_pages(&format!("/users/{}/repos", username), &extra)
      .map_err(|e| map_err(e, "Failed to fetch repositories"))?;

    let mut repos = Vec::with_capacity(items.len());
    for item in items {
      let raw: RawRepo = serde_json::from_value(item)
        .map_err(|e| GithubError::Provider(format!("Failed to fetch repositories: {}", e)))?;
      repos.push(Repository {
        name: raw.name,
        full_name: raw.full_name,
        description: raw.description,
        stars: raw.stargazers_count,
        forks: raw.forks_count,
        is_private: raw.private,
      });
    }
    Ok(repos)
  }

  /// Pull requests for one repository, most-recently-created first,
  /// filtered to `range` during accumulation. Best-effort: any failure
  /// yields an empty list.
  pub fn repository_pull_requests(&self, owner: &str, repo: &str, range: DateRange) -> Vec<PullRequest> {
    let path = format!("/repos/{}/{}/pulls", owner, repo);
    let extra = [
      ("state", "all".to_string()),
      ("sort", "created".to_string()),
      ("direction", "desc".to_string()),
    ];

    let items = match self.collect_pages(&path, &extra) {
      Ok(items) => items,
      Err(e) => {
        let err = map_err(e, "Failed to fetch pull requests");
        self.note_skip(&format!("pull requests for {}/{}", owner, repo), &err);
        return Vec::new();
      }
    };

    let mut prs = Vec::new();
    for item in items {
      let raw: RawPull = match serde_json::from_value(item) {
        Ok(raw) => raw,
        Err(_) => continue,
      };
      if !range.contains(&raw.created_at) {
        continue;
      }
      prs.push(PullRequest {
        number: raw.number,
        title: raw.title,
        author: raw.user.map(|u| u.login).unwrap_or_else(|| "unknown".to_string()),
        created_at: raw.created_at,
        state: raw.state,
        url: raw.html_url,
      });
    }
    prs
  }

  /// Commits of one pull request, provider order. Best-effort.
  pub fn pull_request_commits(&self, owner: &str, repo: &str, number: i64) -> Vec<Commit> {
    let path = format!("/repos/{}/{}/pulls/{}/commits", owner, repo, number);

    let items = match self.collect_pages(&path, &[]) {
      Ok(items) => items,
      Err(e) => {
        let err = map_err(e, "Failed to fetch pull request commits");
        self.note_skip(&format!("commits for {}/{}#{}", owner, repo, number), &err);
        return Vec::new();
      }
    };

    items.into_iter().filter_map(map_commit).collect()
  }

  /// Commits authored by `author` in one repository, filtered to
  /// `range` on the author date. Best-effort.
  pub fn repository_commits(&self, owner: &str, repo: &str, author: &str, range: DateRange) -> Vec<Commit> {
    let path = format!("/repos/{}/{}/commits", owner, repo);
    let extra = [("author", author.to_string())];

    let items = match self.collect_pages(&path, &extra) {
      Ok(items) => items,
      Err(e) => {
        let err = map_err(e, "Failed to fetch repository commits");
        self.note_skip(&format!("commits for {}/{}", owner, repo), &err);
        return Vec::new();
      }
    };

    items
      .into_iter()
      .filter_map(map_commit)
      .filter(|c| range.contains(&c.date))
      .collect()
  }
}


#[cfg(test)]
mod tests {
  use super::mock::{page_of, status, MockTransport};
  use super::*;
  use std::cell::RefCell;
  use std::rc::Rc;

  fn repo_json(name: &str) -> serde_json::Value {
    serde_json::json!({
      "name": name,
      "full_name": format!("octocat/{}", name),
      "description": null,
      "stargazers_count": 1,
      "forks_count": 0,
      "private": false
    })
  }

  fn client(handler: impl Fn(&str, &[(&str, String)]) -> Result<serde_json::Value, TransportError> + 'static) -> GithubClient {
    GithubClient::new(Box::new(MockTransport::new(handler)))
  }

  #[test]
  fn profile_maps_fields() {
    let c = client(|path, _| {
      assert_eq!(path, "/users/octocat");
      Ok(serde_json::json!({
        "login": "octocat",
        "name": "The Octocat",
        "public_repos": 8,
        "followers": 1234,
        "following": 9,
        "html_url": "https://github.com/octocat"
      }))
    });
    let p = c.user_profile("octocat").unwrap();
    assert_eq!(p.login, "octocat");
    assert_eq!(p.name.as_deref(), Some("The Octocat"));
    assert_eq!(p.followers, 1234);
    assert_eq!(p.profile_url, "https://github.com/octocat");
  }

  #[test]
  fn profile_404_is_user_not_found() {
    let c = client(|_, _| Err(status(404)));
    let err = c.user_profile("ghost").unwrap_err();
    assert!(matches!(err, GithubError::UserNotFound(ref u) if u == "ghost"));
    assert_eq!(err.to_string(), "User \"ghost\" not found on GitHub.");
  }

  #[test]
  fn profile_403_is_rate_limited() {
    let c = client(|_, _| Err(status(403)));
    assert!(matches!(c.user_profile("octocat").unwrap_err(), GithubError::RateLimited));
  }

  #[test]
  fn profile_other_errors_wrap_message() {
    let c = client(|_, _| {
      Err(TransportError {
        status: Some(500),
        message: "HTTP 500 Internal Server Error".into(),
      })
    });
    let err = c.user_profile("octocat").unwrap_err();
    assert!(err.to_string().starts_with("Failed to fetch user profile:"));
  }

  #[test]
  fn repositories_403_is_rate_limited() {
    let c = client(|_, _| Err(status(403)));
    assert!(matches!(c.user_repositories("octocat").unwrap_err(), GithubError::RateLimited));
  }

  #[test]
  fn pagination_stops_after_short_page() {
    let transport = MockTransport::new(|_, query| {
      let page = page_of(query);
      let len = match page {
        1 | 2 => 100,
        3 => 5,
        _ => panic!("fetched past the short page"),
      };
      let items: Vec<_> = (0..len).map(|i| repo_json(&format!("r{}-{}", page, i))).collect();
      Ok(serde_json::Value::Array(items))
    });
    let counted = Rc::new(transport);
    let c = GithubClient::new(Box::new(CountingTransport(counted.clone())));
    let repos = c.user_repositories("octocat").unwrap();
    assert_eq!(repos.len(), 205);
    assert_eq!(counted.call_count(), 3);
  }

  struct CountingTransport(Rc<MockTransport>);
  impl Transport for CountingTransport {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<serde_json::Value, TransportError> {
      self.0.get(path, query)
    }
  }

  #[test]
  fn pagination_empty_first_page_is_one_call() {
    let counted = Rc::new(MockTransport::new(|_, _| Ok(serde_json::json!([]))));
    let c = GithubClient::new(Box::new(CountingTransport(counted.clone())));
    let repos = c.user_repositories("octocat").unwrap();
    assert!(repos.is_empty());
    assert_eq!(counted.call_count(), 1);
  }

  fn pr_json(number: i64, created_at: &str) -> serde_json::Value {
    serde_json::json!({
      "number": number,
      "title": format!("PR {}", number),
      "user": { "login": "alice" },
      "created_at": created_at,
      "state": "open",
      "html_url": format!("https://github.com/o/r/pull/{}", number)
    })
  }

  #[test]
  fn pull_request_date_filter_bounds() {
    let c = client(|_, _| {
      Ok(serde_json::json!([
        pr_json(1, "2024-01-01T00:00:00Z"), // at the from bound: kept
        pr_json(2, "2024-01-15T12:00:00Z"), // inside: kept
        pr_json(3, "2024-01-31T00:00:00Z"), // at the to midnight: kept
        pr_json(4, "2024-01-31T08:00:00Z"), // past midnight of the to date: dropped
        pr_json(5, "2023-12-31T23:59:59Z"), // before the from bound: dropped
      ]))
    });
    let range = DateRange {
      from: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
      to: Some(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
    };
    let prs = c.repository_pull_requests("o", "r", range);
    let numbers: Vec<i64> = prs.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
  }

  #[test]
  fn pull_requests_without_range_keep_everything() {
    let c = client(|_, _| Ok(serde_json::json!([pr_json(1, "2020-05-05T00:00:00Z")])));
    let prs = c.repository_pull_requests("o", "r", DateRange::default());
    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0].author, "alice");
  }

  #[test]
  fn pull_request_missing_user_is_unknown() {
    let c = client(|_, _| {
      Ok(serde_json::json!([{
        "number": 9,
        "title": "T",
        "user": null,
        "created_at": "2024-01-01T00:00:00Z",
        "state": "closed",
        "html_url": ""
      }]))
    });
    let prs = c.repository_pull_requests("o", "r", DateRange::default());
    assert_eq!(prs[0].author, "unknown");
  }

  #[test]
  fn pull_request_fetch_errors_become_empty_with_skip_note() {
    let skips: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let seen = skips.clone();
    let c = client(|_, _| Err(status(404))).on_skip(Box::new(move |what, err| {
      seen.borrow_mut().push(format!("{}: {}", what, err));
    }));

    let prs = c.repository_pull_requests("o", "gone", DateRange::default());
    assert!(prs.is_empty());
    let notes = skips.borrow();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].contains("pull requests for o/gone"));
  }

  #[test]
  fn pr_commits_shorten_sha_and_message() {
    let c = client(|path, _| {
      assert_eq!(path, "/repos/o/r/pulls/5/commits");
      Ok(serde_json::json!([
        {
          "sha": "abcdef1234567890",
          "commit": {
            "message": "First line\n\nLong body here",
            "author": { "name": "Alice", "date": "2024-01-02T00:00:00Z" }
          }
        },
        {
          "sha": "0123456789",
          "commit": { "message": "No author", "author": null }
        }
      ]))
    });
    let commits = c.pull_request_commits("o", "r", 5);
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].sha, "abcdef1");
    assert_eq!(commits[0].message, "First line");
    assert_eq!(commits[0].author, "Alice");
    assert_eq!(commits[1].author, "unknown");
  }

  #[test]
  fn pr_commit_fetch_errors_become_empty() {
    let c = client(|_, _| {
      Err(TransportError {
        status: None,
        message: "connection refused".into(),
      })
    });
    assert!(c.pull_request_commits("o", "r", 1).is_empty());
  }

  #[test]
  fn repository_commits_query_and_filter() {
    let c = client(|path, query| {
      assert_eq!(path, "/repos/octocat/r/commits");
      assert!(query.iter().any(|(k, v)| *k == "author" && v == "octocat"));
      Ok(serde_json::json!([
        {
          "sha": "aaaaaaa1111",
          "commit": { "message": "in range", "author": { "name": "O", "date": "2024-06-10T09:00:00Z" } }
        },
        {
          "sha": "bbbbbbb2222",
          "commit": { "message": "too new", "author": { "name": "O", "date": "2024-07-01T09:00:00Z" } }
        }
      ]))
    });
    let range = DateRange {
      from: Some(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
      to: Some(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()),
    };
    let commits = c.repository_commits("octocat", "r", "octocat", range);
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].message, "in range");
  }

  #[test]
  fn non_array_page_is_a_provider_error() {
    let c = client(|_, _| Ok(serde_json::json!({"message": "Not Found"})));
    let err = c.user_repositories("octocat").unwrap_err();
    assert!(matches!(err, GithubError::Provider(_)));
  }

  #[test]
  fn unparseable_timestamps_pass_the_filter() {
    let range = DateRange {
      from: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
      to: None,
    };
    assert!(range.contains("not a timestamp"));
  }
}
