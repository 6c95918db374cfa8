use std::fmt::{self, Debug, Formatter};
use base64;
use chrono::{DateTime, Utc};
use failure::{Error, ResultExt};

use config::GithubConfig;
use utils::{get, Paginated};
use {Commit, Contributor, Provider, Repository};

/// An interface to the repositories stored on github.
#[derive(Clone)]
pub struct GitHub {
    cfg: GithubConfig,
}

impl GitHub {
    /// Create a new `GitHub` with the provided config.
    pub fn with_config(cfg: GithubConfig) -> GitHub {
        GitHub { cfg }
    }

    /// Create a new `GitHub` talking to the public API, optionally
    /// authenticated.
    pub fn with_token(token: Option<String>) -> GitHub {
        GitHub::with_config(GithubConfig {
            token,
            ..Default::default()
        })
    }

    fn endpoint(&self, tail: &str) -> String {
        format!("{}/{}", self.cfg.api_root.trim_right_matches('/'), tail)
    }

    fn token(&self) -> Option<&str> {
        self.cfg.token.as_ref().map(|t| t.as_str())
    }
}

impl Provider for GitHub {
    fn name(&self) -> &str {
        "github"
    }

    fn repository(&self, slug: &str) -> Result<Repository, Error> {
        debug!("Fetching repository {}", slug);

        let raw: RawRepo = get(self.token(), &self.endpoint(&format!("repos/{}", slug)))
            .context("Unable to fetch the repository")?;

        Ok(Repository {
            full_name: raw.full_name,
            html_url: raw.html_url,
            default_branch: raw.default_branch,
        })
    }

    fn commits(
        &self,
        repo: &Repository,
        path: &str,
        branch: &str,
    ) -> Result<Vec<Commit>, Error> {
        debug!("Fetching commits touching {} on {}", path, branch);

        let endpoint = self.endpoint(&format!(
            "repos/{}/commits?sha={}&path={}",
            repo.full_name, branch, path
        ));

        let mut commits = Vec::new();

        for commit in Paginated::new(self.token(), &endpoint) {
            let raw: RawCommit = commit.context("Unable to fetch the commit history")?;
            commits.push(convert_commit(raw));
        }

        debug!("{} commits touch {}", commits.len(), path);
        Ok(commits)
    }

    fn contents(&self, repo: &Repository, path: &str, branch: &str) -> Result<String, Error> {
        debug!("Fetching the contents of {} at {}", path, branch);

        let endpoint = self.endpoint(&format!(
            "repos/{}/contents/{}?ref={}",
            repo.full_name, path, branch
        ));

        let raw: RawContents =
            get(self.token(), &endpoint).context("Unable to fetch the file contents")?;

        decode_contents(&raw)
    }
}

impl Debug for GitHub {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GitHub").finish()
    }
}

fn convert_commit(raw: RawCommit) -> Commit {
    let RawCommit { author, commit } = raw;
    let RawGitAuthor { name, date } = commit.author;

    // The commits endpoint doesn't carry profile names, so the git author
    // name stands in as the account's display name.
    let author = author.map(|account| Contributor {
        login: account.login,
        name: if name.is_empty() { None } else { Some(name) },
    });

    Commit { author, date }
}

fn decode_contents(raw: &RawContents) -> Result<String, Error> {
    if raw.encoding != "base64" {
        bail!("Unknown contents encoding: {}", raw.encoding);
    }

    // The API wraps the payload across multiple lines.
    let packed: String = raw.content.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = base64::decode(&packed).context("The contents weren't valid base64")?;
    let text = String::from_utf8(bytes).context("The file isn't UTF-8 text")?;

    Ok(text)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawRepo {
    full_name: String,
    html_url: String,
    default_branch: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCommit {
    author: Option<RawAccount>,
    commit: RawCommitDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawAccount {
    login: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCommitDetails {
    author: RawGitAuthor,
}

#[derive(Debug, Clone, Deserialize)]
struct RawGitAuthor {
    name: String,
    date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawContents {
    content: String,
    encoding: String,
}
