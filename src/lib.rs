//! Generate BibTeX citations for files hosted on GitHub, derived from the
//! repository's own commit history.

extern crate base64;
extern crate chrono;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate reqwest;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate toml;

pub mod bibtex;
pub mod cite;
pub mod config;
mod github;
mod urls;
mod utils;

pub use bibtex::{BibTexEntry, CitationFields};
pub use cite::{cite, cite_url, EmptyHistory};
pub use config::{Config, GithubConfig};
pub use github::GitHub;
pub use urls::{FileUrl, MalformedUrl};

use chrono::{DateTime, Utc};
use failure::Error;

/// Something which can answer the repository, history, and content queries
/// the citation pipeline needs.
///
/// The pipeline only ever talks to this trait, so tests can swap the real
/// GitHub client out for an in-memory fake.
pub trait Provider {
    fn name(&self) -> &str;

    /// Resolve an `owner/name` slug to a repository handle.
    fn repository(&self, slug: &str) -> Result<Repository, Error>;

    /// All commits touching `path` on `branch`, newest first.
    fn commits(&self, repo: &Repository, path: &str, branch: &str)
        -> Result<Vec<Commit>, Error>;

    /// The decoded text of the file at `path` on `branch`.
    fn contents(&self, repo: &Repository, path: &str, branch: &str)
        -> Result<String, Error>;
}

/// A handle to a remote repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repository {
    pub full_name: String,
    /// The repository's canonical web URL (not the API URL).
    pub html_url: String,
    pub default_branch: String,
}

/// A single commit touching the cited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// `None` when the service can't tie the commit to an account.
    pub author: Option<Contributor>,
    pub date: DateTime<Utc>,
}

/// An account-level identity. Two contributors are the same person exactly
/// when their logins match, whatever their display names say.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Contributor {
    pub login: String,
    pub name: Option<String>,
}

impl Contributor {
    /// The name to show in the citation, preferring the real name but
    /// falling back to the login.
    pub fn display_name(&self) -> &str {
        match self.name {
            Some(ref name) => name,
            None => &self.login,
        }
    }
}
