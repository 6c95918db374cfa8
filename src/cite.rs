//! The citation pipeline.
//!
//! Everything in here is derived from repository history: the contributor
//! list comes from ranking commit authors, the date from the newest commit
//! touching the file, and the title from the file itself (or its name).

use chrono::{Datelike, NaiveDate};
use failure::{Error, ResultExt};

use bibtex::{BibTexEntry, CitationFields};
use urls::FileUrl;
use {Commit, Contributor, Provider, Repository};

/// Cite a file from its GitHub URL.
pub fn cite_url<P: Provider>(
    provider: &P,
    url: &str,
    today: NaiveDate,
) -> Result<BibTexEntry, Error> {
    let file_url: FileUrl = url.parse()?;
    info!("Citing {} via {}", file_url, provider.name());

    let repo = provider
        .repository(&file_url.repo_slug)
        .context("Unable to resolve the repository")?;

    cite(provider, &repo, &file_url.path, Some(&file_url.branch), today)
}

/// Cite a file at a particular path in a repository.
///
/// When no branch is given the repository's default branch is used. The
/// commit history for the path is fetched once and shared by the contributor
/// ranking and the last-edit date.
pub fn cite<P: Provider>(
    provider: &P,
    repo: &Repository,
    path: &str,
    branch: Option<&str>,
    today: NaiveDate,
) -> Result<BibTexEntry, Error> {
    let branch = branch.unwrap_or(&repo.default_branch);

    let commits = provider
        .commits(repo, path, branch)
        .context("Unable to fetch the commit history")?;

    let contributors = rank_contributors(&commits);
    if contributors.is_empty() {
        return Err(EmptyHistory::new(path, branch).into());
    }

    let last_edit = last_edit_date(&commits).ok_or_else(|| EmptyHistory::new(path, branch))?;

    let title = guess_title(provider, repo, path, branch)?;
    let key = entry_key(&title, last_edit, &contributors);

    let author = contributors
        .iter()
        .map(|c| c.display_name())
        .collect::<Vec<_>>()
        .join(" and ");

    let mut fields = CitationFields::new();
    fields.insert("title", title);
    fields.insert("author", author);
    fields.insert("month", last_edit.format("%B").to_string());
    fields.insert("year", last_edit.year().to_string());
    fields.insert(
        "howpublished",
        format!("\\url{{{}/blob/{}/{}}}", repo.html_url, branch, path),
    );
    fields.insert(
        "note",
        format!(
            "Accessed on {} {}, {}.",
            today.format("%B"),
            today.day(),
            today.year()
        ),
    );

    Ok(BibTexEntry::misc(key, fields))
}

/// Deduplicate commit authors by account and rank them by commit count.
///
/// The sort is stable, so contributors with equal counts keep the order they
/// were first seen in the history. Commits the service couldn't attribute to
/// an account are skipped.
fn rank_contributors(commits: &[Commit]) -> Vec<Contributor> {
    let mut counts: Vec<(Contributor, usize)> = Vec::new();

    for commit in commits {
        let author = match commit.author {
            Some(ref author) => author,
            None => continue,
        };

        match counts.iter().position(|&(ref c, _)| c.login == author.login) {
            Some(existing) => counts[existing].1 += 1,
            None => counts.push((author.clone(), 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts.into_iter().map(|(contributor, _)| contributor).collect()
}

/// The calendar date of the newest commit touching the file.
fn last_edit_date(commits: &[Commit]) -> Option<NaiveDate> {
    commits.iter().map(|c| c.date.naive_utc().date()).max()
}

/// Guess the title of a file in a repository.
///
/// Markdown files are titled after their first heading; everything else
/// (including markdown without a heading) is titled after its filename.
fn guess_title<P: Provider>(
    provider: &P,
    repo: &Repository,
    path: &str,
    branch: &str,
) -> Result<String, Error> {
    if path.ends_with(".md") {
        let text = provider
            .contents(repo, path, branch)
            .context("Unable to fetch the file contents")?;

        if let Some(title) = markdown_title(&text) {
            return Ok(title);
        }
    }

    Ok(title_from_filename(path))
}

/// The first markdown heading, with the `#` markers and whitespace removed.
fn markdown_title(text: &str) -> Option<String> {
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            return Some(trimmed.trim_matches('#').trim().to_string());
        }
    }

    None
}

/// Turn the file name into a title.
fn title_from_filename(path: &str) -> String {
    let file_name = path.split('/').last().unwrap_or(path);
    let stem = file_name.split('.').next().unwrap_or(file_name);

    capitalize(&stem.replace('-', " ").replace('_', " "))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Name an entry after its title, last-edit year, and primary contributor.
///
/// The surname comes from the first ranked contributor with a real name. If
/// nobody has one, the top contributor's login is used whole instead.
fn entry_key(title: &str, last_edit: NaiveDate, contributors: &[Contributor]) -> String {
    let surname = contributors
        .iter()
        .filter_map(|c| c.name.as_ref())
        .filter_map(|name| name.split_whitespace().last())
        .next()
        .map(|token| token.to_lowercase());

    let surname = match surname {
        Some(surname) => surname,
        None => contributors[0].display_name().to_lowercase(),
    };

    let first_word = match title.split_whitespace().next() {
        Some(word) => word.to_lowercase(),
        None => String::new(),
    };

    format!("{}{}{}", first_word, last_edit.year(), surname)
}

#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "{} has no citable history on {}", path, branch)]
pub struct EmptyHistory {
    path: String,
    branch: String,
}

impl EmptyHistory {
    fn new(path: &str, branch: &str) -> EmptyHistory {
        EmptyHistory {
            path: path.to_string(),
            branch: branch.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    struct FakeProvider {
        commits: Vec<Commit>,
        contents: Option<String>,
    }

    impl FakeProvider {
        fn new(commits: Vec<Commit>) -> FakeProvider {
            FakeProvider {
                commits,
                contents: None,
            }
        }

        fn with_contents(commits: Vec<Commit>, contents: &str) -> FakeProvider {
            FakeProvider {
                commits,
                contents: Some(contents.to_string()),
            }
        }
    }

    impl Provider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn repository(&self, slug: &str) -> Result<Repository, Error> {
            Ok(Repository {
                full_name: slug.to_string(),
                html_url: format!("https://github.com/{}", slug),
                default_branch: String::from("master"),
            })
        }

        fn commits(
            &self,
            _repo: &Repository,
            _path: &str,
            _branch: &str,
        ) -> Result<Vec<Commit>, Error> {
            Ok(self.commits.clone())
        }

        fn contents(
            &self,
            _repo: &Repository,
            _path: &str,
            _branch: &str,
        ) -> Result<String, Error> {
            match self.contents {
                Some(ref text) => Ok(text.clone()),
                None => bail!("this test has no file contents"),
            }
        }
    }

    fn commit(login: &str, name: Option<&str>, date: &str) -> Commit {
        let date: DateTime<Utc> = date.parse().unwrap();

        Commit {
            author: Some(Contributor {
                login: login.to_string(),
                name: name.map(|n| n.to_string()),
            }),
            date,
        }
    }

    fn unattributed(date: &str) -> Commit {
        Commit {
            author: None,
            date: date.parse().unwrap(),
        }
    }

    #[test]
    fn contributors_are_ranked_by_commit_count() {
        let commits = vec![
            commit("alice", Some("Alice A"), "2023-01-01T00:00:00Z"),
            commit("bob", Some("Bob B"), "2023-01-02T00:00:00Z"),
            commit("bob", Some("Bob B"), "2023-01-03T00:00:00Z"),
        ];

        let got = rank_contributors(&commits);

        let logins: Vec<&str> = got.iter().map(|c| c.login.as_str()).collect();
        assert_eq!(logins, ["bob", "alice"]);
    }

    #[test]
    fn tied_contributors_keep_first_seen_order() {
        let commits = vec![
            commit("carol", None, "2023-01-01T00:00:00Z"),
            commit("dave", None, "2023-01-02T00:00:00Z"),
            commit("erin", None, "2023-01-03T00:00:00Z"),
        ];

        let got = rank_contributors(&commits);

        let logins: Vec<&str> = got.iter().map(|c| c.login.as_str()).collect();
        assert_eq!(logins, ["carol", "dave", "erin"]);
    }

    #[test]
    fn unattributed_commits_are_ignored_by_ranking() {
        let commits = vec![
            unattributed("2023-01-01T00:00:00Z"),
            commit("alice", None, "2023-01-02T00:00:00Z"),
        ];

        let got = rank_contributors(&commits);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].login, "alice");
    }

    #[test]
    fn last_edit_is_the_newest_commit_date() {
        let commits = vec![
            commit("alice", None, "2021-06-30T23:59:00Z"),
            commit("alice", None, "2023-04-01T10:30:00Z"),
            commit("alice", None, "2022-12-25T08:00:00Z"),
        ];

        let got = last_edit_date(&commits).unwrap();

        assert_eq!(got, NaiveDate::from_ymd(2023, 4, 1));
    }

    #[test]
    fn markdown_titles_come_from_the_first_heading() {
        let text = "intro text\n# My Title\nmore text";

        let got = markdown_title(text).unwrap();

        assert_eq!(got, "My Title");
    }

    #[test]
    fn markdown_without_a_heading_has_no_title() {
        assert_eq!(markdown_title("just some prose\n\nno headings here"), None);
    }

    #[test]
    fn filenames_turn_into_titles() {
        assert_eq!(title_from_filename("some-notes_file.txt"), "Some notes file");
        assert_eq!(title_from_filename("docs/Getting-Started.tar.gz"), "Getting started");
        assert_eq!(title_from_filename("README"), "Readme");
    }

    #[test]
    fn keys_use_the_first_real_surname() {
        let contributors = vec![Contributor {
            login: String::from("ada"),
            name: Some(String::from("Ada Lovelace")),
        }];

        let got = entry_key("My Title", NaiveDate::from_ymd(2023, 5, 17), &contributors);

        assert_eq!(got, "my2023lovelace");
    }

    #[test]
    fn keys_fall_back_to_the_top_login() {
        let contributors = vec![
            Contributor {
                login: String::from("octocat"),
                name: None,
            },
            Contributor {
                login: String::from("hubot"),
                name: None,
            },
        ];

        let got = entry_key("Spoon Knife", NaiveDate::from_ymd(2020, 1, 2), &contributors);

        assert_eq!(got, "spoon2020octocat");
    }

    #[test]
    fn cite_assembles_the_fields_in_order() {
        let provider = FakeProvider::with_contents(
            vec![
                commit("ada", Some("Ada Lovelace"), "2023-04-01T10:30:00Z"),
                commit("ada", Some("Ada Lovelace"), "2023-03-30T09:00:00Z"),
            ],
            "intro text\n# My Title\nmore text",
        );
        let repo = provider.repository("ada/notes").unwrap();
        let today = NaiveDate::from_ymd(2023, 6, 5);

        let entry = cite(&provider, &repo, "docs/my-title.md", Some("master"), today).unwrap();

        assert_eq!(entry.key, "my2023lovelace");
        assert_eq!(entry.kind(), "misc");

        let names: Vec<&str> = entry.fields.iter().map(|&(ref n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            ["title", "author", "month", "year", "howpublished", "note"]
        );

        assert_eq!(entry.fields.get("title"), Some("My Title"));
        assert_eq!(entry.fields.get("author"), Some("Ada Lovelace"));
        assert_eq!(entry.fields.get("month"), Some("April"));
        assert_eq!(entry.fields.get("year"), Some("2023"));
        assert_eq!(
            entry.fields.get("howpublished"),
            Some("\\url{https://github.com/ada/notes/blob/master/docs/my-title.md}")
        );
        assert_eq!(entry.fields.get("note"), Some("Accessed on June 5, 2023."));
    }

    #[test]
    fn authors_are_joined_with_and() {
        let provider = FakeProvider::new(vec![
            commit("ada", Some("Ada Lovelace"), "2023-01-01T00:00:00Z"),
            commit("ada", Some("Ada Lovelace"), "2023-01-02T00:00:00Z"),
            commit("grace", Some("Grace Hopper"), "2023-01-03T00:00:00Z"),
        ]);
        let repo = provider.repository("ada/notes").unwrap();

        let entry = cite(
            &provider,
            &repo,
            "notes.txt",
            None,
            NaiveDate::from_ymd(2023, 2, 3),
        ).unwrap();

        assert_eq!(
            entry.fields.get("author"),
            Some("Ada Lovelace and Grace Hopper")
        );
    }

    #[test]
    fn non_markdown_paths_never_fetch_contents() {
        // The fake errors on any contents call, so citing a text file only
        // works if the pipeline skips the fetch.
        let provider = FakeProvider::new(vec![commit(
            "ada",
            None,
            "2023-01-01T00:00:00Z",
        )]);
        let repo = provider.repository("ada/notes").unwrap();

        let entry = cite(
            &provider,
            &repo,
            "some-notes_file.txt",
            Some("master"),
            NaiveDate::from_ymd(2023, 2, 3),
        ).unwrap();

        assert_eq!(entry.fields.get("title"), Some("Some notes file"));
    }

    #[test]
    fn markdown_without_a_heading_falls_back_to_the_filename() {
        let provider = FakeProvider::with_contents(
            vec![commit("ada", None, "2023-01-01T00:00:00Z")],
            "no headings in here",
        );
        let repo = provider.repository("ada/notes").unwrap();

        let entry = cite(
            &provider,
            &repo,
            "design-notes.md",
            Some("master"),
            NaiveDate::from_ymd(2023, 2, 3),
        ).unwrap();

        assert_eq!(entry.fields.get("title"), Some("Design notes"));
    }

    #[test]
    fn empty_history_is_an_explicit_error() {
        let provider = FakeProvider::new(Vec::new());
        let repo = provider.repository("ada/notes").unwrap();

        let err = cite(
            &provider,
            &repo,
            "notes.txt",
            Some("master"),
            NaiveDate::from_ymd(2023, 2, 3),
        ).unwrap_err();

        assert!(err.downcast_ref::<EmptyHistory>().is_some());
    }

    #[test]
    fn history_with_only_unattributed_commits_is_empty_too() {
        let provider = FakeProvider::new(vec![unattributed("2023-01-01T00:00:00Z")]);
        let repo = provider.repository("ada/notes").unwrap();

        let err = cite(
            &provider,
            &repo,
            "notes.txt",
            Some("master"),
            NaiveDate::from_ymd(2023, 2, 3),
        ).unwrap_err();

        assert!(err.downcast_ref::<EmptyHistory>().is_some());
    }

    #[test]
    fn cite_url_parses_and_cites() {
        let provider = FakeProvider::new(vec![commit(
            "ada",
            Some("Ada Lovelace"),
            "2023-04-01T10:30:00Z",
        )]);

        let entry = cite_url(
            &provider,
            "https://github.com/ada/notes/blob/main/some-notes_file.txt",
            NaiveDate::from_ymd(2023, 6, 5),
        ).unwrap();

        assert_eq!(entry.key, "some2023lovelace");
        assert_eq!(
            entry.fields.get("howpublished"),
            Some("\\url{https://github.com/ada/notes/blob/main/some-notes_file.txt}")
        );
    }
}
