//! Request plumbing shared by every GitHub API call.

use std::vec::IntoIter;
use failure::{Error, ResultExt};
use reqwest::header::{qitem, Accept, Authorization, ContentType, Link, LinkValue,
                      RelationType, UserAgent};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{self, Value};

const GITHUB_MIME: &str = "application/vnd.github.v3+json";
const AGENT: &str = "repo-cite";

/// Fetch a single endpoint and deserialize its body.
pub fn get<T>(token: Option<&str>, endpoint: &str) -> Result<T, Error>
where
    for<'de> T: Deserialize<'de>,
{
    let client = Client::new();
    let (body, _next) = execute(&client, token, endpoint)?;

    Ok(body)
}

/// An iterator which lazily walks a paginated endpoint, following the
/// `Link: rel="next"` headers until the server runs out of pages.
pub struct Paginated<I>
where
    I: for<'de> Deserialize<'de>,
{
    client: Client,
    token: Option<String>,
    next_endpoint: Option<String>,
    items: IntoIter<I>,
}

impl<I> Paginated<I>
where
    for<'de> I: Deserialize<'de>,
{
    pub fn new(token: Option<&str>, endpoint: &str) -> Paginated<I> {
        Paginated {
            client: Client::new(),
            token: token.map(|t| t.to_string()),
            next_endpoint: Some(String::from(endpoint)),
            items: Vec::new().into_iter(),
        }
    }
}

impl<I> Iterator for Paginated<I>
where
    for<'de> I: Deserialize<'de>,
{
    type Item = Result<I, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.items.next() {
                return Some(Ok(item));
            }

            let endpoint = self.next_endpoint.take()?;
            let token = self.token.clone();

            match execute::<Vec<I>>(&self.client, token.as_ref().map(|t| t.as_str()), &endpoint) {
                Ok((page, next)) => {
                    self.next_endpoint = next;
                    self.items = page.into_iter();
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Send one GET request, returning the deserialized body and the endpoint of
/// the next page, if the server named one.
fn execute<T>(
    client: &Client,
    token: Option<&str>,
    endpoint: &str,
) -> Result<(T, Option<String>), Error>
where
    for<'de> T: Deserialize<'de>,
{
    debug!("Sending request to {:?}", endpoint);

    let mime_type = GITHUB_MIME.parse()?;
    let mut builder = client.get(endpoint);
    builder
        .header(ContentType::json())
        .header(UserAgent::new(String::from(AGENT)))
        .header(Accept(vec![qitem(mime_type)]));

    if let Some(token) = token {
        builder.header(Authorization(format!("token {}", token)));
    }

    let request = builder
        .build()
        .context("Generated invalid request. This is a bug.")?;

    let mut response = client.execute(request).context("Unable to send request")?;

    let status = response.status();
    debug!("Received response ({})", status);

    if !status.is_success() {
        warn!("Request to {} failed with {}", endpoint, status);

        let err = FailedRequest {
            status,
            url: endpoint.to_string(),
        };

        return Err(err.into());
    }

    let raw: Value = response.json().context("The response wasn't JSON")?;

    if log_enabled!(::log::Level::Trace) {
        for line in format!("Response Headers {:#?}", response.headers()).lines() {
            trace!("{}", line);
        }

        if let Ok(pretty) = serde_json::to_string_pretty(&raw) {
            trace!("Body:");
            for line in pretty.lines() {
                trace!("{}", line);
            }
        }
    }

    let next = response
        .headers()
        .get::<Link>()
        .and_then(next_link)
        .map(|s| s.to_string());

    let body = serde_json::from_value(raw).context("Unable to deserialize the response")?;

    Ok((body, next))
}

/// The server answered with a non-success status code.
#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "Request to {} failed with {}", url, status)]
pub struct FailedRequest {
    status: StatusCode,
    url: String,
}

fn next_link(link: &Link) -> Option<&str> {
    link.values()
        .iter()
        .filter(|v| is_next(v))
        .map(|v| v.link())
        .next()
}

fn is_next(link_value: &LinkValue) -> bool {
    link_value
        .rel()
        .map(|relations| relations.iter().any(|rel| *rel == RelationType::Next))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_next_link() {
        let src = r#"<https://api.github.com/repos/a/b/commits?page=2>; rel="next", <https://api.github.com/repos/a/b/commits?page=9>; rel="last""#;
        let link: Link = src.parse().unwrap();

        let should_be = "https://api.github.com/repos/a/b/commits?page=2";
        let got = next_link(&link).unwrap();
        assert_eq!(got, should_be);
    }

    #[test]
    fn last_page_has_no_next_link() {
        let src = r#"<https://api.github.com/repos/a/b/commits?page=1>; rel="first""#;
        let link: Link = src.parse().unwrap();

        assert_eq!(next_link(&link), None);
    }
}
