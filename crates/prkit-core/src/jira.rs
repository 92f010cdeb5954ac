//! Jira ticket lookup.
//!
//! Lookup failures are never fatal to the pipeline: a description that cannot
//! be loaded is logged and omitted from the pull-request body.

use serde::Deserialize;

use crate::config::JiraAuth;
use crate::error::Result;

pub const DEFAULT_JIRA_HOST: &str = "jira.example.com";

pub struct JiraClient {
    base_url: String,
    auth: JiraAuth,
    http: reqwest::blocking::Client,
}

impl JiraClient {
    pub fn new(auth: JiraAuth) -> Self {
        let host = auth
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_JIRA_HOST.to_string());
        Self::with_base_url(auth, format!("https://{host}"))
    }

    pub fn with_base_url(auth: JiraAuth, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Browsable URL for a ticket identifier.
    pub fn issue_url(&self, ticket: &str) -> String {
        format!("{}/browse/{ticket}", self.base_url)
    }

    /// The ticket's description, truncated to `max_chars` when given (the
    /// trailing `...` counts toward the limit). Any failure is logged and
    /// yields `None`.
    pub fn fetch_description(&self, ticket: &str, max_chars: Option<usize>) -> Option<String> {
        match self.try_fetch_description(ticket) {
            Ok(description) => Some(match max_chars {
                Some(max) => truncate(&description, max),
                None => description,
            }),
            Err(error) => {
                tracing::warn!("failed to load ticket description for {ticket}: {error}");
                None
            }
        }
    }

    fn try_fetch_description(&self, ticket: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Issue {
            fields: Fields,
        }

        #[derive(Deserialize)]
        struct Fields {
            description: Option<String>,
        }

        let url = format!("{}/rest/api/2/issue/{ticket}", self.base_url);
        let issue: Issue = self
            .http
            .get(&url)
            .basic_auth(&self.auth.username, Some(&self.auth.password))
            .query(&[("fields", "description")])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(issue.fields.description.unwrap_or_default())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let omission = "...";
    let keep = max_chars.saturating_sub(omission.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(omission);
    truncated
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> JiraAuth {
        JiraAuth {
            username: "me".to_string(),
            password: "s3cret".to_string(),
            host: None,
        }
    }

    fn client(server: &mockito::Server) -> JiraClient {
        JiraClient::with_base_url(auth(), server.url())
    }

    #[test]
    fn issue_url_uses_the_browse_path() {
        let jira = JiraClient::new(JiraAuth {
            host: Some("jira.acme.net/jira".to_string()),
            ..auth()
        });
        assert_eq!(
            jira.issue_url("MK-101"),
            "https://jira.acme.net/jira/browse/MK-101"
        );
    }

    #[test]
    fn fetch_description_returns_the_field() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/rest/api/2/issue/MK-101")
            .match_query(mockito::Matcher::UrlEncoded(
                "fields".into(),
                "description".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"fields": {"description": "Fix the header"}}"#)
            .create();

        let description = client(&server).fetch_description("MK-101", None);
        assert_eq!(description.as_deref(), Some("Fix the header"));
        mock.assert();
    }

    #[test]
    fn fetch_description_truncates_within_the_limit() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/api/2/issue/MK-102")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"fields": {"description": "abcdefghij"}}"#)
            .create();

        let description = client(&server).fetch_description("MK-102", Some(8)).unwrap();
        assert_eq!(description, "abcde...");
        assert_eq!(description.chars().count(), 8);
    }

    #[test]
    fn short_descriptions_are_untouched() {
        assert_eq!(truncate("short", 80), "short");
    }

    #[test]
    fn fetch_description_swallows_http_failures() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/api/2/issue/MK-500")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .create();
        assert_eq!(client(&server).fetch_description("MK-500", None), None);
    }

    #[test]
    fn missing_description_field_becomes_empty() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/api/2/issue/MK-103")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"fields": {"description": null}}"#)
            .create();
        assert_eq!(
            client(&server).fetch_description("MK-103", None).as_deref(),
            Some("")
        );
    }
}
