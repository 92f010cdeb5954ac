//! Bitbucket 2.0 API client: repository lookup, branch commits, pull-request
//! creation, and checklist comments.
//!
//! In dry-run mode `create_pull_request` fabricates a response with
//! placeholder identifiers and never touches the network, and
//! `create_comment` is a no-op.

use serde::{Deserialize, Serialize};

use crate::config::BitbucketAuth;
use crate::error::{PrkitError, Result};
use crate::teams::User;

pub const DEFAULT_API_BASE: &str = "https://api.bitbucket.org/2.0";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything needed to submit a pull request. Owned by the assembler until
/// submission.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequestDraft {
    pub owner: String,
    pub title: String,
    pub repository_slug: String,
    pub source_branch: String,
    pub destination_branch: String,
    pub reviewers: Vec<User>,
    pub description: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// The created (or fabricated) pull request, reduced to what the comment
/// endpoint and reporting need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedPullRequest {
    pub id: String,
    /// Browsable URL; absent in dry-run.
    pub url: Option<String>,
    /// Workspace part of the source repository's full name.
    pub workspace: String,
    /// Source repository identifier used by the comments endpoint.
    pub repository: String,
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// Wire formats
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
}

#[derive(Deserialize)]
struct CommitEntry {
    message: String,
}

#[derive(Deserialize)]
struct PullRequestResponse {
    id: u64,
    #[serde(default)]
    links: Option<PullRequestLinks>,
    source: SourceRef,
}

#[derive(Deserialize)]
struct PullRequestLinks {
    html: Option<Link>,
}

#[derive(Deserialize)]
struct Link {
    href: String,
}

#[derive(Deserialize)]
struct SourceRef {
    repository: RepositoryRef,
}

#[derive(Deserialize)]
struct RepositoryRef {
    full_name: String,
    uuid: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct BitbucketClient {
    base_url: String,
    auth: BitbucketAuth,
    http: reqwest::blocking::Client,
}

impl BitbucketClient {
    pub fn new(auth: BitbucketAuth) -> Self {
        Self::with_base_url(auth, DEFAULT_API_BASE)
    }

    pub fn with_base_url(auth: BitbucketAuth, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Basic auth by default; bearer auth when a token is configured.
    fn authed(&self, builder: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.auth.token {
            Some(token) => builder.bearer_auth(token),
            None => builder.basic_auth(&self.auth.username, self.auth.password.as_deref()),
        }
    }

    pub fn repositories(&self, owner: &str, query: &str) -> Result<Vec<Repository>> {
        let url = format!("{}/repositories/{owner}", self.base_url);
        let response = self
            .authed(self.http.get(&url).query(&[("q", query)]))
            .send()?;
        let page: Page<Repository> = check(response)?.json()?;
        Ok(page.values)
    }

    /// Slug of the first repository whose name matches `project_name`.
    pub fn repository_slug(&self, owner: &str, project_name: &str) -> Result<Option<String>> {
        let query = format!("(name = \"{project_name}\")");
        Ok(self
            .repositories(owner, &query)?
            .into_iter()
            .next()
            .map(|repository| repository.slug))
    }

    /// Commit messages on `source_branch` not yet on `destination_branch`.
    pub fn commit_messages(
        &self,
        owner: &str,
        repository_slug: &str,
        source_branch: &str,
        destination_branch: &str,
    ) -> Result<Vec<String>> {
        let url = format!("{}/repositories/{owner}/{repository_slug}/commits", self.base_url);
        let response = self
            .authed(
                self.http
                    .get(&url)
                    .query(&[("include", source_branch), ("exclude", destination_branch)]),
            )
            .send()?;
        let page: Page<CommitEntry> = check(response)?.json()?;
        Ok(page.values.into_iter().map(|commit| commit.message).collect())
    }

    pub fn create_pull_request(&self, draft: &PullRequestDraft) -> Result<CreatedPullRequest> {
        if draft.dry_run {
            return Ok(CreatedPullRequest {
                id: ":fake-id:".to_string(),
                url: None,
                workspace: ":fake-repository-name:".to_string(),
                repository: ":fake-repository-uuid:".to_string(),
                dry_run: true,
            });
        }

        let body = serde_json::json!({
            "title": draft.title,
            "description": draft.description,
            "reviewers": draft
                .reviewers
                .iter()
                .map(|reviewer| serde_json::json!({ "uuid": reviewer.uuid }))
                .collect::<Vec<_>>(),
            "source": { "branch": { "name": draft.source_branch } },
            "destination": { "branch": { "name": draft.destination_branch } },
        });

        let url = format!(
            "{}/repositories/{}/{}/pullrequests",
            self.base_url, draft.owner, draft.repository_slug
        );
        let response = self.authed(self.http.post(&url).json(&body)).send()?;
        let created: PullRequestResponse = check(response)?.json()?;

        let full_name = created.source.repository.full_name;
        let workspace = full_name
            .split('/')
            .next()
            .unwrap_or(full_name.as_str())
            .to_string();
        Ok(CreatedPullRequest {
            id: created.id.to_string(),
            url: created.links.and_then(|links| links.html).map(|link| link.href),
            workspace,
            repository: created.source.repository.uuid,
            dry_run: false,
        })
    }

    /// Post a comment on a created pull request. Dry-run simulates.
    pub fn create_comment(
        &self,
        pull_request: &CreatedPullRequest,
        text: &str,
        dry_run: bool,
    ) -> Result<()> {
        if dry_run || pull_request.dry_run {
            return Ok(());
        }
        let url = format!(
            "{}/repositories/{}/{}/pullrequests/{}/comments",
            self.base_url, pull_request.workspace, pull_request.repository, pull_request.id
        );
        let body = serde_json::json!({ "content": { "raw": text } });
        let response = self.authed(self.http.post(&url).json(&body)).send()?;
        check(response)?;
        Ok(())
    }
}

fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(PrkitError::Api {
        status: status.as_u16(),
        body,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn auth() -> BitbucketAuth {
        BitbucketAuth {
            username: "me".to_string(),
            password: Some("s3cret".to_string()),
            token: None,
        }
    }

    fn client(server: &mockito::Server) -> BitbucketClient {
        BitbucketClient::with_base_url(auth(), server.url())
    }

    fn draft(dry_run: bool) -> PullRequestDraft {
        PullRequestDraft {
            owner: "acme".to_string(),
            title: "Mk 101 Fix Header".to_string(),
            repository_slug: "widget".to_string(),
            source_branch: "MK-101-fix-header".to_string(),
            destination_branch: "master".to_string(),
            reviewers: vec![User {
                display_name: "Alice Smith".to_string(),
                username: "alice".to_string(),
                uuid: "u-1".to_string(),
            }],
            description: "### Commits:\n* fix".to_string(),
            dry_run,
        }
    }

    #[test]
    fn repository_slug_queries_by_name() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/repositories/acme")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                r#"(name = "widget")"#.into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"values": [{"slug": "widget", "name": "widget"}]}"#)
            .create();

        let slug = client(&server).repository_slug("acme", "widget").unwrap();
        assert_eq!(slug.as_deref(), Some("widget"));
        mock.assert();
    }

    #[test]
    fn repository_slug_is_none_when_nothing_matches() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/repositories/acme")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"values": []}"#)
            .create();
        assert!(client(&server)
            .repository_slug("acme", "missing")
            .unwrap()
            .is_none());
    }

    #[test]
    fn commit_messages_use_include_exclude() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/repositories/acme/widget/commits")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("include".into(), "feature-x".into()),
                Matcher::UrlEncoded("exclude".into(), "master".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"values": [{"message": "first"}, {"message": "second\nbody"}]}"#)
            .create();

        let messages = client(&server)
            .commit_messages("acme", "widget", "feature-x", "master")
            .unwrap();
        assert_eq!(messages, vec!["first", "second\nbody"]);
        mock.assert();
    }

    #[test]
    fn create_pull_request_posts_the_draft() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/repositories/acme/widget/pullrequests")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "title": "Mk 101 Fix Header",
                "reviewers": [{"uuid": "u-1"}],
                "source": {"branch": {"name": "MK-101-fix-header"}},
                "destination": {"branch": {"name": "master"}},
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "id": 7,
                    "links": {"html": {"href": "https://bitbucket.org/acme/widget/pull-requests/7"}},
                    "source": {"repository": {"full_name": "acme/widget", "uuid": "{repo-uuid}"}}
                }"#,
            )
            .create();

        let created = client(&server).create_pull_request(&draft(false)).unwrap();
        assert_eq!(created.id, "7");
        assert_eq!(
            created.url.as_deref(),
            Some("https://bitbucket.org/acme/widget/pull-requests/7")
        );
        assert_eq!(created.workspace, "acme");
        assert_eq!(created.repository, "{repo-uuid}");
        assert!(!created.dry_run);
        mock.assert();
    }

    #[test]
    fn dry_run_fabricates_without_touching_the_network() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/repositories/acme/widget/pullrequests")
            .expect(0)
            .create();

        let created = client(&server).create_pull_request(&draft(true)).unwrap();
        assert_eq!(created.id, ":fake-id:");
        assert_eq!(created.workspace, ":fake-repository-name:");
        assert_eq!(created.repository, ":fake-repository-uuid:");
        assert!(created.dry_run);
        assert!(created.url.is_none());
        mock.assert();
    }

    #[test]
    fn create_comment_posts_to_the_request() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/repositories/acme/%7Brepo-uuid%7D/pullrequests/7/comments")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "content": {"raw": "### Review Checklist: Accessibility\n  * Check images have alt tags"}
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create();

        let created = CreatedPullRequest {
            id: "7".to_string(),
            url: None,
            workspace: "acme".to_string(),
            repository: "{repo-uuid}".to_string(),
            dry_run: false,
        };
        client(&server)
            .create_comment(
                &created,
                "### Review Checklist: Accessibility\n  * Check images have alt tags",
                false,
            )
            .unwrap();
        mock.assert();
    }

    #[test]
    fn create_comment_is_a_noop_in_dry_run() {
        let server = mockito::Server::new();
        let created = CreatedPullRequest {
            id: ":fake-id:".to_string(),
            url: None,
            workspace: ":fake-repository-name:".to_string(),
            repository: ":fake-repository-uuid:".to_string(),
            dry_run: true,
        };
        client(&server).create_comment(&created, "text", true).unwrap();
    }

    #[test]
    fn non_success_responses_become_api_errors() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/repositories/acme")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("forbidden")
            .create();

        let error = client(&server).repositories("acme", "(q)").unwrap_err();
        match error {
            PrkitError::Api { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
