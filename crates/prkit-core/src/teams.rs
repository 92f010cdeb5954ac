//! Team roster: a remotely hosted JSON document mapping team names to member
//! lists. Fetched lazily, at most once per resolver instance.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_TEAMS_URL: &str =
    "https://prkit-automation.s3.eu-west-2.amazonaws.com/teams.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub display_name: String,
    pub username: String,
    pub uuid: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamRoster {
    pub teams: BTreeMap<String, Vec<User>>,
}

impl TeamRoster {
    pub fn fetch(url: &str) -> Result<Self> {
        let response = reqwest::blocking::get(url)?.error_for_status()?;
        Ok(response.json()?)
    }

    pub fn team(&self, name: &str) -> Option<&[User]> {
        self.teams.get(name).map(Vec::as_slice)
    }

    /// Union of every team, de-duplicated by uuid, in team iteration order.
    pub fn all(&self) -> Vec<&User> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        for members in self.teams.values() {
            for user in members {
                if seen.insert(user.uuid.as_str()) {
                    all.push(user);
                }
            }
        }
        all
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, uuid: &str) -> User {
        User {
            display_name: name.to_string(),
            username: name.to_lowercase(),
            uuid: uuid.to_string(),
        }
    }

    #[test]
    fn parses_roster_json() {
        let json = r#"{
            "core": [
                {"displayName": "Alice Smith", "username": "alice", "uuid": "u-1"}
            ],
            "web": [
                {"displayName": "Bob Jones", "username": "bob", "uuid": "u-2"}
            ]
        }"#;
        let roster: TeamRoster = serde_json::from_str(json).unwrap();
        assert_eq!(roster.team("core").unwrap()[0].username, "alice");
        assert_eq!(roster.team("web").unwrap()[0].display_name, "Bob Jones");
        assert!(roster.team("mobile").is_none());
    }

    #[test]
    fn all_deduplicates_across_teams() {
        let shared = user("Alice", "u-1");
        let mut teams = BTreeMap::new();
        teams.insert("core".to_string(), vec![shared.clone(), user("Bob", "u-2")]);
        teams.insert("web".to_string(), vec![shared, user("Carol", "u-3")]);
        let roster = TeamRoster { teams };

        let all = roster.all();
        assert_eq!(all.len(), 3);
        let uuids: Vec<_> = all.iter().map(|u| u.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["u-1", "u-2", "u-3"]);
    }

    #[test]
    fn fetch_reads_the_remote_document() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/teams.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"core": [{"displayName": "Alice", "username": "alice", "uuid": "u-1"}]}"#)
            .create();

        let roster = TeamRoster::fetch(&format!("{}/teams.json", server.url())).unwrap();
        assert_eq!(roster.team("core").unwrap().len(), 1);
        mock.assert();
    }

    #[test]
    fn fetch_surfaces_http_failures() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/teams.json")
            .with_status(500)
            .create();
        assert!(TeamRoster::fetch(&format!("{}/teams.json", server.url())).is_err());
    }
}
