//! User configuration.
//!
//! Two JSON files in the user's home directory are shallow-merged, with the
//! credentials file winning on key conflicts:
//!
//!   ~/.prkit/config.json       hosts, defaults, teams URL (safe to share)
//!   ~/.prkit/credentials.json  usernames, passwords, tokens

use crate::error::{PrkitError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const CONFIG_FILE: &str = ".prkit/config.json";
pub const CREDENTIALS_FILE: &str = ".prkit/credentials.json";

// ---------------------------------------------------------------------------
// Auth sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitbucketAuth {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// When set, requests use bearer auth instead of basic auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraAuth {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitbucket: Option<BitbucketAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl Config {
    /// Load and merge the per-user config and credentials files. With
    /// `required`, an entirely empty result is an error.
    pub fn load(required: bool) -> Result<Self> {
        let home = home::home_dir().ok_or(PrkitError::HomeNotFound)?;
        Self::from_files(&home.join(CONFIG_FILE), &home.join(CREDENTIALS_FILE), required)
    }

    pub fn from_files(config_path: &Path, credentials_path: &Path, required: bool) -> Result<Self> {
        let merged = merge_objects(read_object(config_path)?, read_object(credentials_path)?);
        if required && merged.is_empty() {
            return Err(PrkitError::ConfigMissing);
        }
        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    /// The Bitbucket section, required for anything that talks to the
    /// hosting API.
    pub fn bitbucket(&self) -> Result<&BitbucketAuth> {
        self.bitbucket
            .as_ref()
            .ok_or_else(|| PrkitError::MissingCredentials("bitbucket".to_string()))
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let data = std::fs::read_to_string(path)?;
    if data.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(&data)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn merge_objects(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in overlay {
        base.insert(key, value);
    }
    base
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn merges_config_and_credentials() {
        let dir = TempDir::new().unwrap();
        let config = write(
            &dir,
            "config.json",
            r#"{"owner": "acme", "teamsUrl": "https://example.com/teams.json"}"#,
        );
        let credentials = write(
            &dir,
            "credentials.json",
            r#"{"bitbucket": {"username": "me", "password": "s3cret"}}"#,
        );
        let loaded = Config::from_files(&config, &credentials, true).unwrap();
        assert_eq!(loaded.owner.as_deref(), Some("acme"));
        assert_eq!(
            loaded.teams_url.as_deref(),
            Some("https://example.com/teams.json")
        );
        assert_eq!(loaded.bitbucket().unwrap().username, "me");
    }

    #[test]
    fn credentials_win_on_conflict() {
        let dir = TempDir::new().unwrap();
        let config = write(&dir, "config.json", r#"{"owner": "from-config"}"#);
        let credentials = write(&dir, "credentials.json", r#"{"owner": "from-credentials"}"#);
        let loaded = Config::from_files(&config, &credentials, true).unwrap();
        assert_eq!(loaded.owner.as_deref(), Some("from-credentials"));
    }

    #[test]
    fn missing_files_are_an_error_when_required() {
        let dir = TempDir::new().unwrap();
        let error = Config::from_files(
            &dir.path().join("config.json"),
            &dir.path().join("credentials.json"),
            true,
        )
        .unwrap_err();
        assert!(matches!(error, PrkitError::ConfigMissing));
    }

    #[test]
    fn missing_files_are_fine_when_optional() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::from_files(
            &dir.path().join("config.json"),
            &dir.path().join("credentials.json"),
            false,
        )
        .unwrap();
        assert!(loaded.owner.is_none());
        assert!(loaded.bitbucket.is_none());
    }

    #[test]
    fn missing_bitbucket_section_is_a_typed_error() {
        let config = Config::default();
        assert!(matches!(
            config.bitbucket().unwrap_err(),
            PrkitError::MissingCredentials(_)
        ));
    }
}
