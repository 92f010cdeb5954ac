use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrkitError {
    #[error("command failed: {command}")]
    CommandFailed { command: String, output: String },

    #[error("no configuration found: create ~/.prkit/config.json")]
    ConfigMissing,

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("no repository found matching '{0}'")]
    RepositoryNotFound(String),

    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PrkitError>;
