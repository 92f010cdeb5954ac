pub mod assemble;
pub mod bitbucket;
pub mod branch;
pub mod changes;
pub mod checklist;
pub mod config;
pub mod describe;
pub mod error;
pub mod jira;
pub mod reviewers;
pub mod shell;
pub mod teams;

pub use error::{PrkitError, Result};
