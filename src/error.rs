use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TokenError>;

/// Every failure the token compiler can surface.
///
/// Structural errors abort the offending document only; rule errors abort the
/// whole build. A missing mode value is not an error at all.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed variable document {path}: {reason}")]
    Structural { path: String, reason: String },
    #[error("transform '{rule}' failed for token '{token}': {message}")]
    RuleExecution {
        rule: String,
        token: String,
        message: String,
    },
    #[error("unknown transform group '{0}'")]
    UnknownTransformGroup(String),
    #[error("transform group '{group}' references unknown transform '{transform}'")]
    UnknownTransform { group: String, transform: String },
    #[error("unknown format '{0}'")]
    UnknownFormat(String),
    #[error("invalid build config: {0}")]
    Config(String),
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TokenError {
    pub fn structural(path: &str, reason: impl Into<String>) -> Self {
        Self::Structural {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
