use deployer_core::result::ReportError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

pub type Result<T, E = Error> = ::core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required input(s): {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },
    #[error("invalid input ({field}): {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("{0}")]
    Configuration(String),
    #[error("failed to reach the scheduler: {0}")]
    Transport(String),
    #[error("no such {kind}: {name}")]
    NotFound { kind: ResourceKind, name: String },
}

impl Error {
    pub fn not_found(kind: ResourceKind, name: impl ToString) -> Self {
        Self::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub fn transport(error: impl ToString) -> Self {
        Self::Transport(error.to_string())
    }

    /// Replaces every occurrence of `secret` in the error message.
    pub fn redact(self, secret: &str) -> Self {
        fn scrub(message: String, secret: &str) -> String {
            if secret.is_empty() {
                message
            } else {
                message.replace(secret, "***")
            }
        }

        match self {
            Self::Validation { .. } | Self::NotFound { .. } => self,
            Self::InvalidField { field, reason } => Self::InvalidField {
                field,
                reason: scrub(reason, secret),
            },
            Self::Configuration(message) => Self::Configuration(scrub(message, secret)),
            Self::Transport(message) => Self::Transport(scrub(message, secret)),
        }
    }
}

impl ReportError for Error {
    fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::InvalidField { .. } => "ValidationError",
            Self::Configuration(_) => "ConfigurationError",
            Self::Transport(_) => "TransportError",
            Self::NotFound { .. } => "NotFoundError",
        }
    }

    fn status(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::InvalidField { .. } => 400,
            Self::Configuration(_) => 500,
            Self::Transport(_) => 502,
            Self::NotFound { .. } => 404,
        }
    }
}

#[derive(Copy, Clone, Debug, Display, EnumString, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ResourceKind {
    Job,
    Pod,
}
