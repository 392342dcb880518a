use thiserror::Error;

use crate::adapter::RestError;

/// Failure of a single dispatch.
///
/// `UnknownEndpoint` and `UnresolvedPlaceholder` are raised before any request
/// is sent. `Transport` carries the client's error exactly as it was produced.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("endpoint `{key}` not found in API configuration")]
    UnknownEndpoint { key: String },

    #[error("endpoint `{key}` has unresolved placeholders: {}", .placeholders.join(", "))]
    UnresolvedPlaceholder {
        key: String,
        placeholders: Vec<String>,
    },

    #[error(transparent)]
    Transport(#[from] RestError),
}

impl DispatchError {
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Transport(_))
    }

    pub fn transport(&self) -> Option<&RestError> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: &'static str },

    #[error("template for endpoint `{key}` must start with '/': `{template}`")]
    InvalidTemplate { key: String, template: String },

    #[error("malformed dispatcher config: {0}")]
    Malformed(String),
}
