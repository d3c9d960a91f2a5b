use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error status; `message` is its `{error}` body
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
