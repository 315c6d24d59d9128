use thiserror::Error;

/// The shared vocabulary every component-level error maps onto at its HTTP/gRPC boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidType,
    InvalidValue,
    InvalidHash,
    ParseUri,
    ParseJson,
    NotFound,
    UntrustedIp,
    Storage,
    NoRsaKey,
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("unknown metric kind: {0}")]
    InvalidType(String),

    #[error("invalid value for metric {name}")]
    InvalidValue { name: String },

    #[error("malformed URI parameters: {0}")]
    ParseUri(String),

    #[error("malformed JSON body: {0}")]
    ParseJson(#[from] serde_json::Error),
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::InvalidType(_) => ErrorKind::InvalidType,
            ModelError::InvalidValue { .. } => ErrorKind::InvalidValue,
            ModelError::ParseUri(_) => ErrorKind::ParseUri,
            ModelError::ParseJson(_) => ErrorKind::ParseJson,
        }
    }
}
