use thiserror::Error;

use metrics_model::ErrorKind;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("no RSA key configured")]
    NoKey,

    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse RSA key: {0}")]
    KeyParse(String),

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("AES-GCM operation failed: {0}")]
    Aes(String),

    #[error("RSA-OAEP operation failed: {0}")]
    Rsa(String),

    #[error("sealed body too short to contain a nonce")]
    Truncated,
}

impl CryptoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CryptoError::NoKey => ErrorKind::NoRsaKey,
            _ => ErrorKind::Storage,
        }
    }
}
