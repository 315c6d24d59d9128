use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("failed to parse configured crypto key: {0}")]
    CryptoKey(#[from] crypto::CryptoError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to connect to collector over gRPC: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("invalid gRPC collector address: {0}")]
    InvalidAddress(String),
}

/// Errors from a single send attempt. Never fatal to the orchestrator: every
/// variant is logged by the sender and the report tick simply tries again
/// next interval.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to seal batch: {0}")]
    Seal(#[from] crypto::CryptoError),

    #[error("HTTP transmit failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gRPC transmit failed: {0}")]
    Grpc(#[from] tonic::Status),

    #[error("collector reported an error for the batch: {0}")]
    CollectorRejected(String),
}
