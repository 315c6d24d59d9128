use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use metrics_model::ErrorKind;

/// The collector's boundary error type. Every crate-local error (model,
/// repository, crypto) is absorbed here and mapped onto the shared
/// `ErrorKind` vocabulary, which both the HTTP and gRPC surfaces translate
/// to their own status codes.
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error(transparent)]
    Model(#[from] metrics_model::ModelError),

    #[error(transparent)]
    Repository(#[from] repository::RepositoryError),

    #[error(transparent)]
    Crypto(#[from] crypto::CryptoError),

    #[error("hash mismatch for metric {0}")]
    InvalidHash(String),

    #[error("request originates from an untrusted network")]
    UntrustedIp,
}

impl CollectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectorError::Model(e) => e.kind(),
            CollectorError::Repository(e) => e.kind(),
            CollectorError::Crypto(e) => e.kind(),
            CollectorError::InvalidHash(_) => ErrorKind::InvalidHash,
            CollectorError::UntrustedIp => ErrorKind::UntrustedIp,
        }
    }
}

impl IntoResponse for CollectorError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::InvalidType => StatusCode::NOT_IMPLEMENTED,
            ErrorKind::InvalidValue | ErrorKind::ParseJson | ErrorKind::InvalidHash => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::ParseUri => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::UntrustedIp => StatusCode::FORBIDDEN,
            ErrorKind::Storage | ErrorKind::NoRsaKey => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

impl From<CollectorError> for tonic::Status {
    fn from(error: CollectorError) -> Self {
        let message = error.to_string();
        match error.kind() {
            ErrorKind::InvalidHash | ErrorKind::InvalidValue | ErrorKind::ParseJson => {
                tonic::Status::invalid_argument(message)
            }
            ErrorKind::InvalidType => tonic::Status::unimplemented(message),
            ErrorKind::NotFound => tonic::Status::not_found(message),
            ErrorKind::UntrustedIp => tonic::Status::permission_denied(message),
            ErrorKind::ParseUri | ErrorKind::Storage | ErrorKind::NoRsaKey => {
                tonic::Status::internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_type_maps_to_not_implemented() {
        let err = CollectorError::Model(metrics_model::ModelError::InvalidType("fruit".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[test]
    fn invalid_hash_maps_to_bad_request() {
        let err = CollectorError::InvalidHash("Dog".into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn untrusted_ip_maps_to_forbidden() {
        let response = CollectorError::UntrustedIp.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
