use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use axum_client_ip::InsecureClientIp;
use crypto::CryptoError;

use crate::error::CollectorError;
use crate::http::AppState;

const ENCRYPTED_KEY_HEADER: &str = "Encrypted-Key";
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Rejects requests whose client IP falls outside the configured trusted
/// subnet. A request is always let through when no subnet is configured.
pub async fn trusted_ip(
    State(state): State<AppState>,
    InsecureClientIp(ip): InsecureClientIp,
    request: Request,
    next: Next,
) -> Response {
    if let Some(subnet) = state.trusted_subnet {
        if !subnet.contains(&ip) {
            return CollectorError::UntrustedIp.into_response();
        }
    }
    next.run(request).await
}

/// Decrypts the request body when an `Encrypted-Key` header is present,
/// replacing it with the recovered plaintext before the route handler sees
/// it. Requests without the header pass through untouched.
pub async fn decrypt(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let encrypted_key = request
        .headers()
        .get(ENCRYPTED_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    let Some(encrypted_key) = encrypted_key else {
        return next.run(request).await;
    };

    let Some(private_key) = &state.private_key else {
        return CollectorError::Crypto(CryptoError::NoKey).into_response();
    };

    let (parts, body) = request.into_parts();
    let body_bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response(),
    };
    let body_str = match std::str::from_utf8(&body_bytes) {
        Ok(s) => s,
        Err(_) => return (StatusCode::BAD_REQUEST, "request body is not valid UTF-8").into_response(),
    };

    let plaintext = match crypto::open(body_str, &encrypted_key, private_key) {
        Ok(plaintext) => plaintext,
        Err(e) => return CollectorError::Crypto(e).into_response(),
    };

    let request = Request::from_parts(parts, Body::from(plaintext));
    next.run(request).await
}
