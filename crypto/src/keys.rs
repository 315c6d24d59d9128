use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::CryptoError;

/// Loads an RSA public key from a PEM file (`PUBLIC KEY` / PKIX form). An empty
/// path means "no key configured" rather than a file-not-found error.
pub fn load_public_key(path: &str) -> Result<RsaPublicKey, CryptoError> {
    if path.is_empty() {
        return Err(CryptoError::NoKey);
    }
    let pem = std::fs::read_to_string(path).map_err(|source| CryptoError::KeyFile {
        path: path.to_owned(),
        source,
    })?;
    RsaPublicKey::from_public_key_pem(&pem).map_err(|e| CryptoError::KeyParse(e.to_string()))
}

/// Loads an RSA private key from a PEM file (`RSA PRIVATE KEY` / PKCS1 form).
pub fn load_private_key(path: &str) -> Result<RsaPrivateKey, CryptoError> {
    if path.is_empty() {
        return Err(CryptoError::NoKey);
    }
    let pem = std::fs::read_to_string(path).map_err(|source| CryptoError::KeyFile {
        path: path.to_owned(),
        source,
    })?;
    RsaPrivateKey::from_pkcs1_pem(&pem).map_err(|e| CryptoError::KeyParse(e.to_string()))
}
