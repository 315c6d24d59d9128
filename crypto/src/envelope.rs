use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng as AesOsRng};
use aes_gcm::{Aes128Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::CryptoError;

const NONCE_LEN: usize = 12;

/// A sealed request: base64url body (nonce || AES-GCM ciphertext) and a base64url
/// RSA-OAEP-wrapped AES key, carried in the `Encrypted-Key` header.
pub struct Sealed {
    pub body: String,
    pub encrypted_key: String,
}

/// Seals `plaintext` for transmission: generates a fresh AES-128 key, encrypts the
/// body with AES-GCM, and wraps the AES key with the collector's RSA public key.
pub fn seal(plaintext: &[u8], public_key: &RsaPublicKey) -> Result<Sealed, CryptoError> {
    let aes_key = Aes128Gcm::generate_key(&mut AesOsRng);
    let cipher = Aes128Gcm::new(&aes_key);
    let nonce = Aes128Gcm::generate_nonce(&mut AesOsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Aes(e.to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);

    let mut rng = rand::thread_rng();
    let encrypted_key = public_key
        .encrypt(&mut rng, Oaep::new::<Sha256>(), aes_key.as_slice())
        .map_err(|e| CryptoError::Rsa(e.to_string()))?;

    Ok(Sealed {
        body: URL_SAFE_NO_PAD.encode(sealed),
        encrypted_key: URL_SAFE_NO_PAD.encode(encrypted_key),
    })
}

/// Opens a sealed request body, given the base64url-encoded wrapped AES key from
/// the `Encrypted-Key` header and the collector's RSA private key.
pub fn open(
    body_b64: &str,
    encrypted_key_b64: &str,
    private_key: &RsaPrivateKey,
) -> Result<Vec<u8>, CryptoError> {
    let sealed = URL_SAFE_NO_PAD.decode(body_b64)?;
    let encrypted_key = URL_SAFE_NO_PAD.decode(encrypted_key_b64)?;

    let aes_key_bytes = private_key
        .decrypt(Oaep::new::<Sha256>(), &encrypted_key)
        .map_err(|e| CryptoError::Rsa(e.to_string()))?;
    let aes_key = Key::<Aes128Gcm>::from_slice(&aes_key_bytes);
    let cipher = Aes128Gcm::new(aes_key);

    if sealed.len() < NONCE_LEN {
        return Err(CryptoError::Truncated);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| CryptoError::Aes(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::EncodeRsaPrivateKey;
    use rsa::pkcs8::EncodePublicKey;

    fn test_keypair() -> (RsaPrivateKey, RsaPublicKey) {
        let mut rng = rand::thread_rng();
        let priv_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let pub_key = RsaPublicKey::from(&priv_key);
        (priv_key, pub_key)
    }

    #[test]
    fn seal_then_open_round_trips() {
        let (priv_key, pub_key) = test_keypair();
        let plaintext = b"{\"id\":\"Dog\",\"type\":\"counter\",\"delta\":3}";

        let sealed = seal(plaintext, &pub_key).unwrap();
        let opened = open(&sealed.body, &sealed.encrypted_key, &priv_key).unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn pem_round_trip_for_keys() {
        let (priv_key, pub_key) = test_keypair();
        let priv_pem = priv_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .unwrap()
            .to_string();
        let pub_pem = pub_key.to_public_key_pem(rsa::pkcs1::LineEnding::LF).unwrap();

        assert!(priv_pem.contains("RSA PRIVATE KEY"));
        assert!(pub_pem.contains("PUBLIC KEY"));
    }
}
