pub mod envelope;
pub mod error;
pub mod keys;

pub use envelope::{open, seal, Sealed};
pub use error::CryptoError;
pub use keys::{load_private_key, load_public_key};
