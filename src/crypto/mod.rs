//! Signature verification key material and assertion decryption (C4).

pub mod decrypt;
pub mod keys;

pub use decrypt::decrypt_assertion;
pub use keys::{DecryptionKey, KeyRing, SigningKey};
