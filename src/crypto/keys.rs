//! Key material wrappers (C4 support).
//!
//! The core never parses X.509 certificates itself — administering trust
//! anchors and rotating keys is explicitly a host concern (§6). What the
//! host hands in is already-decoded key material; these types exist only to
//! give that material a name in this crate's API instead of passing around
//! bare `rsa` crate types everywhere.

use rsa::pkcs8::DecodePublicKey;
use rsa::{RsaPrivateKey, RsaPublicKey};

/// A signing-verification public key, as published by an IdP for one of its
/// active signing certificates. Key rollover means an IdP can have more
/// than one of these valid at once; see [`KeyRing`].
#[derive(Debug, Clone)]
pub struct SigningKey(pub RsaPublicKey);

impl SigningKey {
    pub fn from_public_key_der(der: &[u8]) -> Result<Self, rsa::pkcs8::spki::Error> {
        RsaPublicKey::from_public_key_der(der).map(SigningKey)
    }
}

/// A decryption private key belonging to this SP. Like [`SigningKey`], an SP
/// may have more than one live at once during rollover.
#[derive(Clone)]
pub struct DecryptionKey(pub RsaPrivateKey);

impl std::fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptionKey").finish_non_exhaustive()
    }
}

/// An ordered set of candidate keys to try during verification or
/// decryption. Order matters only for efficiency (most-recently-rotated-in
/// first is the common convention); correctness never depends on it since
/// every candidate is tried.
#[derive(Debug, Clone, Default)]
pub struct KeyRing<K> {
    keys: Vec<K>,
}

impl<K> KeyRing<K> {
    pub fn new(keys: Vec<K>) -> Self {
        Self { keys }
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn push(&mut self, key: K) {
        self.keys.push(key);
    }
}

impl KeyRing<SigningKey> {
    pub fn public_keys(&self) -> Vec<RsaPublicKey> {
        self.keys.iter().map(|k| k.0.clone()).collect()
    }
}
