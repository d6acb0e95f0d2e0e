//! HTTP-Artifact binding (C6): the `SAMLart` parameter is a small fixed-
//! layout token, not the message itself — the message is fetched
//! separately over the back-channel (C9) by resolving the artifact.
//!
//! Type code 4 layout (§3.6.4 of the SAML2 bindings spec): 2 bytes type
//! code (`0x0004`), 2 bytes endpoint index, 20 bytes SourceID
//! (`SHA-1(issuing entity's entity ID)`), 20 bytes MessageHandle (random),
//! the whole 44 bytes base64-encoded.

use rand::RngCore;
use sha1::{Digest, Sha1};

use crate::error::BindingError;

const TYPE_CODE_4: u16 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub type_code: u16,
    pub endpoint_index: u16,
    pub source_id: [u8; 20],
    pub message_handle: [u8; 20],
}

impl Artifact {
    /// Generate a fresh type-4 artifact naming `issuer_entity_id` as the
    /// source and a random message handle for correlation.
    pub fn generate(issuer_entity_id: &str, endpoint_index: u16) -> Self {
        let source_id: [u8; 20] = Sha1::digest(issuer_entity_id.as_bytes()).into();
        let mut message_handle = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut message_handle);

        Artifact {
            type_code: TYPE_CODE_4,
            endpoint_index,
            source_id,
            message_handle,
        }
    }

    pub fn to_wire(&self) -> String {
        let mut bytes = Vec::with_capacity(44);
        bytes.extend_from_slice(&self.type_code.to_be_bytes());
        bytes.extend_from_slice(&self.endpoint_index.to_be_bytes());
        bytes.extend_from_slice(&self.source_id);
        bytes.extend_from_slice(&self.message_handle);
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
    }

    pub fn from_wire(encoded: &str) -> Result<Self, BindingError> {
        let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded)
            .map_err(|e| BindingError::Base64(e.to_string()))?;
        if bytes.len() != 44 {
            return Err(BindingError::MalformedArtifact(format!(
                "expected 44 bytes, got {}",
                bytes.len()
            )));
        }
        let type_code = u16::from_be_bytes([bytes[0], bytes[1]]);
        if type_code != TYPE_CODE_4 {
            return Err(BindingError::MalformedArtifact(format!(
                "unsupported artifact type code {type_code}"
            )));
        }
        let endpoint_index = u16::from_be_bytes([bytes[2], bytes[3]]);
        let mut source_id = [0u8; 20];
        source_id.copy_from_slice(&bytes[4..24]);
        let mut message_handle = [0u8; 20];
        message_handle.copy_from_slice(&bytes[24..44]);

        Ok(Artifact {
            type_code,
            endpoint_index,
            source_id,
            message_handle,
        })
    }

    /// Whether `entity_id` is a plausible source for this artifact — the
    /// cheap pre-resolution check a host can use to route an artifact to
    /// the right IdP before spending a round trip resolving it.
    pub fn matches_source(&self, entity_id: &str) -> bool {
        let expected: [u8; 20] = Sha1::digest(entity_id.as_bytes()).into();
        expected == self.source_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_wire_encoding() {
        let artifact = Artifact::generate("https://idp.example.com/metadata", 1);
        let wire = artifact.to_wire();
        let parsed = Artifact::from_wire(&wire).unwrap();
        assert_eq!(parsed, artifact);
    }

    #[test]
    fn matches_source_against_the_generating_entity_id() {
        let artifact = Artifact::generate("https://idp.example.com/metadata", 0);
        assert!(artifact.matches_source("https://idp.example.com/metadata"));
        assert!(!artifact.matches_source("https://someone-else.example.com/metadata"));
    }

    #[test]
    fn rejects_wrong_length_artifact() {
        let short = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, [0u8; 10]);
        assert!(Artifact::from_wire(&short).is_err());
    }

    #[test]
    fn rejects_unsupported_type_code() {
        let mut bytes = vec![0u8, 1]; // type code 1
        bytes.extend_from_slice(&[0u8; 42]);
        let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes);
        assert!(Artifact::from_wire(&encoded).is_err());
    }
}
