//! Host-provided interfaces (§6).
//!
//! This crate is a protocol core, not an application: it never owns a
//! config file format, a certificate store, or an HTTP framework. Anything
//! that needs "where do I look this up" or "what does the current request
//! look like" is expressed as a trait here, implemented by whatever is
//! embedding this core.

use crate::crypto::keys::{DecryptionKey, KeyRing, SigningKey};

/// This service provider's own identity and key material.
pub trait SpOptions: Send + Sync {
    fn entity_id(&self) -> &str;
    fn assertion_consumer_service_url(&self) -> &str;
    fn decryption_keys(&self) -> KeyRing<DecryptionKey>;
}

/// A single configured identity provider's metadata and key material.
pub trait IdentityProviderConfig: Send + Sync {
    fn entity_id(&self) -> &str;
    fn signing_keys(&self) -> KeyRing<SigningKey>;
    fn sso_url(&self, binding: crate::namespace::Saml2BindingType) -> Option<&str>;
    fn artifact_resolution_url(&self) -> Option<&str>;
}

/// The directory of configured IdPs a host exposes, so the core can look
/// one up by entity ID (from `Issuer`) without knowing how they're stored.
pub trait IdentityProviders: Send + Sync {
    fn find(&self, entity_id: &str) -> Option<&dyn IdentityProviderConfig>;
}

/// Narrow view of an inbound HTTP request, enough for binding dispatch
/// (see [`crate::binding::BindingRequest`]) and for building absolute URLs
/// when needed.
pub trait HttpRequestData: Send + Sync {
    fn method(&self) -> &str;
    fn query_string(&self) -> Option<&str>;
    fn form_body(&self) -> Option<&str>;
}

/// The outcome of handling an inbound SSO message, handed back to the host
/// to act on — this core never writes an HTTP response itself. Serializable
/// so a host can stash it in a session store or ship it across a process
/// boundary (e.g. from a worker that terminates the SSO flow to the web
/// tier that renders the result) without writing its own mapping.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CommandResult {
    /// A successfully validated assertion, ready for the host to establish
    /// a session from.
    Authenticated {
        name_id: Option<String>,
        attributes: Vec<crate::model::Attribute>,
        relay_state: Option<String>,
    },
    /// Validation failed; the host decides how to surface this (error page,
    /// retry, etc).
    Failed(crate::error::ValidationErrorKind),
}

pub use crate::artifact_resolver::ArtifactBackChannel;
