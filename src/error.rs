//! Error types for the SAML2 core.
//!
//! Mirrors the host application's convention of a single `thiserror`-derived
//! enum per failure family rather than one error type per module: validation
//! failures all funnel into [`Saml2ResponseFailedValidation`] so a host can
//! match on `.kind()` without threading module-specific error types through
//! its own call sites.

use thiserror::Error;

use crate::namespace::Saml2StatusCode;

/// Failures that can occur while reading or writing SAML XML, prior to and
/// independent of signature/validation semantics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("expected element `{{{expected_ns}}}{expected_local}`, found `{{{found_ns}}}{found_local}`")]
    UnexpectedElement {
        expected_ns: String,
        expected_local: String,
        found_ns: String,
        found_local: String,
    },

    #[error("missing required attribute `{0}`")]
    MissingAttribute(String),

    #[error("missing required child element `{0}`")]
    MissingElement(String),

    #[error("attribute `{attribute}` is not a valid {expected}: {value}")]
    InvalidAttributeValue {
        attribute: String,
        expected: String,
        value: String,
    },

    #[error("unrecognized status code URI: {0}")]
    UnknownStatusCode(String),
}

/// Failures specific to transport binding (de)serialization — the part of
/// the pipeline that runs before a message even becomes XML-shaped data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("missing required field `{0}` on the wire")]
    MissingField(String),

    #[error("base64 decoding failed: {0}")]
    Base64(String),

    #[error("DEFLATE decompression failed: {0}")]
    Inflate(String),

    #[error("DEFLATE compression failed: {0}")]
    Deflate(String),

    #[error("request is not addressed to this binding")]
    WrongBinding,

    #[error("malformed artifact: {0}")]
    MalformedArtifact(String),

    #[error(transparent)]
    Xml(#[from] XmlError),
}

/// The single discriminated error family for response validation (§7 of the
/// design: `Saml2ResponseFailedValidation`). Each variant is a `kind`; the
/// struct wraps it so `Display` stays stable while call sites that care can
/// match on `.kind`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("SAML2 response failed validation: {kind}")]
pub struct Saml2ResponseFailedValidation {
    pub kind: ValidationErrorKind,
}

impl Saml2ResponseFailedValidation {
    pub fn new(kind: ValidationErrorKind) -> Self {
        Self { kind }
    }
}

impl From<ValidationErrorKind> for Saml2ResponseFailedValidation {
    fn from(kind: ValidationErrorKind) -> Self {
        Self::new(kind)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ValidationErrorKind {
    #[error("the response element carries no ds:Signature")]
    NotSigned,

    #[error("SignedInfo contains no Reference")]
    NoReference,

    #[error("SignedInfo contains more than one Reference")]
    MultipleReferences,

    #[error("Reference URI does not point at the signed root element")]
    ReferenceMismatch,

    #[error("transform `{0}` is not on the allow-list")]
    DisallowedTransform(String),

    #[error("no candidate key validated the signature")]
    SignatureInvalid,

    #[error("RSA-SHA256 is not registered on this platform")]
    Sha256NotRegistered,

    #[error("response is unsigned and assertion is not individually signed")]
    UnsignedAssertion,

    #[error("no configured private key could decrypt the assertion")]
    DecryptionFailed,

    #[error("assertion is encrypted but no decryption key is configured")]
    NoDecryptionKey,

    #[error("response has no InResponseTo and the IdP does not allow unsolicited responses")]
    UnsolicitedNotAllowed,

    #[error("relay state is unknown or has already been consumed")]
    ReplayedOrUnknownRelayState,

    #[error("InResponseTo does not match the stored request id")]
    InResponseToMismatch,

    #[error("response Issuer does not match the IdP that issued the original request")]
    IssuerMismatch,

    #[error("response status is not Success: {status:?} ({message:?}, {second_level:?})")]
    UnsuccessfulStatus {
        status: Saml2StatusCode,
        message: Option<String>,
        second_level: Option<String>,
    },

    #[error("artifact resolution failed: {0}")]
    ArtifactResolutionFailed(String),

    #[error("XML is not a well-formed SAML2 Response: {0}")]
    XmlMalformed(String),

    #[error("assertion condition violated: {0}")]
    ConditionFailed(String),

    #[error("assertion audience restriction did not include our entity id")]
    AudienceMismatch,

    #[error("assertion `{0}` has already been presented")]
    AssertionReplayed(String),
}

impl From<XmlError> for ValidationErrorKind {
    fn from(e: XmlError) -> Self {
        ValidationErrorKind::XmlMalformed(e.to_string())
    }
}

impl From<BindingError> for ValidationErrorKind {
    fn from(e: BindingError) -> Self {
        ValidationErrorKind::ArtifactResolutionFailed(e.to_string())
    }
}
