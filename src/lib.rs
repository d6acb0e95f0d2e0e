//! SAML 2.0 Web SSO protocol core: message model, transport bindings, the
//! signature/encryption pipeline, and response validation.
//!
//! This crate knows how to parse, sign, verify, encrypt and decrypt SAML2
//! Web SSO messages and how to carry them over the three standard
//! bindings. It does not know how to store configuration, serve HTTP, or
//! manage a certificate store — those are host concerns, expressed as
//! traits in [`host`].

pub mod artifact_resolver;
pub mod binding;
pub mod crypto;
pub mod error;
pub mod host;
pub mod id;
pub mod model;
pub mod namespace;
pub mod pending;
pub mod replay;
pub mod validator;
pub mod xml;

pub use error::{BindingError, Saml2ResponseFailedValidation, ValidationErrorKind, XmlError};
pub use id::Saml2Id;
pub use namespace::{Saml2BindingType, Saml2StatusCode};
pub use validator::{AudienceMode, Saml2Validator, ValidatedAssertion};
