//! SAML2 message data model (C5).

pub mod artifact_response;
pub mod assertion;
pub mod authn_request;
pub mod response;

pub use artifact_response::{ArtifactPayload, ArtifactResponse};
pub use assertion::{Assertion, Attribute, AuthnStatement, Conditions, NameId, Subject, SubjectConfirmation};
pub use authn_request::{AuthnRequest, NameIdPolicy};
pub use response::{Response, ResponseAssertion, Status};
