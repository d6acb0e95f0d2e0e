//! Transport binding dispatch (C6).
//!
//! Bindings don't just encode/decode bytes — a host needs to go from "here
//! is an inbound HTTP request" to "here is the binding that can make sense
//! of it" without already knowing which one the IdP used. `Binding::get`
//! resolves by declared type; `Binding::probe` resolves by trying each
//! known binding's `can_unbind` against the request, which is how the ACS
//! endpoint figures out whether it's looking at a POST or an artifact
//! submission before it's parsed anything.

pub mod artifact;
pub mod post;
pub mod redirect;

use crate::error::BindingError;
use crate::namespace::Saml2BindingType;

/// The minimal shape of an inbound HTTP request a binding needs to look at.
/// Kept deliberately narrow and framework-agnostic — the host owns the real
/// request type (see [`crate::host::HttpRequestData`]), this is just enough
/// surface to decide which binding applies and pull the relevant field out.
pub trait BindingRequest {
    fn method(&self) -> &str;
    fn query_string(&self) -> Option<&str>;
    fn form_body(&self) -> Option<&str>;
}

pub trait Binding {
    fn binding_type(&self) -> Saml2BindingType;

    /// Whether this binding recognizes `request` as one of its own, without
    /// fully decoding it.
    fn can_unbind(&self, request: &dyn BindingRequest) -> bool;
}

pub struct RedirectBinding;
pub struct PostBinding;
pub struct ArtifactBinding;

impl Binding for RedirectBinding {
    fn binding_type(&self) -> Saml2BindingType {
        Saml2BindingType::HttpRedirect
    }

    fn can_unbind(&self, request: &dyn BindingRequest) -> bool {
        request.method() == "GET"
            && request
                .query_string()
                .is_some_and(|q| q.contains("SAMLRequest=") || q.contains("SAMLResponse="))
    }
}

impl Binding for PostBinding {
    fn binding_type(&self) -> Saml2BindingType {
        Saml2BindingType::HttpPost
    }

    fn can_unbind(&self, request: &dyn BindingRequest) -> bool {
        request.method() == "POST"
            && request
                .form_body()
                .is_some_and(|b| b.contains("SAMLRequest=") || b.contains("SAMLResponse="))
    }
}

impl Binding for ArtifactBinding {
    fn binding_type(&self) -> Saml2BindingType {
        Saml2BindingType::Artifact
    }

    fn can_unbind(&self, request: &dyn BindingRequest) -> bool {
        let carries_artifact = |s: &str| s.contains("SAMLart=");
        match request.method() {
            "GET" => request.query_string().is_some_and(carries_artifact),
            "POST" => request.form_body().is_some_and(carries_artifact),
            _ => false,
        }
    }
}

/// Look up a binding implementation by its declared type.
pub fn get(binding_type: Saml2BindingType) -> Box<dyn Binding> {
    match binding_type {
        Saml2BindingType::HttpRedirect => Box::new(RedirectBinding),
        Saml2BindingType::HttpPost => Box::new(PostBinding),
        Saml2BindingType::Artifact => Box::new(ArtifactBinding),
    }
}

/// Find whichever known binding claims it can handle `request`. Order is
/// fixed (redirect, post, artifact) since a request can in principle
/// satisfy more than one probe loosely and we want deterministic results.
pub fn probe(request: &dyn BindingRequest) -> Result<Box<dyn Binding>, BindingError> {
    for binding_type in [
        Saml2BindingType::HttpRedirect,
        Saml2BindingType::HttpPost,
        Saml2BindingType::Artifact,
    ] {
        let binding = get(binding_type);
        if binding.can_unbind(request) {
            return Ok(binding);
        }
    }
    Err(BindingError::WrongBinding)
}
