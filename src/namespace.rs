//! Namespace & status tables (C2).
//!
//! Every URI here is a fixed constant mandated by OASIS SAML 2.0 §3.2.2.2
//! (status codes) and the core/protocol/assertion/metadata schemas
//! (namespaces). None of this is configuration; it's just naming the wire
//! format.

/// `urn:oasis:names:tc:SAML:2.0:protocol`
pub const NS_PROTOCOL: &str = "urn:oasis:names:tc:SAML:2.0:protocol";
/// `urn:oasis:names:tc:SAML:2.0:assertion`
pub const NS_ASSERTION: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
/// `urn:oasis:names:tc:SAML:2.0:metadata`
pub const NS_METADATA: &str = "urn:oasis:names:tc:SAML:2.0:metadata";
/// `http://www.w3.org/2000/09/xmldsig#`
pub const NS_DS: &str = "http://www.w3.org/2000/09/xmldsig#";
/// `http://www.w3.org/2001/04/xmlenc#`
pub const NS_XENC: &str = "http://www.w3.org/2001/04/xmlenc#";
/// `http://schemas.xmlsoap.org/soap/envelope/`
pub const NS_SOAP_ENVELOPE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

pub const BINDING_HTTP_REDIRECT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect";
pub const BINDING_HTTP_POST: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST";
pub const BINDING_HTTP_ARTIFACT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Artifact";
pub const BINDING_SOAP: &str = "urn:oasis:names:tc:SAML:2.0:bindings:SOAP";

/// The enumerated SAML2 top-level and second-level status codes (§3.2.2.2).
/// `Success`/`Requester`/`Responder`/`VersionMismatch` are the three
/// top-level codes; the rest are the standard second-level codes, which
/// this core also accepts in the top-level `StatusCode@Value` slot so a
/// caller can always map a status URI to a variant without caring which
/// nesting level it appeared at (the nested second-level value, if any, is
/// additionally preserved verbatim on `Response::second_level_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Saml2StatusCode {
    Success,
    Requester,
    Responder,
    VersionMismatch,
    AuthnFailed,
    InvalidAttrNameOrValue,
    InvalidNameIDPolicy,
    NoAuthnContext,
    NoAvailableIdp,
    NoPassive,
    NoSupportedIdp,
    PartialLogout,
    ProxyCountExceeded,
    RequestDenied,
    RequestUnsupported,
    RequestVersionDeprecated,
    RequestVersionTooHigh,
    RequestVersionTooLow,
    ResourceNotRecognized,
    TooManyResponses,
    UnknownAttrProfile,
    UnknownPrincipal,
    UnsupportedBinding,
}

impl Saml2StatusCode {
    pub fn as_uri(&self) -> &'static str {
        use Saml2StatusCode::*;
        match self {
            Success => "urn:oasis:names:tc:SAML:2.0:status:Success",
            Requester => "urn:oasis:names:tc:SAML:2.0:status:Requester",
            Responder => "urn:oasis:names:tc:SAML:2.0:status:Responder",
            VersionMismatch => "urn:oasis:names:tc:SAML:2.0:status:VersionMismatch",
            AuthnFailed => "urn:oasis:names:tc:SAML:2.0:status:AuthnFailed",
            InvalidAttrNameOrValue => "urn:oasis:names:tc:SAML:2.0:status:InvalidAttrNameOrValue",
            InvalidNameIDPolicy => "urn:oasis:names:tc:SAML:2.0:status:InvalidNameIDPolicy",
            NoAuthnContext => "urn:oasis:names:tc:SAML:2.0:status:NoAuthnContext",
            NoAvailableIdp => "urn:oasis:names:tc:SAML:2.0:status:NoAvailableIDP",
            NoPassive => "urn:oasis:names:tc:SAML:2.0:status:NoPassive",
            NoSupportedIdp => "urn:oasis:names:tc:SAML:2.0:status:NoSupportedIDP",
            PartialLogout => "urn:oasis:names:tc:SAML:2.0:status:PartialLogout",
            ProxyCountExceeded => "urn:oasis:names:tc:SAML:2.0:status:ProxyCountExceeded",
            RequestDenied => "urn:oasis:names:tc:SAML:2.0:status:RequestDenied",
            RequestUnsupported => "urn:oasis:names:tc:SAML:2.0:status:RequestUnsupported",
            RequestVersionDeprecated => {
                "urn:oasis:names:tc:SAML:2.0:status:RequestVersionDeprecated"
            }
            RequestVersionTooHigh => "urn:oasis:names:tc:SAML:2.0:status:RequestVersionTooHigh",
            RequestVersionTooLow => "urn:oasis:names:tc:SAML:2.0:status:RequestVersionTooLow",
            ResourceNotRecognized => "urn:oasis:names:tc:SAML:2.0:status:ResourceNotRecognized",
            TooManyResponses => "urn:oasis:names:tc:SAML:2.0:status:TooManyResponses",
            UnknownAttrProfile => "urn:oasis:names:tc:SAML:2.0:status:UnknownAttrProfile",
            UnknownPrincipal => "urn:oasis:names:tc:SAML:2.0:status:UnknownPrincipal",
            UnsupportedBinding => "urn:oasis:names:tc:SAML:2.0:status:UnsupportedBinding",
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        use Saml2StatusCode::*;
        Some(match uri {
            "urn:oasis:names:tc:SAML:2.0:status:Success" => Success,
            "urn:oasis:names:tc:SAML:2.0:status:Requester" => Requester,
            "urn:oasis:names:tc:SAML:2.0:status:Responder" => Responder,
            "urn:oasis:names:tc:SAML:2.0:status:VersionMismatch" => VersionMismatch,
            "urn:oasis:names:tc:SAML:2.0:status:AuthnFailed" => AuthnFailed,
            "urn:oasis:names:tc:SAML:2.0:status:InvalidAttrNameOrValue" => InvalidAttrNameOrValue,
            "urn:oasis:names:tc:SAML:2.0:status:InvalidNameIDPolicy" => InvalidNameIDPolicy,
            "urn:oasis:names:tc:SAML:2.0:status:NoAuthnContext" => NoAuthnContext,
            "urn:oasis:names:tc:SAML:2.0:status:NoAvailableIDP" => NoAvailableIdp,
            "urn:oasis:names:tc:SAML:2.0:status:NoPassive" => NoPassive,
            "urn:oasis:names:tc:SAML:2.0:status:NoSupportedIDP" => NoSupportedIdp,
            "urn:oasis:names:tc:SAML:2.0:status:PartialLogout" => PartialLogout,
            "urn:oasis:names:tc:SAML:2.0:status:ProxyCountExceeded" => ProxyCountExceeded,
            "urn:oasis:names:tc:SAML:2.0:status:RequestDenied" => RequestDenied,
            "urn:oasis:names:tc:SAML:2.0:status:RequestUnsupported" => RequestUnsupported,
            "urn:oasis:names:tc:SAML:2.0:status:RequestVersionDeprecated" => {
                RequestVersionDeprecated
            }
            "urn:oasis:names:tc:SAML:2.0:status:RequestVersionTooHigh" => RequestVersionTooHigh,
            "urn:oasis:names:tc:SAML:2.0:status:RequestVersionTooLow" => RequestVersionTooLow,
            "urn:oasis:names:tc:SAML:2.0:status:ResourceNotRecognized" => ResourceNotRecognized,
            "urn:oasis:names:tc:SAML:2.0:status:TooManyResponses" => TooManyResponses,
            "urn:oasis:names:tc:SAML:2.0:status:UnknownAttrProfile" => UnknownAttrProfile,
            "urn:oasis:names:tc:SAML:2.0:status:UnknownPrincipal" => UnknownPrincipal,
            "urn:oasis:names:tc:SAML:2.0:status:UnsupportedBinding" => UnsupportedBinding,
            _ => return None,
        })
    }
}

/// The three Web SSO transport bindings this core supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Saml2BindingType {
    HttpRedirect,
    HttpPost,
    Artifact,
}

impl Saml2BindingType {
    pub fn uri(&self) -> &'static str {
        match self {
            Saml2BindingType::HttpRedirect => BINDING_HTTP_REDIRECT,
            Saml2BindingType::HttpPost => BINDING_HTTP_POST,
            Saml2BindingType::Artifact => BINDING_HTTP_ARTIFACT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Saml2StatusCode::Success)]
    #[case(Saml2StatusCode::Requester)]
    #[case(Saml2StatusCode::Responder)]
    #[case(Saml2StatusCode::VersionMismatch)]
    #[case(Saml2StatusCode::InvalidNameIDPolicy)]
    #[case(Saml2StatusCode::NoAvailableIdp)]
    #[case(Saml2StatusCode::UnsupportedBinding)]
    fn status_code_round_trips_through_its_uri(#[case] code: Saml2StatusCode) {
        let uri = code.as_uri();
        assert_eq!(Saml2StatusCode::from_uri(uri), Some(code));
    }

    #[test]
    fn unknown_status_uri_is_none() {
        assert_eq!(
            Saml2StatusCode::from_uri("urn:oasis:names:tc:SAML:2.0:status:NotARealCode"),
            None
        );
    }
}
