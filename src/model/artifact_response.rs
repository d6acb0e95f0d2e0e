//! `samlp:ArtifactResponse` (C5), the payload an IdP returns over the SOAP
//! back-channel in answer to an `ArtifactResolve` (C9).

use chrono::{DateTime, Utc};

use crate::error::XmlError;
use crate::id::{parse_issue_instant, Saml2Id};
use crate::namespace::{Saml2StatusCode, NS_ASSERTION, NS_DS, NS_PROTOCOL};
use crate::xml::tree::Element;

use super::response::{Response, Status};

/// An `ArtifactResponse`'s inner payload. The schema allows any SAML
/// protocol message here, but Web SSO artifact resolution only ever puts a
/// `Response` inside — anything else means resolution against an artifact
/// that wasn't actually ours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactPayload {
    Response(Response),
    Other(Element),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactResponse {
    pub id: Saml2Id,
    pub in_response_to: Option<String>,
    pub issue_instant: DateTime<Utc>,
    pub status: Status,
    pub payload: ArtifactPayload,
}

impl ArtifactResponse {
    pub fn from_element(el: &Element) -> Result<Self, XmlError> {
        if !el.is(NS_PROTOCOL, "ArtifactResponse") {
            return Err(XmlError::UnexpectedElement {
                expected_ns: NS_PROTOCOL.to_string(),
                expected_local: "ArtifactResponse".to_string(),
                found_ns: el.namespace.clone().unwrap_or_default(),
                found_local: el.local_name.clone(),
            });
        }

        let id = Saml2Id::parse(
            el.attr("ID")
                .ok_or_else(|| XmlError::MissingAttribute("ID".into()))?,
        )?;
        let in_response_to = el.attr("InResponseTo").map(str::to_string);
        let issue_instant = parse_issue_instant(
            el.attr("IssueInstant")
                .ok_or_else(|| XmlError::MissingAttribute("IssueInstant".into()))?,
        )?;
        let status_el = el
            .child_element(NS_PROTOCOL, "Status")
            .ok_or_else(|| XmlError::MissingElement("Status".into()))?;
        let status = parse_status(status_el)?;

        // StatusResponseType's shape is `Issuer?, Signature?, Extensions?,
        // Status, <payload>` — the payload is whichever element follows all
        // of those, so every one of them has to be excluded from the scan,
        // not just Status itself.
        let inner = el
            .child_elements()
            .find(|e| {
                !e.is(NS_PROTOCOL, "Status")
                    && !e.is(NS_ASSERTION, "Issuer")
                    && !e.is(NS_DS, "Signature")
                    && !e.is(NS_PROTOCOL, "Extensions")
            })
            .ok_or_else(|| XmlError::MissingElement("ArtifactResponse payload".into()))?;

        let payload = if inner.is(NS_PROTOCOL, "Response") {
            ArtifactPayload::Response(Response::from_element(inner)?)
        } else {
            ArtifactPayload::Other(inner.clone())
        };

        Ok(ArtifactResponse {
            id,
            in_response_to,
            issue_instant,
            status,
            payload,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.code == Saml2StatusCode::Success
    }
}

fn parse_status(el: &Element) -> Result<Status, XmlError> {
    let status_code_el = el
        .child_element(NS_PROTOCOL, "StatusCode")
        .ok_or_else(|| XmlError::MissingElement("StatusCode".into()))?;
    let uri = status_code_el
        .attr("Value")
        .ok_or_else(|| XmlError::MissingAttribute("Value".into()))?;
    let code = Saml2StatusCode::from_uri(uri).ok_or_else(|| XmlError::UnknownStatusCode(uri.to_string()))?;
    let second_level_code = status_code_el
        .child_element(NS_PROTOCOL, "StatusCode")
        .and_then(|nested| nested.attr("Value"))
        .map(str::to_string);
    let message = el
        .child_element(NS_PROTOCOL, "StatusMessage")
        .map(|e| e.text());

    Ok(Status {
        code,
        second_level_code,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::tree::parse_document;

    const ARTIFACT_RESPONSE: &str = r#"<samlp:ArtifactResponse xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_ar1" InResponseTo="_resolve1" IssueInstant="2026-07-30T12:00:00Z" Version="2.0">
        <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
        <samlp:Response ID="_r1" IssueInstant="2026-07-30T12:00:00Z" Version="2.0">
            <saml:Issuer>https://idp.example.com</saml:Issuer>
            <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
        </samlp:Response>
    </samlp:ArtifactResponse>"#;

    #[test]
    fn extracts_inner_response() {
        let el = parse_document(ARTIFACT_RESPONSE.as_bytes()).unwrap();
        let artifact_response = ArtifactResponse::from_element(&el).unwrap();
        assert!(artifact_response.is_success());
        match artifact_response.payload {
            ArtifactPayload::Response(r) => assert_eq!(r.id.as_str(), "_r1"),
            ArtifactPayload::Other(_) => panic!("expected inner Response"),
        }
    }

    const ARTIFACT_RESPONSE_WITH_LEADING_ISSUER: &str = r#"<samlp:ArtifactResponse xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_ar2" InResponseTo="_resolve2" IssueInstant="2026-07-30T12:00:00Z" Version="2.0">
        <saml:Issuer>https://idp.example.com</saml:Issuer>
        <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
        <samlp:Response ID="_r2" IssueInstant="2026-07-30T12:00:00Z" Version="2.0">
            <saml:Issuer>https://idp.example.com</saml:Issuer>
            <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
        </samlp:Response>
    </samlp:ArtifactResponse>"#;

    #[test]
    fn extracts_inner_response_past_a_leading_issuer() {
        let el = parse_document(ARTIFACT_RESPONSE_WITH_LEADING_ISSUER.as_bytes()).unwrap();
        let artifact_response = ArtifactResponse::from_element(&el).unwrap();
        match artifact_response.payload {
            ArtifactPayload::Response(r) => assert_eq!(r.id.as_str(), "_r2"),
            ArtifactPayload::Other(_) => panic!("expected inner Response, got Other (Issuer misclassified as payload)"),
        }
    }
}
