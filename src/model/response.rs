//! The `samlp:Response` data model (C5).

use chrono::{DateTime, Utc};

use crate::error::XmlError;
use crate::id::{parse_issue_instant, Saml2Id};
use crate::namespace::{Saml2StatusCode, NS_ASSERTION, NS_PROTOCOL};
use crate::xml::tree::Element;

use super::assertion::Assertion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: Saml2StatusCode,
    pub second_level_code: Option<String>,
    pub message: Option<String>,
}

/// Either an assertion that's already in the clear, or one this core hasn't
/// decrypted yet. Kept as a sum type rather than eagerly decrypting at
/// parse time, since decryption needs key material the parser doesn't have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseAssertion {
    Plaintext(Assertion),
    Encrypted(Element),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: Saml2Id,
    pub in_response_to: Option<String>,
    pub issue_instant: DateTime<Utc>,
    pub destination: Option<String>,
    pub issuer: Option<String>,
    pub status: Status,
    pub assertions: Vec<ResponseAssertion>,
    /// The root element this was parsed from, retained so the signature
    /// verifier can canonicalize the *original* bytes rather than a
    /// reconstruction of this struct.
    pub root: Element,
}

impl Response {
    pub fn from_element(el: &Element) -> Result<Self, XmlError> {
        if !el.is(NS_PROTOCOL, "Response") {
            return Err(XmlError::UnexpectedElement {
                expected_ns: NS_PROTOCOL.to_string(),
                expected_local: "Response".to_string(),
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
        let destination = el.attr("Destination").map(str::to_string);
        let issuer = el
            .child_element(NS_ASSERTION, "Issuer")
            .map(|e| e.text());

        let status_el = el
            .child_element(NS_PROTOCOL, "Status")
            .ok_or_else(|| XmlError::MissingElement("Status".into()))?;
        let status = parse_status(status_el)?;

        let mut assertions = Vec::new();
        for child in el.child_elements() {
            if child.is(NS_ASSERTION, "Assertion") {
                assertions.push(ResponseAssertion::Plaintext(Assertion::from_element(child)?));
            } else if child.is(NS_ASSERTION, "EncryptedAssertion") {
                assertions.push(ResponseAssertion::Encrypted(child.clone()));
            }
        }

        Ok(Response {
            id,
            in_response_to,
            issue_instant,
            destination,
            issuer,
            status,
            assertions,
            root: el.clone(),
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
