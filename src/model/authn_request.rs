//! `samlp:AuthnRequest` (C5, supplemented): the message this core emits to
//! start Web SSO, and must be able to read back in its own round-trip
//! tests. IdPs never send these back to us, so unlike `Response` there's no
//! "parse untrusted wire data" obligation here beyond self-consistency.

use chrono::{DateTime, Utc};

use crate::error::XmlError;
use crate::id::{format_issue_instant, parse_issue_instant, Saml2Id};
use crate::namespace::{NS_ASSERTION, NS_PROTOCOL};
use crate::xml::tree::{parse_document, Element};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIdPolicy {
    pub format: Option<String>,
    pub allow_create: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthnRequest {
    pub id: Saml2Id,
    pub issue_instant: DateTime<Utc>,
    pub destination: Option<String>,
    pub issuer: String,
    pub assertion_consumer_service_url: Option<String>,
    pub protocol_binding: Option<String>,
    pub name_id_policy: Option<NameIdPolicy>,
}

impl AuthnRequest {
    pub fn new(issuer: impl Into<String>, acs_url: impl Into<String>, protocol_binding: impl Into<String>) -> Self {
        AuthnRequest {
            id: Saml2Id::generate(),
            issue_instant: Utc::now(),
            destination: None,
            issuer: issuer.into(),
            assertion_consumer_service_url: Some(acs_url.into()),
            protocol_binding: Some(protocol_binding.into()),
            name_id_policy: None,
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_name_id_policy(mut self, policy: NameIdPolicy) -> Self {
        self.name_id_policy = Some(policy);
        self
    }

    pub fn to_xml(&self) -> String {
        let mut attrs = format!(
            r#"ID="{id}" Version="2.0" IssueInstant="{instant}""#,
            id = self.id,
            instant = format_issue_instant(self.issue_instant),
        );
        if let Some(dest) = &self.destination {
            attrs.push_str(&format!(r#" Destination="{dest}""#));
        }
        if let Some(acs) = &self.assertion_consumer_service_url {
            attrs.push_str(&format!(r#" AssertionConsumerServiceURL="{acs}""#));
        }
        if let Some(binding) = &self.protocol_binding {
            attrs.push_str(&format!(r#" ProtocolBinding="{binding}""#));
        }

        let name_id_policy_xml = self
            .name_id_policy
            .as_ref()
            .map(|p| {
                let mut policy_attrs = String::new();
                if let Some(fmt) = &p.format {
                    policy_attrs.push_str(&format!(r#" Format="{fmt}""#));
                }
                if let Some(allow) = p.allow_create {
                    policy_attrs.push_str(&format!(r#" AllowCreate="{allow}""#));
                }
                format!(r#"<samlp:NameIDPolicy{policy_attrs}/>"#)
            })
            .unwrap_or_default();

        format!(
            r#"<samlp:AuthnRequest xmlns:samlp="{protocol_ns}" xmlns:saml="{assertion_ns}" {attrs}><saml:Issuer>{issuer}</saml:Issuer>{name_id_policy_xml}</samlp:AuthnRequest>"#,
            protocol_ns = NS_PROTOCOL,
            assertion_ns = NS_ASSERTION,
            attrs = attrs,
            issuer = self.issuer,
            name_id_policy_xml = name_id_policy_xml,
        )
    }

    pub fn from_xml(xml: &[u8]) -> Result<Self, XmlError> {
        let el = parse_document(xml)?;
        Self::from_element(&el)
    }

    pub fn from_element(el: &Element) -> Result<Self, XmlError> {
        if !el.is(NS_PROTOCOL, "AuthnRequest") {
            return Err(XmlError::UnexpectedElement {
                expected_ns: NS_PROTOCOL.to_string(),
                expected_local: "AuthnRequest".to_string(),
                found_ns: el.namespace.clone().unwrap_or_default(),
                found_local: el.local_name.clone(),
            });
        }

        let id = Saml2Id::parse(
            el.attr("ID")
                .ok_or_else(|| XmlError::MissingAttribute("ID".into()))?,
        )?;
        let issue_instant = parse_issue_instant(
            el.attr("IssueInstant")
                .ok_or_else(|| XmlError::MissingAttribute("IssueInstant".into()))?,
        )?;
        let destination = el.attr("Destination").map(str::to_string);
        let assertion_consumer_service_url =
            el.attr("AssertionConsumerServiceURL").map(str::to_string);
        let protocol_binding = el.attr("ProtocolBinding").map(str::to_string);
        let issuer = el
            .child_element(NS_ASSERTION, "Issuer")
            .ok_or_else(|| XmlError::MissingElement("Issuer".into()))?
            .text();

        let name_id_policy = el
            .child_element(NS_PROTOCOL, "NameIDPolicy")
            .map(|p| NameIdPolicy {
                format: p.attr("Format").map(str::to_string),
                allow_create: p.attr("AllowCreate").map(|v| v == "true"),
            });

        Ok(AuthnRequest {
            id,
            issue_instant,
            destination,
            issuer,
            assertion_consumer_service_url,
            protocol_binding,
            name_id_policy,
        })
    }
}
