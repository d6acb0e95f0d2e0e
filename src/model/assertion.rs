//! The `saml:Assertion` data model (C5).

use chrono::{DateTime, Utc};

use crate::error::XmlError;
use crate::id::{parse_issue_instant, Saml2Id};
use crate::namespace::NS_ASSERTION;
use crate::xml::tree::Element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameId {
    pub value: String,
    pub format: Option<String>,
    pub name_qualifier: Option<String>,
    pub sp_name_qualifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectConfirmation {
    pub method: String,
    pub in_response_to: Option<String>,
    pub recipient: Option<String>,
    pub not_on_or_after: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name_id: Option<NameId>,
    pub confirmations: Vec<SubjectConfirmation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditions {
    pub not_before: Option<DateTime<Utc>>,
    pub not_on_or_after: Option<DateTime<Utc>>,
    pub audiences: Vec<String>,
    /// Whether a bare `saml:OneTimeUse` element is present — the assertion
    /// must be rejected on any presentation after the first.
    pub one_time_use: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthnStatement {
    pub authn_instant: DateTime<Utc>,
    pub session_index: Option<String>,
    pub authn_context_class_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attribute {
    pub name: String,
    pub name_format: Option<String>,
    pub friendly_name: Option<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub id: Saml2Id,
    pub issue_instant: DateTime<Utc>,
    pub issuer: String,
    pub subject: Subject,
    pub conditions: Option<Conditions>,
    pub authn_statements: Vec<AuthnStatement>,
    pub attributes: Vec<Attribute>,
}

impl Assertion {
    pub fn from_element(el: &Element) -> Result<Self, XmlError> {
        if !el.is(NS_ASSERTION, "Assertion") {
            return Err(XmlError::UnexpectedElement {
                expected_ns: NS_ASSERTION.to_string(),
                expected_local: "Assertion".to_string(),
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
        let issuer = el
            .child_element(NS_ASSERTION, "Issuer")
            .ok_or_else(|| XmlError::MissingElement("Issuer".into()))?
            .text();

        let subject_el = el
            .child_element(NS_ASSERTION, "Subject")
            .ok_or_else(|| XmlError::MissingElement("Subject".into()))?;
        let subject = parse_subject(subject_el)?;

        let conditions = el
            .child_element(NS_ASSERTION, "Conditions")
            .map(parse_conditions)
            .transpose()?;

        let authn_statements = el
            .child_elements()
            .filter(|e| e.is(NS_ASSERTION, "AuthnStatement"))
            .map(parse_authn_statement)
            .collect::<Result<Vec<_>, _>>()?;

        let attributes = el
            .child_element(NS_ASSERTION, "AttributeStatement")
            .map(|stmt| {
                stmt.child_elements()
                    .filter(|e| e.is(NS_ASSERTION, "Attribute"))
                    .map(parse_attribute)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Assertion {
            id,
            issue_instant,
            issuer,
            subject,
            conditions,
            authn_statements,
            attributes,
        })
    }
}

fn parse_subject(el: &Element) -> Result<Subject, XmlError> {
    let name_id = el
        .child_element(NS_ASSERTION, "NameID")
        .map(|n| NameId {
            value: n.text(),
            format: n.attr("Format").map(str::to_string),
            name_qualifier: n.attr("NameQualifier").map(str::to_string),
            sp_name_qualifier: n.attr("SPNameQualifier").map(str::to_string),
        });

    let confirmations = el
        .child_elements()
        .filter(|e| e.is(NS_ASSERTION, "SubjectConfirmation"))
        .map(|e| {
            let method = e
                .attr("Method")
                .ok_or_else(|| XmlError::MissingAttribute("Method".into()))?
                .to_string();
            let data = e.child_element(NS_ASSERTION, "SubjectConfirmationData");
            let in_response_to = data.and_then(|d| d.attr("InResponseTo")).map(str::to_string);
            let recipient = data.and_then(|d| d.attr("Recipient")).map(str::to_string);
            let not_on_or_after = data
                .and_then(|d| d.attr("NotOnOrAfter"))
                .map(parse_issue_instant)
                .transpose()?;
            Ok(SubjectConfirmation {
                method,
                in_response_to,
                recipient,
                not_on_or_after,
            })
        })
        .collect::<Result<Vec<_>, XmlError>>()?;

    Ok(Subject {
        name_id,
        confirmations,
    })
}

fn parse_conditions(el: &Element) -> Result<Conditions, XmlError> {
    let not_before = el.attr("NotBefore").map(parse_issue_instant).transpose()?;
    let not_on_or_after = el
        .attr("NotOnOrAfter")
        .map(parse_issue_instant)
        .transpose()?;
    let audiences = el
        .child_element(NS_ASSERTION, "AudienceRestriction")
        .map(|ar| {
            ar.child_elements()
                .filter(|e| e.is(NS_ASSERTION, "Audience"))
                .map(|e| e.text())
                .collect()
        })
        .unwrap_or_default();
    let one_time_use = el.child_element(NS_ASSERTION, "OneTimeUse").is_some();

    Ok(Conditions {
        not_before,
        not_on_or_after,
        audiences,
        one_time_use,
    })
}

fn parse_authn_statement(el: &Element) -> Result<AuthnStatement, XmlError> {
    let authn_instant = parse_issue_instant(
        el.attr("AuthnInstant")
            .ok_or_else(|| XmlError::MissingAttribute("AuthnInstant".into()))?,
    )?;
    let session_index = el.attr("SessionIndex").map(str::to_string);
    let authn_context_class_ref = el
        .child_element(NS_ASSERTION, "AuthnContext")
        .and_then(|ctx| ctx.child_element(NS_ASSERTION, "AuthnContextClassRef"))
        .map(|e| e.text());

    Ok(AuthnStatement {
        authn_instant,
        session_index,
        authn_context_class_ref,
    })
}

fn parse_attribute(el: &Element) -> Result<Attribute, XmlError> {
    let name = el
        .attr("Name")
        .ok_or_else(|| XmlError::MissingAttribute("Name".into()))?
        .to_string();
    let name_format = el.attr("NameFormat").map(str::to_string);
    let friendly_name = el.attr("FriendlyName").map(str::to_string);
    let values = el
        .child_elements()
        .filter(|e| e.is(NS_ASSERTION, "AttributeValue"))
        .map(|e| e.text())
        .collect();

    Ok(Attribute {
        name,
        name_format,
        friendly_name,
        values,
    })
}
