//! Artifact resolution over the SOAP 1.1 back-channel (C9).
//!
//! The only network I/O this core performs itself: posting an
//! `ArtifactResolve` request to an IdP's resolution endpoint and parsing
//! whatever SOAP envelope comes back. Everything else (the front-channel
//! HTTP bindings) is the host's responsibility to transport; this one step
//! happens server-to-server and so the core owns the client.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{BindingError, ValidationErrorKind};
use crate::id::{format_issue_instant, Saml2Id};
use crate::model::ArtifactResponse;
use crate::namespace::NS_SOAP_ENVELOPE;
use crate::xml::tree::parse_document;

#[async_trait]
pub trait ArtifactBackChannel: Send + Sync {
    async fn resolve(&self, resolution_url: &str, soap_body: &[u8]) -> Result<Vec<u8>, BindingError>;
}

/// A `reqwest`-backed back-channel client, the default implementation most
/// hosts will use unless they need to substitute a mock for testing.
pub struct ReqwestArtifactBackChannel {
    client: reqwest::Client,
}

impl ReqwestArtifactBackChannel {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("reqwest client configuration is static and always valid"),
        }
    }
}

#[async_trait]
impl ArtifactBackChannel for ReqwestArtifactBackChannel {
    async fn resolve(&self, resolution_url: &str, soap_body: &[u8]) -> Result<Vec<u8>, BindingError> {
        let response = self
            .client
            .post(resolution_url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .body(soap_body.to_vec())
            .send()
            .await
            .map_err(|e| BindingError::MalformedArtifact(format!("SOAP request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BindingError::MalformedArtifact(format!(
                "SOAP resolution endpoint returned {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| BindingError::MalformedArtifact(format!("reading SOAP response body failed: {e}")))
    }
}

/// Build the `ArtifactResolve` SOAP envelope for artifact `artifact_wire`.
pub fn build_artifact_resolve(issuer_entity_id: &str, artifact_wire: &str, destination: &str) -> (Saml2Id, Vec<u8>) {
    let id = Saml2Id::generate();
    let envelope = format!(
        r#"<soap:Envelope xmlns:soap="{soap_ns}"><soap:Body><samlp:ArtifactResolve xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{id}" Version="2.0" IssueInstant="{instant}" Destination="{destination}"><saml:Issuer>{issuer}</saml:Issuer><samlp:Artifact>{artifact}</samlp:Artifact></samlp:ArtifactResolve></soap:Body></soap:Envelope>"#,
        soap_ns = NS_SOAP_ENVELOPE,
        id = id,
        instant = format_issue_instant(chrono::Utc::now()),
        destination = destination,
        issuer = issuer_entity_id,
        artifact = artifact_wire,
    );
    (id, envelope.into_bytes())
}

/// Unwrap a SOAP envelope and parse its inner `ArtifactResponse`.
pub fn parse_artifact_resolve_response(soap_xml: &[u8]) -> Result<ArtifactResponse, ValidationErrorKind> {
    let envelope = parse_document(soap_xml).map_err(ValidationErrorKind::from)?;
    let body = envelope
        .child_element(NS_SOAP_ENVELOPE, "Body")
        .ok_or_else(|| ValidationErrorKind::ArtifactResolutionFailed("SOAP envelope has no Body".into()))?;
    let artifact_response_el = body
        .child_elements()
        .next()
        .ok_or_else(|| ValidationErrorKind::ArtifactResolutionFailed("SOAP Body is empty".into()))?;
    ArtifactResponse::from_element(artifact_response_el).map_err(ValidationErrorKind::from)
}

/// Resolve `artifact_wire` end to end: build the request, send it over
/// `back_channel`, and parse the response. `timeout` bounds the whole
/// round trip, not just connect — an IdP that accepts the connection and
/// then stalls must still be treated as a resolution failure.
pub async fn resolve_artifact(
    back_channel: &dyn ArtifactBackChannel,
    issuer_entity_id: &str,
    artifact_wire: &str,
    resolution_url: &str,
    timeout: Duration,
) -> Result<ArtifactResponse, ValidationErrorKind> {
    let (request_id, soap_body) = build_artifact_resolve(issuer_entity_id, artifact_wire, resolution_url);
    debug!("resolving artifact via {} as ArtifactResolve {:?}", resolution_url, request_id);

    let raw_response = tokio::time::timeout(timeout, back_channel.resolve(resolution_url, &soap_body))
        .await
        .map_err(|_| {
            warn!("ArtifactResolve {:?} to {} timed out after {:?}", request_id, resolution_url, timeout);
            ValidationErrorKind::ArtifactResolutionFailed("timed out".into())
        })?
        .map_err(|e| {
            warn!("ArtifactResolve {:?} to {} failed: {}", request_id, resolution_url, e);
            ValidationErrorKind::ArtifactResolutionFailed(e.to_string())
        })?;

    parse_artifact_resolve_response(&raw_response)
}
