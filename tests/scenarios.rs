//! End-to-end scenario tests exercising the public API the way a host
//! actually would: issue a request, remember it in the pending table, hand
//! back a wire-format response, and validate it.

mod common;

use std::time::Duration;

use async_trait::async_trait;

use common::fixtures::{
    empty_decryption_keys, idp_fixture, signed_assertion_xml, wrap_response, IDP_ENTITY_ID,
    SP_ENTITY_ID,
};
use saml2_core::artifact_resolver::{resolve_artifact, ArtifactBackChannel};
use saml2_core::binding::artifact::Artifact;
use saml2_core::binding::post;
use saml2_core::binding::redirect::RedirectMessage;
use saml2_core::error::{BindingError, ValidationErrorKind};
use saml2_core::id::Saml2Id;
use saml2_core::model::{AuthnRequest, Response};
use saml2_core::namespace::NS_SOAP_ENVELOPE;
use saml2_core::pending::{InMemoryPendingRequestStore, PendingRequestState, PendingRequestStore};
use saml2_core::replay::InMemoryAssertionReplayStore;
use saml2_core::validator::{AudienceMode, Saml2Validator};
use saml2_core::xml::parse_document;

const RELAY_STATE: &str = "R1";

fn seed_pending(pending: &InMemoryPendingRequestStore, request_id: &str) {
    pending.add(
        RELAY_STATE,
        PendingRequestState {
            issuer_entity_id: IDP_ENTITY_ID.to_string(),
            message_id: Saml2Id::parse(request_id).unwrap(),
            return_url: Some("/after-login".to_string()),
        },
    );
}

#[test]
fn successful_post_bound_response_validates_and_yields_attributes() {
    common::init_tracing();
    let (private, public) = common::fixtures::generate_keypair();
    let pending = InMemoryPendingRequestStore::default();
    seed_pending(&pending, "_req1");

    let assertion = signed_assertion_xml(
        &private,
        "_a1",
        "_req1",
        "2026-07-30T11:55:00Z",
        "2026-07-30T12:05:00Z",
        SP_ENTITY_ID,
    );
    let response_xml = wrap_response(
        "_r1",
        "_req1",
        "urn:oasis:names:tc:SAML:2.0:status:Success",
        &assertion,
    );

    let decoded = post::decode(&post::encode(response_xml.as_bytes())).unwrap();
    let el = parse_document(&decoded).unwrap();
    let response = Response::from_element(&el).unwrap();

    let idp = idp_fixture(public);
    let decryption_keys = empty_decryption_keys();
    let replay = InMemoryAssertionReplayStore::default();
    let validator =
        Saml2Validator::new(&response, SP_ENTITY_ID, AudienceMode::Always, Some(RELAY_STATE));

    let validated = validator
        .validate(&pending, &idp, &decryption_keys, &replay)
        .expect("response should validate");
    assert_eq!(validated.return_url.as_deref(), Some("/after-login"));
    assert_eq!(validated.assertions[0].attributes[0].name, "email");
}

#[test]
fn replayed_response_is_rejected_on_reuse() {
    let (private, public) = common::fixtures::generate_keypair();
    let pending = InMemoryPendingRequestStore::default();
    seed_pending(&pending, "_req2");

    let assertion = signed_assertion_xml(
        &private,
        "_a2",
        "_req2",
        "2026-07-30T11:55:00Z",
        "2026-07-30T12:05:00Z",
        SP_ENTITY_ID,
    );
    let response_xml = wrap_response(
        "_r2",
        "_req2",
        "urn:oasis:names:tc:SAML:2.0:status:Success",
        &assertion,
    );
    let el = parse_document(response_xml.as_bytes()).unwrap();
    let response = Response::from_element(&el).unwrap();
    let idp = idp_fixture(public);
    let decryption_keys = empty_decryption_keys();
    let replay = InMemoryAssertionReplayStore::default();

    let first = Saml2Validator::new(&response, SP_ENTITY_ID, AudienceMode::Always, Some(RELAY_STATE));
    assert!(first.validate(&pending, &idp, &decryption_keys, &replay).is_ok());

    let second = Saml2Validator::new(&response, SP_ENTITY_ID, AudienceMode::Always, Some(RELAY_STATE));
    assert_eq!(
        second.validate(&pending, &idp, &decryption_keys, &replay),
        Err(&ValidationErrorKind::ReplayedOrUnknownRelayState)
    );
}

#[test]
fn audience_restriction_mismatch_is_rejected() {
    let (private, public) = common::fixtures::generate_keypair();
    let pending = InMemoryPendingRequestStore::default();
    seed_pending(&pending, "_req3");

    let assertion = signed_assertion_xml(
        &private,
        "_a3",
        "_req3",
        "2026-07-30T11:55:00Z",
        "2026-07-30T12:05:00Z",
        "https://someone-else.example.com",
    );
    let response_xml = wrap_response(
        "_r3",
        "_req3",
        "urn:oasis:names:tc:SAML:2.0:status:Success",
        &assertion,
    );
    let el = parse_document(response_xml.as_bytes()).unwrap();
    let response = Response::from_element(&el).unwrap();
    let idp = idp_fixture(public);
    let decryption_keys = empty_decryption_keys();
    let replay = InMemoryAssertionReplayStore::default();

    let validator =
        Saml2Validator::new(&response, SP_ENTITY_ID, AudienceMode::Always, Some(RELAY_STATE));
    assert_eq!(
        validator.validate(&pending, &idp, &decryption_keys, &replay),
        Err(&ValidationErrorKind::AudienceMismatch)
    );
}

#[test]
fn authn_request_round_trips_over_the_redirect_binding() {
    let request = AuthnRequest::new(
        SP_ENTITY_ID,
        "https://sp.example.com/acs",
        "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST",
    )
    .with_destination("https://idp.example.com/sso");

    let query = RedirectMessage::encode(
        "SAMLRequest",
        request.to_xml().as_bytes(),
        Some("/after-login"),
        None::<fn(&[u8]) -> Vec<u8>>,
    )
    .unwrap();

    let (xml, message) = RedirectMessage::decode("SAMLRequest", &query).unwrap();
    let roundtripped = AuthnRequest::from_xml(&xml).unwrap();

    assert_eq!(roundtripped.id, request.id);
    assert_eq!(message.relay_state.as_deref(), Some("/after-login"));
}

struct FixtureArtifactBackChannel {
    response_xml: String,
}

#[async_trait]
impl ArtifactBackChannel for FixtureArtifactBackChannel {
    async fn resolve(&self, _resolution_url: &str, _soap_body: &[u8]) -> Result<Vec<u8>, BindingError> {
        let soap = format!(
            r#"<soap:Envelope xmlns:soap="{soap_ns}"><soap:Body><samlp:ArtifactResponse xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_ar1" InResponseTo="_resolve1" IssueInstant="2026-07-30T12:00:00Z" Version="2.0">
                <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
                {response_xml}
            </samlp:ArtifactResponse></soap:Body></soap:Envelope>"#,
            soap_ns = NS_SOAP_ENVELOPE,
            response_xml = self.response_xml,
        );
        Ok(soap.into_bytes())
    }
}

#[tokio::test]
async fn artifact_binding_resolves_and_validates_end_to_end() {
    let (private, public) = common::fixtures::generate_keypair();
    let pending = InMemoryPendingRequestStore::default();
    seed_pending(&pending, "_req4");

    let assertion = signed_assertion_xml(
        &private,
        "_a4",
        "_req4",
        "2026-07-30T11:55:00Z",
        "2026-07-30T12:05:00Z",
        SP_ENTITY_ID,
    );
    let response_xml = wrap_response(
        "_r4",
        "_req4",
        "urn:oasis:names:tc:SAML:2.0:status:Success",
        &assertion,
    );

    let artifact = Artifact::generate(IDP_ENTITY_ID, 0);
    assert!(artifact.matches_source(IDP_ENTITY_ID));

    let back_channel = FixtureArtifactBackChannel { response_xml };
    let artifact_response = resolve_artifact(
        &back_channel,
        SP_ENTITY_ID,
        &artifact.to_wire(),
        "https://idp.example.com/resolve",
        Duration::from_secs(5),
    )
    .await
    .unwrap();

    let response = match artifact_response.payload {
        saml2_core::model::ArtifactPayload::Response(r) => r,
        saml2_core::model::ArtifactPayload::Other(_) => panic!("expected inner Response"),
    };

    let idp = idp_fixture(public);
    let decryption_keys = empty_decryption_keys();
    let replay = InMemoryAssertionReplayStore::default();
    let validator =
        Saml2Validator::new(&response, SP_ENTITY_ID, AudienceMode::Always, Some(RELAY_STATE));
    assert!(validator.validate(&pending, &idp, &decryption_keys, &replay).is_ok());
}
