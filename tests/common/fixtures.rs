//! Test fixtures: canned signed responses and stub host implementations,
//! shared by the scenario tests in this directory.

use rsa::pkcs1v15::SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use saml2_core::crypto::{DecryptionKey, KeyRing, SigningKey as CoreSigningKey};
use saml2_core::host::IdentityProviderConfig;
use saml2_core::namespace::{Saml2BindingType, NS_DS};
use saml2_core::xml::canon::canonicalize;
use saml2_core::xml::parse_document;

pub const IDP_ENTITY_ID: &str = "https://idp.example.com/metadata";
pub const SP_ENTITY_ID: &str = "https://sp.example.com/metadata";
pub const SP_ACS_URL: &str = "https://sp.example.com/acs";

pub fn generate_keypair() -> (RsaPrivateKey, RsaPublicKey) {
    let mut rng = rand::thread_rng();
    let private = RsaPrivateKey::new(&mut rng, 2048).expect("key generation");
    let public = private.to_public_key();
    (private, public)
}

/// Build a fully-formed, signed `saml:Assertion` with the given `id`,
/// `in_response_to`, and attribute map, signed with `private`.
pub fn signed_assertion_xml(
    private: &RsaPrivateKey,
    id: &str,
    in_response_to: &str,
    not_before: &str,
    not_on_or_after: &str,
    audience: &str,
) -> String {
    let unsigned = format!(
        r#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" xmlns:ds="{ds}" ID="{id}" IssueInstant="2026-07-30T12:00:00Z" Version="2.0">
            <saml:Issuer>{issuer}</saml:Issuer>
            <saml:Subject>
                <saml:NameID Format="urn:oasis:names:tc:SAML:2.0:nameid-format:transient">user-1</saml:NameID>
                <saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer">
                    <saml:SubjectConfirmationData InResponseTo="{in_response_to}" Recipient="{acs}" NotOnOrAfter="{not_on_or_after}"/>
                </saml:SubjectConfirmation>
            </saml:Subject>
            <saml:Conditions NotBefore="{not_before}" NotOnOrAfter="{not_on_or_after}">
                <saml:AudienceRestriction><saml:Audience>{audience}</saml:Audience></saml:AudienceRestriction>
            </saml:Conditions>
            <saml:AuthnStatement AuthnInstant="2026-07-30T12:00:00Z" SessionIndex="sess-1">
                <saml:AuthnContext><saml:AuthnContextClassRef>urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport</saml:AuthnContextClassRef></saml:AuthnContext>
            </saml:AuthnStatement>
            <saml:AttributeStatement>
                <saml:Attribute Name="email"><saml:AttributeValue>user@example.com</saml:AttributeValue></saml:Attribute>
            </saml:AttributeStatement>
        </saml:Assertion>"#,
        ds = NS_DS,
        id = id,
        issuer = IDP_ENTITY_ID,
        in_response_to = in_response_to,
        acs = SP_ACS_URL,
        not_before = not_before,
        not_on_or_after = not_on_or_after,
        audience = audience,
    );

    let el = parse_document(unsigned.as_bytes()).expect("fixture parses");
    let canon = canonicalize(&el);
    let digest_value = Sha256::digest(&canon);
    let digest_b64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, digest_value);

    let signed_info = format!(
        r#"<ds:SignedInfo xmlns:ds="{ds}"><ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/><ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"/><ds:Reference URI="#{id}"><ds:Transforms><ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/><ds:Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/></ds:Transforms><ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"/><ds:DigestValue>{digval}</ds:DigestValue></ds:Reference></ds:SignedInfo>"#,
        ds = NS_DS,
        digval = digest_b64,
        id = id,
    );
    let signed_info_el = parse_document(signed_info.as_bytes()).expect("signed info parses");
    let signed_info_canon = canonicalize(&signed_info_el);

    let mut rng = rand::thread_rng();
    let signing_key = SigningKey::<Sha256>::new(private.clone());
    let signature = signing_key.sign_with_rng(&mut rng, &signed_info_canon);
    let sig_b64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, signature.to_bytes());

    let signature_xml = format!(
        r#"<ds:Signature xmlns:ds="{ds}">{signed_info}<ds:SignatureValue>{sig_b64}</ds:SignatureValue></ds:Signature>"#,
        ds = NS_DS,
        signed_info = signed_info,
        sig_b64 = sig_b64,
    );

    unsigned.replacen("</saml:Assertion>", &format!("{signature_xml}</saml:Assertion>"), 1)
}

pub fn wrap_response(
    response_id: &str,
    in_response_to: &str,
    status_uri: &str,
    assertion_xml: &str,
) -> String {
    format!(
        r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{response_id}" InResponseTo="{in_response_to}" IssueInstant="2026-07-30T12:00:00Z" Destination="{acs}" Version="2.0">
            <saml:Issuer>{issuer}</saml:Issuer>
            <samlp:Status><samlp:StatusCode Value="{status_uri}"/></samlp:Status>
            {assertion_xml}
        </samlp:Response>"#,
        response_id = response_id,
        in_response_to = in_response_to,
        acs = SP_ACS_URL,
        issuer = IDP_ENTITY_ID,
        status_uri = status_uri,
        assertion_xml = assertion_xml,
    )
}

pub struct StubIdp {
    pub entity_id: String,
    pub signing_keys: Vec<RsaPublicKey>,
    pub sso_redirect_url: Option<String>,
    pub artifact_resolution_url: Option<String>,
}

impl IdentityProviderConfig for StubIdp {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn signing_keys(&self) -> KeyRing<CoreSigningKey> {
        KeyRing::new(
            self.signing_keys
                .iter()
                .cloned()
                .map(CoreSigningKey)
                .collect(),
        )
    }

    fn sso_url(&self, binding: Saml2BindingType) -> Option<&str> {
        match binding {
            Saml2BindingType::HttpRedirect => self.sso_redirect_url.as_deref(),
            _ => None,
        }
    }

    fn artifact_resolution_url(&self) -> Option<&str> {
        self.artifact_resolution_url.as_deref()
    }
}

pub fn idp_fixture(public: RsaPublicKey) -> StubIdp {
    StubIdp {
        entity_id: IDP_ENTITY_ID.to_string(),
        signing_keys: vec![public],
        sso_redirect_url: Some("https://idp.example.com/sso".to_string()),
        artifact_resolution_url: Some("https://idp.example.com/resolve".to_string()),
    }
}

pub fn empty_decryption_keys() -> KeyRing<DecryptionKey> {
    KeyRing::new(vec![])
}
