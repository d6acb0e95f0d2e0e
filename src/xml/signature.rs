//! XML-DSig verification for signed SAML content (C3).
//!
//! Covers the enveloped-signature profile IdPs use for both `Response` and
//! bare `Assertion` elements: a `ds:Signature` child of the signed element
//! itself, with exactly one `ds:Reference` whose `URI` points back at that
//! same element by its `ID`. The reference-matching rule is not cosmetic —
//! it's what stops an attacker wrapping a validly-signed assertion inside an
//! attacker-controlled envelope and pointing the unsigned outer element at a
//! principal of their choosing (the classic XML signature wrapping attack).
//! We deliberately never fall back to "there is a signature somewhere in the
//! document" — the reference has to name the element we're actually about
//! to trust.

use rsa::pkcs1v15::{Signature as RsaSignature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha1::Sha1;
use sha2::Sha256;

use crate::error::ValidationErrorKind;
use crate::namespace::NS_DS;
use crate::xml::canon::{canonicalize, strip_enveloped_signature};
use crate::xml::tree::Element;

const TRANSFORM_ENVELOPED: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
const TRANSFORM_EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
const TRANSFORM_EXC_C14N_COMMENTS: &str = "http://www.w3.org/2001/10/xml-exc-c14n#WithComments";
const DIGEST_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#sha1";
const DIGEST_SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
const SIG_RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";
const SIG_RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";

/// A located but not-yet-verified signature: the parsed `SignedInfo`
/// subtree plus the pieces needed to recompute and compare a digest.
struct ParsedSignature<'a> {
    signed_info: &'a Element,
    digest_method: String,
    digest_value: Vec<u8>,
    signature_method: String,
    signature_value: Vec<u8>,
    reference_uri: String,
}

/// Verify that `element` carries a valid enveloped XML signature referring
/// to itself (`element`'s own `ID` attribute), against any one of
/// `candidate_keys`. Returns `Ok(())` on the first key that validates;
/// `Err(SignatureInvalid)` if every candidate fails or there are no
/// candidates, surfacing the more specific structural errors first.
pub fn verify_enveloped_signature(
    element: &Element,
    candidate_keys: &[RsaPublicKey],
) -> Result<(), ValidationErrorKind> {
    let signature_el = element
        .child_element(NS_DS, "Signature")
        .ok_or(ValidationErrorKind::NotSigned)?;

    let parsed = parse_signature(signature_el)?;

    let own_id = element
        .attr("ID")
        .ok_or_else(|| ValidationErrorKind::XmlMalformed("signed element has no ID".into()))?;
    let expected_uri = format!("#{own_id}");
    if parsed.reference_uri != expected_uri {
        return Err(ValidationErrorKind::ReferenceMismatch);
    }

    let stripped = strip_enveloped_signature(element);
    let canonical = canonicalize(&stripped);
    let actual_digest = digest(&parsed.digest_method, &canonical)?;
    if actual_digest != parsed.digest_value {
        return Err(ValidationErrorKind::SignatureInvalid);
    }

    let signed_info_canonical = canonicalize(parsed.signed_info);

    if candidate_keys.is_empty() {
        return Err(ValidationErrorKind::SignatureInvalid);
    }

    for key in candidate_keys {
        if verify_with_key(key, &parsed.signature_method, &signed_info_canonical, &parsed.signature_value)? {
            return Ok(());
        }
    }

    Err(ValidationErrorKind::SignatureInvalid)
}

fn parse_signature(signature_el: &Element) -> Result<ParsedSignature<'_>, ValidationErrorKind> {
    let signed_info = signature_el
        .child_element(NS_DS, "SignedInfo")
        .ok_or_else(|| ValidationErrorKind::XmlMalformed("Signature has no SignedInfo".into()))?;

    let references: Vec<&Element> = signed_info
        .child_elements()
        .filter(|e| e.is(NS_DS, "Reference"))
        .collect();
    if references.is_empty() {
        return Err(ValidationErrorKind::NoReference);
    }
    if references.len() > 1 {
        return Err(ValidationErrorKind::MultipleReferences);
    }
    let reference = references[0];

    let reference_uri = reference
        .attr("URI")
        .ok_or_else(|| ValidationErrorKind::XmlMalformed("Reference has no URI".into()))?
        .to_string();

    let transforms_el = reference
        .child_element(NS_DS, "Transforms")
        .ok_or_else(|| ValidationErrorKind::XmlMalformed("Reference has no Transforms".into()))?;
    for transform in transforms_el.child_elements().filter(|e| e.is(NS_DS, "Transform")) {
        let algorithm = transform.attr("Algorithm").unwrap_or_default();
        if algorithm != TRANSFORM_ENVELOPED
            && algorithm != TRANSFORM_EXC_C14N
            && algorithm != TRANSFORM_EXC_C14N_COMMENTS
        {
            return Err(ValidationErrorKind::DisallowedTransform(algorithm.to_string()));
        }
    }

    let digest_method_el = reference
        .child_element(NS_DS, "DigestMethod")
        .ok_or_else(|| ValidationErrorKind::XmlMalformed("Reference has no DigestMethod".into()))?;
    let digest_method = digest_method_el.attr("Algorithm").unwrap_or_default().to_string();

    let digest_value_el = reference
        .child_element(NS_DS, "DigestValue")
        .ok_or_else(|| ValidationErrorKind::XmlMalformed("Reference has no DigestValue".into()))?;
    let digest_value = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, digest_value_el.text().replace(['\n', '\r', ' '], ""))
        .map_err(|_| ValidationErrorKind::XmlMalformed("DigestValue is not valid base64".into()))?;

    let signature_method_el = signed_info
        .child_element(NS_DS, "SignatureMethod")
        .ok_or_else(|| ValidationErrorKind::XmlMalformed("SignedInfo has no SignatureMethod".into()))?;
    let signature_method = signature_method_el.attr("Algorithm").unwrap_or_default().to_string();

    let signature_value_el = signature_el
        .child_element(NS_DS, "SignatureValue")
        .ok_or_else(|| ValidationErrorKind::XmlMalformed("Signature has no SignatureValue".into()))?;
    let signature_value = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, signature_value_el.text().replace(['\n', '\r', ' '], ""))
        .map_err(|_| ValidationErrorKind::XmlMalformed("SignatureValue is not valid base64".into()))?;

    Ok(ParsedSignature {
        signed_info,
        digest_method,
        digest_value,
        signature_method,
        signature_value,
        reference_uri,
    })
}

fn digest(method: &str, data: &[u8]) -> Result<Vec<u8>, ValidationErrorKind> {
    use sha1::Sha1 as Sha1Digest;
    use sha2::{Digest, Sha256 as Sha256Digest};
    match method {
        DIGEST_SHA256 => Ok(Sha256Digest::digest(data).to_vec()),
        DIGEST_SHA1 => Ok(Sha1Digest::digest(data).to_vec()),
        other => Err(ValidationErrorKind::DisallowedTransform(other.to_string())),
    }
}

fn verify_with_key(
    key: &RsaPublicKey,
    method: &str,
    signed_info: &[u8],
    signature: &[u8],
) -> Result<bool, ValidationErrorKind> {
    let sig = RsaSignature::try_from(signature)
        .map_err(|_| ValidationErrorKind::SignatureInvalid)?;
    match method {
        SIG_RSA_SHA256 => {
            let verifying_key = VerifyingKey::<Sha256>::new(key.clone());
            Ok(verifying_key.verify(signed_info, &sig).is_ok())
        }
        SIG_RSA_SHA1 => {
            let verifying_key = VerifyingKey::<Sha1>::new(key.clone());
            Ok(verifying_key.verify(signed_info, &sig).is_ok())
        }
        _ => Err(ValidationErrorKind::Sha256NotRegistered),
    }
}
