//! HTTP-Redirect binding (C6): `SAMLRequest`/`SAMLResponse` carried as a
//! DEFLATE-compressed, base64-encoded, URL-encoded query parameter, with an
//! optional detached `SigAlg`/`Signature` pair covering the exact query
//! string bytes.
//!
//! The signing/verification order matters and is easy to get backwards: the
//! string that gets signed is `SAMLRequest=<enc>&RelayState=<enc>&SigAlg=<enc>`
//! built from the *already percent-encoded* parameter values, assembled in
//! that fixed order, with `RelayState` omitted entirely when absent — not
//! the raw query string as received, and not the unencoded values.

use flate2::write::DeflateEncoder;
use flate2::read::DeflateDecoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::error::BindingError;

pub struct RedirectMessage {
    pub param_name: &'static str,
    pub encoded_message: String,
    pub relay_state: Option<String>,
    pub sig_alg: Option<String>,
    pub signature: Option<String>,
}

impl RedirectMessage {
    /// Build the query string fragment (no leading `?`) for an outgoing
    /// redirect, optionally signed with `sign` (raw RSA-SHA256 signature
    /// bytes over the to-be-signed string).
    pub fn encode(
        param_name: &'static str,
        xml: &[u8],
        relay_state: Option<&str>,
        sign: Option<impl Fn(&[u8]) -> Vec<u8>>,
    ) -> Result<String, BindingError> {
        let deflated = deflate(xml)?;
        let encoded_message = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, deflated);

        let mut query = format!(
            "{param_name}={}",
            urlencoding::encode(&encoded_message)
        );
        if let Some(rs) = relay_state {
            query.push_str(&format!("&RelayState={}", urlencoding::encode(rs)));
        }

        if let Some(sign) = sign {
            const SIG_ALG: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
            let to_be_signed = format!("{query}&SigAlg={}", urlencoding::encode(SIG_ALG));
            let signature = sign(to_be_signed.as_bytes());
            let signature_b64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, signature);
            query = format!(
                "{to_be_signed}&Signature={}",
                urlencoding::encode(&signature_b64)
            );
        }

        Ok(query)
    }

    /// Parse a received query string into its constituent fields and
    /// inflate the message payload, without verifying any signature — that
    /// is the caller's job, since it needs key material this module has no
    /// business holding.
    pub fn decode(param_name: &'static str, query: &str) -> Result<(Vec<u8>, Self), BindingError> {
        let mut encoded_message = None;
        let mut relay_state = None;
        let mut sig_alg = None;
        let mut signature = None;

        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let decoded = urlencoding::decode(value)
                .map_err(|e| BindingError::MalformedArtifact(e.to_string()))?
                .into_owned();
            if key == param_name {
                encoded_message = Some(decoded);
            } else if key == "RelayState" {
                relay_state = Some(decoded);
            } else if key == "SigAlg" {
                sig_alg = Some(decoded);
            } else if key == "Signature" {
                signature = Some(decoded);
            }
        }

        let encoded_message =
            encoded_message.ok_or_else(|| BindingError::MissingField(param_name.to_string()))?;
        let compressed = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &encoded_message)
            .map_err(|e| BindingError::Base64(e.to_string()))?;
        let xml = inflate(&compressed)?;

        Ok((
            xml,
            RedirectMessage {
                param_name,
                encoded_message,
                relay_state,
                sig_alg,
                signature,
            },
        ))
    }

    /// Reconstruct the exact to-be-signed string for a received message, so
    /// a caller can verify `signature` against it. Returns `None` if the
    /// message carried no `SigAlg`/`Signature` pair.
    pub fn signed_content(&self, original_query: &str) -> Option<String> {
        self.sig_alg.as_ref()?;
        self.signature.as_ref()?;
        // The signed content is everything up to (and including) `SigAlg=...`,
        // verbatim as received — we must not re-derive percent-encoding,
        // since IdPs vary in how they encode reserved characters and any
        // re-encoding would produce bytes the signer never signed.
        let sig_param_start = original_query.find("&Signature=")?;
        Some(original_query[..sig_param_start].to_string())
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, BindingError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| BindingError::Deflate(e.to_string()))?;
    encoder.finish().map_err(|e| BindingError::Deflate(e.to_string()))
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, BindingError> {
    let mut decoder = DeflateDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| BindingError::Inflate(e.to_string()))?;
    Ok(out)
}
