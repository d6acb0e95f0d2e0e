//! HTTP-POST binding (C6): `SAMLRequest`/`SAMLResponse` carried as a plain
//! base64-encoded form field, no compression — unlike the redirect binding,
//! signing (if any) is carried inline in the XML itself via `ds:Signature`,
//! not as a detached form-field signature.

use crate::error::BindingError;

pub fn encode(xml: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, xml)
}

pub fn decode(encoded: &str) -> Result<Vec<u8>, BindingError> {
    base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded.replace(['\n', '\r'], ""))
        .map_err(|e| BindingError::Base64(e.to_string()))
}

/// Extract a named field from an `application/x-www-form-urlencoded` body,
/// percent-decoding the value.
pub fn form_field(body: &str, field: &str) -> Result<String, BindingError> {
    for pair in body.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if key == field {
            return urlencoding::decode(&value.replace('+', " "))
                .map(|s| s.into_owned())
                .map_err(|e| BindingError::MalformedArtifact(e.to_string()));
        }
    }
    Err(BindingError::MissingField(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_base64() {
        let xml = b"<samlp:Response/>";
        let encoded = encode(xml);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, xml);
    }

    #[test]
    fn extracts_a_form_encoded_field() {
        let body = "SAMLResponse=abc123&RelayState=%2Fafter-login";
        assert_eq!(form_field(body, "SAMLResponse").unwrap(), "abc123");
        assert_eq!(form_field(body, "RelayState").unwrap(), "/after-login");
    }

    #[test]
    fn missing_field_is_an_error() {
        assert!(form_field("RelayState=foo", "SAMLResponse").is_err());
    }
}
