//! `EncryptedAssertion` decryption (C4).
//!
//! Wire shape this decrypts:
//!
//! ```xml
//! <saml:EncryptedAssertion>
//!   <xenc:EncryptedData>
//!     <xenc:CipherData><xenc:CipherValue>...</xenc:CipherValue></xenc:CipherData>
//!     <ds:KeyInfo>
//!       <xenc:EncryptedKey>
//!         <xenc:CipherData><xenc:CipherValue>...</xenc:CipherValue></xenc:CipherData>
//!       </xenc:EncryptedKey>
//!     </ds:KeyInfo>
//!   </xenc:EncryptedData>
//! </saml:EncryptedAssertion>
//! ```
//!
//! `EncryptedKey` is unwrapped with RSA-OAEP to recover a content-encryption
//! key, which then opens `CipherValue` with AES-GCM. Every candidate
//! decryption key in the ring is tried; a response is rejected only once
//! every candidate has failed to unwrap the key (key rollover means a
//! mid-rotation failure on an old key is expected and not itself fatal).

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use rsa::Oaep;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::crypto::keys::{DecryptionKey, KeyRing};
use crate::error::ValidationErrorKind;
use crate::namespace::{NS_DS, NS_XENC};
use crate::xml::tree::{parse_document, Element};

pub fn decrypt_assertion(
    encrypted_assertion: &Element,
    keys: &KeyRing<DecryptionKey>,
) -> Result<Element, ValidationErrorKind> {
    if keys.is_empty() {
        return Err(ValidationErrorKind::NoDecryptionKey);
    }

    let encrypted_data = encrypted_assertion
        .child_element(NS_XENC, "EncryptedData")
        .ok_or_else(|| ValidationErrorKind::XmlMalformed("no EncryptedData".into()))?;

    let content_cipher_value = base64_text(
        encrypted_data
            .child_element(NS_XENC, "CipherData")
            .and_then(|cd| cd.child_element(NS_XENC, "CipherValue"))
            .ok_or_else(|| ValidationErrorKind::XmlMalformed("EncryptedData has no CipherValue".into()))?,
    )?;

    let content_algorithm = encrypted_data
        .child_element(NS_XENC, "EncryptionMethod")
        .and_then(|m| m.attr("Algorithm"))
        .unwrap_or_default()
        .to_string();

    let encrypted_key_el = encrypted_data
        .child_element(NS_DS, "KeyInfo")
        .and_then(|ki| ki.child_element(NS_XENC, "EncryptedKey"))
        .ok_or_else(|| ValidationErrorKind::XmlMalformed("EncryptedData has no EncryptedKey".into()))?;

    let key_cipher_value = base64_text(
        encrypted_key_el
            .child_element(NS_XENC, "CipherData")
            .and_then(|cd| cd.child_element(NS_XENC, "CipherValue"))
            .ok_or_else(|| ValidationErrorKind::XmlMalformed("EncryptedKey has no CipherValue".into()))?,
    )?;

    debug!("attempting EncryptedAssertion decryption against {} candidate key(s)", keys.iter().count());
    let mut last_err = None;
    for (i, key) in keys.iter().enumerate() {
        match unwrap_and_decrypt(&key.0, &key_cipher_value, &content_cipher_value, &content_algorithm) {
            Ok(plaintext) => {
                let el = parse_document(&plaintext)
                    .map_err(|e| ValidationErrorKind::XmlMalformed(e.to_string()))?;
                debug!("EncryptedAssertion decrypted with candidate key {}", i);
                return Ok(el);
            }
            Err(e) => last_err = Some(e),
        }
    }
    warn!("EncryptedAssertion decryption failed against every candidate key");
    Err(last_err.unwrap_or(ValidationErrorKind::DecryptionFailed))
}

fn unwrap_and_decrypt(
    private_key: &rsa::RsaPrivateKey,
    key_cipher_value: &[u8],
    content_cipher_value: &[u8],
    content_algorithm: &str,
) -> Result<Vec<u8>, ValidationErrorKind> {
    let padding = Oaep::new::<Sha256>();
    let content_key = private_key
        .decrypt(padding, key_cipher_value)
        .map_err(|_| ValidationErrorKind::DecryptionFailed)?;

    // GCM-mode ciphertexts here are laid out nonce (12 bytes) || ciphertext+tag,
    // the convention this crate uses for its own `CipherValue` framing since
    // plain XML-ENC AES-GCM-CBC framing isn't standardized the way CBC is.
    if content_cipher_value.len() < 12 {
        return Err(ValidationErrorKind::DecryptionFailed);
    }
    let (nonce_bytes, ciphertext) = content_cipher_value.split_at(12);
    let nonce = Nonce::from_slice(nonce_bytes);

    match content_algorithm {
        "http://www.w3.org/2009/xmlenc11#aes128-gcm" => {
            let cipher = Aes128Gcm::new_from_slice(&content_key)
                .map_err(|_| ValidationErrorKind::DecryptionFailed)?;
            cipher
                .decrypt(nonce, ciphertext)
                .map_err(|_| ValidationErrorKind::DecryptionFailed)
        }
        "http://www.w3.org/2009/xmlenc11#aes256-gcm" | "" => {
            let cipher = Aes256Gcm::new_from_slice(&content_key)
                .map_err(|_| ValidationErrorKind::DecryptionFailed)?;
            cipher
                .decrypt(nonce, ciphertext)
                .map_err(|_| ValidationErrorKind::DecryptionFailed)
        }
        _ => Err(ValidationErrorKind::DecryptionFailed),
    }
}

fn base64_text(el: &Element) -> Result<Vec<u8>, ValidationErrorKind> {
    base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        el.text().replace(['\n', '\r', ' '], ""),
    )
    .map_err(|_| ValidationErrorKind::XmlMalformed("CipherValue is not valid base64".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::KeyRing;
    use aes_gcm::aead::OsRng as AesOsRng;
    use rsa::RsaPrivateKey;

    fn encrypt_fixture(plaintext: &[u8], public: &rsa::RsaPublicKey) -> (Vec<u8>, Vec<u8>) {
        let content_key_bytes: [u8; 32] = {
            use aes_gcm::aead::rand_core::RngCore;
            let mut k = [0u8; 32];
            AesOsRng.fill_bytes(&mut k);
            k
        };
        let cipher = Aes256Gcm::new_from_slice(&content_key_bytes).unwrap();
        let mut nonce_bytes = [0u8; 12];
        {
            use aes_gcm::aead::rand_core::RngCore;
            AesOsRng.fill_bytes(&mut nonce_bytes);
        }
        let nonce = Nonce::from_slice(&nonce_bytes);
        let mut ciphertext = cipher.encrypt(nonce, plaintext).unwrap();
        let mut framed = nonce_bytes.to_vec();
        framed.append(&mut ciphertext);

        let mut rng = rand::thread_rng();
        let padding = Oaep::new::<Sha256>();
        let wrapped_key = public.encrypt(&mut rng, padding, &content_key_bytes).unwrap();

        (wrapped_key, framed)
    }

    #[test]
    fn decrypts_with_matching_key() {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = private.to_public_key();

        let plaintext = br#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_x"/>"#;
        let (wrapped_key, framed_content) = encrypt_fixture(plaintext, &public);

        let xml = format!(
            r#"<saml:EncryptedAssertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" xmlns:xenc="{xenc}" xmlns:ds="{ds}">
                <xenc:EncryptedData>
                    <xenc:EncryptionMethod Algorithm="http://www.w3.org/2009/xmlenc11#aes256-gcm"/>
                    <xenc:CipherData><xenc:CipherValue>{content}</xenc:CipherValue></xenc:CipherData>
                    <ds:KeyInfo>
                        <xenc:EncryptedKey>
                            <xenc:CipherData><xenc:CipherValue>{key}</xenc:CipherValue></xenc:CipherData>
                        </xenc:EncryptedKey>
                    </ds:KeyInfo>
                </xenc:EncryptedData>
            </saml:EncryptedAssertion>"#,
            xenc = NS_XENC,
            ds = NS_DS,
            content = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &framed_content),
            key = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &wrapped_key),
        );

        let el = parse_document(xml.as_bytes()).unwrap();
        let keys = KeyRing::new(vec![DecryptionKey(private)]);
        let decrypted = decrypt_assertion(&el, &keys).unwrap();
        assert!(decrypted.is("urn:oasis:names:tc:SAML:2.0:assertion", "Assertion"));
    }

    #[test]
    fn fails_when_no_candidate_key_matches() {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = private.to_public_key();
        let other_private = RsaPrivateKey::new(&mut rng, 2048).unwrap();

        let plaintext = br#"<saml:Assertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_x"/>"#;
        let (wrapped_key, framed_content) = encrypt_fixture(plaintext, &public);

        let xml = format!(
            r#"<saml:EncryptedAssertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" xmlns:xenc="{xenc}" xmlns:ds="{ds}">
                <xenc:EncryptedData>
                    <xenc:EncryptionMethod Algorithm="http://www.w3.org/2009/xmlenc11#aes256-gcm"/>
                    <xenc:CipherData><xenc:CipherValue>{content}</xenc:CipherValue></xenc:CipherData>
                    <ds:KeyInfo>
                        <xenc:EncryptedKey>
                            <xenc:CipherData><xenc:CipherValue>{key}</xenc:CipherValue></xenc:CipherData>
                        </xenc:EncryptedKey>
                    </ds:KeyInfo>
                </xenc:EncryptedData>
            </saml:EncryptedAssertion>"#,
            xenc = NS_XENC,
            ds = NS_DS,
            content = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &framed_content),
            key = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &wrapped_key),
        );

        let el = parse_document(xml.as_bytes()).unwrap();
        let keys = KeyRing::new(vec![DecryptionKey(other_private)]);
        assert!(decrypt_assertion(&el, &keys).is_err());
    }

    #[test]
    fn fails_with_no_keys_configured() {
        let el = parse_document(
            format!(
                r#"<saml:EncryptedAssertion xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" xmlns:xenc="{}"><xenc:EncryptedData/></saml:EncryptedAssertion>"#,
                NS_XENC
            )
            .as_bytes(),
        )
        .unwrap();
        let keys: KeyRing<DecryptionKey> = KeyRing::new(vec![]);
        assert_eq!(
            decrypt_assertion(&el, &keys),
            Err(ValidationErrorKind::NoDecryptionKey)
        );
    }
}
