//! Response validation (C8): the procedure that turns a parsed `Response`
//! into either a trusted [`ValidatedAssertion`] or a concrete
//! [`ValidationErrorKind`], run at most once per response and memoized.
//!
//! Validation is expensive (RSA verification, XML canonicalization) and a
//! host may legitimately ask "is this valid?" more than once while handling
//! a single request (once to decide whether to log the user in, again to
//! render an error page on failure). `Saml2Validator` caches its own
//! outcome behind a `OnceCell` so the second caller gets the first result
//! instead of redoing the work — and so two callers racing on the very
//! first call can't observe two different answers.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::crypto::decrypt::decrypt_assertion;
use crate::crypto::keys::{DecryptionKey, KeyRing};
use crate::error::ValidationErrorKind;
use crate::host::IdentityProviderConfig;
use crate::model::{Assertion, Attribute, Response, ResponseAssertion};
use crate::namespace::Saml2StatusCode;
use crate::pending::{PendingRequestState, PendingRequestStore};
use crate::replay::AssertionReplayStore;
use crate::xml::signature::verify_enveloped_signature;
use crate::xml::tree::Element;

/// Governs whether the audience restriction in `Conditions` must name our
/// own entity ID. `Always` is the normal Web SSO posture; `IfBearer` only
/// enforces it when the subject confirmation method is bearer (some
/// holder-of-key profiles carry no audience restriction at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceMode {
    Always,
    Never,
    IfBearer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAssertion {
    /// Every assertion the response carried, each individually verified and
    /// condition-checked. Almost always exactly one element.
    pub assertions: Vec<Assertion>,
    /// Where the host wanted to resume local state, carried in the pending
    /// entry the `RelayState` token was keyed under.
    pub return_url: Option<String>,
}

pub struct Saml2Validator<'a> {
    response: &'a Response,
    our_entity_id: &'a str,
    audience_mode: AudienceMode,
    relay_state: Option<&'a str>,
    now: DateTime<Utc>,
    result: OnceCell<Result<ValidatedAssertion, ValidationErrorKind>>,
}

impl<'a> Saml2Validator<'a> {
    pub fn new(
        response: &'a Response,
        our_entity_id: &'a str,
        audience_mode: AudienceMode,
        relay_state: Option<&'a str>,
    ) -> Self {
        Self {
            response,
            our_entity_id,
            audience_mode,
            relay_state,
            now: Utc::now(),
            result: OnceCell::new(),
        }
    }

    #[cfg(test)]
    fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Run (or reuse the cached result of) the full validation procedure.
    pub fn validate(
        &self,
        pending: &dyn PendingRequestStore,
        idp: &dyn IdentityProviderConfig,
        decryption_keys: &KeyRing<DecryptionKey>,
        replay: &dyn AssertionReplayStore,
    ) -> Result<&ValidatedAssertion, &ValidationErrorKind> {
        self.result
            .get_or_init(|| self.run(pending, idp, decryption_keys, replay))
            .as_ref()
    }

    fn run(
        &self,
        pending: &dyn PendingRequestStore,
        idp: &dyn IdentityProviderConfig,
        decryption_keys: &KeyRing<DecryptionKey>,
        replay: &dyn AssertionReplayStore,
    ) -> Result<ValidatedAssertion, ValidationErrorKind> {
        debug!("validating response {:?} for {}", self.response.id, self.our_entity_id);

        let pending_state = self.match_request(pending).inspect_err(|e| {
            warn!("response {:?} did not match a pending request: {:?}", self.response.id, e);
        })?;

        if self.response.status.code != Saml2StatusCode::Success {
            warn!(
                "response {:?} carries unsuccessful status {:?}",
                self.response.id, self.response.status.code
            );
            return Err(ValidationErrorKind::UnsuccessfulStatus {
                status: self.response.status.code,
                message: self.response.status.message.clone(),
                second_level: self.response.status.second_level_code.clone(),
            });
        }

        if self.response.issuer.as_deref() != Some(pending_state.issuer_entity_id.as_str()) {
            warn!(
                "response {:?} issuer {:?} does not match the pending IdP {:?}",
                self.response.id, self.response.issuer, pending_state.issuer_entity_id
            );
            return Err(ValidationErrorKind::IssuerMismatch);
        }

        let signing_keys = idp.signing_keys().public_keys();
        let response_signed = verify_enveloped_signature(&self.response.root, &signing_keys).is_ok();
        debug!("response {:?} signed at the response level: {}", self.response.id, response_signed);

        let assertions = self.extract_assertions(decryption_keys)?;

        if !response_signed {
            // unsigned response: every assertion must individually carry its
            // own signature, or there's nothing tying its content to the IdP.
            for (el, _) in &assertions {
                verify_enveloped_signature(el, &signing_keys)
                    .map_err(|_| ValidationErrorKind::UnsignedAssertion)?;
            }
        }

        for (_, assertion) in &assertions {
            self.check_conditions(assertion, replay)?;
        }

        debug!("response {:?} validated successfully", self.response.id);
        Ok(ValidatedAssertion {
            assertions: assertions.into_iter().map(|(_, a)| a).collect(),
            return_url: pending_state.return_url,
        })
    }

    fn match_request(
        &self,
        pending: &dyn PendingRequestStore,
    ) -> Result<PendingRequestState, ValidationErrorKind> {
        match &self.response.in_response_to {
            None => Err(ValidationErrorKind::UnsolicitedNotAllowed),
            Some(in_response_to) => {
                let relay_state = self
                    .relay_state
                    .ok_or(ValidationErrorKind::ReplayedOrUnknownRelayState)?;
                let state = pending
                    .try_remove(relay_state)
                    .ok_or(ValidationErrorKind::ReplayedOrUnknownRelayState)?;
                if state.message_id.as_str() != in_response_to.as_str() {
                    return Err(ValidationErrorKind::InResponseToMismatch);
                }
                Ok(state)
            }
        }
    }

    /// Decrypt (if needed) and parse every assertion the response carries,
    /// alongside the raw element each was parsed from — needed so an
    /// unsigned response's per-assertion signature check can canonicalize
    /// the original bytes rather than a reconstruction of the parsed struct.
    fn extract_assertions(
        &self,
        decryption_keys: &KeyRing<DecryptionKey>,
    ) -> Result<Vec<(Element, Assertion)>, ValidationErrorKind> {
        if self.response.assertions.is_empty() {
            return Err(ValidationErrorKind::XmlMalformed("response carries no assertion".into()));
        }

        self.response
            .assertions
            .iter()
            .map(|entry| match entry {
                ResponseAssertion::Plaintext(a) => {
                    let el = self
                        .response
                        .root
                        .child_elements()
                        .find(|e| {
                            e.is(crate::namespace::NS_ASSERTION, "Assertion")
                                && e.attr("ID") == Some(a.id.as_str())
                        })
                        .ok_or_else(|| {
                            ValidationErrorKind::XmlMalformed("could not re-locate assertion element".into())
                        })?;
                    Ok((el.clone(), a.clone()))
                }
                ResponseAssertion::Encrypted(el) => {
                    let decrypted_el = decrypt_assertion(el, decryption_keys)?;
                    let assertion = Assertion::from_element(&decrypted_el).map_err(ValidationErrorKind::from)?;
                    Ok((decrypted_el, assertion))
                }
            })
            .collect()
    }

    fn check_conditions(
        &self,
        assertion: &Assertion,
        replay: &dyn AssertionReplayStore,
    ) -> Result<(), ValidationErrorKind> {
        if !replay.mark_used(&assertion.id) {
            return Err(ValidationErrorKind::AssertionReplayed(assertion.id.as_str().to_string()));
        }

        if let Some(conditions) = &assertion.conditions {
            if let Some(not_before) = conditions.not_before {
                if self.now < not_before {
                    return Err(ValidationErrorKind::ConditionFailed("NotBefore in the future".into()));
                }
            }
            if let Some(not_on_or_after) = conditions.not_on_or_after {
                if self.now >= not_on_or_after {
                    return Err(ValidationErrorKind::ConditionFailed("NotOnOrAfter has passed".into()));
                }
            }

            let is_bearer = assertion
                .subject
                .confirmations
                .iter()
                .any(|c| c.method == "urn:oasis:names:tc:SAML:2.0:cm:bearer");
            let must_check_audience = match self.audience_mode {
                AudienceMode::Always => true,
                AudienceMode::Never => false,
                AudienceMode::IfBearer => is_bearer,
            };
            if must_check_audience
                && !conditions.audiences.is_empty()
                && !conditions.audiences.iter().any(|a| a == self.our_entity_id)
            {
                return Err(ValidationErrorKind::AudienceMismatch);
            }
        }
        Ok(())
    }
}

pub fn attributes_to_host(attributes: &[Attribute]) -> Vec<Attribute> {
    attributes.to_vec()
}
