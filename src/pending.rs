//! Pending-request correlation table (C7).
//!
//! Every `AuthnRequest` we send carries a `RelayState` token out to the IdP
//! and back; that token is the correlation key this table is addressed by —
//! not the request's own `ID`, which only shows up later as the response's
//! `InResponseTo` and has to be checked *against* the stored entry rather
//! than used to look it up. The table carries a TTL so abandoned logins
//! don't leak memory forever, and `try_remove` is atomic — a response can
//! only ever be matched to its request exactly once, even under concurrent
//! delivery of the same response twice (the replay case
//! `ReplayedOrUnknownRelayState` guards against).

use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use crate::id::Saml2Id;

/// What this core remembers about an `AuthnRequest` it issued, for as long
/// as it's willing to accept a matching response. Keyed externally by the
/// `RelayState` token handed to the IdP alongside the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequestState {
    pub issuer_entity_id: String,
    /// The original request's `ID`, checked against the response's
    /// `InResponseTo` once the entry is found.
    pub message_id: Saml2Id,
    /// Where the host wants to resume local state once login completes.
    pub return_url: Option<String>,
}

pub trait PendingRequestStore: Send + Sync {
    fn add(&self, relay_state: &str, state: PendingRequestState);

    /// Atomically remove and return the state for `relay_state`, if present.
    /// Once removed it cannot be matched again — this is the replay defense.
    fn try_remove(&self, relay_state: &str) -> Option<PendingRequestState>;
}

/// An in-process, TTL-evicting pending-request table backed by `moka`.
pub struct InMemoryPendingRequestStore {
    cache: Cache<String, PendingRequestState>,
}

impl InMemoryPendingRequestStore {
    /// `ttl` should comfortably exceed how long an IdP's login page can
    /// reasonably keep a user, since an entry expiring mid-login makes an
    /// otherwise-successful response look replayed.
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }
}

impl Default for InMemoryPendingRequestStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(15 * 60))
    }
}

impl PendingRequestStore for InMemoryPendingRequestStore {
    fn add(&self, relay_state: &str, state: PendingRequestState) {
        debug!(
            "tracking pending request {:?} for IdP {} under relay state {:?}",
            state.message_id, state.issuer_entity_id, relay_state
        );
        self.cache.insert(relay_state.to_string(), state);
    }

    fn try_remove(&self, relay_state: &str) -> Option<PendingRequestState> {
        let found = self.cache.remove(relay_state);
        if found.is_none() {
            debug!(
                "no pending request found for relay state {:?} (unknown, already consumed, or expired)",
                relay_state
            );
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PendingRequestState {
        PendingRequestState {
            issuer_entity_id: "https://sp.example.com/metadata".to_string(),
            message_id: Saml2Id::parse("_req1").unwrap(),
            return_url: Some("/after-login".to_string()),
        }
    }

    #[test]
    fn try_remove_returns_the_state_exactly_once() {
        let store = InMemoryPendingRequestStore::default();
        store.add("R1", state());

        assert_eq!(store.try_remove("R1"), Some(state()));
        assert_eq!(store.try_remove("R1"), None);
    }

    #[test]
    fn unknown_relay_state_returns_none() {
        let store = InMemoryPendingRequestStore::default();
        assert_eq!(store.try_remove("unknown"), None);
    }

    #[test]
    fn entries_expire_after_their_ttl() {
        let store = InMemoryPendingRequestStore::new(Duration::from_millis(10));
        store.add("R1", state());
        std::thread::sleep(Duration::from_millis(100));
        store.cache.run_pending_tasks();
        assert_eq!(store.try_remove("R1"), None);
    }
}
