//! Assertion replay detection (C8): a separate concern from the
//! pending-request correlation table in `pending.rs`. That table guards
//! against the same *response* being delivered twice; this one guards
//! against the same *assertion* being presented twice, which matters
//! independently whenever an assertion is forwarded, cached, or replayed
//! outside the request/response round-trip it originally arrived in (or
//! simply carries `saml:OneTimeUse`, which makes this check mandatory rather
//! than defense-in-depth).

use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use crate::id::Saml2Id;

pub trait AssertionReplayStore: Send + Sync {
    /// Record that `id` has now been presented. Returns `true` the first
    /// time an id is seen and `false` on every subsequent call for the same
    /// id — the caller should treat `false` as a replay.
    fn mark_used(&self, id: &Saml2Id) -> bool;
}

/// An in-process, TTL-evicting record of presented assertion IDs backed by
/// `moka`. `ttl` should comfortably outlive the longest `NotOnOrAfter`
/// window any IdP in use issues, since an entry expiring early would let a
/// captured assertion be replayed after its tracked window closes but
/// before its actual validity window does.
pub struct InMemoryAssertionReplayStore {
    cache: Cache<String, ()>,
}

impl InMemoryAssertionReplayStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().time_to_live(ttl).build(),
        }
    }
}

impl Default for InMemoryAssertionReplayStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(15 * 60))
    }
}

impl AssertionReplayStore for InMemoryAssertionReplayStore {
    fn mark_used(&self, id: &Saml2Id) -> bool {
        let entry = self.cache.entry(id.as_str().to_string()).or_insert_with(|| ());
        if !entry.is_fresh() {
            debug!("assertion {:?} already presented once, rejecting as replayed", id);
        }
        entry.is_fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_presentation_is_accepted_and_second_is_rejected() {
        let store = InMemoryAssertionReplayStore::default();
        let id = Saml2Id::parse("_a1").unwrap();
        assert!(store.mark_used(&id));
        assert!(!store.mark_used(&id));
    }

    #[test]
    fn distinct_ids_do_not_interfere() {
        let store = InMemoryAssertionReplayStore::default();
        assert!(store.mark_used(&Saml2Id::parse("_a1").unwrap()));
        assert!(store.mark_used(&Saml2Id::parse("_a2").unwrap()));
    }

    #[test]
    fn entries_expire_after_their_ttl() {
        let store = InMemoryAssertionReplayStore::new(Duration::from_millis(10));
        let id = Saml2Id::parse("_a1").unwrap();
        assert!(store.mark_used(&id));
        std::thread::sleep(Duration::from_millis(100));
        store.cache.run_pending_tasks();
        assert!(store.mark_used(&id));
    }
}
