//! The subscriber registry: packet kind → ordered callback list.
//!
//! Registration happens from setup code while the receive loop iterates, so
//! the registry is the one piece of state mutated concurrently. The
//! discipline is snapshot-before-invoke: lookups clone the matching entries
//! under a short read lock and callbacks run lock-free. That makes
//! `register`/`unregister` safe to call from inside a running callback —
//! mutations take effect for the *next* dispatch, never the in-flight one.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use rill_core::Packet;

/// What a callback returns. An `Err` is logged and does not prevent sibling
/// callbacks from running.
pub type HandlerResult = anyhow::Result<()>;

/// A subscriber callback.
///
/// Callbacks run sequentially on the receive loop's task — a slow callback
/// delays the next frame, so long-running work must be handed off.
pub type Handler = Arc<dyn Fn(&Packet) -> HandlerResult + Send + Sync>;

/// Identifies one registration, for [`SubscriberRegistry::unregister`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Entry {
    id: SubscriptionId,
    handler: Handler,
}

#[derive(Default)]
struct Inner {
    by_kind: HashMap<String, Vec<Entry>>,
    all: Vec<Entry>,
}

/// Mapping from packet kind to zero-or-more interested callbacks.
///
/// Kinds are coarse discriminators (`PRIVMSG`, `MESSAGE`, `phx_reply`, …) or
/// fine `"<kind>/<sub>"` keys for shapes that refine further. A registration
/// made with [`SubscriberRegistry::register_all`] observes every packet.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    inner: RwLock<Inner>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for packets classified under `kind`.
    pub fn register(&self, kind: impl Into<String>, handler: Handler) -> SubscriptionId {
        let id = self.next();
        self.inner
            .write()
            .by_kind
            .entry(kind.into())
            .or_default()
            .push(Entry { id, handler });
        id
    }

    /// Register `handler` for every packet, regardless of kind.
    pub fn register_all(&self, handler: Handler) -> SubscriptionId {
        let id = self.next();
        self.inner.write().all.push(Entry { id, handler });
        id
    }

    /// Remove a registration. Returns whether it was still present.
    ///
    /// Safe to call from within the unregistered callback itself: the packet
    /// currently being dispatched was snapshotted and still reaches its
    /// remaining subscribers; subsequent packets do not reach this one.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.all.len();
        inner.all.retain(|entry| entry.id != id);
        if inner.all.len() != before {
            return true;
        }
        for entries in inner.by_kind.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            if entries.len() != before {
                return true;
            }
        }
        false
    }

    /// Snapshot the handlers interested in `kind`, in registration order.
    ///
    /// `include_all` folds in the catch-all registrations; the fine-grained
    /// second dispatch pass leaves them out so each packet reaches a
    /// catch-all subscriber exactly once.
    pub(crate) fn handlers_for(
        &self,
        kind: &str,
        include_all: bool,
    ) -> Vec<(SubscriptionId, Handler)> {
        let inner = self.inner.read();
        let mut entries: Vec<Entry> = inner.by_kind.get(kind).cloned().unwrap_or_default();
        if include_all {
            entries.extend(inner.all.iter().cloned());
        }
        drop(inner);

        // ids are monotonic, so this restores global registration order
        entries.sort_by_key(|entry| entry.id);
        entries
            .into_iter()
            .map(|entry| (entry.id, entry.handler))
            .collect()
    }

    fn next(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Arc::new(|_| Ok(()))
    }

    #[test]
    fn lookup_respects_registration_order_across_kind_and_all() {
        let registry = SubscriberRegistry::new();
        let a = registry.register("PRIVMSG", noop());
        let b = registry.register_all(noop());
        let c = registry.register("PRIVMSG", noop());

        let ids: Vec<SubscriptionId> = registry
            .handlers_for("PRIVMSG", true)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn fine_pass_excludes_catch_all() {
        let registry = SubscriberRegistry::new();
        let _ = registry.register_all(noop());
        let fine = registry.register("MESSAGE/whispers", noop());

        let ids: Vec<SubscriptionId> = registry
            .handlers_for("MESSAGE/whispers", false)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![fine]);
    }

    #[test]
    fn unregister_removes_exactly_one() {
        let registry = SubscriberRegistry::new();
        let a = registry.register("JOIN", noop());
        let b = registry.register("JOIN", noop());

        assert!(registry.unregister(a));
        assert!(!registry.unregister(a));

        let ids: Vec<SubscriptionId> = registry
            .handlers_for("JOIN", true)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![b]);
    }

    #[test]
    fn unknown_kind_snapshots_empty() {
        let registry = SubscriberRegistry::new();
        assert!(registry.handlers_for("NOPE", true).is_empty());
    }

    #[test]
    fn registering_from_inside_a_callback_does_not_deadlock() {
        let registry = Arc::new(SubscriberRegistry::new());
        let inner = Arc::clone(&registry);
        let _ = registry.register(
            "JOIN",
            Arc::new(move |_| {
                let _ = inner.register("PART", Arc::new(|_| Ok(())));
                Ok(())
            }),
        );

        let packet: Packet = rill_core::TaggedPacket::decode("JOIN #chan").unwrap().into();
        for (_, handler) in registry.handlers_for("JOIN", true) {
            handler(&packet).unwrap();
        }
        assert_eq!(registry.handlers_for("PART", true).len(), 1);
    }
}
