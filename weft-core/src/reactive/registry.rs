//! Dependency Registry
//!
//! The registry stores the many-to-many relation between reactive state
//! and the effects that read it: each `(target, key)` slot maps to the set
//! of effects currently subscribed to it.
//!
//! # Structure
//!
//! Two maps:
//!
//! 1. `deps`: `(target, key)` -> ordered set of effect IDs. Slots are
//!    created lazily on first track and never deleted, even when their set
//!    drains. Identity-keyed slots only live as long as callers keep
//!    minting reads for them, which is already the lifetime of any
//!    retained reactive object.
//!
//! 2. `subscribers`: effect ID -> weak handle. Triggering upgrades through
//!    this table, so the registry never keeps an effect alive; the
//!    caller's handle stays the only strong reference.
//!
//! # Locking
//!
//! Both maps are sharded ([`DashMap`]), and no shard guard is ever held
//! while an effect callback runs: trigger snapshots the dependents first
//! and invokes them afterwards. Effects re-running inside a trigger mutate
//! the same sets, which is exactly why iteration happens over a snapshot.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use indexmap::IndexSet;

use super::key::{DepKey, EffectId};

/// The registry's view of an effect.
///
/// `notify` applies the effect's re-run policy: scheduled effects invoke
/// their scheduler, direct effects re-run their computation.
pub(crate) trait Subscriber: Send + Sync {
    /// Get the effect's identity.
    fn id(&self) -> EffectId;

    /// Apply the effect's re-run policy. No-op once the effect stopped.
    fn notify(&self);
}

/// Dependency storage for one reactive universe.
pub(crate) struct Registry {
    /// `(target, key)` -> effect IDs subscribed to that slot.
    /// Insertion order fixes the order trigger invokes dependents in.
    deps: DashMap<DepKey, IndexSet<EffectId>>,

    /// Effect ID -> weak handle for propagation.
    subscribers: DashMap<EffectId, Weak<dyn Subscriber>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            deps: DashMap::new(),
            subscribers: DashMap::new(),
        }
    }

    /// Link an effect into the slot for `dep`.
    ///
    /// Returns `true` if the effect was newly added, `false` if it was
    /// already a member. The caller records the reverse membership edge
    /// only on `true`, so re-reading the same property within one run
    /// cannot create duplicate membership entries.
    pub fn subscribe(&self, dep: &DepKey, id: EffectId, subscriber: &Weak<dyn Subscriber>) -> bool {
        let added = self.deps.entry(dep.clone()).or_default().insert(id);
        if added {
            self.subscribers
                .entry(id)
                .or_insert_with(|| Weak::clone(subscriber));
        }
        added
    }

    /// Remove an effect from the slot for `dep`.
    ///
    /// The slot itself is kept; empty sets are legal and cheap.
    pub fn unsubscribe(&self, dep: &DepKey, id: EffectId) {
        if let Some(mut set) = self.deps.get_mut(dep) {
            set.shift_remove(&id);
        }
    }

    /// Drop an effect's weak handle. Called once, on stop.
    pub fn unregister(&self, id: EffectId) {
        self.subscribers.remove(&id);
    }

    /// Snapshot the live dependents of a slot.
    ///
    /// Returns an empty vec when the slot was never tracked (a write to a
    /// key nothing reads) or when every subscriber has died. All shard
    /// guards are released before this returns, so callers are free to
    /// invoke the dependents.
    pub fn dependents(&self, dep: &DepKey) -> Vec<Arc<dyn Subscriber>> {
        let ids: Vec<EffectId> = match self.deps.get(dep) {
            Some(set) => set.iter().copied().collect(),
            None => return Vec::new(),
        };

        let mut live = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(weak) = self.subscribers.get(&id) {
                if let Some(subscriber) = weak.upgrade() {
                    debug_assert_eq!(subscriber.id(), id, "subscriber table out of sync");
                    live.push(subscriber);
                }
            }
        }
        live
    }

    /// Number of effect IDs currently in a slot (dead ones included).
    #[cfg(test)]
    pub fn dependent_count(&self, dep: &DepKey) -> usize {
        self.deps.get(dep).map(|set| set.len()).unwrap_or(0)
    }
}
