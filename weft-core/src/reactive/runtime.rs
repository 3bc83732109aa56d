//! Reactive Runtime
//!
//! The runtime is one self-contained reactive universe: it owns a
//! dependency registry and exposes the four operations the rest of the
//! system builds on.
//!
//! # How It Works
//!
//! 1. [`effect`](Runtime::effect) wraps a computation and runs it once.
//!    While it runs, the effect sits on the thread-local tracking scope.
//!
//! 2. The interception layer calls [`track`](Runtime::track) on every
//!    reactive property read. If an effect is on the scope and tracking
//!    is enabled, the read links that effect into the registry slot for
//!    the `(target, key)` pair.
//!
//! 3. The interception layer calls [`trigger`](Runtime::trigger) on every
//!    reactive property write. Every effect linked to the written slot
//!    has its re-run policy applied, synchronously, so a write is
//!    observable by the time `trigger` returns.
//!
//! Runtimes are explicitly constructed and cheap to clone (clones share
//! the registry). Independent runtimes are fully isolated from each
//! other, which keeps tests hermetic; only the tracking scope is shared,
//! and that is per-thread by nature.

use std::sync::Arc;

use tracing::trace;

use super::effect::{EffectHandle, EffectOptions};
use super::key::{DepKey, Key, TargetId};
use super::registry::Registry;
use super::scope;

/// One reactive universe.
#[derive(Clone)]
pub struct Runtime {
    registry: Arc<Registry>,
}

impl Runtime {
    /// Create an empty universe with no tracked dependencies.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
        }
    }

    /// Run a computation reactively.
    ///
    /// The computation runs once, immediately, to collect its initial
    /// dependencies. From then on, every write to a property it read on
    /// its most recent run re-runs it. The returned handle re-invokes the
    /// computation on demand and tears the effect down.
    pub fn effect<T, F>(&self, computation: F) -> EffectHandle<T>
    where
        T: 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.effect_with(computation, EffectOptions::new())
    }

    /// Run a computation reactively with an explicit re-run policy and an
    /// optional teardown callback.
    pub fn effect_with<T, F>(&self, computation: F, options: EffectOptions) -> EffectHandle<T>
    where
        T: 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let handle = EffectHandle::new(Box::new(computation), options, Arc::clone(&self.registry));
        handle.run();
        handle
    }

    /// Record that the currently running effect read `(target, key)`.
    ///
    /// Called by the interception layer on every reactive property read.
    /// No-op unless tracking is enabled and an effect is on the scope:
    /// stray reads outside any reactive run, reads under
    /// [`untracked`](Runtime::untracked), and reads made by a stopped
    /// effect's manual run all subscribe nothing.
    pub fn track(&self, target: TargetId, key: impl Into<Key>) {
        if !scope::tracking_enabled() {
            return;
        }
        let Some(frame) = scope::current_frame() else {
            return;
        };

        let dep = DepKey::new(target, key);
        if self
            .registry
            .subscribe(&dep, frame.effect_id, &frame.subscriber)
        {
            trace!(effect = frame.effect_id.raw(), dep = %dep, "dependency tracked");
            frame.memberships.lock().push(dep);
        }
    }

    /// Notify every effect subscribed to `(target, key)` that it changed.
    ///
    /// Called by the interception layer on every reactive property write.
    /// Writing a slot nothing reads is legal and cheap. Dependents are
    /// invoked synchronously, over a snapshot: re-runs mutate the very
    /// sets being propagated, so iteration order is frozen first.
    pub fn trigger(&self, target: TargetId, key: impl Into<Key>) {
        let dep = DepKey::new(target, key);
        let dependents = self.registry.dependents(&dep);
        if dependents.is_empty() {
            return;
        }

        trace!(dep = %dep, count = dependents.len(), "dependency triggered");
        for subscriber in dependents {
            subscriber.notify();
        }
    }

    /// Run a closure with tracking disabled.
    ///
    /// Reads made inside the closure subscribe nothing, even when an
    /// effect is running. The previous tracking state is restored when
    /// the closure returns or panics.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _pause = scope::pause_tracking();
        f()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn effect_runs_once_on_creation() {
        let rt = Runtime::new();
        let runs = Arc::new(AtomicI32::new(0));
        let runs_clone = runs.clone();

        let _handle = rt.effect(move || {
            runs_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn track_outside_any_run_is_a_no_op() {
        let rt = Runtime::new();
        let target = TargetId::new();

        // No effect is running, so this read subscribes nothing
        rt.track(target, "age");

        let runs = Arc::new(AtomicI32::new(0));
        let runs_clone = runs.clone();
        let _handle = rt.effect(move || {
            runs_clone.fetch_add(1, Ordering::SeqCst);
        });

        rt.trigger(target, "age");
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn trigger_on_untracked_slot_is_a_no_op() {
        let rt = Runtime::new();
        // Never tracked, never registered: must simply do nothing
        rt.trigger(TargetId::new(), "ghost");
        rt.trigger(TargetId::new(), 7usize);
    }

    #[test]
    fn untracked_reads_subscribe_nothing() {
        let rt = Runtime::new();
        let target = TargetId::new();

        let runs = Arc::new(AtomicI32::new(0));
        let runs_clone = runs.clone();
        let rt_inner = rt.clone();
        let _handle = rt.effect(move || {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            rt_inner.untracked(|| rt_inner.track(target, "age"));
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // The read happened under `untracked`, so the write reaches nobody
        rt.trigger(target, "age");
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn runtimes_are_isolated_universes() {
        let rt_a = Runtime::new();
        let rt_b = Runtime::new();
        let target = TargetId::new();

        let runs = Arc::new(AtomicI32::new(0));
        let runs_clone = runs.clone();
        let rt_a_inner = rt_a.clone();
        let _handle = rt_a.effect(move || {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            rt_a_inner.track(target, "age");
        });
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Same target and key, different universe: no propagation
        rt_b.trigger(target, "age");
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        rt_a.trigger(target, "age");
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clones_share_the_registry() {
        let rt = Runtime::new();
        let clone = rt.clone();
        let target = TargetId::new();

        let runs = Arc::new(AtomicI32::new(0));
        let runs_clone = runs.clone();
        let rt_inner = rt.clone();
        let _handle = rt.effect(move || {
            runs_clone.fetch_add(1, Ordering::SeqCst);
            rt_inner.track(target, "age");
        });

        clone.trigger(target, "age");
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
