//! Effect Implementation
//!
//! An effect is a re-runnable unit of computation that subscribes to the
//! reactive state it reads.
//!
//! # How Effects Work
//!
//! 1. When created through the runtime, the effect runs its computation
//!    immediately to establish initial dependencies.
//!
//! 2. When any dependency is written, the effect's re-run policy is
//!    applied: direct effects re-run the computation, scheduled effects
//!    invoke their scheduler callback instead.
//!
//! 3. Before each active run, the effect drops the memberships collected
//!    on the previous run and re-accumulates them during execution, so
//!    only the properties actually read on the latest run can re-run it.
//!
//! # Lifecycle
//!
//! `Created (active) -> [run*] -> Stopped (inactive)`. Stopping removes
//! the effect from every dependency set, fires the optional teardown
//! callback once, and is terminal: there is no un-stop. A stopped effect
//! stays manually runnable; it just no longer subscribes to anything.
//! Dropping the handle stops the effect the same way.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::key::{DepList, EffectId};
use super::registry::{Registry, Subscriber};
use super::scope::{Frame, ScopeGuard};

/// Caller-supplied re-run callback, invoked instead of the computation.
pub type SchedulerFn = Box<dyn Fn() + Send + Sync>;

/// Teardown callback, invoked once when the effect stops.
pub type TeardownFn = Box<dyn FnOnce() + Send>;

/// What happens when a tracked dependency is written.
#[derive(Default)]
pub enum RunPolicy {
    /// Re-run the computation directly.
    #[default]
    Direct,

    /// Invoke the scheduler instead of the computation. The caller decides
    /// when (and whether) to re-run the effect, typically by invoking the
    /// handle later.
    Scheduled(SchedulerFn),
}

impl RunPolicy {
    /// Build a scheduled policy from a callback.
    pub fn scheduled<F>(scheduler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::Scheduled(Box::new(scheduler))
    }
}

impl fmt::Debug for RunPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPolicy::Direct => f.write_str("Direct"),
            RunPolicy::Scheduled(_) => f.write_str("Scheduled"),
        }
    }
}

/// Options accepted when creating an effect.
#[derive(Default)]
pub struct EffectOptions {
    pub(crate) policy: RunPolicy,
    pub(crate) on_stop: Option<TeardownFn>,
}

impl EffectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the re-run policy.
    pub fn policy(mut self, policy: RunPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Route re-runs through a scheduler callback.
    ///
    /// Shorthand for `policy(RunPolicy::scheduled(..))`.
    pub fn scheduler<F>(self, scheduler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.policy(RunPolicy::scheduled(scheduler))
    }

    /// Register a teardown callback, invoked exactly once on stop.
    pub fn on_stop<F>(mut self, teardown: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_stop = Some(Box::new(teardown));
        self
    }
}

/// Shared state of one effect.
///
/// The caller's [`EffectHandle`] holds the only strong reference; the
/// registry reaches this through weak handles only.
struct EffectState<T> {
    id: EffectId,

    /// The computation to (re-)run.
    computation: Box<dyn Fn() -> T + Send + Sync>,

    /// Applied when a tracked dependency is written.
    policy: RunPolicy,

    /// True until stopped. A stopped effect no longer tracks or reacts
    /// but remains manually runnable.
    active: AtomicBool,

    /// Teardown callback, taken on the first stop.
    on_stop: Mutex<Option<TeardownFn>>,

    /// The registry slots this effect is currently a member of. Shared
    /// with the scope frame during runs: an effect is in a slot's set iff
    /// that slot is in this list.
    memberships: Arc<Mutex<DepList>>,

    /// Registry of the universe this effect lives in.
    registry: Arc<Registry>,

    /// Handed to scope frames so the registry can reach us on trigger.
    self_weak: Weak<EffectState<T>>,
}

impl<T> EffectState<T> {
    /// Remove this effect from every slot in its membership list.
    fn clear_memberships(&self) {
        let stale: DepList = {
            let mut memberships = self.memberships.lock();
            memberships.drain(..).collect()
        };

        for dep in &stale {
            self.registry.unsubscribe(dep, self.id);
        }
    }

    /// Transition to inactive. Idempotent; only the first call tears down.
    fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.clear_memberships();
            self.registry.unregister(self.id);

            if let Some(teardown) = self.on_stop.lock().take() {
                teardown();
            }

            debug!(effect = self.id.raw(), "effect stopped");
        }
    }
}

impl<T: 'static> EffectState<T> {
    /// Run the computation.
    ///
    /// Active runs shed last run's memberships, install a scope frame for
    /// the duration, and return the computation's value. The frame pop is
    /// RAII, so a panicking computation restores the scope stack and
    /// propagates unmodified. Inactive runs invoke the computation with no
    /// tracking side effects at all.
    fn run(&self) -> T {
        if !self.active.load(Ordering::SeqCst) {
            return (self.computation)();
        }

        // Shed stale memberships so a branch that is no longer read
        // cannot keep re-running this effect.
        self.clear_memberships();

        let _guard = ScopeGuard::enter(Frame {
            effect_id: self.id,
            memberships: Arc::clone(&self.memberships),
            subscriber: self.self_weak.clone(),
        });

        (self.computation)()
    }
}

impl<T: 'static> Subscriber for EffectState<T> {
    fn id(&self) -> EffectId {
        self.id
    }

    fn notify(&self) {
        // A stopped effect no longer participates in propagation, even if
        // a trigger snapshot from before the stop still reaches it.
        if !self.active.load(Ordering::SeqCst) {
            return;
        }

        match &self.policy {
            RunPolicy::Direct => {
                self.run();
            }
            RunPolicy::Scheduled(scheduler) => scheduler(),
        }
    }
}

/// Handle to a running effect.
///
/// The handle (a) re-invokes the computation on demand, returning its
/// value, and (b) tears the effect down via [`stop`](Self::stop). It is
/// the only strong reference to the effect: dropping it stops the effect.
pub struct EffectHandle<T> {
    state: Arc<EffectState<T>>,
}

impl<T: 'static> EffectHandle<T> {
    pub(crate) fn new(
        computation: Box<dyn Fn() -> T + Send + Sync>,
        options: EffectOptions,
        registry: Arc<Registry>,
    ) -> Self {
        let state = Arc::new_cyclic(|self_weak| EffectState {
            id: EffectId::new(),
            computation,
            policy: options.policy,
            active: AtomicBool::new(true),
            on_stop: Mutex::new(options.on_stop),
            memberships: Arc::new(Mutex::new(DepList::new())),
            registry,
            self_weak: self_weak.clone(),
        });

        debug!(effect = state.id.raw(), policy = ?state.policy, "effect created");
        Self { state }
    }

    /// Get the effect's identity.
    pub fn id(&self) -> EffectId {
        self.state.id
    }

    /// Re-run the computation and return its value.
    ///
    /// While active, reads made by the computation re-subscribe the
    /// effect. Once stopped, this still runs the computation (with full
    /// read access) but subscribes nothing.
    pub fn run(&self) -> T {
        self.state.run()
    }

    /// Stop the effect: unlink it from every dependency set and fire the
    /// teardown callback. Idempotent; the second call is a no-op.
    pub fn stop(&self) {
        self.state.stop();
    }

    /// Whether the effect still participates in tracking and propagation.
    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Number of registry slots the effect is currently a member of.
    pub fn dependency_count(&self) -> usize {
        self.state.memberships.lock().len()
    }
}

impl<T> Drop for EffectHandle<T> {
    fn drop(&mut self) {
        // Without its handle the effect could never be run again, so a
        // drop is a stop. `stop` is idempotent, so an explicit stop
        // beforehand already consumed the teardown callback.
        self.state.stop();
    }
}

impl<T> fmt::Debug for EffectHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectHandle")
            .field("id", &self.state.id)
            .field("active", &self.state.active.load(Ordering::SeqCst))
            .field("policy", &self.state.policy)
            .field("dependency_count", &self.state.memberships.lock().len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
