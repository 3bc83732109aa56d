//! Tracking Scope
//!
//! The scope tracks which effect is currently running. This enables
//! automatic dependency tracking: when a reactive property is read, the
//! engine can attribute the read to the innermost running effect.
//!
//! # Implementation
//!
//! We use a thread-local stack of frames. When an effect starts an active
//! run we push a frame; when the run completes we pop it. The pop lives in
//! a `Drop` impl, so a panicking computation unwinds through the guard and
//! the stack is restored before the panic reaches the caller.
//!
//! This design supports nested runs (an effect whose computation runs
//! another effect): reads are attributed to the innermost frame only, and
//! popping the inner frame re-exposes the outer one.
//!
//! A separate thread-local flag can pause tracking entirely, so a read
//! performed under [`pause_tracking`] subscribes nothing even while a
//! frame is on the stack.

use std::cell::{Cell, RefCell};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::key::{DepList, EffectId};
use super::registry::Subscriber;

thread_local! {
    /// Each thread has its own stack of running effects. This thread-local
    /// approach avoids synchronization: exactly one computation executes
    /// on a thread at a time.
    static FRAME_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };

    /// Whether reads should currently subscribe the running effect.
    static TRACKING: Cell<bool> = const { Cell::new(true) };
}

/// A frame on the tracking stack.
///
/// Carries everything `track` needs to link the running effect into a
/// dependency set: its identity, its membership list (the reverse index),
/// and a weak handle the registry can store for later propagation.
#[derive(Clone)]
pub(crate) struct Frame {
    /// Identity of the running effect.
    pub effect_id: EffectId,
    /// The effect's membership list, shared with the effect itself.
    pub memberships: Arc<Mutex<DepList>>,
    /// Weak handle used by the registry to reach the effect on trigger.
    pub subscriber: Weak<dyn Subscriber>,
}

/// Guard that pops the frame when dropped.
///
/// This keeps the stack correct even if the computation panics.
pub(crate) struct ScopeGuard {
    effect_id: EffectId,
}

impl ScopeGuard {
    /// Push a frame for the given effect.
    ///
    /// While the guard is live, reads attribute themselves to this effect.
    /// The frame is popped when the guard is dropped.
    pub fn enter(frame: Frame) -> Self {
        let effect_id = frame.effect_id;
        FRAME_STACK.with(|stack| stack.borrow_mut().push(frame));
        Self { effect_id }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        FRAME_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Verify we're popping the right frame. This helps catch bugs
            // where guards are dropped out of order.
            if let Some(frame) = popped {
                debug_assert_eq!(
                    frame.effect_id, self.effect_id,
                    "scope frame mismatch: expected {:?}, got {:?}",
                    self.effect_id, frame.effect_id
                );
            }
        });
    }
}

/// Get the innermost running effect's frame, if any.
pub(crate) fn current_frame() -> Option<Frame> {
    FRAME_STACK.with(|stack| stack.borrow().last().cloned())
}

/// Whether reads should subscribe the running effect right now.
pub(crate) fn tracking_enabled() -> bool {
    TRACKING.with(|flag| flag.get())
}

/// Guard that re-enables tracking when dropped.
pub(crate) struct PauseGuard {
    previous: bool,
}

/// Disable tracking until the returned guard is dropped.
///
/// The previous state is restored on drop, so pauses nest correctly and
/// survive panics in the paused closure.
pub(crate) fn pause_tracking() -> PauseGuard {
    let previous = TRACKING.with(|flag| flag.replace(false));
    PauseGuard { previous }
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        TRACKING.with(|flag| flag.set(self.previous));
    }
}
