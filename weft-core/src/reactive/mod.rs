//! Reactive Engine
//!
//! This module implements fine-grained reactive dependency tracking:
//! effects re-run automatically whenever the precise data they read
//! changes, with no manual subscription.
//!
//! # Concepts
//!
//! ## Effects
//!
//! An effect is a re-runnable computation created with
//! [`Runtime::effect`]. It runs once immediately; every reactive
//! property it reads during a run subscribes it to that property.
//!
//! ## Track and trigger
//!
//! The engine does not wrap objects itself. An interception layer (a
//! proxy, a setter, a store) calls [`Runtime::track`] on every read and
//! [`Runtime::trigger`] on every write, identifying state by a
//! [`TargetId`] (object identity) and a property [`Key`]. The engine does
//! the rest: it maintains the `(target, key)` -> effects relation and
//! applies each dependent's re-run policy on writes.
//!
//! ## Re-run policy
//!
//! By default a write re-runs the computation directly. With
//! [`RunPolicy::Scheduled`] the write invokes a caller-supplied callback
//! instead, and the caller re-runs the effect whenever it sees fit. This
//! is the building block for batching and async scheduling layers above
//! this engine.
//!
//! # Implementation Notes
//!
//! The engine uses a thread-local tracking scope to detect dependencies:
//! while an effect runs, reads attribute themselves to the innermost
//! running effect. This approach (sometimes called "automatic dependency
//! tracking" or "transparent reactivity") is used by SolidJS, Vue 3, and
//! Leptos.

mod effect;
mod key;
mod registry;
mod runtime;
mod scope;

pub use effect::{EffectHandle, EffectOptions, RunPolicy, SchedulerFn, TeardownFn};
pub use key::{DepKey, EffectId, Key, TargetId};
pub use runtime::Runtime;
