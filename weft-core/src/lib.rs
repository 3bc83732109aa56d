//! Weft Core
//!
//! This crate provides the dependency-tracking engine at the heart of the
//! Weft reactive framework. It implements:
//!
//! - Effects: re-runnable computations with automatic subscription
//! - A per-property dependency registry (track on read, trigger on write)
//! - Pluggable re-run policy (direct re-run or caller-supplied scheduler)
//! - Explicit, idempotent teardown with optional stop callbacks
//!
//! The property-interception layer that decides *when* a read or write
//! happened, and any renderer built on top, are deliberately out of
//! scope: they are ordinary clients of [`reactive::Runtime::track`] and
//! [`reactive::Runtime::trigger`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicI32, Ordering};
//! use weft_core::reactive::{Runtime, TargetId};
//!
//! let rt = Runtime::new();
//! let user = TargetId::new();
//!
//! // Stand-in for the interception layer: age lives here, reads track,
//! // writes trigger.
//! let age = Arc::new(AtomicI32::new(10));
//!
//! let next_age = Arc::new(AtomicI32::new(0));
//! let handle = {
//!     let (rt, age, next_age) = (rt.clone(), age.clone(), next_age.clone());
//!     rt.clone().effect(move || {
//!         rt.track(user, "age");
//!         next_age.store(age.load(Ordering::SeqCst) + 1, Ordering::SeqCst);
//!     })
//! };
//! assert_eq!(next_age.load(Ordering::SeqCst), 11);
//!
//! // A write to the tracked property re-runs the effect synchronously.
//! age.store(11, Ordering::SeqCst);
//! rt.trigger(user, "age");
//! assert_eq!(next_age.load(Ordering::SeqCst), 12);
//!
//! handle.stop();
//! ```

pub mod reactive;
