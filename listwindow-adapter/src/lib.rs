//! Scroll/load coordination and failure recovery for `listwindow`.
//!
//! The `listwindow` crate computes windows and recycles nodes; it never waits on anything. This
//! crate adds the time-based pieces an adapter needs around it:
//!
//! - [`ScrollCoordinator`]: scrolling / loading-more / cooldown / height-settling flags, each
//!   cleared by a cancelable timer
//! - [`RecoveryScheduler`]: bounded, delayed retries of a recovery action
//! - [`ListController`]: a framework-neutral controller wiring both to a calculator and a pool
//!
//! Time is injected through [`Clock`] and advanced by calling `tick()` from the host loop, so
//! the whole crate runs deterministically under a [`ManualClock`].
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod clock;
mod controller;
mod coordinator;
mod error;
mod options;
mod recovery;
mod timer;


#[cfg(feature = "std")]
pub use clock::SystemClock;
pub use clock::{Clock, ManualClock};
pub use controller::{ListController, ListSurface, TickReport};
pub use coordinator::{CoordinatorEvent, CoordinatorState, ScrollCoordinator};
pub use error::RecoveryError;
pub use options::{CoordinatorOptions, RecoveryCallback, RecoveryFailCallback, RecoveryOptions};
pub use recovery::{
    RecoveryAction, RecoveryContext, RecoveryOutcome, RecoveryScheduler, RecoveryState,
};
pub use timer::{TimerToken, Timers};
