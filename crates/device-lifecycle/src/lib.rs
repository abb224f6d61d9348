#![cfg_attr(not(test), no_std)]
//! Resource lifecycle for a bus-attached device that also listens to
//! platform notifications.
//!
//! A [`DeviceContext`] tracks three coupled resources: an open bus session,
//! a notification subscription and the chip's own register state.
//! [`activate`] acquires them in order with full rollback on failure;
//! [`deactivate`] releases them best-effort, is safe to call from any phase
//! and is idempotent.

mod fmt;

mod bus;
mod context;
mod controller;
mod error;
mod notify;
mod reset;

pub use bus::BusTransport;
pub use context::{DeviceContext, Phase};
pub use controller::{activate, deactivate, StepOutcome, TeardownReport};
pub use error::{Error, ResetError};
pub use notify::{
    Correlation, LiveGuard, Liveness, NotificationCallback,
    NotificationSource,
};
pub use reset::{reset_to_default, RegisterWrite};
