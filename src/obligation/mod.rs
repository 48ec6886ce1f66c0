//! Cleanup obligations: the closed set of shapes and their discharge.
//!
//! This module defines the obligation **data model** and the one-shot
//! **discharge dispatcher**.
//!
//! ## Contents
//! - [`Obligation`] closed tagged union over the five cleanup shapes
//! - [`Dispose`], [`Unsubscribe`] traits satisfied by caller resources
//!
//! Discharge itself is crate-internal; it is reachable only through the
//! registry paths that own the obligation (overwrite, removal, sweep), which
//! is what makes exactly-once discharge an ownership fact rather than a
//! runtime flag.

mod obligation;
mod traits;

pub use obligation::{ActionFn, Obligation};
pub use traits::{Dispose, Unsubscribe};
