//! Error types used by the registry and by cleanup code.
//!
//! This module defines two main error enums:
//!
//! - [`RegistryError`]: synchronous validation failures surfaced to the
//!   caller of a registration operation.
//! - [`DischargeError`]: failures raised by user cleanup code while an
//!   obligation is being discharged.
//!
//! Registration errors are returned directly. Discharge errors are isolated
//! per obligation: during a sweep they are reported on the event bus and the
//! remaining obligations are still discharged.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics.

use std::any::Any;

use thiserror::Error;

/// # Errors produced by registration operations.
///
/// These are synchronous validation failures: the registry state is left
/// unchanged and the error is returned to the caller immediately.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RegistryError {
    /// An absent obligation was handed to a registration operation.
    #[error("cannot register an empty obligation")]
    NilObligation,

    /// The key names one of the registry's own public operations.
    #[error("key \"{key}\" shadows a built-in registry operation")]
    ReservedKey {
        /// The offending key name.
        key: String,
    },

    /// The value can never be validly discharged.
    #[error("obligation is not dischargeable: {reason}")]
    InvalidObligation {
        /// Why the obligation was rejected.
        reason: String,
    },

    /// A constructor argument was out of range.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Why the argument was rejected.
        reason: String,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use janitor::RegistryError;
    ///
    /// let err = RegistryError::NilObligation;
    /// assert_eq!(err.as_label(), "nil_obligation");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::NilObligation => "nil_obligation",
            RegistryError::ReservedKey { .. } => "reserved_key",
            RegistryError::InvalidObligation { .. } => "invalid_obligation",
            RegistryError::InvalidArgument { .. } => "invalid_argument",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors raised by cleanup code during discharge.
///
/// Produced by fallible actions, `Dispose` implementations, and interval
/// callbacks. Never propagated out of a sweep; reported on the event bus
/// instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DischargeError {
    /// The cleanup routine returned an error.
    #[error("cleanup failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The cleanup routine panicked; the panic was caught and isolated.
    #[error("cleanup panicked: {reason}")]
    Panicked {
        /// Best-effort rendering of the panic payload.
        reason: String,
    },
}

impl DischargeError {
    /// Creates a [`DischargeError::Failed`] from any message.
    ///
    /// # Example
    /// ```
    /// use janitor::DischargeError;
    ///
    /// let err = DischargeError::failed("socket already closed");
    /// assert_eq!(err.as_label(), "discharge_failed");
    /// ```
    pub fn failed(error: impl Into<String>) -> Self {
        DischargeError::Failed {
            error: error.into(),
        }
    }

    /// Builds a [`DischargeError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let reason = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        DischargeError::Panicked { reason }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DischargeError::Failed { .. } => "discharge_failed",
            DischargeError::Panicked { .. } => "discharge_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_labels() {
        assert_eq!(RegistryError::NilObligation.as_label(), "nil_obligation");
        assert_eq!(
            RegistryError::ReservedKey { key: "add".into() }.as_label(),
            "reserved_key"
        );
        assert_eq!(
            RegistryError::InvalidObligation {
                reason: "x".into()
            }
            .as_label(),
            "invalid_obligation"
        );
        assert_eq!(
            RegistryError::InvalidArgument {
                reason: "x".into()
            }
            .as_label(),
            "invalid_argument"
        );
    }

    #[test]
    fn test_messages_carry_details() {
        let err = RegistryError::ReservedKey { key: "clean".into() };
        assert!(err.as_message().contains("clean"));

        let err = DischargeError::failed("socket already closed");
        assert!(err.as_message().contains("socket already closed"));
    }

    #[test]
    fn test_from_panic_renders_common_payloads() {
        let err = DischargeError::from_panic(Box::new("boom"));
        assert!(err.as_message().contains("boom"));

        let err = DischargeError::from_panic(Box::new(String::from("kaput")));
        assert!(err.as_message().contains("kaput"));

        let err = DischargeError::from_panic(Box::new(17_u32));
        assert!(err.as_message().contains("unknown panic payload"));
    }
}
