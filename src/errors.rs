//! Error Types
//!
//! This module defines the error types used throughout the engine core.
//!
//! # Overview
//!
//! The main error type [`LumenError`] covers three families of failure:
//! - **Transient** realization failures ([`LumenError::GraphicsResource`]), retried
//!   by the frame scheduler on the next frame
//! - **Fatal** device loss ([`LumenError::DeviceLost`]), propagated to the host
//! - **Programming** errors (access before load, invalid arguments, use after
//!   dispose), which are never recovered internally
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, LumenError>`.
//!
//! ```rust,ignore
//! use lumen::errors::{LumenError, Result};
//!
//! fn build() -> Result<()> {
//!     Err(LumenError::transient("VertexBuffer", "staging heap exhausted"))
//! }
//! ```

use thiserror::Error;

use crate::device::DeviceId;

/// How the frame scheduler reacts to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Retry on the next frame; the resource stays unloaded meanwhile.
    Transient,
    /// The owning device is unusable until the host re-initialises it.
    Fatal,
    /// A bug at the call site. Never swallowed.
    Programming,
}

/// The main error type for the Lumen engine core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LumenError {
    // ========================================================================
    // Resource Lifecycle Errors
    // ========================================================================
    /// GPU-level access was attempted before `ensure_loaded` succeeded on the device.
    #[error("Resource '{resource}' is not loaded on device {device}")]
    ResourceNotLoaded {
        /// Label of the resource being accessed
        resource: String,
        /// The device the access was made against
        device: DeviceId,
    },

    /// Building the realization failed for a recoverable reason.
    #[error("Failed to realize resource '{resource}': {reason}")]
    GraphicsResource {
        /// Label of the resource being realized
        resource: String,
        /// Backend-provided failure description
        reason: String,
    },

    /// The resource was disposed and can never be loaded again.
    #[error("Resource '{resource}' has been disposed")]
    ObjectDisposed {
        /// Label of the disposed resource
        resource: String,
    },

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The device was removed or reset by the driver.
    #[error("Device {device} lost: {reason}")]
    DeviceLost {
        /// The lost device
        device: DeviceId,
        /// Backend-provided failure description
        reason: String,
    },

    /// No device with this id is known to the engine.
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceId),

    // ========================================================================
    // Precondition Errors
    // ========================================================================
    /// An argument failed a precondition check at an API boundary.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl LumenError {
    /// Shorthand for a transient [`LumenError::GraphicsResource`].
    pub fn transient(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GraphicsResource {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`LumenError::DeviceLost`].
    pub fn device_lost(device: DeviceId, reason: impl Into<String>) -> Self {
        Self::DeviceLost {
            device,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::GraphicsResource { .. } => ErrorSeverity::Transient,
            Self::DeviceLost { .. } => ErrorSeverity::Fatal,
            Self::ResourceNotLoaded { .. }
            | Self::ObjectDisposed { .. }
            | Self::UnknownDevice(_)
            | Self::InvalidArgument(_) => ErrorSeverity::Programming,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.severity() == ErrorSeverity::Transient
    }

    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }
}

/// Alias for `Result<T, LumenError>`.
pub type Result<T> = std::result::Result<T, LumenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_classification() {
        let device = DeviceId::from_raw(7);
        assert!(LumenError::transient("Buffer", "oom").is_transient());
        assert!(LumenError::device_lost(device, "removed").is_fatal());
        let not_loaded = LumenError::ResourceNotLoaded {
            resource: "Buffer".to_string(),
            device,
        };
        assert_eq!(not_loaded.severity(), ErrorSeverity::Programming);
        assert!(!not_loaded.is_transient());
        assert!(!not_loaded.is_fatal());
    }

    #[test]
    fn display_mentions_device() {
        let err = LumenError::device_lost(DeviceId::from_raw(3), "TDR");
        assert_eq!(err.to_string(), "Device #3 lost: TDR");
    }
}
