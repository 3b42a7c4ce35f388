//! Error type for the driver layer.
//!
//! There are exactly two locally detected failure modes (session
//! exclusivity and use after shutdown, plus the version gate during open);
//! everything else is a native driver code surfaced verbatim through
//! [`Error::Native`]. This layer never retries or recovers on behalf of the
//! caller.

use thiserror::Error;

use crate::types::ResultCode;

/// Convenience alias for results using the driver error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the safe driver layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Another driver session is already active in this process. Only one
    /// session may exist at a time; close the existing one first.
    #[error("another driver session is already active in this process")]
    AlreadyActive,

    /// The native driver version is incompatible with this layer.
    #[error("native driver version {major}.{minor} is not supported")]
    UnsupportedVersion {
        /// Major version reported by the driver.
        major: u8,
        /// Minor version reported by the driver.
        minor: u8,
    },

    /// The session has been shut down; no further operations are possible.
    #[error("the driver session has been shut down")]
    SessionClosed,

    /// A native driver call returned a non-success code. Generally
    /// non-retryable; the documented exception is
    /// [`ResultCode::WatchdogTimeout`], which is recoverable by re-enabling
    /// and servicing the watchdog.
    #[error("native driver call failed: {0}")]
    Native(ResultCode),
}

impl Error {
    /// The native result code, if this error originated in the driver.
    pub fn native_code(&self) -> Option<ResultCode> {
        match self {
            Error::Native(code) => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_code_is_inspectable() {
        let err = Error::Native(ResultCode::DevAccessFailed);
        assert_eq!(err.native_code(), Some(ResultCode::DevAccessFailed));
        assert_eq!(Error::SessionClosed.native_code(), None);
    }

    #[test]
    fn messages_name_the_condition() {
        assert!(Error::AlreadyActive.to_string().contains("already active"));
        let err = Error::UnsupportedVersion { major: 1, minor: 4 };
        assert!(err.to_string().contains("1.4"));
    }
}
