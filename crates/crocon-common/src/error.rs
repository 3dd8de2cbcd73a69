//! Error types for crocon.
//!
//! This module defines [`ConverterError`], the single error type shared by the
//! envelope codec, the executor and the dispatch gateway.
//!
//! No error is retried internally. Each variant is surfaced to the immediate
//! caller of `convert`.

use thiserror::Error;

/// Top-level converter errors.
///
/// These errors cover the whole life of a conversion, from building the
/// native execution context to decoding the engine's reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConverterError {
    /// The native execution context could not be created.
    ///
    /// Fatal to construction and never retried automatically.
    #[error("Initialization failed: {reason}")]
    Initialization {
        /// Description of the initialization failure.
        reason: String,
    },

    /// An operation was attempted after the converter was closed.
    #[error("Converter has been closed")]
    Closed,

    /// The request did not fit the wire envelope.
    #[error("Encoding failed: {reason}")]
    Encoding {
        /// Description of the field that could not be encoded.
        reason: String,
    },

    /// The engine's response envelope was malformed.
    #[error("Decoding failed: {reason}")]
    Decoding {
        /// Description of the decoding failure.
        reason: String,
    },

    /// The decoded payload does not match the expected shape for its data kind.
    #[error("Unexpected {kind} payload: {reason}")]
    PayloadShape {
        /// The data kind whose payload was being decoded.
        kind: &'static str,
        /// Description of the mismatch.
        reason: String,
    },

    /// The engine returned a null sentinel with no envelope to parse.
    #[error("Native call '{operation}' returned no result")]
    NativeCallFailure {
        /// The native symbol that failed.
        operation: &'static str,
    },

    /// The engine ran but reported a domain-level failure.
    #[error("Conversion failed: {message}")]
    Conversion {
        /// Message text reported by the engine.
        message: String,
        /// Diagnostic trace reported by the engine.
        stack_trace: String,
    },
}

impl ConverterError {
    /// Create a new `Initialization` error.
    pub fn initialization(reason: impl Into<String>) -> Self {
        Self::Initialization {
            reason: reason.into(),
        }
    }

    /// Create a new `Encoding` error.
    pub fn encoding(reason: impl Into<String>) -> Self {
        Self::Encoding {
            reason: reason.into(),
        }
    }

    /// Create a new `Decoding` error.
    pub fn decoding(reason: impl Into<String>) -> Self {
        Self::Decoding {
            reason: reason.into(),
        }
    }

    /// Create a new `PayloadShape` error.
    pub fn payload_shape(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::PayloadShape {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a new `Conversion` error.
    pub fn conversion(message: impl Into<String>, stack_trace: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
            stack_trace: stack_trace.into(),
        }
    }

    /// Returns `true` if the converter was used after teardown.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if the engine itself reported the failure.
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// Returns `true` if this error indicates a wire contract mismatch.
    ///
    /// These are never transient: retrying the same request fails the same way.
    pub fn is_contract_mismatch(&self) -> bool {
        matches!(
            self,
            Self::Encoding { .. } | Self::Decoding { .. } | Self::PayloadShape { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConverterError::Closed;
        assert_eq!(err.to_string(), "Converter has been closed");

        let err = ConverterError::conversion("unknown block", "at Foo.bar()");
        assert_eq!(err.to_string(), "Conversion failed: unknown block");

        let err = ConverterError::NativeCallFailure {
            operation: "convert_block",
        };
        assert_eq!(
            err.to_string(),
            "Native call 'convert_block' returned no result"
        );
    }

    #[test]
    fn test_payload_shape_display() {
        let err = ConverterError::payload_shape("block", "missing 'id'");
        assert_eq!(err.to_string(), "Unexpected block payload: missing 'id'");
    }

    #[test]
    fn test_is_contract_mismatch() {
        assert!(ConverterError::encoding("too long").is_contract_mismatch());
        assert!(ConverterError::decoding("bad base64").is_contract_mismatch());
        assert!(ConverterError::payload_shape("item", "x").is_contract_mismatch());
        assert!(!ConverterError::Closed.is_contract_mismatch());
        assert!(!ConverterError::conversion("a", "b").is_contract_mismatch());
    }

    #[test]
    fn test_predicates() {
        assert!(ConverterError::Closed.is_closed());
        assert!(!ConverterError::initialization("oom").is_closed());
        assert!(ConverterError::conversion("a", "").is_conversion());
        assert!(!ConverterError::Closed.is_conversion());
    }
}
