// ABOUTME: Modem client error types for failures that abort an operation outright
// ABOUTME: Protocol mismatches and device-reported failures are return values, not errors

use crate::codec::CodecError;
use std::io;
use thiserror::Error;

/// Error type for modem client operations
///
/// Only conditions that leave the caller nothing sensible to continue with
/// are reported here: a failing byte channel, a line that cannot be decoded
/// even after substitution, caller input that cannot be sent, and the two
/// hard stops raised by the operator and service-provider queries.
/// Everything else (timeouts, `ERROR` replies, unexpected reply shapes) is
/// logged and surfaced through each operation's return type.
#[derive(Debug, Error)]
pub enum ModemError {
    /// I/O error on the transport (write failed, connection dropped)
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// Text could not be converted to or from the GSM alphabet
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The modem is not registered with an operator
    #[error("Not registered: {0}")]
    NotRegistered(String),

    /// The SIM did not answer the service provider query
    #[error("SIM unavailable: {0}")]
    SimUnavailable(String),

    /// The reset control line could not be driven
    #[error("Reset line error: {0}")]
    ResetLine(String),

    /// Caller input rejected before anything was sent
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for modem operations
pub type ModemResult<T> = Result<T, ModemError>;
