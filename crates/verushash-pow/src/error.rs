//! PoW hashing error types.

use thiserror::Error;
use verushash_core::CoreError;

/// Errors returned by the hash dispatcher.
///
/// A rejected merge-mining candidate is not an error: it is reported as
/// [`crate::Verdict::Rejected`] and surfaces as the all-`0xff` digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    /// Input at the call boundary was not a usable byte sequence.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The buffer is too short for a field the parser must touch.
    #[error("out of range: {len} bytes at offset {offset} exceed buffer of {buf_len} bytes")]
    OutOfRange {
        /// Start of the requested span.
        offset: usize,
        /// Length of the requested span.
        len: usize,
        /// Actual buffer length.
        buf_len: usize,
    },
}

impl From<CoreError> for PowError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OutOfRange {
                offset,
                len,
                buf_len,
            } => PowError::OutOfRange {
                offset,
                len,
                buf_len,
            },
            CoreError::InvalidHexLength { .. } => {
                PowError::InvalidArgument("unexpected hex length")
            }
            CoreError::InvalidHex(_) => PowError::InvalidArgument("input is not valid hex"),
        }
    }
}
