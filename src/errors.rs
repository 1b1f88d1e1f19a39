//! The `errors` module defines the error taxonomy for the FLAC decoder.

use std::error;
use std::fmt;
use std::io;

use super::Result;

/// `Error` enumerates every way a FLAC bitstream can fail to decode.
///
/// All variants are fatal: decoding does not attempt to resync on a
/// malformed frame, so every error tears the decoder down. Recovery
/// requires constructing a new decoder over a fresh (or rewound) stream.
#[derive(Debug)]
pub enum Error {
    /// The underlying byte source returned fewer bytes than required.
    IoError(io::Error),
    /// The first four bytes of the stream are not `fLaC`.
    MalformedMarker,
    /// STREAMINFO missing/mis-sized, a reserved metadata block type, or a
    /// malformed Vorbis comment length.
    MalformedMetadata(&'static str),
    /// Sync code mismatch, non-zero reserved bit, a reserved block-size,
    /// sample-rate, sample-size or channel-assignment code, or a header
    /// CRC mismatch (when header CRC verification is enabled).
    MalformedFrameHeader(&'static str),
    /// Reserved subframe type, invalid LPC precision, or a malformed
    /// wasted-bits prefix.
    MalformedSubframe(&'static str),
    /// Reserved residual coding method, a partition order incompatible
    /// with the block size, or an implausible first-partition count.
    MalformedResidual(&'static str),
    /// An invariant from the data model was violated, e.g. a decoded
    /// block size outside `[min_block_size, max_block_size]`, or a frame
    /// CRC mismatch (when frame CRC verification is enabled).
    InvariantViolation(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::IoError(ref err) => err.fmt(f),
            Error::MalformedMarker => write!(f, "stream does not start with the 'fLaC' marker"),
            Error::MalformedMetadata(msg) => write!(f, "malformed metadata: {}", msg),
            Error::MalformedFrameHeader(msg) => write!(f, "malformed frame header: {}", msg),
            Error::MalformedSubframe(msg) => write!(f, "malformed subframe: {}", msg),
            Error::MalformedResidual(msg) => write!(f, "malformed residual: {}", msg),
            Error::InvariantViolation(msg) => write!(f, "invariant violation: {}", msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IoError(err)
    }
}

/// Constructs a `MalformedMetadata` error.
pub fn malformed_metadata<T>(desc: &'static str) -> Result<T> {
    Err(Error::MalformedMetadata(desc))
}

/// Constructs a `MalformedFrameHeader` error.
pub fn malformed_frame_header<T>(desc: &'static str) -> Result<T> {
    Err(Error::MalformedFrameHeader(desc))
}

/// Constructs a `MalformedSubframe` error.
pub fn malformed_subframe<T>(desc: &'static str) -> Result<T> {
    Err(Error::MalformedSubframe(desc))
}

/// Constructs a `MalformedResidual` error.
pub fn malformed_residual<T>(desc: &'static str) -> Result<T> {
    Err(Error::MalformedResidual(desc))
}

/// Constructs an `InvariantViolation` error.
pub fn invariant_violation<T>(desc: &'static str) -> Result<T> {
    Err(Error::InvariantViolation(desc))
}
