//! Error types for opening, reading and probing AV1 streams.

use std::path::PathBuf;

use thiserror::Error;

/// Container-level malformation detail.
///
/// Carried inside [`OpenError::MalformedHeader`] and
/// [`DecodeFailure::Container`] so callers can log the exact reason while
/// matching on the coarse taxonomy.
#[derive(Error, Debug)]
pub enum ContainerError {
    /// An I/O error occurred while reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid IVF file signature (expected `"DKIF"`).
    #[error("invalid IVF signature: expected \"DKIF\", got {0:?}")]
    InvalidIvfSignature([u8; 4]),

    /// Invalid IVF codec FourCC (expected `"AV01"` or `"av01"`).
    #[error("invalid IVF codec: expected \"AV01\" or \"av01\", got {0:?}")]
    InvalidIvfCodec([u8; 4]),

    /// Unsupported IVF version.
    #[error("unsupported IVF version: {0}")]
    UnsupportedIvfVersion(u16),

    /// Invalid IVF timebase (zero numerator or denominator).
    #[error("invalid IVF timebase: {numerator}/{denominator}")]
    InvalidIvfTimebase {
        /// Timebase numerator.
        numerator: u32,
        /// Timebase denominator.
        denominator: u32,
    },

    /// Invalid OBU data.
    #[error("invalid OBU: {0}")]
    InvalidObu(String),

    /// Invalid sequence header OBU payload.
    #[error("invalid sequence header: {0}")]
    InvalidSequenceHeader(String),

    /// The stream's header region contains no sequence header OBU.
    #[error("no sequence header found in the first temporal unit")]
    MissingSequenceHeader,

    /// LEB128 value overflow.
    #[error("LEB128 overflow: value exceeds maximum")]
    Leb128Overflow,

    /// Unexpected end of data.
    #[error("unexpected end of data: expected {expected} bytes, got {actual}")]
    UnexpectedEof {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes available.
        actual: usize,
    },
}

/// Errors returned when opening a stream.
#[derive(Error, Debug)]
pub enum OpenError {
    /// The source path does not exist.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// The source could not be read.
    #[error("I/O failure: {0}")]
    IoFailure(#[source] std::io::Error),

    /// The container or stream header could not be parsed.
    #[error("malformed header: {0}")]
    MalformedHeader(#[from] ContainerError),
}

impl OpenError {
    /// Maps an I/O error from opening `path` into the open taxonomy.
    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            OpenError::NotFound(path.to_path_buf())
        } else {
            OpenError::IoFailure(err)
        }
    }
}

/// Cause detail for [`ReadError::DecodeFailure`].
#[derive(Error, Debug)]
pub enum DecodeFailure {
    /// The next temporal unit could not be framed from the container.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// The decode primitive rejected the payload.
    #[error("native decoder error (code {code})")]
    Native {
        /// Native error code reported by the decode primitive.
        code: i32,
    },
}

/// Errors returned by [`Context::read_pictures`](crate::Context::read_pictures).
#[derive(Error, Debug)]
pub enum ReadError {
    /// The requested picture count was zero. Session state is not mutated.
    #[error("picture count must be at least 1")]
    InvalidArgument,

    /// A picture failed to decode. The session remains usable; subsequent
    /// reads continue after the offending temporal unit.
    #[error("picture decode failed: {0}")]
    DecodeFailure(#[source] DecodeFailure),

    /// The decoder state is corrupt. The context must be discarded; every
    /// further read on it fails with this variant.
    #[error("decoder entered an unrecoverable state (native code {code})")]
    FatalState {
        /// Native error code reported by the decode primitive.
        code: i32,
    },
}

/// Errors returned by [`Context::guess_frame_rate`](crate::Context::guess_frame_rate).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EstimationError {
    /// Fewer timed temporal units were found than the estimator needs.
    #[error("insufficient timing data: found {found} timed units, need {needed}")]
    InsufficientData {
        /// Number of timed units found in the probe window.
        found: usize,
        /// Minimum number of timed units required.
        needed: usize,
    },

    /// The container carries no timestamps and the sequence header has no
    /// usable timing info.
    #[error("stream carries no timing information")]
    NoTimingInfo,
}

/// Result type alias for container-level parsing.
pub type Result<T, E = ContainerError> = std::result::Result<T, E>;
