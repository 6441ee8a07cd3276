//! The decode primitive seam.
//!
//! Actual AV1 entropy/transform/prediction decoding is out of scope: the
//! session drives an opaque [`PictureDecoder`] with temporal units and
//! pulls decoded pictures back, mirroring the send/poll loop of
//! libdav1d-style decoders (send data, poll pictures, EAGAIN means feed
//! more).

use thiserror::Error;

use crate::bitstream::TemporalUnit;
use crate::info::PixelLayout;

/// Errors reported by a decode primitive.
///
/// Native error codes are carried through verbatim for diagnostics; their
/// numeric values have no stable cross-version meaning and must not be
/// interpreted beyond the variant they arrive in.
#[derive(Error, Debug)]
pub enum DecoderError {
    /// The fed payload was rejected. The decoder remains usable and the
    /// session may continue with the next temporal unit.
    #[error("corrupt temporal unit (native code {code})")]
    Corrupt {
        /// Native error code.
        code: i32,
    },

    /// The decoder state is unrecoverable; the owning context must be
    /// discarded.
    #[error("unrecoverable decoder state (native code {code})")]
    Fatal {
        /// Native error code.
        code: i32,
    },
}

impl DecoderError {
    /// Maps an errno-style native code onto the error taxonomy.
    ///
    /// Allocation failure is the one code that always leaves the decoder
    /// unusable; every other (and any unknown) code is treated as a
    /// per-unit corruption that the session can skip past. A primitive
    /// that knows a code is unrecoverable should construct
    /// [`DecoderError::Fatal`] directly instead.
    pub fn from_native(code: i32) -> Self {
        const ENOMEM: i32 = -12;
        match code {
            ENOMEM => DecoderError::Fatal { code },
            _ => DecoderError::Corrupt { code },
        }
    }

    /// Native code carried by this error.
    pub fn code(&self) -> i32 {
        match self {
            DecoderError::Corrupt { code } | DecoderError::Fatal { code } => *code,
        }
    }
}

/// One plane of a decoded picture, owned by the decode primitive's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneBuf {
    /// Sample bytes, `stride * height` long. Rows may carry alignment
    /// padding past `width * sample_size`.
    pub data: Vec<u8>,
    /// Byte distance between the start of consecutive rows.
    pub stride: usize,
    /// Plane width in samples.
    pub width: u32,
    /// Plane height in samples.
    pub height: u32,
}

/// A decoded picture as produced by the decode primitive.
///
/// U/V planes are `None` for monochrome output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPicture {
    /// Chroma subsampling of this picture.
    pub pixel_layout: PixelLayout,
    /// `true` when samples are two bytes wide.
    pub high_bit_depth: bool,
    /// Luma plane.
    pub y: PlaneBuf,
    /// First chroma plane.
    pub u: Option<PlaneBuf>,
    /// Second chroma plane.
    pub v: Option<PlaneBuf>,
}

/// An opaque decode primitive driven by the session.
///
/// Implementations wrap an actual AV1 decoder. The session feeds temporal
/// units via [`send`](PictureDecoder::send) whenever
/// [`poll_picture`](PictureDecoder::poll_picture) reports it needs more
/// data, and rewinds via [`flush`](PictureDecoder::flush) on reset.
pub trait PictureDecoder {
    /// Feeds one temporal unit into the decoder.
    fn send(&mut self, unit: &TemporalUnit) -> Result<(), DecoderError>;

    /// Polls for the next decoded picture in display order.
    ///
    /// `Ok(None)` means the decoder needs more input before it can emit a
    /// picture (EAGAIN in native terms), not end of stream.
    fn poll_picture(&mut self) -> Result<Option<RawPicture>, DecoderError>;

    /// Discards all in-flight decoder state, including buffered reference
    /// frames. Called on session reset.
    fn flush(&mut self);
}
