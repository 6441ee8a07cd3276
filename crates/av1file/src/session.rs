//! Decode session lifecycle and the read loop.
//!
//! A [`Context`] owns one opened stream end to end: the bitstream reader,
//! the decode primitive, the picture pool and the end-of-stream flag. The
//! session is strictly single-threaded; callers wanting parallel decode
//! open one context per stream. All resources are released on drop, so an
//! early return on an error path cannot leak the decoder.

use tracing::{debug, trace};

use crate::bitstream::{BitstreamReader, ObuIterator, Source};
use crate::decode::{DecoderError, PictureDecoder, RawPicture};
use crate::error::{ContainerError, DecodeFailure, OpenError, ReadError};
use crate::info::VideoInfo;
use crate::obu::ObuType;
use crate::obu::seq::SequenceHeader;
use crate::picture::{PictureBufferPool, Pictures};

/// Tunables for a decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Upper bound on pictures buffered per [`Context::read_pictures`]
    /// call. The decode primitive retains reference frames internally,
    /// so large values mostly cost memory.
    pub read_ahead: usize,
    /// Upper bound on temporal units scanned when probing: the sequence
    /// header search at open, and timestamp sampling for frame rate
    /// estimation.
    pub probe_window: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            read_ahead: PictureBufferPool::DEFAULT_READ_AHEAD,
            probe_window: 32,
        }
    }
}

/// A decode session over one opened stream.
///
/// State machine: opened → reading → end-of-stream, with reset returning
/// to reading. Once a read fails with [`ReadError::FatalState`], every
/// subsequent read fails the same way and the context should be dropped.
#[derive(Debug)]
pub struct Context<D> {
    pub(crate) reader: BitstreamReader,
    pub(crate) sequence_header: SequenceHeader,
    pub(crate) options: SessionOptions,
    decoder: D,
    video_info: VideoInfo,
    pool: PictureBufferPool,
    end_of_stream: bool,
    fatal: Option<i32>,
}

impl<D: PictureDecoder> Context<D> {
    /// Opens a source with the given decode primitive and default
    /// [`SessionOptions`].
    ///
    /// Frames the container and scans the leading temporal units for a
    /// sequence header to populate [`VideoInfo`]; the read position is
    /// then rewound so the first read call sees the stream from the
    /// start. Streams without a sequence header in their first
    /// temporal units fail with [`OpenError::MalformedHeader`].
    pub fn open(source: Source, decoder: D) -> Result<Self, OpenError> {
        Self::open_with(source, decoder, SessionOptions::default())
    }

    /// Opens a source with explicit session tunables.
    pub fn open_with(
        source: Source,
        decoder: D,
        options: SessionOptions,
    ) -> Result<Self, OpenError> {
        let mut reader = BitstreamReader::open(source)?;
        let sequence_header = locate_sequence_header(&mut reader, options.probe_window)?;
        reader.rewind();

        let video_info = sequence_header.video_info();
        debug!(%video_info, "opened decode session");

        Ok(Context {
            reader,
            sequence_header,
            options,
            decoder,
            video_info,
            pool: PictureBufferPool::new(options.read_ahead.max(1)),
            end_of_stream: false,
            fatal: None,
        })
    }

    /// Stream geometry from the sequence header. Pure read, callable any
    /// time after open.
    pub fn video_info(&self) -> VideoInfo {
        self.video_info
    }

    /// `true` once the source is fully consumed and no further pictures
    /// remain. Monotonic until [`reset`](Self::reset).
    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Decodes up to `count` pictures in stream order.
    ///
    /// Returns fewer than `count` when the stream ends first, in which
    /// case [`is_end_of_stream`](Self::is_end_of_stream) becomes true; an
    /// empty result at end of stream is not an error. `count` is capped
    /// at [`SessionOptions::read_ahead`] (eight by default), since the
    /// decode primitive retains reference frames internally.
    ///
    /// The returned [`Pictures`] borrow this context: the plane data
    /// stays valid until the next call on the context, and the borrow
    /// checker rejects code that holds a view longer.
    ///
    /// # Errors
    ///
    /// - [`ReadError::InvalidArgument`] for `count == 0`, without
    ///   mutating session state.
    /// - [`ReadError::DecodeFailure`] when a temporal unit is malformed
    ///   or rejected; the session remains usable and the next call
    ///   continues past the offending unit.
    /// - [`ReadError::FatalState`] when the decoder state is corrupt;
    ///   the context must be discarded.
    pub fn read_pictures(&mut self, count: usize) -> Result<Pictures<'_>, ReadError> {
        if count == 0 {
            return Err(ReadError::InvalidArgument);
        }
        if let Some(code) = self.fatal {
            return Err(ReadError::FatalState { code });
        }

        self.pool.clear();
        let target = count.min(self.pool.read_ahead());

        while self.pool.pictures().len() < target {
            match self.next_picture()? {
                Some(picture) => self.pool.push(picture),
                None => {
                    if !self.end_of_stream {
                        debug!("end of stream reached");
                    }
                    self.end_of_stream = true;
                    break;
                }
            }
        }

        trace!(
            requested = count,
            delivered = self.pool.pictures().len(),
            "read pictures"
        );
        Ok(Pictures::new(self.pool.pictures()))
    }

    /// Rewinds the session to the start of the source: the reader is
    /// rewound, the decode primitive flushed, and undelivered pictures
    /// discarded. Clears end-of-stream.
    ///
    /// A context in the fatal state stays fatal; reset cannot recover a
    /// corrupt decoder.
    pub fn reset(&mut self) {
        self.reader.rewind();
        self.decoder.flush();
        self.pool.clear();
        self.end_of_stream = false;
        debug!("session reset");
    }

    /// Releases the session.
    ///
    /// Equivalent to dropping the context; provided so call sites can
    /// make the release point explicit. Double close and use after close
    /// are rejected at compile time since this consumes the context.
    pub fn close(self) {}

    /// Drives the decoder until it emits a picture or input runs out.
    fn next_picture(&mut self) -> Result<Option<RawPicture>, ReadError> {
        loop {
            match self.decoder.poll_picture() {
                Ok(Some(picture)) => return Ok(Some(picture)),
                Ok(None) => {}
                Err(err) => return Err(self.map_decoder_error(err)),
            }

            // Decoder needs more data.
            match self.reader.next_unit() {
                Ok(Some(unit)) => {
                    if let Err(err) = self.decoder.send(&unit) {
                        return Err(self.map_decoder_error(err));
                    }
                }
                Ok(None) => return Ok(None),
                Err(container) => {
                    return Err(ReadError::DecodeFailure(DecodeFailure::Container(container)));
                }
            }
        }
    }

    fn map_decoder_error(&mut self, err: DecoderError) -> ReadError {
        match err {
            DecoderError::Corrupt { code } => {
                debug!(code, "decoder rejected temporal unit");
                ReadError::DecodeFailure(DecodeFailure::Native { code })
            }
            DecoderError::Fatal { code } => {
                debug!(code, "decoder entered fatal state");
                self.fatal = Some(code);
                ReadError::FatalState { code }
            }
        }
    }
}

/// Scans the leading temporal units for a sequence header OBU.
fn locate_sequence_header(
    reader: &mut BitstreamReader,
    probe_window: usize,
) -> Result<SequenceHeader, OpenError> {
    let checkpoint = reader.checkpoint();

    for _ in 0..probe_window {
        let Some(unit) = reader.next_unit()? else {
            break;
        };
        for obu in ObuIterator::new(&unit) {
            let obu = obu?;
            if obu.header.obu_type == ObuType::SequenceHeader {
                let header = SequenceHeader::parse(&obu.data)?;
                reader.resume(checkpoint);
                return Ok(header);
            }
        }
    }

    reader.resume(checkpoint);
    Err(OpenError::MalformedHeader(
        ContainerError::MissingSequenceHeader,
    ))
}
