//! Input sources and temporal-unit framing.
//!
//! A [`BitstreamReader`] owns the stream bytes and carves them into
//! [`TemporalUnit`]s lazily as the session advances. Two container
//! framings are supported, detected by sniffing the first bytes:
//!
//! - **IVF**: every IVF frame is one temporal unit and carries a
//!   presentation timestamp.
//! - **Low-overhead OBU bitstream** (AV1 spec 5.2): concatenated OBUs with
//!   `obu_has_size_field=1`, temporal units delimited by
//!   `OBU_TEMPORAL_DELIMITER`. No timestamps.

use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use bytes_util::BytesCursorExt;
use tracing::debug;

use crate::error::{ContainerError, OpenError, Result};
use crate::ivf::{IVF_SIGNATURE, IvfFrame, IvfHeader};
use crate::obu::{ObuHeader, ObuType};

/// An input byte source: a filesystem path or an in-memory buffer.
///
/// Paths are held as [`PathBuf`], so the platform's native string encoding
/// is preserved end to end (no UTF-8 assumption on platforms whose narrow
/// string APIs are not UTF-8-clean). Memory buffers carry an explicit
/// length and may contain embedded zero bytes.
#[derive(Debug, Clone)]
pub enum Source {
    /// Read the stream from a file.
    Path(PathBuf),
    /// Use an in-memory buffer as the stream.
    Memory(Bytes),
}

impl Source {
    /// Reads the stream from the file at `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Source::Path(path.into())
    }

    /// Wraps an in-memory buffer.
    pub fn from_memory(data: impl Into<Bytes>) -> Self {
        Source::Memory(data.into())
    }
}

/// One container-level chunk of coded data corresponding to one output
/// time instant: a sequence of OBUs, zero-copy-sliced out of the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalUnit {
    /// Raw OBU bytes of this unit.
    pub data: Bytes,
    /// Presentation timestamp in container timebase units, when the
    /// container carries one (IVF only).
    pub pts: Option<u64>,
}

/// Container framing detected at open.
#[derive(Debug)]
enum Framing {
    Ivf(IvfHeader),
    LowOverhead,
}

/// Reads temporal units out of a single source.
///
/// The source bytes are fully resident; units are framed lazily as the
/// caller advances, each returned as a zero-copy slice.
#[derive(Debug)]
pub struct BitstreamReader {
    cursor: io::Cursor<Bytes>,
    framing: Framing,
    first_unit_position: u64,
}

impl BitstreamReader {
    /// Opens a source and detects its container framing.
    pub fn open(source: Source) -> Result<Self, OpenError> {
        let data = match source {
            Source::Path(path) => {
                let bytes = std::fs::read(&path).map_err(|err| OpenError::from_io(&path, err))?;
                Bytes::from(bytes)
            }
            Source::Memory(bytes) => bytes,
        };
        Self::from_bytes(data)
    }

    fn from_bytes(data: Bytes) -> Result<Self, OpenError> {
        if data.is_empty() {
            return Err(OpenError::MalformedHeader(ContainerError::UnexpectedEof {
                expected: 1,
                actual: 0,
            }));
        }

        let mut cursor = io::Cursor::new(data);
        let framing = if cursor.get_ref().len() >= 4 && cursor.get_ref()[..4] == IVF_SIGNATURE {
            let header = IvfHeader::demux(&mut cursor)?;
            debug!(
                width = header.width,
                height = header.height,
                frames = header.frame_count,
                "opened IVF stream"
            );
            Framing::Ivf(header)
        } else {
            debug!("opened low-overhead OBU stream");
            Framing::LowOverhead
        };

        let first_unit_position = cursor.position();
        Ok(BitstreamReader {
            cursor,
            framing,
            first_unit_position,
        })
    }

    /// The IVF file header, when the source is an IVF file.
    pub fn ivf_header(&self) -> Option<&IvfHeader> {
        match &self.framing {
            Framing::Ivf(header) => Some(header),
            Framing::LowOverhead => None,
        }
    }

    /// Frames the next temporal unit, or `None` at end of stream.
    pub fn next_unit(&mut self) -> Result<Option<TemporalUnit>> {
        if self.remaining() == 0 {
            return Ok(None);
        }

        match self.framing {
            Framing::Ivf(_) => {
                let frame = IvfFrame::demux(&mut self.cursor)?;
                Ok(Some(TemporalUnit {
                    data: frame.data,
                    pts: Some(frame.header.pts),
                }))
            }
            Framing::LowOverhead => self.next_low_overhead_unit(),
        }
    }

    /// Groups low-overhead OBUs into one temporal unit: a leading temporal
    /// delimiter (if any) plus every OBU up to the next delimiter.
    fn next_low_overhead_unit(&mut self) -> Result<Option<TemporalUnit>> {
        let start = self.cursor.position();

        while self.remaining() > 0 {
            let obu_start = self.cursor.position();
            let header = ObuHeader::parse(&mut self.cursor)?;
            let size = header.size.ok_or_else(|| {
                ContainerError::InvalidObu(
                    "obu_has_size_field must be 1 in low-overhead bitstream".into(),
                )
            })?;

            if header.obu_type == ObuType::TemporalDelimiter && obu_start != start {
                // Belongs to the next unit.
                self.cursor.set_position(obu_start);
                break;
            }

            self.cursor.extract_bytes(size as usize).map_err(|_| {
                ContainerError::UnexpectedEof {
                    expected: size as usize,
                    actual: self.remaining() as usize,
                }
            })?;
        }

        let end = self.cursor.position();
        let data = self.cursor.get_ref().slice(start as usize..end as usize);
        Ok(Some(TemporalUnit { data, pts: None }))
    }

    /// Rewinds to the first temporal unit.
    pub fn rewind(&mut self) {
        self.cursor.set_position(self.first_unit_position);
    }

    /// Current read position, for probe save/restore.
    pub(crate) fn checkpoint(&self) -> u64 {
        self.cursor.position()
    }

    /// Restores a position previously returned by
    /// [`checkpoint`](Self::checkpoint).
    pub(crate) fn resume(&mut self, position: u64) {
        self.cursor.set_position(position);
    }

    fn remaining(&self) -> u64 {
        self.cursor.get_ref().len() as u64 - self.cursor.position()
    }
}

/// Iterator over the OBUs inside one temporal unit.
///
/// Container-tolerant: the last OBU of a unit may omit
/// `obu_has_size_field`, in which case the container boundary implies its
/// size (common for IVF payloads).
pub struct ObuIterator {
    cursor: io::Cursor<Bytes>,
}

/// An OBU with its parsed header and zero-copy payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obu {
    /// Parsed OBU header.
    pub header: ObuHeader,
    /// Raw payload (header and size field excluded).
    pub data: Bytes,
}

impl ObuIterator {
    /// Creates an iterator over the OBUs of a temporal unit.
    pub fn new(unit: &TemporalUnit) -> Self {
        Self {
            cursor: io::Cursor::new(unit.data.clone()),
        }
    }
}

impl Iterator for ObuIterator {
    type Item = Result<Obu>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.cursor.get_ref().len() as u64 - self.cursor.position();
        if remaining == 0 {
            return None;
        }

        Some(self.parse_next())
    }
}

impl ObuIterator {
    fn parse_next(&mut self) -> Result<Obu> {
        let header = ObuHeader::parse(&mut self.cursor)?;
        let remaining = self.cursor.get_ref().len() as u64 - self.cursor.position();
        let size = header.size.unwrap_or(remaining);
        let data =
            self.cursor
                .extract_bytes(size as usize)
                .map_err(|_| ContainerError::UnexpectedEof {
                    expected: size as usize,
                    actual: remaining as usize,
                })?;
        Ok(Obu { header, data })
    }
}
