//! IVF container format parsing and writing.
//!
//! IVF is a simple container commonly used for AV1, VP8 and VP9 streams:
//! a 32-byte file header followed by 12-byte frame headers with raw codec
//! data. Each IVF frame holds exactly one temporal unit and carries a
//! presentation timestamp in timebase units.
//!
//! All multi-byte integers are little-endian.

use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use bytes_util::BytesCursorExt;

use crate::error::{ContainerError, Result};

/// IVF file signature: `"DKIF"`.
pub(crate) const IVF_SIGNATURE: [u8; 4] = *b"DKIF";

/// AV1 codec FourCC: `"av01"`.
const AV1_FOURCC: [u8; 4] = *b"av01";

/// IVF file header (32 bytes, all little-endian).
///
/// ```text
/// Offset  Size  Field
/// 0       4     signature: "DKIF"
/// 4       2     version: 0
/// 6       2     header_size: 32
/// 8       4     codec_fourcc: "av01"
/// 12      2     width
/// 14      2     height
/// 16      4     timebase_denominator (rate)
/// 20      4     timebase_numerator (scale)
/// 24      4     frame_count
/// 28      4     reserved
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvfHeader {
    /// IVF version (must be 0).
    pub version: u16,
    /// Video width in pixels, per the container (the sequence header is
    /// authoritative for decode geometry).
    pub width: u16,
    /// Video height in pixels, per the container.
    pub height: u16,
    /// Timebase numerator. One pts tick lasts `numerator / denominator`
    /// seconds; 30fps material typically uses 1/30.
    pub timebase_numerator: u32,
    /// Timebase denominator.
    pub timebase_denominator: u32,
    /// Total number of frames (may be 0 if unknown).
    pub frame_count: u32,
}

impl IvfHeader {
    /// Size of the IVF file header in bytes.
    pub const SIZE: usize = 32;

    /// Demuxes an IVF file header from the given reader.
    pub fn demux<R: io::Read>(reader: &mut R) -> Result<Self> {
        let mut signature = [0u8; 4];
        reader.read_exact(&mut signature)?;
        if signature != IVF_SIGNATURE {
            return Err(ContainerError::InvalidIvfSignature(signature));
        }

        let version = reader.read_u16::<LittleEndian>()?;
        if version != 0 {
            return Err(ContainerError::UnsupportedIvfVersion(version));
        }

        let _header_size = reader.read_u16::<LittleEndian>()?;

        let mut codec = [0u8; 4];
        reader.read_exact(&mut codec)?;
        if !codec.eq_ignore_ascii_case(&AV1_FOURCC) {
            return Err(ContainerError::InvalidIvfCodec(codec));
        }

        let width = reader.read_u16::<LittleEndian>()?;
        let height = reader.read_u16::<LittleEndian>()?;
        let timebase_denominator = reader.read_u32::<LittleEndian>()?;
        let timebase_numerator = reader.read_u32::<LittleEndian>()?;

        if timebase_numerator == 0 || timebase_denominator == 0 {
            return Err(ContainerError::InvalidIvfTimebase {
                numerator: timebase_numerator,
                denominator: timebase_denominator,
            });
        }

        let frame_count = reader.read_u32::<LittleEndian>()?;
        let _reserved = reader.read_u32::<LittleEndian>()?;

        Ok(IvfHeader {
            version,
            width,
            height,
            timebase_numerator,
            timebase_denominator,
            frame_count,
        })
    }

    /// Muxes this IVF file header to the given writer.
    pub fn mux<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&IVF_SIGNATURE)?;
        writer.write_u16::<LittleEndian>(self.version)?;
        writer.write_u16::<LittleEndian>(Self::SIZE as u16)?;
        writer.write_all(&AV1_FOURCC)?;
        writer.write_u16::<LittleEndian>(self.width)?;
        writer.write_u16::<LittleEndian>(self.height)?;
        writer.write_u32::<LittleEndian>(self.timebase_denominator)?;
        writer.write_u32::<LittleEndian>(self.timebase_numerator)?;
        writer.write_u32::<LittleEndian>(self.frame_count)?;
        writer.write_u32::<LittleEndian>(0)?; // reserved
        Ok(())
    }

    /// Seconds per pts tick.
    pub fn timebase(&self) -> f64 {
        self.timebase_numerator as f64 / self.timebase_denominator as f64
    }
}

/// IVF frame header (12 bytes, all little-endian).
///
/// ```text
/// Offset  Size  Field
/// 0       4     frame_size (bytes of payload following)
/// 4       8     pts (presentation timestamp in timebase units)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub struct IvfFrameHeader {
    /// Size of the frame data in bytes.
    pub frame_size: u32,
    /// Presentation timestamp in timebase units.
    pub pts: u64,
}

impl IvfFrameHeader {
    /// Size of each IVF frame header in bytes.
    pub const SIZE: usize = 12;

    /// Demuxes an IVF frame header from the given reader.
    pub fn demux<R: io::Read>(reader: &mut R) -> Result<Self> {
        let frame_size = reader.read_u32::<LittleEndian>()?;
        let pts = reader.read_u64::<LittleEndian>()?;
        Ok(IvfFrameHeader { frame_size, pts })
    }

    /// Muxes this IVF frame header to the given writer.
    pub fn mux<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.frame_size)?;
        writer.write_u64::<LittleEndian>(self.pts)?;
        Ok(())
    }
}

/// A parsed IVF frame with zero-copy data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvfFrame {
    /// Frame header.
    pub header: IvfFrameHeader,
    /// Raw frame data (one temporal unit of OBUs). Zero-copy `Bytes` slice.
    pub data: Bytes,
}

impl IvfFrame {
    /// Demuxes a full IVF frame (header + data) from a `Cursor<Bytes>`.
    pub fn demux(reader: &mut io::Cursor<Bytes>) -> Result<Self> {
        let header = IvfFrameHeader::demux(reader)?;
        let data = reader
            .extract_bytes(header.frame_size as usize)
            .map_err(|_| ContainerError::UnexpectedEof {
                expected: header.frame_size as usize,
                actual: (reader.get_ref().len() as u64 - reader.position()) as usize,
            })?;
        Ok(IvfFrame { header, data })
    }
}

/// IVF file writer.
///
/// Writes an IVF file header followed by frames. Call
/// [`finalize`](IvfWriter::finalize) (requires `Write + Seek`) to update
/// the frame count in the file header after all frames have been written.
pub struct IvfWriter<W: io::Write> {
    writer: W,
    frame_count: u32,
}

impl<W: io::Write> IvfWriter<W> {
    /// Creates a new IVF writer and writes the file header.
    pub fn new(mut writer: W, header: &IvfHeader) -> Result<Self> {
        header.mux(&mut writer)?;
        Ok(IvfWriter {
            writer,
            frame_count: 0,
        })
    }

    /// Writes a single frame with the given presentation timestamp and data.
    pub fn write_frame(&mut self, pts: u64, data: &[u8]) -> Result<()> {
        let frame_header = IvfFrameHeader {
            frame_size: data.len() as u32,
            pts,
        };
        frame_header.mux(&mut self.writer)?;
        self.writer.write_all(data)?;
        self.frame_count += 1;
        Ok(())
    }

    /// Returns the number of frames written so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Consumes the writer and returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write + io::Seek> IvfWriter<W> {
    /// Seeks back to the file header and updates the frame count field.
    pub fn finalize(&mut self) -> Result<()> {
        self.writer.seek(io::SeekFrom::Start(24))?;
        self.writer.write_u32::<LittleEndian>(self.frame_count)?;
        self.writer.seek(io::SeekFrom::End(0))?;
        Ok(())
    }
}
