//! A crate for demuxing AV1 elementary streams and driving decode sessions.
//!
//! Supports:
//! - IVF container format parsing and writing
//! - Low-overhead OBU bitstream framing into temporal units
//! - OBU (Open Bitstream Unit) header parsing and writing
//! - Sequence header OBU parsing
//! - Decode session management over a pluggable decode primitive
//! - Zero-copy picture plane access
//! - Frame rate estimation from container timestamps and timing info
//!
//! A session is opened from a file path or an in-memory buffer:
//!
//! ```ignore
//! let mut ctx = Context::open(Source::from_path("stream.ivf"), decoder)?;
//! let info = ctx.video_info();
//! let pictures = ctx.read_pictures(4)?;
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod bitstream;
pub mod decode;
pub mod error;
mod framerate;
mod info;
pub mod ivf;
mod obu;
mod picture;
mod session;

pub use bitstream::{BitstreamReader, Obu, ObuIterator, Source, TemporalUnit};
pub use decode::{DecoderError, PictureDecoder, PlaneBuf, RawPicture};
pub use error::{
    ContainerError, DecodeFailure, EstimationError, OpenError, ReadError, Result,
};
pub use info::{PixelLayout, VideoInfo};
pub use obu::utils::{leb128_size, read_leb128, write_leb128};
pub use obu::{ObuExtensionHeader, ObuHeader, ObuType, seq};
pub use picture::{Picture, Pictures, Plane, PlaneView};
pub use session::{Context, SessionOptions};

/// Library version packed as `major * 10000 + minor * 100 + patch`.
pub const LINKED_VERSION: u32 =
    MAJOR_VERSION * 10000 + MINOR_VERSION * 100 + PATCH_VERSION;

/// Major version of this crate.
pub const MAJOR_VERSION: u32 = 1;
/// Minor version of this crate.
pub const MINOR_VERSION: u32 = 0;
/// Patch version of this crate.
pub const PATCH_VERSION: u32 = 0;

/// The packed library version, for callers that compare against a
/// compile-time expectation.
pub fn linked_version() -> u32 {
    LINKED_VERSION
}
