//! Decoded picture buffering and stride-aware plane views.
//!
//! The pool owns every decoded picture delivered by a read call. Callers
//! get [`Picture`] handles whose plane views borrow the pool through the
//! session, so holding a view past the next read call is a compile error
//! rather than a dangling pointer — the zero-copy contract of the
//! underlying decoder model, enforced by lifetimes.

use crate::decode::{PlaneBuf, RawPicture};
use crate::info::PixelLayout;

/// Identifies one plane of a decoded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    /// Luma.
    Y,
    /// First chroma.
    U,
    /// Second chroma.
    V,
}

/// A stride-aware, zero-copy view of one plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    data: &'a [u8],
    stride: usize,
    width: u32,
    height: u32,
    sample_size: usize,
}

impl<'a> PlaneView<'a> {
    fn new(buf: &'a PlaneBuf, sample_size: usize) -> Self {
        Self {
            data: &buf.data,
            stride: buf.stride,
            width: buf.width,
            height: buf.height,
            sample_size,
        }
    }

    /// Raw plane bytes, `stride * height` long, rows padded to `stride`.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Byte distance between the start of consecutive rows. Always at
    /// least `width * sample_size`; may exceed it due to alignment.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Plane width in samples.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Plane height in samples.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// One row of samples, alignment padding trimmed.
    ///
    /// Returns `None` for rows at or past [`height`](Self::height).
    pub fn row(&self, index: u32) -> Option<&'a [u8]> {
        if index >= self.height {
            return None;
        }
        let start = index as usize * self.stride;
        let len = self.width as usize * self.sample_size;
        Some(&self.data[start..start + len])
    }
}

/// One decoded picture, valid until the next read call on the session.
#[derive(Debug, Clone, Copy)]
pub struct Picture<'a> {
    raw: &'a RawPicture,
}

impl<'a> Picture<'a> {
    /// Chroma subsampling of this picture.
    pub fn pixel_layout(&self) -> PixelLayout {
        self.raw.pixel_layout
    }

    /// `true` when samples are two bytes wide.
    pub fn high_bit_depth(&self) -> bool {
        self.raw.high_bit_depth
    }

    /// A view of the requested plane. `None` for U/V on monochrome
    /// pictures.
    pub fn plane(&self, plane: Plane) -> Option<PlaneView<'a>> {
        let sample_size = if self.raw.high_bit_depth { 2 } else { 1 };
        let buf = match plane {
            Plane::Y => Some(&self.raw.y),
            Plane::U => self.raw.u.as_ref(),
            Plane::V => self.raw.v.as_ref(),
        };
        buf.map(|buf| PlaneView::new(buf, sample_size))
    }

    /// Luma plane view.
    pub fn y(&self) -> PlaneView<'a> {
        let sample_size = if self.raw.high_bit_depth { 2 } else { 1 };
        PlaneView::new(&self.raw.y, sample_size)
    }
}

/// The ordered pictures delivered by one read call.
///
/// Borrows the session mutably, so the backing buffers stay valid exactly
/// as long as this value is alive.
#[derive(Debug, Clone, Copy)]
pub struct Pictures<'a> {
    inner: &'a [RawPicture],
}

impl<'a> Pictures<'a> {
    pub(crate) fn new(inner: &'a [RawPicture]) -> Self {
        Self { inner }
    }

    /// Number of pictures delivered.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// `true` when no pictures were delivered (end of stream).
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The picture at `index`, in stream order.
    pub fn get(&self, index: usize) -> Option<Picture<'a>> {
        self.inner.get(index).map(|raw| Picture { raw })
    }

    /// Iterates the pictures in stream order.
    pub fn iter(&self) -> impl Iterator<Item = Picture<'a>> + use<'a> {
        self.inner.iter().map(|raw| Picture { raw })
    }
}

/// Bounds and retains the pictures in flight for one session.
#[derive(Debug)]
pub(crate) struct PictureBufferPool {
    pictures: Vec<RawPicture>,
    read_ahead: usize,
}

impl PictureBufferPool {
    /// Default bound on pictures buffered per read call. Kept small: the
    /// decode primitive already retains reference frames internally.
    pub(crate) const DEFAULT_READ_AHEAD: usize = 8;

    pub(crate) fn new(read_ahead: usize) -> Self {
        Self {
            pictures: Vec::with_capacity(read_ahead),
            read_ahead,
        }
    }

    /// Largest picture count a single read call may deliver.
    pub(crate) fn read_ahead(&self) -> usize {
        self.read_ahead
    }

    /// Drops all buffered pictures, keeping the allocation.
    pub(crate) fn clear(&mut self) {
        self.pictures.clear();
    }

    /// Retains one decoded picture for delivery.
    ///
    /// The decode primitive contract guarantees `stride >= width *
    /// sample_size` and fully sized plane buffers; both are checked in
    /// debug builds.
    pub(crate) fn push(&mut self, picture: RawPicture) {
        debug_assert!(self.pictures.len() < self.read_ahead);
        debug_assert!(plane_well_formed(&picture.y, picture.high_bit_depth));
        debug_assert!(
            picture
                .u
                .as_ref()
                .is_none_or(|p| plane_well_formed(p, picture.high_bit_depth))
        );
        debug_assert!(
            picture
                .v
                .as_ref()
                .is_none_or(|p| plane_well_formed(p, picture.high_bit_depth))
        );
        self.pictures.push(picture);
    }

    pub(crate) fn pictures(&self) -> &[RawPicture] {
        &self.pictures
    }
}

fn plane_well_formed(plane: &PlaneBuf, high_bit_depth: bool) -> bool {
    let sample_size = if high_bit_depth { 2 } else { 1 };
    plane.stride >= plane.width as usize * sample_size
        && plane.data.len() >= plane.stride * plane.height as usize
}
