//! Stream geometry types exposed to callers.

/// Chroma subsampling scheme of a decoded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// Monochrome: luma plane only.
    I400,
    /// 4:2:0: chroma planes are half width and half height.
    I420,
    /// 4:2:2: chroma planes are half width, full height.
    I422,
    /// 4:4:4: chroma planes are full width and height.
    I444,
}

impl PixelLayout {
    /// Returns `true` if the layout has no chroma planes.
    pub fn is_monochrome(self) -> bool {
        self == PixelLayout::I400
    }

    /// Chroma plane dimensions for a given luma plane size.
    ///
    /// Subsampled dimensions round up, matching how decoders size chroma
    /// planes for odd luma dimensions.
    pub fn chroma_dimensions(self, width: u32, height: u32) -> Option<(u32, u32)> {
        match self {
            PixelLayout::I400 => None,
            PixelLayout::I420 => Some((width.div_ceil(2), height.div_ceil(2))),
            PixelLayout::I422 => Some((width.div_ceil(2), height)),
            PixelLayout::I444 => Some((width, height)),
        }
    }
}

impl std::fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PixelLayout::I400 => "4:0:0",
            PixelLayout::I420 => "4:2:0",
            PixelLayout::I422 => "4:2:2",
            PixelLayout::I444 => "4:4:4",
        };
        f.write_str(name)
    }
}

/// Immutable stream geometry, populated from the sequence header on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    /// Frame width in pixels. Always non-zero once the header is parsed.
    pub width: u32,
    /// Frame height in pixels. Always non-zero once the header is parsed.
    pub height: u32,
    /// Chroma subsampling scheme, fixed for the stream's duration.
    pub pixel_layout: PixelLayout,
    /// `true` for 10-bit or 12-bit samples (two bytes per sample).
    pub high_bit_depth: bool,
}

impl VideoInfo {
    /// Bytes per sample: 2 when high bit depth, 1 otherwise.
    pub fn sample_size(&self) -> usize {
        if self.high_bit_depth { 2 } else { 1 }
    }
}

impl std::fmt::Display for VideoInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} {} ({}-bit samples)",
            self.width,
            self.height,
            self.pixel_layout,
            if self.high_bit_depth { "10/12" } else { "8" },
        )
    }
}
