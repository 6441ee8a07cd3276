//! AV1 sequence header OBU parsing.
//!
//! Parses the subset of the sequence header (AV1 spec 5.5) needed to
//! populate stream geometry and timing information: profile, frame
//! dimensions, `timing_info` and `color_config`. Fields beyond that point
//! (`film_grain_params_present` and trailing bits) are read but discarded.

use std::io;

use bytes_util::{BitReader, BitWriter};

use crate::error::{ContainerError, Result};
use crate::info::{PixelLayout, VideoInfo};
use crate::obu::utils::read_uvlc;

/// `timing_info()` from the sequence header (AV1 spec 5.5.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingInfo {
    /// `num_units_in_display_tick`
    pub num_units_in_display_tick: u32,
    /// `time_scale`
    pub time_scale: u32,
    /// `num_ticks_per_picture_minus_1 + 1` when `equal_picture_interval`
    /// is set, `None` for variable frame intervals.
    pub num_ticks_per_picture: Option<u64>,
}

impl TimingInfo {
    /// Frame rate in frames per second, when the stream declares a fixed
    /// picture interval.
    pub fn fixed_frame_rate(&self) -> Option<f64> {
        let ticks = self.num_ticks_per_picture?;
        if self.num_units_in_display_tick == 0 || ticks == 0 {
            return None;
        }
        Some(self.time_scale as f64 / (self.num_units_in_display_tick as f64 * ticks as f64))
    }
}

/// Parsed sequence header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceHeader {
    /// `seq_profile` (0, 1 or 2).
    pub seq_profile: u8,
    /// `still_picture`
    pub still_picture: bool,
    /// `max_frame_width_minus_1 + 1`
    pub max_frame_width: u32,
    /// `max_frame_height_minus_1 + 1`
    pub max_frame_height: u32,
    /// Sample bit depth (8, 10 or 12).
    pub bit_depth: u8,
    /// `mono_chrome`
    pub mono_chrome: bool,
    /// `subsampling_x`
    pub subsampling_x: bool,
    /// `subsampling_y`
    pub subsampling_y: bool,
    /// `timing_info()` when `timing_info_present_flag` is set.
    pub timing_info: Option<TimingInfo>,
}

impl SequenceHeader {
    /// Parses a sequence header from an `OBU_SEQUENCE_HEADER` payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        parse_inner(payload).map_err(|err| match err {
            ContainerError::Io(io) if io.kind() == io::ErrorKind::UnexpectedEof => {
                ContainerError::InvalidSequenceHeader("payload truncated".into())
            }
            other => other,
        })
    }

    /// Chroma subsampling scheme implied by `mono_chrome` and the
    /// subsampling flags.
    pub fn pixel_layout(&self) -> PixelLayout {
        match (self.mono_chrome, self.subsampling_x, self.subsampling_y) {
            (true, ..) => PixelLayout::I400,
            (false, true, true) => PixelLayout::I420,
            (false, true, false) => PixelLayout::I422,
            (false, false, _) => PixelLayout::I444,
        }
    }

    /// Stream geometry implied by this header.
    pub fn video_info(&self) -> VideoInfo {
        VideoInfo {
            width: self.max_frame_width,
            height: self.max_frame_height,
            pixel_layout: self.pixel_layout(),
            high_bit_depth: self.bit_depth > 8,
        }
    }

    /// Writes this header as an `OBU_SEQUENCE_HEADER` payload.
    ///
    /// The writer emits a non-reduced header with a single operating point,
    /// no decoder model and all optional coding-tool flags off; it produces
    /// any geometry/bit-depth/timing combination [`parse`](Self::parse)
    /// accepts. Used to fabricate conformant streams in tests and tools.
    pub fn mux<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        debug_assert!(self.max_frame_width > 0 && self.max_frame_height > 0);

        let mut w = BitWriter::new(writer);

        w.write_bits(self.seq_profile as u64, 3)?;
        w.write_bit(self.still_picture)?;
        w.write_bit(false)?; // reduced_still_picture_header
        w.write_bit(self.timing_info.is_some())?;
        if let Some(timing) = &self.timing_info {
            w.write_bits(timing.num_units_in_display_tick as u64, 32)?;
            w.write_bits(timing.time_scale as u64, 32)?;
            match timing.num_ticks_per_picture {
                Some(ticks) => {
                    w.write_bit(true)?; // equal_picture_interval
                    write_uvlc(&mut w, ticks - 1)?;
                }
                None => w.write_bit(false)?,
            }
            w.write_bit(false)?; // decoder_model_info_present_flag
        }
        w.write_bit(false)?; // initial_display_delay_present_flag
        w.write_bits(0, 5)?; // operating_points_cnt_minus_1
        w.write_bits(0, 12)?; // operating_point_idc[0]
        w.write_bits(0, 5)?; // seq_level_idx[0] (level 2.0, no seq_tier)

        w.write_bits(15, 4)?; // frame_width_bits_minus_1
        w.write_bits(15, 4)?; // frame_height_bits_minus_1
        w.write_bits(self.max_frame_width as u64 - 1, 16)?;
        w.write_bits(self.max_frame_height as u64 - 1, 16)?;

        w.write_bit(false)?; // frame_id_numbers_present_flag
        w.write_bit(false)?; // use_128x128_superblock
        w.write_bit(false)?; // enable_filter_intra
        w.write_bit(false)?; // enable_intra_edge_filter
        w.write_bit(false)?; // enable_interintra_compound
        w.write_bit(false)?; // enable_masked_compound
        w.write_bit(false)?; // enable_warped_motion
        w.write_bit(false)?; // enable_dual_filter
        w.write_bit(false)?; // enable_order_hint
        w.write_bit(false)?; // seq_choose_screen_content_tools
        w.write_bit(false)?; // seq_force_screen_content_tools
        w.write_bit(false)?; // enable_superres
        w.write_bit(false)?; // enable_cdef
        w.write_bit(false)?; // enable_restoration

        // color_config()
        let high_bitdepth = self.bit_depth > 8;
        w.write_bit(high_bitdepth)?;
        if self.seq_profile == 2 && high_bitdepth {
            w.write_bit(self.bit_depth == 12)?; // twelve_bit
        }
        if self.seq_profile != 1 {
            w.write_bit(self.mono_chrome)?;
        }
        w.write_bit(false)?; // color_description_present_flag
        if self.mono_chrome {
            w.write_bit(false)?; // color_range
        } else {
            w.write_bit(false)?; // color_range
            if self.seq_profile == 2 && self.bit_depth == 12 {
                w.write_bit(self.subsampling_x)?;
                if self.subsampling_x {
                    w.write_bit(self.subsampling_y)?;
                }
            }
            if self.subsampling_x && self.subsampling_y {
                w.write_bits(0, 2)?; // chroma_sample_position
            }
            w.write_bit(false)?; // separate_uv_delta_q
        }

        w.write_bit(false)?; // film_grain_params_present
        w.write_bit(true)?; // trailing_one_bit
        w.finish()?;
        Ok(())
    }
}

fn parse_inner(payload: &[u8]) -> Result<SequenceHeader> {
    let mut cursor = io::Cursor::new(payload);
    let mut r = BitReader::new(&mut cursor);

    let seq_profile = r.read_bits(3)? as u8;
    if seq_profile > 2 {
        return Err(ContainerError::InvalidSequenceHeader(format!(
            "seq_profile {seq_profile} is not defined"
        )));
    }
    let still_picture = r.read_bit()?;
    let reduced_still_picture_header = r.read_bit()?;

    let mut timing_info = None;
    let mut decoder_model_info_present = false;
    let mut buffer_delay_length = 0u8;

    if reduced_still_picture_header {
        r.read_bits(5)?; // seq_level_idx[0]
    } else {
        let timing_info_present = r.read_bit()?;
        if timing_info_present {
            let num_units_in_display_tick = r.read_bits(32)? as u32;
            let time_scale = r.read_bits(32)? as u32;
            let equal_picture_interval = r.read_bit()?;
            let num_ticks_per_picture = if equal_picture_interval {
                Some(read_uvlc(&mut r)? + 1)
            } else {
                None
            };
            timing_info = Some(TimingInfo {
                num_units_in_display_tick,
                time_scale,
                num_ticks_per_picture,
            });

            decoder_model_info_present = r.read_bit()?;
            if decoder_model_info_present {
                buffer_delay_length = r.read_bits(5)? as u8 + 1;
                r.read_bits(32)?; // num_units_in_decoding_tick
                r.read_bits(5)?; // buffer_removal_time_length_minus_1
                r.read_bits(5)?; // frame_presentation_time_length_minus_1
            }
        }

        let initial_display_delay_present = r.read_bit()?;
        let operating_points_cnt = r.read_bits(5)? + 1;
        for _ in 0..operating_points_cnt {
            r.read_bits(12)?; // operating_point_idc[i]
            let seq_level_idx = r.read_bits(5)?;
            if seq_level_idx > 7 {
                r.read_bit()?; // seq_tier[i]
            }
            if decoder_model_info_present {
                let decoder_model_present_for_op = r.read_bit()?;
                if decoder_model_present_for_op {
                    r.read_bits(buffer_delay_length)?; // decoder_buffer_delay
                    r.read_bits(buffer_delay_length)?; // encoder_buffer_delay
                    r.read_bit()?; // low_delay_mode_flag
                }
            }
            if initial_display_delay_present {
                let present_for_op = r.read_bit()?;
                if present_for_op {
                    r.read_bits(4)?; // initial_display_delay_minus_1
                }
            }
        }
    }

    let frame_width_bits = r.read_bits(4)? as u8 + 1;
    let frame_height_bits = r.read_bits(4)? as u8 + 1;
    let max_frame_width = r.read_bits(frame_width_bits)? as u32 + 1;
    let max_frame_height = r.read_bits(frame_height_bits)? as u32 + 1;

    let frame_id_numbers_present = if reduced_still_picture_header {
        false
    } else {
        r.read_bit()?
    };
    if frame_id_numbers_present {
        r.read_bits(4)?; // delta_frame_id_length_minus_2
        r.read_bits(3)?; // additional_frame_id_length_minus_1
    }

    r.read_bit()?; // use_128x128_superblock
    r.read_bit()?; // enable_filter_intra
    r.read_bit()?; // enable_intra_edge_filter

    if !reduced_still_picture_header {
        r.read_bit()?; // enable_interintra_compound
        r.read_bit()?; // enable_masked_compound
        r.read_bit()?; // enable_warped_motion
        r.read_bit()?; // enable_dual_filter
        let enable_order_hint = r.read_bit()?;
        if enable_order_hint {
            r.read_bit()?; // enable_jnt_comp
            r.read_bit()?; // enable_ref_frame_mvs
        }
        let seq_force_screen_content_tools = if r.read_bit()? {
            // seq_choose_screen_content_tools
            2
        } else {
            r.read_bit()? as u8
        };
        if seq_force_screen_content_tools > 0 {
            let seq_choose_integer_mv = r.read_bit()?;
            if !seq_choose_integer_mv {
                r.read_bit()?; // seq_force_integer_mv
            }
        }
        if enable_order_hint {
            r.read_bits(3)?; // order_hint_bits_minus_1
        }
    }

    r.read_bit()?; // enable_superres
    r.read_bit()?; // enable_cdef
    r.read_bit()?; // enable_restoration

    // color_config()
    let high_bitdepth = r.read_bit()?;
    let bit_depth = if seq_profile == 2 && high_bitdepth {
        if r.read_bit()? { 12 } else { 10 } // twelve_bit
    } else if high_bitdepth {
        10
    } else {
        8
    };

    let mono_chrome = if seq_profile == 1 { false } else { r.read_bit()? };

    let color_description_present = r.read_bit()?;
    let (color_primaries, transfer_characteristics, matrix_coefficients) =
        if color_description_present {
            (
                r.read_bits(8)? as u8,
                r.read_bits(8)? as u8,
                r.read_bits(8)? as u8,
            )
        } else {
            // CP_UNSPECIFIED / TC_UNSPECIFIED / MC_UNSPECIFIED
            (2, 2, 2)
        };

    let (subsampling_x, subsampling_y);
    if mono_chrome {
        r.read_bit()?; // color_range
        subsampling_x = true;
        subsampling_y = true;
    } else if color_primaries == 1 && transfer_characteristics == 13 && matrix_coefficients == 0 {
        // BT.709 sRGB identity: forced 4:4:4 full range.
        subsampling_x = false;
        subsampling_y = false;
    } else {
        r.read_bit()?; // color_range
        match seq_profile {
            0 => {
                subsampling_x = true;
                subsampling_y = true;
            }
            1 => {
                subsampling_x = false;
                subsampling_y = false;
            }
            _ => {
                if bit_depth == 12 {
                    subsampling_x = r.read_bit()?;
                    subsampling_y = if subsampling_x { r.read_bit()? } else { false };
                } else {
                    subsampling_x = true;
                    subsampling_y = false;
                }
            }
        }
        if subsampling_x && subsampling_y {
            r.read_bits(2)?; // chroma_sample_position
        }
        r.read_bit()?; // separate_uv_delta_q
    }

    Ok(SequenceHeader {
        seq_profile,
        still_picture,
        max_frame_width,
        max_frame_height,
        bit_depth,
        mono_chrome,
        subsampling_x,
        subsampling_y,
        timing_info,
    })
}

/// Writes a variable-length unsigned integer (AV1 spec 4.10.3).
fn write_uvlc<W: io::Write>(writer: &mut BitWriter<W>, value: u64) -> io::Result<()> {
    let shifted = value + 1;
    let width = 64 - shifted.leading_zeros() as u8;
    for _ in 0..width - 1 {
        writer.write_bit(false)?;
    }
    writer.write_bit(true)?;
    writer.write_bits(shifted - (1 << (width - 1)), width - 1)?;
    Ok(())
}

#[cfg(test)]
#[cfg_attr(all(coverage_nightly, test), coverage(off))]
mod tests {
    use super::*;

    // Sequence header payload from a real 4K stream (profile 0, level 5.1,
    // 3840x2160, 8-bit 4:2:0, no timing info).
    const UHD_SEQ_PAYLOAD: &[u8] = &[
        0x00, 0x00, 0x00, 0x6a, 0xef, 0xbf, 0xe1, 0xbc, 0x02, 0x19, 0x90, 0x10, 0x10, 0x10, 0x40,
    ];

    #[test]
    fn test_parse_real_uhd_header() {
        let header = SequenceHeader::parse(UHD_SEQ_PAYLOAD).unwrap();
        assert_eq!(header.seq_profile, 0);
        assert!(!header.still_picture);
        assert_eq!(header.max_frame_width, 3840);
        assert_eq!(header.max_frame_height, 2160);
        assert_eq!(header.bit_depth, 8);
        assert!(!header.mono_chrome);
        assert_eq!(header.pixel_layout(), PixelLayout::I420);
        assert_eq!(header.timing_info, None);

        let info = header.video_info();
        assert_eq!(info.width, 3840);
        assert_eq!(info.height, 2160);
        assert!(!info.high_bit_depth);
    }

    fn header_for(width: u32, height: u32) -> SequenceHeader {
        SequenceHeader {
            seq_profile: 0,
            still_picture: false,
            max_frame_width: width,
            max_frame_height: height,
            bit_depth: 8,
            mono_chrome: false,
            subsampling_x: true,
            subsampling_y: true,
            timing_info: None,
        }
    }

    #[test]
    fn test_mux_parse_round_trip() {
        let header = header_for(64, 64);
        let mut buf = Vec::new();
        header.mux(&mut buf).unwrap();

        let parsed = SequenceHeader::parse(&buf).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_mux_parse_round_trip_with_timing_info() {
        let mut header = header_for(1920, 1080);
        header.timing_info = Some(TimingInfo {
            num_units_in_display_tick: 1,
            time_scale: 30,
            num_ticks_per_picture: Some(1),
        });

        let mut buf = Vec::new();
        header.mux(&mut buf).unwrap();

        let parsed = SequenceHeader::parse(&buf).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.timing_info.unwrap().fixed_frame_rate(), Some(30.0));
    }

    #[test]
    fn test_mux_parse_round_trip_monochrome() {
        let mut header = header_for(128, 96);
        header.mono_chrome = true;
        let mut buf = Vec::new();
        header.mux(&mut buf).unwrap();

        let parsed = SequenceHeader::parse(&buf).unwrap();
        assert!(parsed.mono_chrome);
        assert_eq!(parsed.pixel_layout(), PixelLayout::I400);
    }

    #[test]
    fn test_mux_parse_round_trip_high_bit_depth() {
        let mut header = header_for(640, 480);
        header.bit_depth = 10;
        let mut buf = Vec::new();
        header.mux(&mut buf).unwrap();

        let parsed = SequenceHeader::parse(&buf).unwrap();
        assert_eq!(parsed.bit_depth, 10);
        assert!(parsed.video_info().high_bit_depth);
    }

    #[test]
    fn test_mux_parse_round_trip_profile2_twelve_bit_422() {
        let mut header = header_for(320, 240);
        header.seq_profile = 2;
        header.bit_depth = 12;
        header.subsampling_x = true;
        header.subsampling_y = false;
        let mut buf = Vec::new();
        header.mux(&mut buf).unwrap();

        let parsed = SequenceHeader::parse(&buf).unwrap();
        assert_eq!(parsed.bit_depth, 12);
        assert_eq!(parsed.pixel_layout(), PixelLayout::I422);
    }

    #[test]
    fn test_parse_truncated_payload() {
        let err = SequenceHeader::parse(&UHD_SEQ_PAYLOAD[..4]).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidSequenceHeader(_)));
    }

    #[test]
    fn test_parse_undefined_profile() {
        // First three bits 0b011 = profile 3.
        let err = SequenceHeader::parse(&[0b0110_0000, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidSequenceHeader(_)));
    }

    #[test]
    fn test_fixed_frame_rate_variable_interval() {
        let timing = TimingInfo {
            num_units_in_display_tick: 1,
            time_scale: 90000,
            num_ticks_per_picture: None,
        };
        assert_eq!(timing.fixed_frame_rate(), None);
    }

    #[test]
    fn test_fixed_frame_rate_ntsc() {
        let timing = TimingInfo {
            num_units_in_display_tick: 1001,
            time_scale: 30000,
            num_ticks_per_picture: Some(1),
        };
        let fps = timing.fixed_frame_rate().unwrap();
        assert!((fps - 29.97).abs() < 0.01);
    }
}
