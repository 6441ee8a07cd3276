//! Frame rate estimation.
//!
//! Elementary AV1 streams carry no authoritative frame rate, so this is a
//! best-effort guess from two sources, in order: container timestamps
//! (IVF pts deltas over a probe window) and the sequence header's timing
//! info when the stream signals a fixed picture interval.

use tracing::debug;

use crate::decode::PictureDecoder;
use crate::error::EstimationError;
use crate::session::Context;

impl<D: PictureDecoder> Context<D> {
    /// Estimates the stream's frame rate in frames per second.
    ///
    /// Probes up to
    /// [`SessionOptions::probe_window`](crate::SessionOptions::probe_window)
    /// temporal units from the start of the stream; the session's read
    /// position is saved and restored, so the estimate can be taken at
    /// any point without disturbing decode.
    ///
    /// IVF timestamps win over sequence-header timing info when both are
    /// present, since containers routinely override the coded rate.
    ///
    /// # Errors
    ///
    /// - [`EstimationError::InsufficientData`] when the container carries
    ///   timestamps but fewer than two of them.
    /// - [`EstimationError::NoTimingInfo`] when neither the container nor
    ///   the sequence header provides usable timing.
    pub fn guess_frame_rate(&mut self) -> Result<f64, EstimationError> {
        if self.reader.ivf_header().is_some() {
            let timestamps = self.probe_timestamps();
            if timestamps.len() >= 2 {
                if let Some(fps) = self.frame_rate_from_timestamps(&timestamps) {
                    debug!(fps, samples = timestamps.len(), "frame rate from pts deltas");
                    return Ok(fps);
                }
            }
            if let Some(fps) = self.fixed_frame_rate() {
                return Ok(fps);
            }
            return Err(EstimationError::InsufficientData {
                found: timestamps.len(),
                needed: 2,
            });
        }

        self.fixed_frame_rate().ok_or(EstimationError::NoTimingInfo)
    }

    /// Collects pts values from the leading temporal units without
    /// moving the session's read position.
    fn probe_timestamps(&mut self) -> Vec<u64> {
        let checkpoint = self.reader.checkpoint();
        self.reader.rewind();

        let mut timestamps = Vec::new();
        while timestamps.len() < self.options.probe_window {
            match self.reader.next_unit() {
                Ok(Some(unit)) => {
                    if let Some(pts) = unit.pts {
                        timestamps.push(pts);
                    }
                }
                // A truncated tail does not invalidate the samples
                // already taken.
                Ok(None) | Err(_) => break,
            }
        }

        self.reader.resume(checkpoint);
        timestamps
    }

    /// Median pts delta converted through the container timebase. `None`
    /// when the timestamps are flat or non-monotonic throughout.
    fn frame_rate_from_timestamps(&self, timestamps: &[u64]) -> Option<f64> {
        let header = self.reader.ivf_header()?;

        let mut deltas: Vec<u64> = timestamps
            .windows(2)
            .filter_map(|pair| pair[1].checked_sub(pair[0]))
            .filter(|delta| *delta > 0)
            .collect();
        if deltas.is_empty() {
            return None;
        }
        deltas.sort_unstable();
        let median = deltas[deltas.len() / 2];

        Some(1.0 / (median as f64 * header.timebase()))
    }

    fn fixed_frame_rate(&self) -> Option<f64> {
        self.sequence_header
            .timing_info
            .as_ref()
            .and_then(|timing| timing.fixed_frame_rate())
    }
}

#[cfg(test)]
#[cfg_attr(all(coverage_nightly, test), coverage(off))]
mod tests {
    use std::io::Write;

    use bytes::Bytes;

    use crate::bitstream::Source;
    use crate::error::EstimationError;
    use crate::obu::seq::{SequenceHeader, TimingInfo};
    use crate::obu::{ObuHeader, ObuType};
    use crate::session::Context;
    use crate::session::tests::{StubDecoder, ivf_test_stream, test_video_info};

    fn obu_bytes(obu_type: ObuType, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        ObuHeader {
            obu_type,
            size: Some(payload.len() as u64),
            extension_header: None,
        }
        .mux(&mut buf)
        .unwrap();
        buf.write_all(payload).unwrap();
        buf
    }

    /// Low-overhead stream: seq header up front, then `frames` temporal
    /// units of one frame each, no container timestamps anywhere.
    fn low_overhead_stream(timing_info: Option<TimingInfo>, frames: usize) -> Bytes {
        let mut seq_payload = Vec::new();
        SequenceHeader {
            seq_profile: 0,
            still_picture: false,
            max_frame_width: 64,
            max_frame_height: 64,
            bit_depth: 8,
            mono_chrome: false,
            subsampling_x: true,
            subsampling_y: true,
            timing_info,
        }
        .mux(&mut seq_payload)
        .unwrap();

        let mut data = obu_bytes(ObuType::TemporalDelimiter, &[]);
        data.extend(obu_bytes(ObuType::SequenceHeader, &seq_payload));
        data.extend(obu_bytes(ObuType::Frame, &[0; 16]));
        for index in 1..frames {
            data.extend(obu_bytes(ObuType::TemporalDelimiter, &[]));
            data.extend(obu_bytes(ObuType::Frame, &[index as u8; 16]));
        }
        Bytes::from(data)
    }

    #[test]
    fn test_ivf_pts_deltas() {
        // 1/30 timebase, pts incrementing by one tick.
        let info = test_video_info();
        let mut ctx = Context::open(
            Source::from_memory(ivf_test_stream(info, 4)),
            StubDecoder::new(info),
        )
        .unwrap();

        let fps = ctx.guess_frame_rate().unwrap();
        assert!((fps - 30.0).abs() < 1e-9, "fps = {fps}");
    }

    #[test]
    fn test_probe_does_not_disturb_read_position() {
        let info = test_video_info();
        let mut ctx = Context::open(
            Source::from_memory(ivf_test_stream(info, 3)),
            StubDecoder::new(info),
        )
        .unwrap();

        ctx.guess_frame_rate().unwrap();
        assert_eq!(ctx.read_pictures(3).unwrap().len(), 3);

        // Estimation still works mid-stream and after end of stream.
        let fps = ctx.guess_frame_rate().unwrap();
        assert!((fps - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_frame_ivf_is_insufficient() {
        let info = test_video_info();
        let mut ctx = Context::open(
            Source::from_memory(ivf_test_stream(info, 1)),
            StubDecoder::new(info),
        )
        .unwrap();

        let err = ctx.guess_frame_rate().unwrap_err();
        assert_eq!(
            err,
            EstimationError::InsufficientData {
                found: 1,
                needed: 2
            }
        );
    }

    #[test]
    fn test_sequence_header_timing_fallback() {
        let timing = TimingInfo {
            num_units_in_display_tick: 1,
            time_scale: 25,
            num_ticks_per_picture: Some(1),
        };
        let mut ctx = Context::open(
            Source::from_memory(low_overhead_stream(Some(timing), 3)),
            StubDecoder::new(test_video_info()),
        )
        .unwrap();

        let fps = ctx.guess_frame_rate().unwrap();
        assert!((fps - 25.0).abs() < 1e-9, "fps = {fps}");
    }

    #[test]
    fn test_no_timing_info() {
        let mut ctx = Context::open(
            Source::from_memory(low_overhead_stream(None, 3)),
            StubDecoder::new(test_video_info()),
        )
        .unwrap();

        assert_eq!(ctx.guess_frame_rate().unwrap_err(), EstimationError::NoTimingInfo);
    }
}
