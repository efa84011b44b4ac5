//! Conversion from Symphonia's planar decode buffers to interleaved f32.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Converts decoded packets into the interleaved f32 layout used by
/// [`PcmBuffer`](bridge_traits::graph::PcmBuffer).
///
/// Symphonia hands out planar buffers whose sample format depends on the
/// codec. Each packet must be converted before the next decode call because
/// the decoder reuses its output buffer.
pub struct SampleConverter;

impl SampleConverter {
    /// Append the frames of a decoded packet to `out` in interleaved order.
    pub fn append_interleaved_f32(buffer: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
        match buffer {
            AudioBufferRef::F32(buf) => Self::append(&**buf, |s: f32| s, out),
            AudioBufferRef::F64(buf) => Self::append(&**buf, |s: f64| s.into_sample(), out),
            AudioBufferRef::S32(buf) => Self::append(&**buf, |s: i32| s.into_sample(), out),
            AudioBufferRef::S24(buf) => Self::append(&**buf, |s| IntoSample::into_sample(s), out),
            AudioBufferRef::S16(buf) => Self::append(&**buf, |s: i16| s.into_sample(), out),
            AudioBufferRef::S8(buf) => Self::append(&**buf, |s: i8| s.into_sample(), out),
            AudioBufferRef::U32(buf) => Self::append(&**buf, |s: u32| s.into_sample(), out),
            AudioBufferRef::U24(buf) => Self::append(&**buf, |s| IntoSample::into_sample(s), out),
            AudioBufferRef::U16(buf) => Self::append(&**buf, |s: u16| s.into_sample(), out),
            AudioBufferRef::U8(buf) => Self::append(&**buf, |s: u8| s.into_sample(), out),
        }
    }

    fn append<S>(buf: &AudioBuffer<S>, convert: fn(S) -> f32, out: &mut Vec<f32>)
    where
        S: Sample + Copy,
    {
        let channels = buf.spec().channels.count();
        let frames = buf.frames();
        out.reserve(frames * channels);
        for frame in 0..frames {
            for channel in 0..channels {
                out.push(convert(buf.chan(channel)[frame]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::{AsAudioBufferRef, Channels, SignalSpec};

    #[test]
    fn interleaves_stereo_planes() {
        let spec = SignalSpec::new(44_100, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        let mut buf = AudioBuffer::<f32>::new(2, spec);
        buf.render_reserved(Some(2));
        buf.chan_mut(0).copy_from_slice(&[0.1, 0.2]);
        buf.chan_mut(1).copy_from_slice(&[0.3, 0.4]);

        let mut out = Vec::new();
        SampleConverter::append_interleaved_f32(&buf.as_audio_buffer_ref(), &mut out);
        assert_eq!(out, vec![0.1, 0.3, 0.2, 0.4]);
    }

    #[test]
    fn scales_integer_samples_to_unit_range() {
        let spec = SignalSpec::new(44_100, Channels::FRONT_LEFT);
        let mut buf = AudioBuffer::<i16>::new(2, spec);
        buf.render_reserved(Some(2));
        buf.chan_mut(0).copy_from_slice(&[i16::MAX, 0]);

        let mut out = Vec::new();
        SampleConverter::append_interleaved_f32(&buf.as_audio_buffer_ref(), &mut out);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 1.0).abs() < 1e-3);
        assert!(out[1].abs() < 1e-6);
    }

    #[test]
    fn appends_across_packets() {
        let spec = SignalSpec::new(44_100, Channels::FRONT_LEFT);
        let mut buf = AudioBuffer::<f32>::new(1, spec);
        buf.render_reserved(Some(1));
        buf.chan_mut(0).copy_from_slice(&[0.5]);

        let mut out = vec![0.25];
        SampleConverter::append_interleaved_f32(&buf.as_audio_buffer_ref(), &mut out);
        assert_eq!(out, vec![0.25, 0.5]);
    }
}
