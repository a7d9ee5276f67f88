// Format conversion for CPAL output streams
//
// Clicks are mixed in f32; the device may want f32, i16 or u16.
// Conversion goes through cpal's `FromSample`, allocation-free.

use cpal::{FromSample, Sample};

/// Write one mono sample to every channel of an interleaved frame
/// (e.g. [L, R] for stereo)
#[inline]
pub fn write_mono_to_interleaved_frame<T>(sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    let converted: T = Sample::from_sample::<f32>(sample);
    output_frame.fill(converted);
}
