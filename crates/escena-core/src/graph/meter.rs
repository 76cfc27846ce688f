//! Lock-free per-channel peak metering.
//!
//! The audio thread publishes one peak value per hardware channel per block;
//! UI code reads them from any thread without locking. Values are f32 peaks
//! bit-cast into relaxed atomics.

use std::array;
use std::sync::atomic::{AtomicU32, Ordering};

/// Number of hardware channels the meter tracks per direction.
pub const MAX_METER_CHANNELS: usize = 32;

/// Shared input/output peak levels, one slot per hardware channel.
///
/// Obtain a handle via [`AudioGraphEngine::meter`](super::AudioGraphEngine::meter)
/// and read it from the UI thread while the audio thread keeps writing.
pub struct PeakMeter {
    input: [AtomicU32; MAX_METER_CHANNELS],
    output: [AtomicU32; MAX_METER_CHANNELS],
}

impl PeakMeter {
    pub(crate) fn new() -> Self {
        Self {
            input: array::from_fn(|_| AtomicU32::new(0)),
            output: array::from_fn(|_| AtomicU32::new(0)),
        }
    }

    /// The most recent input peak for a hardware channel (0.0 out of range).
    pub fn input_peak(&self, channel: usize) -> f32 {
        self.input
            .get(channel)
            .map_or(0.0, |slot| f32::from_bits(slot.load(Ordering::Relaxed)))
    }

    /// The most recent output peak for a hardware channel (0.0 out of range).
    pub fn output_peak(&self, channel: usize) -> f32 {
        self.output
            .get(channel)
            .map_or(0.0, |slot| f32::from_bits(slot.load(Ordering::Relaxed)))
    }

    pub(crate) fn store_input(&self, channel: usize, peak: f32) {
        if let Some(slot) = self.input.get(channel) {
            slot.store(peak.to_bits(), Ordering::Relaxed);
        }
    }

    pub(crate) fn store_output(&self, channel: usize, peak: f32) {
        if let Some(slot) = self.output.get(channel) {
            slot.store(peak.to_bits(), Ordering::Relaxed);
        }
    }

    /// Zeroes every meter slot.
    pub fn reset(&self) {
        for slot in self.input.iter().chain(self.output.iter()) {
            slot.store(0.0f32.to_bits(), Ordering::Relaxed);
        }
    }
}

impl Default for PeakMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_read() {
        let meter = PeakMeter::new();
        meter.store_input(0, 0.5);
        meter.store_output(1, 0.25);
        assert_eq!(meter.input_peak(0), 0.5);
        assert_eq!(meter.output_peak(1), 0.25);
        assert_eq!(meter.input_peak(1), 0.0);
    }

    #[test]
    fn out_of_range_channels_read_zero() {
        let meter = PeakMeter::new();
        meter.store_input(MAX_METER_CHANNELS + 1, 0.9);
        assert_eq!(meter.input_peak(MAX_METER_CHANNELS + 1), 0.0);
    }

    #[test]
    fn reset_clears_everything() {
        let meter = PeakMeter::new();
        meter.store_input(0, 0.5);
        meter.reset();
        assert_eq!(meter.input_peak(0), 0.0);
    }
}
