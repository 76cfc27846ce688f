//! Smoothed preamp gain stage.

use escena_core::{AudioBuffer, AudioNode, BusLayout, MidiEvent, SmoothedParam};
use serde::{Deserialize, Serialize};

use crate::db_to_linear;

/// Smoothing time for gain changes, in milliseconds.
const GAIN_RAMP_MS: f32 = 10.0;

/// Persisted parameter state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PreampState {
    gain_db: f32,
}

/// A clean gain stage with zipper-free level changes.
///
/// # Example
///
/// ```rust
/// use escena_nodes::Preamp;
///
/// let mut preamp = Preamp::new();
/// preamp.set_gain_db(6.0);
/// ```
pub struct Preamp {
    gain_db: f32,
    gain: SmoothedParam,
}

impl Preamp {
    /// Creates a preamp at unity gain.
    pub fn new() -> Self {
        Self {
            gain_db: 0.0,
            gain: SmoothedParam::new(1.0),
        }
    }

    /// Sets the gain in dB, clamped to ±24 dB.
    pub fn set_gain_db(&mut self, db: f32) {
        self.gain_db = db.clamp(-24.0, 24.0);
        self.gain.set_target(db_to_linear(self.gain_db));
    }

    /// Current gain in dB.
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }
}

impl Default for Preamp {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for Preamp {
    fn prepare_to_play(&mut self, sample_rate: f32, _block_size: usize) {
        self.gain = SmoothedParam::with_config(
            db_to_linear(self.gain_db),
            sample_rate,
            GAIN_RAMP_MS,
        );
    }

    fn process_block(&mut self, audio: &mut AudioBuffer, _midi: &[MidiEvent]) {
        let samples = audio.num_samples();
        let channels = audio.num_channels().min(2);
        for i in 0..samples {
            let g = self.gain.advance();
            for ch in 0..channels {
                audio.channel_mut(ch)[i] *= g;
            }
        }
    }

    fn bus_layout(&self) -> BusLayout {
        BusLayout::stereo()
    }

    fn effect_type(&self) -> &'static str {
        "preamp"
    }

    fn node_category(&self) -> &'static str {
        "Utility"
    }

    fn get_state(&self, out: &mut Vec<u8>) {
        out.clear();
        if let Ok(bytes) = serde_json::to_vec(&PreampState {
            gain_db: self.gain_db,
        }) {
            out.extend_from_slice(&bytes);
        }
    }

    fn set_state(&mut self, data: &[u8]) {
        if let Ok(state) = serde_json::from_slice::<PreampState>(data) {
            self.set_gain_db(state.gain_db);
            self.gain.snap_to_target();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(value: f32, len: usize) -> AudioBuffer {
        let mut buf = AudioBuffer::new(2, len);
        buf.channel_mut(0).fill(value);
        buf.channel_mut(1).fill(value);
        buf
    }

    #[test]
    fn unity_gain_passes_audio_unchanged() {
        let mut preamp = Preamp::new();
        preamp.prepare_to_play(48_000.0, 16);

        let mut buf = block(0.5, 16);
        preamp.process_block(&mut buf, &[]);
        assert!(buf.channel(0).iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn gain_settles_at_target() {
        let mut preamp = Preamp::new();
        preamp.set_gain_db(6.0);
        preamp.prepare_to_play(48_000.0, 512);

        // prepare snaps the smoother to the configured gain.
        let mut buf = block(0.25, 512);
        preamp.process_block(&mut buf, &[]);
        let expected = 0.25 * db_to_linear(6.0);
        assert!((buf.channel(0)[511] - expected).abs() < 1e-3);
    }

    #[test]
    fn gain_is_clamped() {
        let mut preamp = Preamp::new();
        preamp.set_gain_db(99.0);
        assert_eq!(preamp.gain_db(), 24.0);
        preamp.set_gain_db(-99.0);
        assert_eq!(preamp.gain_db(), -24.0);
    }

    #[test]
    fn state_round_trips() {
        let mut preamp = Preamp::new();
        preamp.set_gain_db(-7.5);

        let mut blob = Vec::new();
        preamp.get_state(&mut blob);

        let mut restored = Preamp::new();
        restored.set_state(&blob);
        assert_eq!(restored.gain_db(), -7.5);
    }

    #[test]
    fn bad_state_blob_is_ignored() {
        let mut preamp = Preamp::new();
        preamp.set_gain_db(3.0);
        preamp.set_state(b"not json at all");
        assert_eq!(preamp.gain_db(), 3.0);
    }
}
