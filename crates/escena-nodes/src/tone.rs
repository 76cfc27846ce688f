//! One-pole low-pass tone control.

use escena_core::{AudioBuffer, AudioNode, BusLayout, MidiEvent};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Persisted parameter state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ToneState {
    cutoff_hz: f32,
}

/// Darkens a signal with a single pole per channel.
///
/// `y[n] = y[n-1] + coeff * (x[n] - y[n-1])` with
/// `coeff = 1 - exp(-2π * cutoff / sample_rate)`.
pub struct ToneFilter {
    cutoff_hz: f32,
    coeff: f32,
    sample_rate: f32,
    state: [f32; 2],
}

impl ToneFilter {
    /// Creates a filter that is effectively open (18 kHz cutoff).
    pub fn new() -> Self {
        Self {
            cutoff_hz: 18_000.0,
            coeff: 1.0,
            sample_rate: 0.0,
            state: [0.0; 2],
        }
    }

    /// Sets the cutoff frequency, clamped to 200 Hz ..= 18 kHz.
    pub fn set_cutoff_hz(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz.clamp(200.0, 18_000.0);
        self.recalculate_coeff();
    }

    /// Current cutoff frequency in Hz.
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    fn recalculate_coeff(&mut self) {
        if self.sample_rate > 0.0 {
            self.coeff = 1.0 - (-TAU * self.cutoff_hz / self.sample_rate).exp();
        }
    }
}

impl Default for ToneFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for ToneFilter {
    fn prepare_to_play(&mut self, sample_rate: f32, _block_size: usize) {
        self.sample_rate = sample_rate;
        self.state = [0.0; 2];
        self.recalculate_coeff();
    }

    fn release_resources(&mut self) {
        self.state = [0.0; 2];
    }

    fn process_block(&mut self, audio: &mut AudioBuffer, _midi: &[MidiEvent]) {
        let channels = audio.num_channels().min(2);
        for ch in 0..channels {
            let mut y = self.state[ch];
            for s in audio.channel_mut(ch) {
                y += self.coeff * (*s - y);
                *s = y;
            }
            self.state[ch] = y;
        }
    }

    fn bus_layout(&self) -> BusLayout {
        BusLayout::stereo()
    }

    fn effect_type(&self) -> &'static str {
        "tone"
    }

    fn node_category(&self) -> &'static str {
        "Filter"
    }

    fn get_state(&self, out: &mut Vec<u8>) {
        out.clear();
        if let Ok(bytes) = serde_json::to_vec(&ToneState {
            cutoff_hz: self.cutoff_hz,
        }) {
            out.extend_from_slice(&bytes);
        }
    }

    fn set_state(&mut self, data: &[u8]) {
        if let Ok(state) = serde_json::from_slice::<ToneState>(data) {
            self.set_cutoff_hz(state.cutoff_hz);
        }
    }
}
