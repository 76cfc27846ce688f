//! Envelope-follower noise gate.

use escena_core::{AudioBuffer, AudioNode, BusLayout, MidiEvent};
use serde::{Deserialize, Serialize};

use crate::db_to_linear;

/// Persisted parameter state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct GateState {
    threshold_db: f32,
    attack_ms: f32,
    release_ms: f32,
}

/// Mutes the signal while its envelope sits below a threshold.
///
/// The envelope follows the per-frame peak of both channels; the gate gain
/// opens with the attack time constant and closes with the release time
/// constant, so it never chops hard edges into the audio.
pub struct NoiseGate {
    threshold_db: f32,
    attack_ms: f32,
    release_ms: f32,
    threshold: f32,
    attack_coeff: f32,
    release_coeff: f32,
    envelope: f32,
    gain: f32,
    sample_rate: f32,
}

impl NoiseGate {
    /// Creates a gate at -50 dB with stage-friendly timings.
    pub fn new() -> Self {
        Self {
            threshold_db: -50.0,
            attack_ms: 2.0,
            release_ms: 120.0,
            threshold: db_to_linear(-50.0),
            attack_coeff: 1.0,
            release_coeff: 1.0,
            envelope: 0.0,
            gain: 0.0,
            sample_rate: 0.0,
        }
    }

    /// Sets the open threshold in dB, clamped to -80..=0.
    pub fn set_threshold_db(&mut self, db: f32) {
        self.threshold_db = db.clamp(-80.0, 0.0);
        self.threshold = db_to_linear(self.threshold_db);
    }

    /// Current threshold in dB.
    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    /// Sets the attack time in ms, clamped to 0.1..=50.
    pub fn set_attack_ms(&mut self, ms: f32) {
        self.attack_ms = ms.clamp(0.1, 50.0);
        self.recalculate_coeffs();
    }

    /// Current attack time in ms.
    pub fn attack_ms(&self) -> f32 {
        self.attack_ms
    }

    /// Sets the release time in ms, clamped to 10..=1000.
    pub fn set_release_ms(&mut self, ms: f32) {
        self.release_ms = ms.clamp(10.0, 1000.0);
        self.recalculate_coeffs();
    }

    /// Current release time in ms.
    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    fn recalculate_coeffs(&mut self) {
        if self.sample_rate > 0.0 {
            self.attack_coeff = time_coeff(self.attack_ms, self.sample_rate);
            self.release_coeff = time_coeff(self.release_ms, self.sample_rate);
        }
    }
}

/// One-pole coefficient for a time constant in milliseconds.
fn time_coeff(ms: f32, sample_rate: f32) -> f32 {
    1.0 - (-1.0 / (ms / 1000.0 * sample_rate)).exp()
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for NoiseGate {
    fn prepare_to_play(&mut self, sample_rate: f32, _block_size: usize) {
        self.sample_rate = sample_rate;
        self.envelope = 0.0;
        self.gain = 0.0;
        self.recalculate_coeffs();
    }

    fn release_resources(&mut self) {
        self.envelope = 0.0;
        self.gain = 0.0;
    }

    fn process_block(&mut self, audio: &mut AudioBuffer, _midi: &[MidiEvent]) {
        if audio.num_channels() < 2 {
            return;
        }
        let samples = audio.num_samples();
        let (left, right) = audio.channel_pair_mut(0, 1);
        for i in 0..samples {
            let peak = left[i].abs().max(right[i].abs());
            // Fast-rising, slow-falling envelope.
            let env_coeff = if peak > self.envelope {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.envelope += env_coeff * (peak - self.envelope);

            let target = if self.envelope >= self.threshold { 1.0 } else { 0.0 };
            let gain_coeff = if target > self.gain {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.gain += gain_coeff * (target - self.gain);

            left[i] *= self.gain;
            right[i] *= self.gain;
        }
    }

    fn bus_layout(&self) -> BusLayout {
        BusLayout::stereo()
    }

    fn effect_type(&self) -> &'static str {
        "gate"
    }

    fn node_category(&self) -> &'static str {
        "Dynamics"
    }

    fn get_state(&self, out: &mut Vec<u8>) {
        out.clear();
        if let Ok(bytes) = serde_json::to_vec(&GateState {
            threshold_db: self.threshold_db,
            attack_ms: self.attack_ms,
            release_ms: self.release_ms,
        }) {
            out.extend_from_slice(&bytes);
        }
    }

    fn set_state(&mut self, data: &[u8]) {
        if let Ok(state) = serde_json::from_slice::<GateState>(data) {
            self.set_threshold_db(state.threshold_db);
            self.set_attack_ms(state.attack_ms);
            self.set_release_ms(state.release_ms);
        }
    }
}
