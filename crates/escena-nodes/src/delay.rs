//! Feedback delay.

use escena_core::{AudioBuffer, AudioNode, BusLayout, MidiEvent, SmoothedParam};
use serde::{Deserialize, Serialize};

/// Longest supported delay time.
const MAX_DELAY_MS: f32 = 2000.0;

/// Persisted parameter state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct DelayState {
    time_ms: f32,
    feedback: f32,
    mix: f32,
}

/// One channel's ring buffer.
#[derive(Debug, Default)]
struct DelayLine {
    samples: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    fn resize(&mut self, len: usize) {
        self.samples = vec![0.0; len.max(1)];
        self.write_pos = 0;
    }

    /// Reads the sample `delay` frames behind the write head.
    fn read(&self, delay: usize) -> f32 {
        let len = self.samples.len();
        self.samples[(self.write_pos + len - delay.min(len - 1)) % len]
    }

    /// Writes one sample and advances the write head.
    fn write(&mut self, input: f32) {
        self.samples[self.write_pos] = input;
        self.write_pos = (self.write_pos + 1) % self.samples.len();
    }

    fn clear(&mut self) {
        self.samples.fill(0.0);
        self.write_pos = 0;
    }
}

/// Stereo feedback delay.
///
/// Uninterpolated taps - time changes land on whole samples, which is all a
/// live vocal slap or doubling effect needs.
///
/// # Example
///
/// ```rust
/// use escena_nodes::StereoDelay;
///
/// let mut delay = StereoDelay::new();
/// delay.set_time_ms(250.0);
/// delay.set_feedback(0.4);
/// delay.set_mix(0.3);
/// ```
pub struct StereoDelay {
    time_ms: f32,
    feedback: f32,
    mix: SmoothedParam,
    mix_target: f32,
    sample_rate: f32,
    delay_samples: usize,
    left: DelayLine,
    right: DelayLine,
}

impl StereoDelay {
    /// Creates a delay with a 300 ms slap default.
    pub fn new() -> Self {
        Self {
            time_ms: 300.0,
            feedback: 0.35,
            mix: SmoothedParam::new(0.5),
            mix_target: 0.5,
            sample_rate: 0.0,
            delay_samples: 1,
            left: DelayLine::default(),
            right: DelayLine::default(),
        }
    }

    /// Sets the delay time in milliseconds, clamped to 1..=2000.
    pub fn set_time_ms(&mut self, time_ms: f32) {
        self.time_ms = time_ms.clamp(1.0, MAX_DELAY_MS);
        self.recalculate_taps();
    }

    /// Current delay time in milliseconds.
    pub fn time_ms(&self) -> f32 {
        self.time_ms
    }

    /// Sets the feedback amount, clamped to 0..=0.95.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    /// Current feedback amount.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Sets the wet/dry mix (0 = dry, 1 = wet).
    pub fn set_mix(&mut self, mix: f32) {
        self.mix_target = mix.clamp(0.0, 1.0);
        self.mix.set_target(self.mix_target);
    }

    /// Current wet/dry mix.
    pub fn mix(&self) -> f32 {
        self.mix_target
    }

    fn recalculate_taps(&mut self) {
        if self.sample_rate > 0.0 {
            self.delay_samples =
                ((self.time_ms / 1000.0 * self.sample_rate) as usize).max(1);
        }
    }
}

impl Default for StereoDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioNode for StereoDelay {
    fn prepare_to_play(&mut self, sample_rate: f32, _block_size: usize) {
        self.sample_rate = sample_rate;
        let capacity = (MAX_DELAY_MS / 1000.0 * sample_rate) as usize + 1;
        self.left.resize(capacity);
        self.right.resize(capacity);
        self.recalculate_taps();
        self.mix = SmoothedParam::with_config(self.mix_target, sample_rate, 10.0);
    }

    fn release_resources(&mut self) {
        self.left.clear();
        self.right.clear();
    }

    fn process_block(&mut self, audio: &mut AudioBuffer, _midi: &[MidiEvent]) {
        if audio.num_channels() < 2 || self.left.samples.is_empty() {
            return;
        }
        let samples = audio.num_samples();
        let delay = self.delay_samples;
        let feedback = self.feedback;
        let (left, right) = audio.channel_pair_mut(0, 1);
        for i in 0..samples {
            let mix = self.mix.advance();
            let (dry_l, dry_r) = (left[i], right[i]);
            let wet_l = self.left.read(delay);
            let wet_r = self.right.read(delay);
            self.left.write(dry_l + wet_l * feedback);
            self.right.write(dry_r + wet_r * feedback);
            left[i] = dry_l + (wet_l - dry_l) * mix;
            right[i] = dry_r + (wet_r - dry_r) * mix;
        }
    }

    fn bus_layout(&self) -> BusLayout {
        BusLayout::stereo()
    }

    fn effect_type(&self) -> &'static str {
        "delay"
    }

    fn node_category(&self) -> &'static str {
        "Time-Based"
    }

    fn get_state(&self, out: &mut Vec<u8>) {
        out.clear();
        if let Ok(bytes) = serde_json::to_vec(&DelayState {
            time_ms: self.time_ms,
            feedback: self.feedback,
            mix: self.mix_target,
        }) {
            out.extend_from_slice(&bytes);
        }
    }

    fn set_state(&mut self, data: &[u8]) {
        if let Ok(state) = serde_json::from_slice::<DelayState>(data) {
            self.set_time_ms(state.time_ms);
            self.set_feedback(state.feedback);
            self.set_mix(state.mix);
            self.mix.snap_to_target();
        }
    }
}
