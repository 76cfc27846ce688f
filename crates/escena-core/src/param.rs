//! Exponentially smoothed parameters.
//!
//! Gain changes applied as hard steps produce audible clicks. The engine uses
//! [`SmoothedParam`] for the hardware I/O bypass ramps and per-node bypass
//! crossfades: a one-pole lowpass toward the target value, advanced once per
//! sample on the audio thread.

/// A parameter value that approaches its target along a one-pole exponential.
///
/// The difference equation is `y[n] = y[n-1] + coeff * (target - y[n-1])`,
/// with `coeff = 1 - exp(-1 / (tau * sample_rate))` and
/// `tau = smoothing_time_ms / 1000`. After five time constants the value is
/// within 1% of the target, which [`is_settled`](Self::is_settled) treats as
/// arrived.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
    sample_rate: f32,
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Creates a parameter with an initial value and no smoothing configured
    /// (changes are instant until a sample rate and time are set).
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 0.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Creates a fully configured parameter.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Sets the value the parameter smooths toward.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Sets target and current value at once (no ramp).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Updates the sample rate, preserving the current ramp position.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Sets the smoothing time constant in milliseconds.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Advances one sample and returns the new smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Returns the current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Returns the target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Returns true once the ramp has effectively reached its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-4
    }

    /// Jumps straight to the target value.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples_per_tau = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - (-1.0 / samples_per_tau).exp();
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
