//! Escena Nodes - built-in effect units.
//!
//! Every unit here implements the
//! [`AudioNode`](escena_core::AudioNode) contract as a stereo
//! (2-in/2-out) processor with typed setters and an opaque JSON state blob.
//! The processing is intentionally simple; what matters to the host is the
//! contract: prepare/process/release, a stable type tag, and state that
//! round-trips byte-for-byte through snapshots and presets.
//!
//! - [`Preamp`] - smoothed dB gain stage
//! - [`StereoDelay`] - feedback delay
//! - [`ToneFilter`] - one-pole low-pass tone control
//! - [`NoiseGate`] - envelope-follower gate

pub mod delay;
pub mod gate;
pub mod preamp;
pub mod tone;

pub use delay::StereoDelay;
pub use gate::NoiseGate;
pub use preamp::Preamp;
pub use tone::ToneFilter;

/// Converts decibels to linear amplitude.
pub(crate) fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_conversion_reference_points() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(20.0) - 10.0).abs() < 1e-4);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
    }
}
