//! Media player seam.
//!
//! The playback node pulls stereo audio from an externally owned media
//! player through [`MediaSource`]. The host supplies the shared handle at
//! [`prepare`](crate::AudioGraphEngine::prepare) time; the playback node
//! holds a clone for the lifetime of the current device epoch.
//!
//! The audio thread reads through `Mutex::try_lock`: a contended period
//! plays one block of silence instead of blocking the callback.

use std::sync::{Arc, Mutex};

/// A source of stereo media audio (file player, streaming client, ...).
///
/// Implementations are driven from the audio thread; `read_block` must fill
/// both slices completely (silence-padding past end of media) and must not
/// allocate or block.
pub trait MediaSource: Send {
    /// Fills one block of stereo audio. Both slices have the same length.
    fn read_block(&mut self, left: &mut [f32], right: &mut [f32]);

    /// Whether the source is currently producing audio.
    fn is_playing(&self) -> bool {
        true
    }
}

/// Shared handle through which the playback node reaches the media player.
pub type SharedMediaSource = Arc<Mutex<dyn MediaSource>>;

/// A media source that always produces silence.
///
/// The default stand-in when no media player is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilenceSource;

impl MediaSource for SilenceSource {
    fn read_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        left.fill(0.0);
        right.fill(0.0);
    }

    fn is_playing(&self) -> bool {
        false
    }
}

/// Convenience constructor for a silent shared source.
pub fn silence() -> SharedMediaSource {
    Arc::new(Mutex::new(SilenceSource))
}
