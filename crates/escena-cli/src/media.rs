//! A WAV-backed media source for the playback node.

use escena_core::MediaSource;

/// Plays a preloaded stereo buffer once, then silence.
pub struct WavMediaSource {
    left: Vec<f32>,
    right: Vec<f32>,
    position: usize,
}

impl WavMediaSource {
    /// Creates a source over preloaded stereo samples.
    pub fn new(left: Vec<f32>, right: Vec<f32>) -> Self {
        Self {
            left,
            right,
            position: 0,
        }
    }
}

impl MediaSource for WavMediaSource {
    fn read_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        let remaining = self.left.len().saturating_sub(self.position);
        let n = remaining.min(left.len());
        left[..n].copy_from_slice(&self.left[self.position..self.position + n]);
        right[..n].copy_from_slice(&self.right[self.position..self.position + n]);
        left[n..].fill(0.0);
        right[n..].fill(0.0);
        self.position += n;
    }

    fn is_playing(&self) -> bool {
        self.position < self.left.len()
    }
}
