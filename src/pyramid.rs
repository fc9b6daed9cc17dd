//! Ping-pong buffer pair for walking a mip pyramid
//!
//! Level zero is rendered from the input image into one slot; every
//! later level is rendered from the previous level into the other slot,
//! then the roles swap. Coarser levels therefore inherit the filtering
//! already applied to finer ones instead of resampling the input from
//! scratch.

use crate::image::{EnvImage, EnvKind};

/// Two level buffers that alternate between source and destination.
pub struct LevelPair {
    slots: [EnvImage; 2],
    front: usize,
}

impl LevelPair {
    pub fn new(kind: EnvKind) -> Self {
        Self {
            slots: [EnvImage::new(kind, 1, 1), EnvImage::new(kind, 1, 1)],
            front: 0,
        }
    }

    /// The most recently finished level.
    pub fn front(&self) -> &EnvImage {
        &self.slots[self.front]
    }

    /// The buffer the next level will be rendered into.
    pub fn scratch(&self) -> &EnvImage {
        &self.slots[1 - self.front]
    }

    /// Borrow the finished level and the scratch buffer together, so a
    /// resampler can read one while writing the other.
    pub fn split(&mut self) -> (&EnvImage, &mut EnvImage) {
        let (a, b) = self.slots.split_at_mut(1);
        if self.front == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    /// Promote the scratch buffer to the finished level.
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }
}
