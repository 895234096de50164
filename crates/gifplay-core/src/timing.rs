//! Pure frame-timing rules used by the player on every tick.

use std::time::{Duration, Instant};

/// Whether more than `frame_duration` has passed since the last advance.
///
/// A `now` earlier than `last_advance` counts as no time elapsed.
pub fn should_advance(now: Instant, last_advance: Instant, frame_duration: Duration) -> bool {
    now.saturating_duration_since(last_advance) > frame_duration
}

/// Inclusive `[start, end]` range of frame indices that playback wraps within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopWindow {
    pub start: usize,
    pub end: usize,
}

impl LoopWindow {
    /// The window covering every frame of a `len`-frame sequence.
    pub fn full(len: usize) -> Self {
        Self {
            start: 0,
            end: len.saturating_sub(1),
        }
    }

    /// Clamp both ends into `[0, len - 1]` independently, then raise `end` to
    /// `start` if it ended up below it.
    pub fn clamped(start: i64, end: i64, len: usize) -> Self {
        let start = clamp_index(start, len);
        let end = clamp_index(end, len).max(start);
        Self { start, end }
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    /// Index following `current` in the given direction.
    ///
    /// An index outside the window keeps stepping until it crosses the
    /// wrap point, where it lands back inside.
    pub fn step(&self, current: usize, reversed: bool) -> usize {
        if reversed {
            match current.checked_sub(1) {
                Some(prev) if prev >= self.start => prev,
                _ => self.end,
            }
        } else {
            let next = current + 1;
            if next > self.end {
                self.start
            } else {
                next
            }
        }
    }
}

/// Clamp a possibly negative index into `[0, len - 1]`.
pub fn clamp_index(index: i64, len: usize) -> usize {
    let last = len.saturating_sub(1);
    if index <= 0 {
        0
    } else {
        usize::try_from(index).map_or(last, |i| i.min(last))
    }
}
