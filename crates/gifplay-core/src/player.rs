use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::decode::decoder::{decode_all, FileDecoder, FrameSource};
use crate::decode::frame::{Frame, DEFAULT_FRAME_DELAY};
use crate::error::DecodeError;
use crate::rect::{PixelRect, Position};
use crate::surface::Surface;
use crate::timing::{clamp_index, should_advance, LoopWindow};

/// Construction-time playback settings.
#[derive(Debug, Clone, Copy)]
pub struct PlayerConfig {
    /// When set, every frame is shown for this long instead of its own delay.
    pub frame_duration: Option<Duration>,
    /// Delay for frames whose source declares none.
    pub fallback_delay: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            frame_duration: None,
            fallback_delay: DEFAULT_FRAME_DELAY,
        }
    }
}

/// Plays a decoded animation inside a render loop.
///
/// Frames are decoded once and shared between clones; playback state
/// (current frame, direction, loop window, pause flag) belongs to each
/// instance. Call [`render`](Self::render) once per iteration of the host
/// loop; it advances at most one frame per call.
#[derive(Debug, Clone)]
pub struct AnimatedImagePlayer<C: Clock = SystemClock> {
    frames: Arc<[Frame]>,
    width: u32,
    height: u32,
    clock: C,
    config: PlayerConfig,
    current: usize,
    last_advance: Instant,
    running: bool,
    reversed: bool,
    window: LoopWindow,
}

impl AnimatedImagePlayer<SystemClock> {
    /// Decode `path` and play it against the system clock.
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        Self::open_with(path, PlayerConfig::default(), SystemClock)
    }
}

impl<C: Clock> AnimatedImagePlayer<C> {
    pub fn open_with(path: &Path, config: PlayerConfig, clock: C) -> Result<Self, DecodeError> {
        let mut decoder = FileDecoder::open(path, config.fallback_delay)?;
        Self::from_source(&mut decoder, config, clock)
    }

    /// Decode every frame of `source` up front. The source is not retained.
    pub fn from_source(
        source: &mut dyn FrameSource,
        config: PlayerConfig,
        clock: C,
    ) -> Result<Self, DecodeError> {
        let (width, height) = source.dimensions();
        let frames = decode_all(source)?;
        Self::from_frames((width, height), frames, config, clock)
    }

    /// Play an already decoded sequence on a `size` canvas.
    pub fn from_frames(
        size: (u32, u32),
        frames: Vec<Frame>,
        config: PlayerConfig,
        clock: C,
    ) -> Result<Self, DecodeError> {
        if frames.is_empty() {
            return Err(DecodeError::Empty);
        }

        let (width, height) = size;
        let window = LoopWindow::full(frames.len());
        info!(
            frame_count = frames.len(),
            width,
            height,
            frame_duration_ms = ?config.frame_duration.map(|d| d.as_millis()),
            "player created"
        );

        Ok(Self {
            frames: frames.into(),
            width,
            height,
            last_advance: clock.now(),
            clock,
            config,
            current: 0,
            running: true,
            reversed: false,
            window,
        })
    }

    /// Rectangle at the origin with the source canvas size.
    pub fn bounds(&self) -> PixelRect {
        PixelRect::at_origin(self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> &Frame {
        &self.frames[self.current]
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Inclusive `(start, end)` indices playback wraps within.
    pub fn loop_bounds(&self) -> (usize, usize) {
        (self.window.start, self.window.end)
    }

    pub fn explicit_duration(&self) -> Option<Duration> {
        self.config.frame_duration
    }

    /// How long the current frame stays up, honoring the explicit override.
    pub fn current_duration(&self) -> Duration {
        self.config
            .frame_duration
            .unwrap_or(self.frames[self.current].delay)
    }

    /// Length of one pass over every frame.
    pub fn total_duration(&self) -> Duration {
        match self.config.frame_duration {
            Some(d) => d * self.frames.len() as u32,
            None => self.frames.iter().map(|f| f.delay).sum(),
        }
    }

    /// Whether two players draw from the same decoded frames.
    pub fn shares_frames_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.frames, &other.frames)
    }

    /// Advance one frame if the current one has been up long enough.
    ///
    /// Returns whether the index moved. Never advances more than once per
    /// call, no matter how much time has passed.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        let now = self.clock.now();
        if !should_advance(now, self.last_advance, self.current_duration()) {
            return false;
        }

        let from = self.current;
        self.current = self.window.step(from, self.reversed);
        self.last_advance = now;
        debug!(from, to = self.current, reversed = self.reversed, "advanced frame");
        true
    }

    /// Advance if due, then draw the current frame at `position`.
    pub fn render<S: Surface + ?Sized>(&mut self, target: &mut S, position: Position) {
        self.tick();
        target.draw(&self.frames[self.current].image, position);
    }

    /// Jump to `index`, clamped into the frame range.
    pub fn seek(&mut self, index: i64) {
        self.current = clamp_index(index, self.frames.len());
    }

    /// Restrict looping to `[start, end]`, clamping both ends.
    ///
    /// The current index is left alone; if it lies outside the new window it
    /// is brought back on the next wrap.
    pub fn set_loop_bounds(&mut self, start: i64, end: i64) {
        self.window = LoopWindow::clamped(start, end, self.frames.len());
        debug!(start = self.window.start, end = self.window.end, "loop bounds set");
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn rewind(&mut self) {
        self.seek(0);
    }

    pub fn fast_forward(&mut self) {
        self.seek(self.frames.len() as i64 - 1);
    }

    pub fn toggle_reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Back to the first frame, playing forward, with a fresh timer.
    /// Pause state and loop window are kept.
    pub fn reset(&mut self) {
        self.current = 0;
        self.last_advance = self.clock.now();
        self.reversed = false;
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::clock::ManualClock;

    const FRAME: Duration = Duration::from_millis(100);
    const PAST_FRAME: Duration = Duration::from_millis(101);

    /// Frame `i` is filled with a color whose channels spell out its low bits.
    fn color(i: usize) -> Rgba<u8> {
        let bit = |b: usize| if i & b != 0 { 255 } else { 0 };
        Rgba([bit(1), bit(2), bit(4), 255])
    }

    fn frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| Frame::new(RgbaImage::from_pixel(2, 2, color(i)), FRAME))
            .collect()
    }

    fn player(n: usize) -> (AnimatedImagePlayer<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let p = AnimatedImagePlayer::from_frames(
            (2, 2),
            frames(n),
            PlayerConfig::default(),
            clock.clone(),
        )
        .unwrap();
        (p, clock)
    }

    fn render_once(p: &mut AnimatedImagePlayer<ManualClock>) {
        let mut canvas = RgbaImage::new(4, 4);
        p.render(&mut canvas, Position::default());
    }

    #[test]
    fn initial_state() {
        let (p, _) = player(10);
        assert_eq!(p.current_index(), 0);
        assert!(p.is_running());
        assert!(!p.is_reversed());
        assert_eq!(p.loop_bounds(), (0, 9));
        assert_eq!(p.bounds(), PixelRect::at_origin(2, 2));
    }

    #[test]
    fn empty_frames_rejected() {
        let err = AnimatedImagePlayer::from_frames(
            (1, 1),
            Vec::new(),
            PlayerConfig::default(),
            ManualClock::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DecodeError::Empty));
    }

    #[test]
    fn no_advance_before_duration_elapses() {
        let (mut p, clock) = player(3);
        clock.advance(FRAME);
        assert!(!p.tick());
        clock.advance(Duration::from_millis(1));
        assert!(p.tick());
        assert_eq!(p.current_index(), 1);
    }

    #[test]
    fn seek_clamps() {
        let (mut p, _) = player(10);
        p.seek(-5);
        assert_eq!(p.current_index(), 0);
        p.seek(15);
        assert_eq!(p.current_index(), 9);
        p.seek(3);
        assert_eq!(p.current_index(), 3);
    }

    #[test]
    fn seek_keeps_timer() {
        let (mut p, clock) = player(10);
        clock.advance(Duration::from_millis(60));
        p.seek(4);
        clock.advance(Duration::from_millis(60));
        assert!(p.tick());
        assert_eq!(p.current_index(), 5);
    }

    #[test]
    fn loop_bounds_end_clamped_up_to_start() {
        let (mut p, _) = player(10);
        p.set_loop_bounds(5, 2);
        assert_eq!(p.loop_bounds(), (5, 5));
        p.set_loop_bounds(-1, 40);
        assert_eq!(p.loop_bounds(), (0, 9));
    }

    #[test]
    fn forward_wraps_to_loop_start() {
        let (mut p, clock) = player(10);
        p.set_loop_bounds(2, 4);
        p.seek(4);
        clock.advance(PAST_FRAME);
        render_once(&mut p);
        assert_eq!(p.current_index(), 2);
    }

    #[test]
    fn reverse_wraps_to_loop_end() {
        let (mut p, clock) = player(10);
        p.set_loop_bounds(2, 4);
        p.seek(2);
        p.toggle_reverse();
        clock.advance(PAST_FRAME);
        render_once(&mut p);
        assert_eq!(p.current_index(), 4);
    }

    #[test]
    fn loop_bounds_do_not_move_current() {
        let (mut p, clock) = player(10);
        p.seek(8);
        p.set_loop_bounds(2, 4);
        assert_eq!(p.current_index(), 8);
        clock.advance(PAST_FRAME);
        p.tick();
        assert_eq!(p.current_index(), 2);
    }

    #[test]
    fn paused_never_advances() {
        let (mut p, clock) = player(5);
        p.seek(2);
        p.pause();
        for _ in 0..20 {
            clock.advance(Duration::from_secs(3600));
            render_once(&mut p);
        }
        assert_eq!(p.current_index(), 2);

        p.resume();
        render_once(&mut p);
        assert_eq!(p.current_index(), 3);
    }

    #[test]
    fn one_advance_per_render_without_catch_up() {
        let (mut p, clock) = player(10);
        clock.advance(FRAME * 7);
        render_once(&mut p);
        assert_eq!(p.current_index(), 1);
        // Timer restarted at the advance, so an immediate second call stays put.
        render_once(&mut p);
        assert_eq!(p.current_index(), 1);
    }

    #[test]
    fn render_draws_current_frame() {
        let (mut p, _) = player(5);
        p.seek(3);
        let mut canvas = RgbaImage::new(4, 4);
        p.render(&mut canvas, Position::new(1, 1));
        assert_eq!(*canvas.get_pixel(1, 1), color(3));
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn rewind_and_fast_forward() {
        let (mut p, _) = player(6);
        p.fast_forward();
        assert_eq!(p.current_index(), 5);
        p.rewind();
        assert_eq!(p.current_index(), 0);
    }

    #[test]
    fn reset_keeps_pause_and_window() {
        let (mut p, _) = player(10);
        p.seek(7);
        p.toggle_reverse();
        p.pause();
        p.set_loop_bounds(3, 8);

        p.reset();

        assert_eq!(p.current_index(), 0);
        assert!(!p.is_reversed());
        assert!(!p.is_running());
        assert_eq!(p.loop_bounds(), (3, 8));
    }

    #[test]
    fn clone_is_independent() {
        let (mut original, _) = player(10);
        original.seek(4);
        original.set_loop_bounds(1, 6);

        let mut copy = original.clone();
        assert_eq!(copy.current_index(), 4);
        assert_eq!(copy.loop_bounds(), (1, 6));
        assert!(copy.shares_frames_with(&original));

        copy.toggle_reverse();
        copy.seek(0);
        copy.pause();

        assert!(!original.is_reversed());
        assert_eq!(original.current_index(), 4);
        assert!(original.is_running());
    }

    #[test]
    fn explicit_duration_overrides_frame_delays() {
        let clock = ManualClock::new();
        let config = PlayerConfig {
            frame_duration: Some(Duration::from_millis(500)),
            ..PlayerConfig::default()
        };
        let mut p =
            AnimatedImagePlayer::from_frames((2, 2), frames(4), config, clock.clone()).unwrap();

        clock.advance(PAST_FRAME);
        assert!(!p.tick());
        clock.advance(Duration::from_millis(400));
        assert!(p.tick());
        assert_eq!(p.current_duration(), Duration::from_millis(500));
        assert_eq!(p.total_duration(), Duration::from_secs(2));
    }

    #[test]
    fn total_duration_sums_frame_delays() {
        let (p, _) = player(3);
        assert_eq!(p.total_duration(), Duration::from_millis(300));
    }

    #[test]
    fn index_stays_in_range_under_mixed_controls() {
        let (mut p, clock) = player(7);
        let ops: [fn(&mut AnimatedImagePlayer<ManualClock>); 8] = [
            |p| p.seek(-100),
            |p| p.seek(100),
            |p| p.set_loop_bounds(5, 1),
            |p| p.set_loop_bounds(-2, 3),
            |p| p.toggle_reverse(),
            |p| p.reset(),
            |p| p.fast_forward(),
            |p| p.rewind(),
        ];
        for round in 0..200 {
            ops[round % ops.len()](&mut p);
            clock.advance(PAST_FRAME);
            render_once(&mut p);
            assert!(p.current_index() < p.frame_count());
        }
    }

    #[test]
    fn open_propagates_mid_stream_decode_failure() {
        use image::codecs::gif::GifEncoder;
        use image::Delay;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.gif");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut encoder = GifEncoder::new(file);
            for i in 0..4u32 {
                let buffer = RgbaImage::from_fn(16, 16, |x, y| {
                    Rgba([(x * 16) as u8, (y * 16) as u8, (i * 60 + x * y) as u8, 255])
                });
                encoder
                    .encode_frame(image::Frame::from_parts(
                        buffer,
                        0,
                        0,
                        Delay::from_numer_denom_ms(40, 1),
                    ))
                    .unwrap();
            }
        }
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() * 2 / 3]).unwrap();

        let err = AnimatedImagePlayer::open(&path).err().unwrap();
        assert!(
            matches!(err, DecodeError::Frame { index, .. } if index > 0),
            "got {err:?}"
        );
    }

    #[test]
    fn opens_gif_from_disk() {
        use image::codecs::gif::GifEncoder;
        use image::Delay;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut encoder = GifEncoder::new(file);
            for _ in 0..3 {
                let buffer = RgbaImage::from_pixel(5, 3, Rgba([0, 128, 0, 255]));
                encoder
                    .encode_frame(image::Frame::from_parts(
                        buffer,
                        0,
                        0,
                        Delay::from_numer_denom_ms(80, 1),
                    ))
                    .unwrap();
            }
        }

        let p = AnimatedImagePlayer::open(&path).unwrap();
        assert_eq!(p.frame_count(), 3);
        assert_eq!(p.bounds(), PixelRect::at_origin(5, 3));
        assert_eq!(p.current_duration(), Duration::from_millis(80));
    }
}
