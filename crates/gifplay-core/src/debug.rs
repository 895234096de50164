use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::player::AnimatedImagePlayer;
use crate::rect::Position;

const TEXT_SCALE: f32 = 14.0;
const TEXT_COLOR: Rgba<u8> = Rgba([255, 0, 255, 255]);
const TEXT_LINE_HEIGHT: i32 = 15;
const BOUNDS_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Draws player bounds and playback state over a rendered canvas.
pub struct DebugRenderer {
    font: Option<FontVec>,
}

impl DebugRenderer {
    /// Text is only drawn when `font_path` points at a readable font.
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = font_path.and_then(Self::load_font);
        Self { font }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Outline the player's bounds at `position` and print its state beside them.
    pub fn annotate<C: Clock>(
        &self,
        canvas: &mut RgbaImage,
        player: &AnimatedImagePlayer<C>,
        position: Position,
    ) {
        let bounds = player.bounds();
        let (x, y) = bounds.offset_by(position);
        if bounds.w > 0 && bounds.h > 0 {
            let rect = Rect::at(x, y).of_size(bounds.w, bounds.h);
            draw_hollow_rect_mut(canvas, rect, BOUNDS_COLOR);
        }

        let Some(font) = &self.font else { return };
        let scale = PxScale::from(TEXT_SCALE);
        let text_x = x + bounds.w as i32 + 4;
        let mut text_y = y;

        for line in status_lines(player) {
            draw_text_mut(canvas, TEXT_COLOR, text_x, text_y, scale, font, &line);
            text_y += TEXT_LINE_HEIGHT;
        }
    }

    /// Write `canvas` to `dir` as `tick_<n>.png` and return the path.
    pub fn save_canvas(&self, canvas: &RgbaImage, dir: &Path, tick: u32) -> Result<PathBuf> {
        let path = dir.join(format!("tick_{:06}.png", tick));
        canvas
            .save(&path)
            .with_context(|| format!("failed to save canvas to {}", path.display()))?;

        debug!(?path, "saved canvas");
        Ok(path)
    }

    fn load_font(path: &Path) -> Option<FontVec> {
        let loaded = std::fs::read(path)
            .map_err(|e| format!("unreadable: {e}"))
            .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(|e| format!("not a font: {e}")));

        match loaded {
            Ok(font) => {
                info!(?path, "debug overlay font ready");
                Some(font)
            }
            Err(reason) => {
                warn!(?path, %reason, "debug overlay text disabled");
                None
            }
        }
    }
}

fn status_lines<C: Clock>(player: &AnimatedImagePlayer<C>) -> Vec<String> {
    let (start, end) = player.loop_bounds();
    vec![
        format!("F:{}/{}", player.current_index(), player.frame_count()),
        format!(
            "{} {}",
            if player.is_running() { "PLAY" } else { "PAUSE" },
            if player.is_reversed() { "REV" } else { "FWD" },
        ),
        format!("L:{}-{}", start, end),
    ]
}
