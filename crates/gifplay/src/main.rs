mod cli;

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use image::{Rgba, RgbaImage};
use tracing::{info, warn};

use gifplay_core::debug::DebugRenderer;
use gifplay_core::{AnimatedImagePlayer, ManualClock, PlayerConfig, Position};

const MARGIN: u32 = 10;
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Room to the right of each player for debug overlay text.
const OVERLAY_TEXT_WIDTH: u32 = 90;
/// Highest render-loop rate accepted by `render`.
pub(crate) const MAX_FPS: u32 = 1000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Info {
            input,
            frame_duration_ms,
        } => info_command(&input, config_from(frame_duration_ms)),
        cli::Command::Render {
            input,
            output,
            ticks,
            fps,
            reverse,
            loop_start,
            loop_end,
            frame_duration_ms,
            variants,
            debug_overlay,
            font,
        } => {
            info!(?input, ?output, ticks, fps, variants, "starting render");

            let step = tick_step(fps)?;

            let clock = ManualClock::new();
            let mut player =
                AnimatedImagePlayer::open_with(&input, config_from(frame_duration_ms), clock.clone())
                    .with_context(|| format!("failed to load {}", input.display()))?;

            if reverse {
                player.toggle_reverse();
            }
            if loop_start.is_some() || loop_end.is_some() {
                let last = player.frame_count() as i64 - 1;
                player.set_loop_bounds(loop_start.unwrap_or(0), loop_end.unwrap_or(last));
            }

            let players = layout_players(player, variants);
            let debug_renderer = debug_overlay.then(|| DebugRenderer::new(font.as_deref()));
            if debug_overlay && font.is_none() {
                warn!("no --font given, debug overlay will only draw bounds");
            }

            let render = RenderLoop {
                clock,
                step,
                ticks,
                with_overlay: debug_overlay,
            };
            render.run(players, debug_renderer.as_ref(), &output)?;

            info!(ticks, ?output, "render complete");
            Ok(())
        }
    }
}

/// Clock step per render-loop iteration at `fps`.
fn tick_step(fps: u32) -> Result<Duration> {
    if !(1..=MAX_FPS).contains(&fps) {
        bail!("fps must be between 1 and {MAX_FPS}, got {fps}");
    }
    Ok(Duration::from_secs(1) / fps)
}

fn config_from(frame_duration_ms: Option<u64>) -> PlayerConfig {
    PlayerConfig {
        frame_duration: frame_duration_ms.map(Duration::from_millis),
        ..PlayerConfig::default()
    }
}

fn info_command(input: &Path, config: PlayerConfig) -> Result<()> {
    let player = AnimatedImagePlayer::open_with(input, config, ManualClock::new())
        .with_context(|| format!("failed to load {}", input.display()))?;

    info!(
        ?input,
        width = player.width(),
        height = player.height(),
        frame_count = player.frame_count(),
        total_ms = player.total_duration().as_millis() as u64,
        "animation summary"
    );
    for index in 0..player.frame_count() {
        if let Some(frame) = player.frame(index) {
            info!(index, delay_ms = frame.delay.as_millis() as u64, "frame");
        }
    }
    Ok(())
}

/// Stack the player (and optional variants) vertically on the canvas.
fn layout_players(
    player: AnimatedImagePlayer<ManualClock>,
    variants: bool,
) -> Vec<(AnimatedImagePlayer<ManualClock>, Position)> {
    let row_height = (player.height() + MARGIN) as i32;
    let mut rows = vec![player];

    if variants {
        let mut reversed = rows[0].clone();
        reversed.toggle_reverse();
        let mut bounded = rows[0].clone();
        bounded.set_loop_bounds(0, 2);
        rows.push(reversed);
        rows.push(bounded);
    }

    rows.into_iter()
        .enumerate()
        .map(|(i, p)| {
            let position = Position::new(MARGIN as i32, MARGIN as i32 + i as i32 * row_height);
            (p, position)
        })
        .collect()
}

/// A fixed-rate render loop driven by a manual clock.
struct RenderLoop {
    clock: ManualClock,
    step: Duration,
    ticks: u32,
    with_overlay: bool,
}

impl RenderLoop {
    fn run(
        &self,
        mut players: Vec<(AnimatedImagePlayer<ManualClock>, Position)>,
        debug_renderer: Option<&DebugRenderer>,
        output: &Path,
    ) -> Result<()> {
        let Some((first, _)) = players.first() else {
            bail!("nothing to render");
        };
        let (canvas_w, canvas_h) = self.canvas_size(first, players.len() as u32);

        std::fs::create_dir_all(output)
            .with_context(|| format!("failed to create output directory {}", output.display()))?;
        info!(?output, canvas_w, canvas_h, "output directory ready");

        let saver = DebugRenderer::new(None);
        let saver = debug_renderer.unwrap_or(&saver);

        for tick in 0..self.ticks {
            self.clock.advance(self.step);
            let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, BACKGROUND);

            for (player, position) in players.iter_mut() {
                player.render(&mut canvas, *position);
                if let Some(renderer) = debug_renderer {
                    renderer.annotate(&mut canvas, player, *position);
                }
            }

            saver
                .save_canvas(&canvas, output, tick)
                .context("failed to save rendered tick")?;
        }
        Ok(())
    }

    fn canvas_size(&self, player: &AnimatedImagePlayer<ManualClock>, rows: u32) -> (u32, u32) {
        let text = if self.with_overlay { OVERLAY_TEXT_WIDTH } else { 0 };
        let width = player.width() + 2 * MARGIN + text;
        let height = rows * (player.height() + MARGIN) + MARGIN;
        (width, height)
    }
}
