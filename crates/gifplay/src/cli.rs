use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gifplay", about = "Animated image player")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode an animation and report its frames.
    Info {
        /// Path to the animated image (GIF, APNG, WebP, ...).
        #[arg(short, long)]
        input: PathBuf,

        /// Show every frame for this many milliseconds instead of its own delay.
        #[arg(long)]
        frame_duration_ms: Option<u64>,
    },

    /// Play an animation through a simulated render loop and save each tick as PNG.
    Render {
        /// Path to the animated image.
        #[arg(short, long)]
        input: PathBuf,

        /// Directory to write the rendered ticks to.
        #[arg(short, long)]
        output: PathBuf,

        /// Number of render-loop iterations.
        #[arg(long, default_value_t = 60)]
        ticks: u32,

        /// Render-loop rate; the clock moves 1/fps seconds per tick.
        #[arg(
            long,
            default_value_t = 30,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(crate::MAX_FPS)),
        )]
        fps: u32,

        /// Start playing backwards.
        #[arg(long)]
        reverse: bool,

        /// First frame of the loop window.
        #[arg(long)]
        loop_start: Option<i64>,

        /// Last frame of the loop window.
        #[arg(long)]
        loop_end: Option<i64>,

        /// Show every frame for this many milliseconds instead of its own delay.
        #[arg(long)]
        frame_duration_ms: Option<u64>,

        /// Also draw a reversed clone and a clone looping over the first three frames.
        #[arg(long)]
        variants: bool,

        /// Outline each player and print its playback state.
        #[arg(long)]
        debug_overlay: bool,

        /// TTF font for the debug overlay text.
        #[arg(long)]
        font: Option<PathBuf>,
    },
}
