use std::time::Duration;

use image::RgbaImage;

/// Display time used when the source declares none.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// A single decoded animation frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Full-canvas RGBA pixels.
    pub image: RgbaImage,
    /// How long the frame stays on screen before the next advance.
    pub delay: Duration,
}

impl Frame {
    pub fn new(image: RgbaImage, delay: Duration) -> Self {
        Self { image, delay }
    }
}
