use image::{imageops, RgbaImage};

use crate::rect::Position;

/// Something a decoded frame can be drawn onto.
pub trait Surface {
    /// Draw `image` with its top-left corner at `position`.
    fn draw(&mut self, image: &RgbaImage, position: Position);
}

/// Alpha-blends the frame over the canvas, clipping anything off-canvas.
impl Surface for RgbaImage {
    fn draw(&mut self, image: &RgbaImage, position: Position) {
        imageops::overlay(self, image, i64::from(position.x), i64::from(position.y));
    }
}
