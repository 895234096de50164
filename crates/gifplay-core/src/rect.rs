/// A rectangle in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Offset on a target surface where a frame's top-left corner is drawn.
/// May be negative; drawing is clipped to the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl PixelRect {
    /// Rectangle anchored at (0, 0) with the given size.
    pub fn at_origin(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    /// Signed top-left corner after moving this rect by `position`.
    pub fn offset_by(self, position: Position) -> (i32, i32) {
        (self.x as i32 + position.x, self.y as i32 + position.y)
    }
}
