pub mod clock;
pub mod debug;
pub mod decode;
pub mod error;
pub mod player;
pub mod rect;
pub mod surface;
pub mod timing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decode::frame::{Frame, DEFAULT_FRAME_DELAY};
pub use error::DecodeError;
pub use player::{AnimatedImagePlayer, PlayerConfig};
pub use rect::{PixelRect, Position};
pub use surface::Surface;
