use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbaImage};
use tracing::{debug, error, info, warn};

use super::frame::Frame;
use crate::error::DecodeError;

/// A cursor over the frames of one animation.
pub trait FrameSource {
    /// Canvas size every frame is composited to.
    fn dimensions(&self) -> (u32, u32);

    /// The next frame, or `None` once the animation is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError>;

    /// Delay used for frames that declare none, and for synthesized frames.
    fn fallback_delay(&self) -> Duration;
}

enum Frames {
    Animated(image::Frames<'static>),
    Still(Option<RgbaImage>),
}

/// Decodes an image file frame by frame.
///
/// GIF, APNG and animated WebP yield every frame; any other format the
/// `image` crate can read yields a single frame.
pub struct FileDecoder {
    path: PathBuf,
    width: u32,
    height: u32,
    frames: Frames,
    fallback_delay: Duration,
    frame_count: usize,
}

impl FileDecoder {
    /// Open an image file for decoding.
    pub fn open(path: &Path, fallback_delay: Duration) -> Result<Self, DecodeError> {
        info!(?path, "opening image decoder");

        let open_err = |source: io::Error| {
            error!(?path, %source, "failed to open image");
            DecodeError::Open {
                path: path.to_path_buf(),
                source,
            }
        };
        let format_err = |source: image::ImageError| {
            error!(?path, %source, "unsupported or corrupt image");
            DecodeError::Format {
                path: path.to_path_buf(),
                source,
            }
        };

        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(open_err)?;
        let format = reader.format();
        debug!(?path, ?format, "guessed image format");

        let (width, height, frames) = match format {
            Some(ImageFormat::Gif) => {
                let decoder = GifDecoder::new(reader.into_inner()).map_err(format_err)?;
                let (w, h) = decoder.dimensions();
                (w, h, Frames::Animated(decoder.into_frames()))
            }
            Some(ImageFormat::Png) => {
                let decoder = PngDecoder::new(reader.into_inner()).map_err(format_err)?;
                let (w, h) = decoder.dimensions();
                if decoder.is_apng().map_err(format_err)? {
                    let apng = decoder.apng().map_err(format_err)?;
                    (w, h, Frames::Animated(apng.into_frames()))
                } else {
                    let image = DynamicImage::from_decoder(decoder).map_err(format_err)?;
                    (w, h, Frames::Still(Some(image.to_rgba8())))
                }
            }
            Some(ImageFormat::WebP) => {
                let decoder = WebPDecoder::new(reader.into_inner()).map_err(format_err)?;
                let (w, h) = decoder.dimensions();
                if decoder.has_animation() {
                    (w, h, Frames::Animated(decoder.into_frames()))
                } else {
                    let image = DynamicImage::from_decoder(decoder).map_err(format_err)?;
                    (w, h, Frames::Still(Some(image.to_rgba8())))
                }
            }
            _ => {
                let image = reader.decode().map_err(format_err)?.to_rgba8();
                (image.width(), image.height(), Frames::Still(Some(image)))
            }
        };

        info!(
            ?path,
            width,
            height,
            animated = matches!(frames, Frames::Animated(_)),
            "image decoder opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            frames,
            fallback_delay,
            frame_count: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A declared delay of zero means the source specified none.
fn resolve_delay(declared: Duration, fallback: Duration) -> Duration {
    if declared.is_zero() {
        fallback
    } else {
        declared
    }
}

impl FrameSource for FileDecoder {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        let index = self.frame_count;
        let fallback = self.fallback_delay;
        let frame = match &mut self.frames {
            Frames::Still(image) => image.take().map(|image| Frame::new(image, fallback)),
            Frames::Animated(frames) => match frames.next() {
                None => None,
                Some(Err(source)) => {
                    error!(path = ?self.path, index, %source, "failed to decode frame");
                    return Err(DecodeError::Frame {
                        path: self.path.clone(),
                        index,
                        source,
                    });
                }
                Some(Ok(frame)) => {
                    let delay = resolve_delay(Duration::from(frame.delay()), fallback);
                    Some(Frame::new(frame.into_buffer(), delay))
                }
            },
        };

        match &frame {
            Some(f) => {
                self.frame_count += 1;
                debug!(index, delay_ms = f.delay.as_millis() as u64, "decoded frame");
            }
            None => info!(path = ?self.path, total_frames = self.frame_count, "image stream ended"),
        }

        Ok(frame)
    }

    fn fallback_delay(&self) -> Duration {
        self.fallback_delay
    }
}

/// Drain `source` into a frame sequence.
///
/// The result is never empty: a source that yields nothing is replaced by a
/// single transparent frame of the source's canvas size.
pub fn decode_all(source: &mut dyn FrameSource) -> Result<Vec<Frame>, DecodeError> {
    let mut frames = Vec::new();
    while let Some(frame) = source.next_frame()? {
        frames.push(frame);
    }

    if frames.is_empty() {
        let (width, height) = source.dimensions();
        warn!(width, height, "source yielded no frames, synthesizing a blank frame");
        frames.push(Frame::new(
            RgbaImage::new(width, height),
            source.fallback_delay(),
        ));
    }

    Ok(frames)
}
