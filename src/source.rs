// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

//! Visual sources that can be uploaded into a [`Texture`](crate::Texture).
//!
//! A source is anything that can report whether it currently holds a complete
//! frame, how large that frame is, and hand out its pixels as tightly packed
//! RGBA8 rows (top row first).

use std::borrow::Cow;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::error::{CompositorError, Result};

pub trait Source {
    /// `false` while the source has no complete frame to upload.
    fn is_ready(&self) -> bool;

    /// Pixel dimensions of the current frame.
    fn dimensions(&self) -> Result<(u32, u32)>;

    /// RGBA8 pixels of the current frame, `width * height * 4` bytes.
    fn pixels(&self) -> Result<Cow<'_, [u8]>>;
}

/// A decoded still image.
#[derive(Debug, Clone)]
pub struct ImageSource {
    image: DynamicImage,
}

impl ImageSource {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Decode an image file with the `image` crate.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)?;
        log::debug!("Decoded image source {:?} ({:?})", path, image.dimensions());
        Ok(Self::new(image))
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

impl Source for ImageSource {
    fn is_ready(&self) -> bool {
        true
    }

    fn dimensions(&self) -> Result<(u32, u32)> {
        Ok(self.image.dimensions())
    }

    fn pixels(&self) -> Result<Cow<'_, [u8]>> {
        match &self.image {
            DynamicImage::ImageRgba8(buffer) => Ok(Cow::Borrowed(buffer.as_raw())),
            other => Ok(Cow::Owned(other.to_rgba8().into_raw())),
        }
    }
}

impl Source for RgbaImage {
    fn is_ready(&self) -> bool {
        true
    }

    fn dimensions(&self) -> Result<(u32, u32)> {
        Ok(RgbaImage::dimensions(self))
    }

    fn pixels(&self) -> Result<Cow<'_, [u8]>> {
        Ok(Cow::Borrowed(self.as_raw()))
    }
}

/// Layout of the bytes pushed into a [`FrameSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    Bgra8,
    /// Anything else, identified by its FourCC code.
    Other(u32),
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::R8 => Some(1),
            PixelFormat::Rg8 => Some(2),
            PixelFormat::Rgb8 => Some(3),
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => Some(4),
            PixelFormat::Other(_) => None,
        }
    }

    fn to_rgba(self, data: &[u8]) -> Result<Cow<'_, [u8]>> {
        let rgba = match self {
            PixelFormat::R8 => data.iter().flat_map(|r| [*r, *r, *r, 255]).collect(),
            PixelFormat::Rg8 => data
                .chunks_exact(2)
                .flat_map(|rg| [rg[0], rg[1], 0, 255])
                .collect(),
            PixelFormat::Rgb8 => data
                .chunks_exact(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
                .collect(),
            PixelFormat::Bgra8 => data
                .chunks_exact(4)
                .flat_map(|bgra| [bgra[2], bgra[1], bgra[0], bgra[3]])
                .collect(),
            PixelFormat::Rgba8 => return Ok(Cow::Borrowed(data)),
            PixelFormat::Other(fourcc) => return Err(unsupported(fourcc)),
        };
        Ok(Cow::Owned(rgba))
    }
}

fn unsupported(fourcc: u32) -> CompositorError {
    CompositorError::UnsupportedSourceType(format!("pixel format {:#010x}", fourcc))
}

/// A raw frame buffer, e.g. a decoded video frame or an off-screen canvas readback.
///
/// The source is not ready until a frame of the right size has been pushed.
#[derive(Debug, Clone)]
pub struct FrameSource {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Option<Vec<u8>>,
}

impl FrameSource {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: None,
        }
    }

    pub fn with_frame(mut self, data: Vec<u8>) -> Self {
        self.push_frame(data);
        self
    }

    /// Replace the current frame. Used to advance video playback.
    pub fn push_frame(&mut self, data: Vec<u8>) {
        self.data = Some(data);
    }

    /// Drop the current frame; the source is not ready until the next push.
    pub fn clear(&mut self) {
        self.data = None;
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    fn expected_len(&self) -> Option<usize> {
        self.format
            .bytes_per_pixel()
            .map(|bpp| self.width as usize * self.height as usize * bpp)
    }
}

impl Source for FrameSource {
    fn is_ready(&self) -> bool {
        match (&self.data, self.expected_len()) {
            (Some(data), Some(len)) => data.len() == len,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn dimensions(&self) -> Result<(u32, u32)> {
        match self.format {
            PixelFormat::Other(fourcc) => Err(unsupported(fourcc)),
            _ => Ok((self.width, self.height)),
        }
    }

    fn pixels(&self) -> Result<Cow<'_, [u8]>> {
        let data = self.data.as_deref().ok_or(CompositorError::SourceNotReady)?;
        self.format.to_rgba(data)
    }
}

/// Shared sources let a caller keep pushing frames into a source a texture holds.
impl<S: Source> Source for Rc<RefCell<S>> {
    fn is_ready(&self) -> bool {
        self.borrow().is_ready()
    }

    fn dimensions(&self) -> Result<(u32, u32)> {
        self.borrow().dimensions()
    }

    fn pixels(&self) -> Result<Cow<'_, [u8]>> {
        Ok(Cow::Owned(self.borrow().pixels()?.into_owned()))
    }
}

/// Unpack conventions applied to pixels before they reach the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelStore {
    pub flip_y: bool,
    pub premultiply_alpha: bool,
}

impl PixelStore {
    /// Convention every texture upload uses: bottom-up rows, straight alpha.
    pub const UPLOAD: PixelStore = PixelStore {
        flip_y: true,
        premultiply_alpha: false,
    };

    /// Checks that `pixels` holds exactly `width * height` RGBA8 texels.
    pub fn apply<'a>(
        &self,
        pixels: Cow<'a, [u8]>,
        width: u32,
        height: u32,
    ) -> Result<Cow<'a, [u8]>> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(CompositorError::PixelSize {
                expected,
                actual: pixels.len(),
            });
        }
        if !self.flip_y && !self.premultiply_alpha {
            return Ok(pixels);
        }

        let mut out = if self.flip_y {
            flip_rows(&pixels, width)
        } else {
            pixels.into_owned()
        };

        if self.premultiply_alpha {
            premultiply(&mut out);
        }
        Ok(Cow::Owned(out))
    }
}

impl Default for PixelStore {
    fn default() -> Self {
        Self::UPLOAD
    }
}

fn flip_rows(pixels: &[u8], width: u32) -> Vec<u8> {
    let row = width as usize * 4;
    if row == 0 {
        return pixels.to_vec();
    }
    let mut out = Vec::with_capacity(pixels.len());
    for line in pixels.chunks_exact(row).rev() {
        out.extend_from_slice(line);
    }
    out
}

fn premultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
}
