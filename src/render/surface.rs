use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;

use crate::foundation::error::{FlitterError, FlitterResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};
use crate::render::composite::{self, CompositeOp, PremulRgba8};

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an image surface, used by renderers to key cached resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u64);

impl ImageId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Straight-alpha RGBA8 color.
///
/// Deserializes from `"#RRGGBB"`, `"#RRGGBBAA"`, or an `[r, g, b]` / `[r, g, b, a]` byte array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Premultiplied bytes.
    pub fn to_premul(self) -> PremulRgba8 {
        let mut px = [self.r, self.g, self.b, self.a];
        premultiply_rgba8_in_place(&mut px);
        px
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    pub fn from_hex(s: &str) -> FlitterResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> FlitterResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| FlitterError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        if !s.is_ascii() {
            return Err(FlitterError::validation("hex color must be ASCII"));
        }
        match s.len() {
            6 => Ok(Self::rgb(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
            )),
            8 => Ok(Self::rgba(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
                hex_byte(&s[6..8])?,
            )),
            _ => Err(FlitterError::validation(
                "hex color must be #RRGGBB or #RRGGBBAA",
            )),
        }
    }

    /// `#RRGGBBAA` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr(Vec<u8>),
        }

        match <Repr as serde::Deserialize>::deserialize(deserializer)? {
            Repr::Hex(s) => Self::from_hex(&s).map_err(serde::de::Error::custom),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
                [r, g, b, a] => Ok(Self::rgba(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

/// Premultiplied RGBA8 pixel buffer with an identity.
///
/// Surfaces are not `Clone`: [`ImageSurface::duplicate`] makes a copy with a fresh [`ImageId`]
/// so renderer caches never confuse two buffers.
#[derive(Debug)]
pub struct ImageSurface {
    id: ImageId,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageSurface {
    /// Transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: ImageId::next(),
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Wrap premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(width: u32, height: u32, data: Vec<u8>) -> FlitterResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| FlitterError::render("image buffer size overflow"))?;
        if data.len() != expected {
            return Err(FlitterError::render(format!(
                "image byte length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            id: ImageId::next(),
            width,
            height,
            data,
        })
    }

    /// Convert a straight-alpha image.
    pub fn from_rgba_image(img: &image::RgbaImage) -> Self {
        let mut data = img.as_raw().clone();
        premultiply_rgba8_in_place(&mut data);
        Self {
            id: ImageId::next(),
            width: img.width(),
            height: img.height(),
            data,
        }
    }

    /// Decode PNG/JPEG/... bytes.
    pub fn decode(bytes: &[u8]) -> FlitterResult<Self> {
        let img = image::load_from_memory(bytes)
            .context("decode image from memory")?
            .to_rgba8();
        Ok(Self::from_rgba_image(&img))
    }

    /// Decode an image file.
    pub fn open(path: impl AsRef<Path>) -> FlitterResult<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        Self::decode(&bytes)
    }

    /// Straight-alpha copy of the pixels.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut data = self.data.clone();
        unpremultiply_rgba8_in_place(&mut data);
        image::RgbaImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Write the surface as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> FlitterResult<()> {
        let path = path.as_ref();
        self.to_rgba_image()
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable pixel access. Renderers that already cached this surface must be told via
    /// `uncache` before the new content is guaranteed to show.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: i64, y: i64) -> Option<PremulRgba8> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    /// Alpha at `(x, y)`; zero outside the surface.
    pub fn alpha_at(&self, x: i64, y: i64) -> u8 {
        self.pixel(x, y).map_or(0, |px| px[3])
    }

    /// Copy of the pixels under a new id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: ImageId::next(),
            width: self.width,
            height: self.height,
            data: self.data.clone(),
        }
    }

    /// Opaque copy carrying the straight (un-premultiplied) colors under a new id.
    ///
    /// Transparent pixels become opaque black.
    pub fn to_opaque_straight(&self) -> Self {
        let mut data = self.data.clone();
        unpremultiply_rgba8_in_place(&mut data);
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            id: ImageId::next(),
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Composite `src` (same size, aligned at the origin) onto this surface.
    pub fn composite(
        &mut self,
        src: &ImageSurface,
        op: CompositeOp,
        opacity: f32,
    ) -> FlitterResult<()> {
        if src.width != self.width || src.height != self.height {
            return Err(FlitterError::render(format!(
                "composite size mismatch: {}x{} onto {}x{}",
                src.width, src.height, self.width, self.height
            )));
        }
        composite::composite_in_place(&mut self.data, &src.data, op, opacity)
    }

    /// Composite a solid color over the whole surface.
    pub fn fill(&mut self, color: Color, op: CompositeOp, opacity: f32) {
        composite::fill_in_place(&mut self.data, color.to_premul(), op, opacity);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
