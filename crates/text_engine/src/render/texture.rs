//! Texture primitives for glyph atlases
//!
//! The renderer owns real GPU textures; the text engine only needs to create
//! an atlas, write glyph bitmaps into it and copy regions when the atlas is
//! reallocated. [`CpuTexture`] keeps the pixels in memory and is what tools
//! and tests use.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Result type for texture operations
pub type TextureResult<T> = Result<T, TextureError>;

/// Errors raised by texture primitives
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// The region does not fit inside the texture
    #[error("Region {x},{y} {width}x{height} outside texture {texture_width}x{texture_height}")]
    OutOfBounds {
        /// Region left edge
        x: u32,
        /// Region top edge
        y: u32,
        /// Region width
        width: u32,
        /// Region height
        height: u32,
        /// Texture width
        texture_width: u32,
        /// Texture height
        texture_height: u32,
    },

    /// Pixel buffer length does not match the region
    #[error("Expected {expected} bytes of pixel data, got {actual}")]
    SizeMismatch {
        /// Bytes required by the region
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Source and destination formats differ
    #[error("Format mismatch: {0:?} vs {1:?}")]
    FormatMismatch(TextureFormat, TextureFormat),

    /// Texture could not be created
    #[error("Failed to create {width}x{height} texture: {reason}")]
    Creation {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Backend message
        reason: String,
    },

    /// Writing the texture to an image file failed
    #[error("Failed to export texture: {0}")]
    Export(String),
}

/// Pixel formats used by atlases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Single coverage channel
    R8,
    /// Four channels, coverage in alpha
    Rgba8,
}

impl TextureFormat {
    /// Bytes per pixel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rgba8 => 4,
        }
    }
}

/// Texture storage used as a glyph atlas
pub trait AtlasTexture {
    /// Pixel format
    fn format(&self) -> TextureFormat;

    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    /// Overwrite a region with tightly packed pixel data
    fn set_data(&mut self, x: u32, y: u32, width: u32, height: u32, bytes: &[u8]) -> TextureResult<()>;

    /// Read back a region as tightly packed pixel data
    fn read_region(&self, x: u32, y: u32, width: u32, height: u32) -> TextureResult<Vec<u8>>;

    /// Copy a region of `source` to the same location in this texture
    fn copy_region(
        &mut self,
        source: &dyn AtlasTexture,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> TextureResult<()> {
        if source.format() != self.format() {
            return Err(TextureError::FormatMismatch(source.format(), self.format()));
        }
        let pixels = source.read_region(x, y, width, height)?;
        self.set_data(x, y, width, height, &pixels)
    }
}

/// Creates atlas textures on whatever backend the engine runs
pub trait TextureFactory {
    /// Allocate a cleared texture
    fn create(&mut self, format: TextureFormat, width: u32, height: u32) -> TextureResult<Box<dyn AtlasTexture>>;
}

/// Atlas shared between a glyph source and the batch sampling it
///
/// Reallocation swaps the boxed texture in place so every holder sees the new
/// storage. Not `Send`: fonts and their atlases stay on the render thread.
pub type SharedTexture = Rc<RefCell<Box<dyn AtlasTexture>>>;

/// Wrap a texture for sharing
pub fn share_texture(texture: Box<dyn AtlasTexture>) -> SharedTexture {
    Rc::new(RefCell::new(texture))
}

/// In-memory texture
#[derive(Debug, Clone)]
pub struct CpuTexture {
    format: TextureFormat,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CpuTexture {
    /// Create a cleared texture
    pub fn new(format: TextureFormat, width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            format,
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Raw pixel data, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Value of a single pixel's first channel (alpha for RGBA)
    pub fn coverage_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let index = (y as usize * self.width as usize + x as usize) * bpp;
        self.data.get(index + bpp - 1).copied()
    }

    /// Save the texture as a PNG for inspecting atlas packing
    pub fn save_png(&self, path: impl AsRef<Path>) -> TextureResult<()> {
        let path = path.as_ref();
        let result = match self.format {
            TextureFormat::R8 => image::GrayImage::from_raw(self.width, self.height, self.data.clone())
                .map(|img| img.save(path)),
            TextureFormat::Rgba8 => image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
                .map(|img| img.save(path)),
        };

        match result {
            Some(Ok(())) => {
                log::debug!("Saved {}x{} atlas to {}", self.width, self.height, path.display());
                Ok(())
            }
            Some(Err(e)) => Err(TextureError::Export(e.to_string())),
            None => Err(TextureError::Export("pixel buffer does not match dimensions".to_string())),
        }
    }

    fn check_region(&self, x: u32, y: u32, width: u32, height: u32) -> TextureResult<()> {
        let fits_x = x.checked_add(width).is_some_and(|right| right <= self.width);
        let fits_y = y.checked_add(height).is_some_and(|bottom| bottom <= self.height);
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(TextureError::OutOfBounds {
                x,
                y,
                width,
                height,
                texture_width: self.width,
                texture_height: self.height,
            })
        }
    }
}

impl AtlasTexture for CpuTexture {
    fn format(&self) -> TextureFormat {
        self.format
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_data(&mut self, x: u32, y: u32, width: u32, height: u32, bytes: &[u8]) -> TextureResult<()> {
        self.check_region(x, y, width, height)?;
        let bpp = self.format.bytes_per_pixel();
        let row_bytes = width as usize * bpp;
        let expected = row_bytes * height as usize;
        if bytes.len() != expected {
            return Err(TextureError::SizeMismatch { expected, actual: bytes.len() });
        }

        let stride = self.width as usize * bpp;
        for (row, src) in bytes.chunks_exact(row_bytes.max(1)).enumerate().take(height as usize) {
            let start = (y as usize + row) * stride + x as usize * bpp;
            self.data[start..start + row_bytes].copy_from_slice(&src[..row_bytes]);
        }
        Ok(())
    }

    fn read_region(&self, x: u32, y: u32, width: u32, height: u32) -> TextureResult<Vec<u8>> {
        self.check_region(x, y, width, height)?;
        let bpp = self.format.bytes_per_pixel();
        let row_bytes = width as usize * bpp;
        let stride = self.width as usize * bpp;

        let mut out = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = (y as usize + row) * stride + x as usize * bpp;
            out.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Ok(out)
    }
}

/// Factory producing [`CpuTexture`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuTextureFactory;

impl TextureFactory for CpuTextureFactory {
    fn create(&mut self, format: TextureFormat, width: u32, height: u32) -> TextureResult<Box<dyn AtlasTexture>> {
        if width == 0 || height == 0 {
            return Err(TextureError::Creation {
                width,
                height,
                reason: "zero-sized texture".to_string(),
            });
        }
        Ok(Box::new(CpuTexture::new(format, width, height)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read_region() {
        let mut texture = CpuTexture::new(TextureFormat::R8, 4, 4);
        texture.set_data(1, 1, 2, 2, &[1, 2, 3, 4]).unwrap();

        assert_eq!(texture.read_region(1, 1, 2, 2).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(texture.coverage_at(2, 2), Some(4));
        assert_eq!(texture.coverage_at(0, 0), Some(0));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut texture = CpuTexture::new(TextureFormat::R8, 4, 4);
        assert!(matches!(
            texture.set_data(3, 3, 2, 2, &[0; 4]),
            Err(TextureError::OutOfBounds { .. })
        ));
        assert!(matches!(
            texture.set_data(0, 0, 2, 2, &[0; 3]),
            Err(TextureError::SizeMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_copy_region_into_taller_texture() {
        let mut small = CpuTexture::new(TextureFormat::Rgba8, 2, 1);
        small.set_data(0, 0, 2, 1, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        let mut factory = CpuTextureFactory;
        let mut tall = factory.create(TextureFormat::Rgba8, 2, 2).unwrap();
        tall.copy_region(&small, 0, 0, 2, 1).unwrap();

        assert_eq!(tall.height(), 2);
        assert_eq!(tall.read_region(0, 0, 2, 1).unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(tall.read_region(0, 1, 2, 1).unwrap(), vec![0; 8]);
    }

    #[test]
    fn test_save_png_round_trip() {
        let mut texture = CpuTexture::new(TextureFormat::R8, 3, 2);
        texture.set_data(0, 0, 3, 1, &[0, 128, 255]).unwrap();

        let path = std::env::temp_dir().join("text_engine_atlas_export.png");
        texture.save_png(&path).unwrap();
        let saved = image::open(&path).unwrap().into_luma8();
        let _ = std::fs::remove_file(&path);

        assert_eq!(saved.dimensions(), (3, 2));
        assert_eq!(saved.get_pixel(1, 0).0, [128]);
    }
}
