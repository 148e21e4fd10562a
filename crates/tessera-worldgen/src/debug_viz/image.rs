//! A 2D debug image represented as a flat array of RGBA pixels.

use hashbrown::HashSet;

use crate::tile::{Raster, Rgba};

/// A 2D debug image for tile inspection, stored as row-major RGBA pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct DebugImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel data in row-major RGBA format. Length = `width * height * 4`.
    pub pixels: Vec<u8>,
}

impl DebugImage {
    /// Create a new black (all-zero) image with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Paint every cell of `raster` with `color`.
    pub fn from_raster<T: Copy>(raster: &Raster<T>, mut color: impl FnMut(T) -> Rgba) -> Self {
        let mut image = Self::new(raster.width() as u32, raster.height() as u32);
        for (x, y, &cell) in raster.iter_cells() {
            image.set_pixel(x as u32, y as u32, color(cell));
        }
        image
    }

    /// Set a single pixel.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        let idx = self.index(x, y);
        self.pixels[idx..idx + 4].copy_from_slice(bytemuck::bytes_of(&color));
    }

    /// Get a pixel.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba {
        let idx = self.index(x, y);
        *bytemuck::from_bytes(&self.pixels[idx..idx + 4])
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the number of pixels in the image.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Count the number of unique colors (ignoring alpha) in the image.
    pub fn unique_color_count(&self) -> usize {
        let colors: HashSet<(u8, u8, u8)> = self
            .pixels
            .chunks_exact(4)
            .map(|c| (c[0], c[1], c[2]))
            .collect();
        colors.len()
    }
}
