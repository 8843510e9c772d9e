//! Decoded RGBA images and sprite-sheet slicing.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::types::Color;

static NEXT_BITMAP_ID: AtomicU64 = AtomicU64::new(1);

/// A decoded image held in memory as RGBA8 pixels, row-major.
///
/// Every bitmap gets a process-unique `id` so backends can cache their own
/// uploaded copy (e.g. an offscreen canvas) without hashing pixel data.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    id: u64,
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Bitmap {
    /// Wrap raw pixels. `pixels.len()` must equal `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            id: NEXT_BITMAP_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            pixels,
        }
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self::new(width, height, vec![color; width as usize * height as usize])
    }

    /// Decode an encoded image (PNG).
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = img.dimensions();
        let pixels = bytemuck::cast_slice::<u8, Color>(img.as_raw()).to_vec();
        Ok(Self::new(width, height, pixels))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Pixel data as tightly packed RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Copy out a sub-rectangle. Extents are clamped to the image edge;
    /// `None` when nothing of the rectangle lies inside the image.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Option<Bitmap> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let w = width.min(self.width - x);
        let h = height.min(self.height - y);
        if w == 0 || h == 0 {
            return None;
        }

        let mut pixels = Vec::with_capacity(w as usize * h as usize);
        for row in y..y + h {
            let start = (row * self.width + x) as usize;
            pixels.extend_from_slice(&self.pixels[start..start + w as usize]);
        }
        Some(Bitmap::new(w, h, pixels))
    }

    /// Cut the image into `frame_width x frame_height` cells, row-major,
    /// dropping any partial row or column at the right/bottom edge.
    pub fn slice_grid(&self, frame_width: u32, frame_height: u32) -> Vec<Bitmap> {
        if frame_width == 0 || frame_height == 0 {
            return Vec::new();
        }
        let cols = self.width / frame_width;
        let rows = self.height / frame_height;

        let mut frames = Vec::with_capacity((cols * rows) as usize);
        for row in 0..rows {
            for col in 0..cols {
                if let Some(frame) =
                    self.crop(col * frame_width, row * frame_height, frame_width, frame_height)
                {
                    frames.push(frame);
                }
            }
        }
        frames
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// A sheet whose every cell is filled with a color encoding its index:
    /// red channel = column, green channel = row.
    pub(crate) fn grid_sheet(width: u32, height: u32, cell: u32) -> Bitmap {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(Color::rgb((x / cell) as u8, (y / cell) as u8, 0));
            }
        }
        Bitmap::new(width, height, pixels)
    }

    pub(crate) fn encode_png(bitmap: &Bitmap) -> Vec<u8> {
        let img = image::RgbaImage::from_raw(bitmap.width(), bitmap.height(), bitmap.as_bytes().to_vec())
            .expect("pixel buffer matches dimensions");
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).expect("png encode");
        out.into_inner()
    }

    #[test]
    fn ids_are_unique() {
        let a = Bitmap::filled(1, 1, Color::WHITE);
        let b = Bitmap::filled(1, 1, Color::WHITE);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn decode_png() {
        let src = grid_sheet(8, 4, 4);
        let decoded = Bitmap::decode(&encode_png(&src)).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 4);
        assert_eq!(decoded.pixels(), src.pixels());
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(Bitmap::decode(b"definitely not an image").is_err());
    }

    #[test]
    fn crop_clamps_to_edges() {
        let src = grid_sheet(10, 10, 5);
        let c = src.crop(8, 6, 100, 100).unwrap();
        assert_eq!((c.width(), c.height()), (2, 4));
        assert_eq!(c.pixel(0, 0), Some(Color::rgb(1, 1, 0)));
        assert!(src.crop(10, 0, 1, 1).is_none());
        assert!(src.crop(0, 0, 0, 5).is_none());
    }

    #[test]
    fn slice_64x32_into_16x16_gives_8_row_major_frames() {
        let sheet = grid_sheet(64, 32, 16);
        let frames = sheet.slice_grid(16, 16);
        assert_eq!(frames.len(), 8);
        // frame 4 is the first cell of the second row
        assert_eq!(frames[4].pixel(0, 0), Some(Color::rgb(0, 1, 0)));
        assert_eq!(frames[3].pixel(15, 15), Some(Color::rgb(3, 0, 0)));
        assert_eq!(frames[7].pixel(0, 0), Some(Color::rgb(3, 1, 0)));
    }

    #[test]
    fn slice_drops_partial_cells() {
        let sheet = grid_sheet(50, 35, 16);
        let frames = sheet.slice_grid(16, 16);
        assert_eq!(frames.len(), 3 * 2);
        assert!(frames.iter().all(|f| f.width() == 16 && f.height() == 16));
    }

    #[test]
    fn slice_with_oversized_frame_is_empty() {
        let sheet = grid_sheet(8, 8, 8);
        assert!(sheet.slice_grid(16, 16).is_empty());
        assert!(sheet.slice_grid(0, 4).is_empty());
    }
}
