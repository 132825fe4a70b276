// Software drawing on the input view plus the conversion to the 0x00RRGGBB
// buffers minifb presents.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect as DrawRect;

use crate::label::Rect;
use crate::mask::disc_pixels;

pub const RECT_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const RECT_THICKNESS: u32 = 2;

/// Outline `rect` on `canvas`, `RECT_THICKNESS` pixels wide, growing inward.
pub fn draw_rect_outline(canvas: &mut RgbImage, rect: Rect, color: Rgb<u8>) {
    for inset in 0..RECT_THICKNESS {
        let width = rect.width.saturating_sub(2 * inset);
        let height = rect.height.saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let outline = DrawRect::at((rect.x + inset) as i32, (rect.y + inset) as i32)
            .of_size(width, height);
        draw_hollow_rect_mut(canvas, outline, color);
    }
}

/// Filled disc, identical in shape to `LabelMask::paint_disc`.
pub fn draw_disc(canvas: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    let (width, height) = canvas.dimensions();
    for (x, y) in disc_pixels(cx, cy, radius, width, height) {
        canvas.put_pixel(x, y, color);
    }
}

/// Screen buffer in the layout minifb expects.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>, // 0x00RRGGBB
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    /// Repack `image` into this buffer; reallocates when the size changed.
    pub fn copy_from(&mut self, image: &RgbImage) {
        let (width, height) = (image.width() as usize, image.height() as usize);
        if self.width != width || self.height != height {
            *self = Self::new(width, height);
        }
        for (dst, px) in self.pixels.iter_mut().zip(image.pixels()) {
            let Rgb([r, g, b]) = *px;
            *dst = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
        }
    }
}

impl From<&RgbImage> for FrameBuffer {
    fn from(image: &RgbImage) -> Self {
        let mut fb = Self::new(image.width() as usize, image.height() as usize);
        fb.copy_from(image);
        fb
    }
}
