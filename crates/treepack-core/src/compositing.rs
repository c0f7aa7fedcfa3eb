use image::{Rgba, RgbaImage};

use crate::model::Rect;

/// Copy all of `src` into `canvas` with its top-left at (dx, dy), then
/// optionally draw a red 1px outline around the copied area for debugging.
/// Pixels that would land outside the canvas are skipped.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32, outlines: bool) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();

    for (sx, sy, px) in src.enumerate_pixels() {
        let (x, y) = (dx + sx, dy + sy);
        if x < cw && y < ch {
            canvas.put_pixel(x, y, *px);
        }
    }

    if outlines {
        outline_rgba(canvas, Rect::new(dx, dy, sw, sh), Rgba([255, 0, 0, 255]));
    }
}

/// Fill `rect` with a solid colour, clipped to the canvas.
pub fn fill_rgba(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    let x_end = (rect.x as u64 + rect.w as u64).min(cw as u64) as u32;
    let y_end = (rect.y as u64 + rect.h as u64).min(ch as u64) as u32;
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            canvas.put_pixel(x, y, color);
        }
    }
}

/// 1px border just inside `rect`.
pub fn outline_rgba(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    if rect.is_empty() {
        return;
    }
    let (cw, ch) = canvas.dimensions();
    let (right, bottom) = (rect.right(), rect.bottom());
    for x in rect.x..=right {
        for y in [rect.y, bottom] {
            if x < cw && y < ch {
                canvas.put_pixel(x, y, color);
            }
        }
    }
    for y in rect.y..=bottom {
        for x in [rect.x, right] {
            if x < cw && y < ch {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}
