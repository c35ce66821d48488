//! Viewport renderer: copies the scrolled-into-view slice of a surface
//! onto the on-screen bitmap.

use crate::surface::{RasterSurface, Rgba};
use kurbo::Rect;

/// Outline color of the select-gesture rubber band.
pub const SELECTION_STROKE: Rgba = Rgba::new(0, 123, 255, 255);
/// Translucent fill of the select-gesture rubber band.
pub const SELECTION_FILL: Rgba = Rgba::new(0, 123, 255, 26);
const SELECTION_STROKE_WIDTH: u32 = 2;
const SELECTION_DASH: u32 = 5;

/// The on-screen RGBA8 bitmap the user actually sees.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ScreenBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let i = ((y * self.width + x) * 4) as usize;
        Rgba::new(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3])
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.data[i] = color.r;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.b;
        self.data[i + 3] = color.a;
    }

    /// Source-over blend of `color` onto the existing pixel.
    fn blend_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let dst = self.pixel(x, y);
        let alpha = color.a as f64 / 255.0;
        let mix = |s: u8, d: u8| (s as f64 * alpha + d as f64 * (1.0 - alpha)).round() as u8;
        let out = Rgba::new(
            mix(color.r, dst.r),
            mix(color.g, dst.g),
            mix(color.b, dst.b),
            (color.a as f64 + dst.a as f64 * (1.0 - alpha)).round().min(255.0) as u8,
        );
        self.put_pixel(x, y, out);
    }
}

/// Copy the visible slice of `surface` into `screen`.
///
/// The source window starts at `clamp(scroll_y, 0, H - h)` so the view
/// never reads past the surface's vertical extent; the destination is
/// cleared first. Pure function of `(surface, scroll_y, screen size)`.
pub fn render_visible(surface: &RasterSurface, scroll_y: f64, screen: &mut ScreenBuffer) {
    screen.clear();

    let max_scroll = surface.height().saturating_sub(screen.height());
    let source_y = (scroll_y.max(0.0) as u32).min(max_scroll);
    let source_height = screen.height().min(surface.height() - source_y);
    let copy_width = screen.width().min(surface.width());

    for row in 0..source_height {
        let src = (((source_y + row) * surface.width()) * 4) as usize;
        let dst = ((row * screen.width()) * 4) as usize;
        let len = (copy_width * 4) as usize;
        screen.data[dst..dst + len].copy_from_slice(&surface.data()[src..src + len]);
    }
}

/// Repaint the saved pre-gesture snapshot and draw the rubber-band
/// rectangle on top: dashed outline plus translucent fill. Visual
/// feedback only; the raster surface is never touched here.
///
/// `rect` is in screen space (virtual coordinates minus scroll).
pub fn render_selection_overlay(screen: &mut ScreenBuffer, saved: &ScreenBuffer, rect: Rect) {
    if saved.width == screen.width && saved.height == screen.height {
        screen.data.copy_from_slice(&saved.data);
    }

    let x0 = rect.x0.max(0.0).round() as u32;
    let y0 = rect.y0.max(0.0).round() as u32;
    let x1 = (rect.x1.max(0.0).round() as u32).min(screen.width);
    let y1 = (rect.y1.max(0.0).round() as u32).min(screen.height);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for y in y0..y1 {
        for x in x0..x1 {
            screen.blend_pixel(x, y, SELECTION_FILL);
        }
    }

    let on = |offset: u32| (offset / SELECTION_DASH) % 2 == 0;
    for x in x0..x1 {
        if on(x - x0) {
            for t in 0..SELECTION_STROKE_WIDTH {
                screen.put_pixel(x, y0 + t, SELECTION_STROKE);
                screen.put_pixel(x, (y1 - 1).saturating_sub(t), SELECTION_STROKE);
            }
        }
    }
    for y in y0..y1 {
        if on(y - y0) {
            for t in 0..SELECTION_STROKE_WIDTH {
                screen.put_pixel(x0 + t, y, SELECTION_STROKE);
                screen.put_pixel((x1 - 1).saturating_sub(t), y, SELECTION_STROKE);
            }
        }
    }
}
