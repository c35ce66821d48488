//! Content-bounds detection: the tight rectangle enclosing
//! non-background, non-border pixels, used during export.

use crate::surface::{BORDER_COLOR, BORDER_TOLERANCE, RasterSurface, Rgba};

/// Grid cell size for coarse sampling.
pub const SAMPLE_STEP: u32 = 10;
/// Margin added around the detected content on all sides.
pub const CONTENT_MARGIN: u32 = 20;
/// Channel floor above which a pixel counts as near-white background.
pub const NEAR_WHITE_MIN: u8 = 250;

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Find the bounding box of drawn content.
///
/// The surface is scanned in `SAMPLE_STEP`-sized cells; the result is
/// the union of all qualifying cells, expanded by [`CONTENT_MARGIN`]
/// and clamped to the surface, so its edges land on cell granularity
/// rather than exact pixels. Returns `None` when no cell qualifies.
pub fn find_content_bounds(surface: &RasterSurface) -> Option<PixelRect> {
    let width = surface.width();
    let height = surface.height();
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut any_content = false;

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let cell_w = SAMPLE_STEP.min(width - x);
            let cell_h = SAMPLE_STEP.min(height - y);
            if cell_has_content(surface, x, y, cell_w, cell_h) {
                any_content = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x + SAMPLE_STEP);
                max_y = max_y.max(y + SAMPLE_STEP);
            }
            x += SAMPLE_STEP;
        }
        y += SAMPLE_STEP;
    }

    if !any_content {
        return None;
    }

    let x0 = min_x.saturating_sub(CONTENT_MARGIN);
    let y0 = min_y.saturating_sub(CONTENT_MARGIN);
    let x1 = (max_x + CONTENT_MARGIN).min(width);
    let y1 = (max_y + CONTENT_MARGIN).min(height);
    Some(PixelRect {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}

/// A cell is content if any pixel in it is neither transparent,
/// near-white, nor border-colored.
fn cell_has_content(surface: &RasterSurface, x: u32, y: u32, width: u32, height: u32) -> bool {
    for py in y..y + height {
        for px in x..x + width {
            if is_content_pixel(surface.pixel(px, py)) {
                return true;
            }
        }
    }
    false
}

fn is_content_pixel(pixel: Rgba) -> bool {
    if pixel.a == 0 {
        return false;
    }
    if pixel.r >= NEAR_WHITE_MIN && pixel.g >= NEAR_WHITE_MIN && pixel.b >= NEAR_WHITE_MIN {
        return false;
    }
    !pixel.near(BORDER_COLOR, BORDER_TOLERANCE)
}
