//! Raster surface: the off-screen pixel buffer backing one sheet.

use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use thiserror::Error;

/// A4 page width at 96 px per inch equivalent (210 mm).
pub const A4_WIDTH_PX: u32 = 794;
/// A4 page height at 96 px per inch equivalent (297 mm).
pub const A4_HEIGHT_PX: u32 = 1123;
/// Surface width: two A4 widths of horizontal drawing room.
pub const SURFACE_WIDTH_PX: u32 = A4_WIDTH_PX * 2;

/// Reserved sentinel color of the decorative page border (#d0d0d0).
pub const BORDER_COLOR: Rgba = Rgba::new(208, 208, 208, 255);
/// Per-channel tolerance when classifying a pixel as border-colored.
pub const BORDER_TOLERANCE: u8 = 5;

/// Errors from snapshot encoding and restoration.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("snapshot encode error: {0}")]
    Encode(String),
    #[error("snapshot decode error: {0}")]
    Decode(String),
}

/// RGBA8 color used for surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse a hex color string (#rgb, #rrggbb or #rrggbbaa).
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.strip_prefix('#')?.trim();
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b, 255))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Whether every color channel is within `tolerance` of `other`'s.
    /// Alpha is ignored; used for border-pixel classification.
    pub fn near(&self, other: Rgba, tolerance: u8) -> bool {
        self.r.abs_diff(other.r) < tolerance
            && self.g.abs_diff(other.g) < tolerance
            && self.b.abs_diff(other.b) < tolerance
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// How new pixels combine with existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    /// Opaque color drawn over existing content.
    Paint,
    /// Existing content forced to fully transparent (destination-out).
    Erase,
}

/// The full off-screen pixel buffer for one sheet.
///
/// Fixed width, vertical extent a multiple of the page unit. The
/// outermost 1-px ring always holds [`BORDER_COLOR`]; every mutator
/// restores it last so drawing and erasing never disturb it.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterSurface {
    /// Create a transparent surface of the given dimensions, with border.
    pub fn new(width: u32, height: u32) -> Self {
        let mut surface = Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        };
        surface.draw_border();
        surface
    }

    /// Create a surface sized to one standard page unit.
    pub fn page() -> Self {
        Self::new(SURFACE_WIDTH_PX, A4_HEIGHT_PX)
    }

    /// Create a surface spanning `pages` vertically stacked page units.
    pub fn with_pages(pages: u32) -> Self {
        Self::new(SURFACE_WIDTH_PX, A4_HEIGHT_PX * pages.max(1))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixel data, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Read one pixel. `x`/`y` must be in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let i = ((y * self.width + x) * 4) as usize;
        Rgba::new(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3])
    }

    /// Write one pixel; out-of-bounds coordinates are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.data[i] = color.r;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.b;
        self.data[i + 3] = color.a;
    }

    /// Draw a continuous stroke through `points` with a round end cap at
    /// the latest point. A single point paints a dot. The border is
    /// restored afterwards.
    pub fn compose_stroke(&mut self, points: &[Point], mode: CompositeMode, color: Rgba, width: f64) {
        let radius = width / 2.0;
        match points {
            [] => return,
            [p] => self.stamp_segment(*p, *p, radius, mode, color),
            _ => {
                for pair in points.windows(2) {
                    self.stamp_segment(pair[0], pair[1], radius, mode, color);
                }
                // Round cap at the latest point.
                let last = points[points.len() - 1];
                self.stamp_segment(last, last, radius, mode, color);
            }
        }
        self.draw_border();
    }

    /// Set a rectangular sub-region to fully transparent, then restore
    /// the border. Portions outside the surface are ignored.
    pub fn clear_region(&mut self, rect: Rect) {
        let x0 = rect.x0.max(0.0).floor() as u32;
        let y0 = rect.y0.max(0.0).floor() as u32;
        let x1 = (rect.x1.max(0.0).ceil() as u32).min(self.width);
        let y1 = (rect.y1.max(0.0).ceil() as u32).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.put_pixel(x, y, Rgba::transparent());
            }
        }
        self.draw_border();
    }

    /// Wipe the entire buffer to transparent, then restore the border.
    pub fn clear_all(&mut self) {
        self.data.fill(0);
        self.draw_border();
    }

    /// Redraw the 1-px decorative border ring.
    pub fn draw_border(&mut self) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        for x in 0..self.width {
            self.put_pixel(x, 0, BORDER_COLOR);
            self.put_pixel(x, self.height - 1, BORDER_COLOR);
        }
        for y in 0..self.height {
            self.put_pixel(0, y, BORDER_COLOR);
            self.put_pixel(self.width - 1, y, BORDER_COLOR);
        }
    }

    /// Encode the current pixel contents as a portable
    /// `data:image/png;base64,` string (lossless RGBA8).
    pub fn snapshot_encode(&self) -> Result<String, SurfaceError> {
        let mut png_bytes = Vec::new();
        let mut encoder = png::Encoder::new(&mut png_bytes, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| SurfaceError::Encode(e.to_string()))?;
        writer
            .write_image_data(&self.data)
            .map_err(|e| SurfaceError::Encode(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| SurfaceError::Encode(e.to_string()))?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png_bytes)))
    }

    /// Replace buffer contents by decoding an encoded snapshot at the
    /// origin. No resizing: smaller images leave the trailing area at
    /// its prior content, larger images are cropped. Accepts both
    /// data-URL strings and bare base64 payloads. The border is
    /// restored afterwards.
    pub fn restore_from_encoding(&mut self, encoded: &str) -> Result<(), SurfaceError> {
        let payload = encoded.rsplit_once(',').map_or(encoded, |(_, p)| p);
        let png_bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| SurfaceError::Decode(e.to_string()))?;

        let decoder = png::Decoder::new(std::io::Cursor::new(png_bytes));
        let mut reader = decoder
            .read_info()
            .map_err(|e| SurfaceError::Decode(e.to_string()))?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| SurfaceError::Decode(e.to_string()))?;
        if info.color_type != png::ColorType::Rgba || info.bit_depth != png::BitDepth::Eight {
            return Err(SurfaceError::Decode(format!(
                "unsupported pixel format {:?}/{:?}",
                info.color_type, info.bit_depth
            )));
        }

        let copy_width = info.width.min(self.width);
        let copy_height = info.height.min(self.height);
        for y in 0..copy_height {
            let src = ((y * info.width) * 4) as usize;
            let dst = ((y * self.width) * 4) as usize;
            let len = (copy_width * 4) as usize;
            self.data[dst..dst + len].copy_from_slice(&buf[src..src + len]);
        }
        self.draw_border();
        Ok(())
    }

    /// Stamp all pixels within `radius` of segment `a`..`b` (a capsule,
    /// which gives the stroke its round caps).
    fn stamp_segment(&mut self, a: Point, b: Point, radius: f64, mode: CompositeMode, color: Rgba) {
        let stamped = match mode {
            CompositeMode::Paint => Rgba::new(color.r, color.g, color.b, 255),
            CompositeMode::Erase => Rgba::transparent(),
        };
        let x0 = (a.x.min(b.x) - radius).floor().max(0.0) as u32;
        let y0 = (a.y.min(b.y) - radius).floor().max(0.0) as u32;
        let x1 = ((a.x.max(b.x) + radius).ceil() as i64).clamp(0, self.width as i64) as u32;
        let y1 = ((a.y.max(b.y) + radius).ceil() as i64).clamp(0, self.height as i64) as u32;
        let radius_sq = radius * radius;
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if segment_distance_sq(center, a, b) <= radius_sq {
                    self.put_pixel(x, y, stamped);
                }
            }
        }
    }
}

/// Squared distance from `p` to the segment `a`..`b`.
fn segment_distance_sq(p: Point, a: Point, b: Point) -> f64 {
    let ab: Vec2 = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return (p - a).hypot2();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    let projected = a + ab * t;
    (p - projected).hypot2()
}
