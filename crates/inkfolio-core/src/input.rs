//! Input translation: raw pointer/touch/mouse events into
//! virtual-canvas coordinates.

use kurbo::Point;

/// Pressure reported when the device does not provide one.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// A raw input event as reported by the embedding surface, before any
/// coordinate mapping. Device class only affects how client coordinates
/// are extracted; the produced [`StrokePoint`] is uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPointer {
    /// A pointer event (pen, unified pointer API).
    Pointer {
        client_x: f64,
        client_y: f64,
        pressure: Option<f64>,
    },
    /// A touch event carrying its active touch points; the first one wins.
    Touch { points: Vec<(f64, f64)> },
    /// A plain mouse event.
    Mouse { client_x: f64, client_y: f64 },
}

impl RawPointer {
    /// Extract client coordinates. `None` for a touch event with no
    /// active touch points.
    fn client_position(&self) -> Option<(f64, f64)> {
        match self {
            RawPointer::Pointer { client_x, client_y, .. }
            | RawPointer::Mouse { client_x, client_y } => Some((*client_x, *client_y)),
            RawPointer::Touch { points } => points.first().copied(),
        }
    }

    fn pressure(&self) -> f64 {
        match self {
            RawPointer::Pointer { pressure, .. } => pressure.unwrap_or(DEFAULT_PRESSURE),
            _ => DEFAULT_PRESSURE,
        }
    }
}

/// Placement and scaling of the on-screen canvas within the client
/// coordinate space: its client-space position, its displayed (CSS)
/// size, and the backing bitmap size it is scaled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGeometry {
    pub left: f64,
    pub top: f64,
    pub displayed_width: f64,
    pub displayed_height: f64,
    pub backing_width: f64,
    pub backing_height: f64,
}

impl CanvasGeometry {
    /// Geometry for a canvas displayed 1:1 with its backing bitmap at
    /// the client origin.
    pub fn identity(width: u32, height: u32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            displayed_width: width as f64,
            displayed_height: height as f64,
            backing_width: width as f64,
            backing_height: height as f64,
        }
    }
}

/// One translated input sample in virtual-canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePoint {
    pub position: Point,
    pub pressure: f64,
}

/// Map a raw event to virtual-canvas coordinates:
/// `x = (client_x - left) * (backing_w / displayed_w)` and
/// `y = (client_y - top) * (backing_h / displayed_h) + scroll_y`.
///
/// Returns `None` when the event carries no usable coordinates (e.g. a
/// touch event with an empty touch list).
pub fn translate(event: &RawPointer, geometry: &CanvasGeometry, scroll_y: f64) -> Option<StrokePoint> {
    let (client_x, client_y) = event.client_position()?;
    let scale_x = geometry.backing_width / geometry.displayed_width;
    let scale_y = geometry.backing_height / geometry.displayed_height;
    Some(StrokePoint {
        position: Point::new(
            (client_x - geometry.left) * scale_x,
            (client_y - geometry.top) * scale_y + scroll_y,
        ),
        pressure: event.pressure(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_identity() {
        let geometry = CanvasGeometry::identity(800, 600);
        let event = RawPointer::Mouse { client_x: 100.0, client_y: 200.0 };
        let point = translate(&event, &geometry, 0.0).unwrap();
        assert_eq!(point.position, Point::new(100.0, 200.0));
        assert!((point.pressure - DEFAULT_PRESSURE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_translate_applies_scroll_offset() {
        let geometry = CanvasGeometry::identity(800, 600);
        let event = RawPointer::Mouse { client_x: 10.0, client_y: 20.0 };
        let point = translate(&event, &geometry, 500.0).unwrap();
        assert_eq!(point.position, Point::new(10.0, 520.0));
    }

    #[test]
    fn test_translate_device_pixel_scaling() {
        // Bitmap twice the displayed size: client coordinates double.
        let geometry = CanvasGeometry {
            left: 50.0,
            top: 10.0,
            displayed_width: 400.0,
            displayed_height: 300.0,
            backing_width: 800.0,
            backing_height: 600.0,
        };
        let event = RawPointer::Pointer { client_x: 150.0, client_y: 110.0, pressure: Some(0.8) };
        let point = translate(&event, &geometry, 0.0).unwrap();
        assert_eq!(point.position, Point::new(200.0, 200.0));
        assert!((point.pressure - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_touch_point_wins() {
        let geometry = CanvasGeometry::identity(800, 600);
        let event = RawPointer::Touch { points: vec![(30.0, 40.0), (300.0, 400.0)] };
        let point = translate(&event, &geometry, 0.0).unwrap();
        assert_eq!(point.position, Point::new(30.0, 40.0));
    }

    #[test]
    fn test_empty_touch_yields_none() {
        let geometry = CanvasGeometry::identity(800, 600);
        let event = RawPointer::Touch { points: vec![] };
        assert!(translate(&event, &geometry, 0.0).is_none());
    }
}
