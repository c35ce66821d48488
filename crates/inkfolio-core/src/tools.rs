//! Tool system for the whiteboard: pen, eraser and rectangular select.

use crate::surface::{CompositeMode, Rgba};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Pen stroke width bounds and keyboard step.
pub const PEN_WIDTH_MIN: f64 = 2.0;
pub const PEN_WIDTH_MAX: f64 = 50.0;
pub const PEN_WIDTH_STEP: f64 = 1.0;

/// Eraser stroke width bounds and keyboard step.
pub const ERASER_WIDTH_MIN: f64 = 5.0;
pub const ERASER_WIDTH_MAX: f64 = 100.0;
pub const ERASER_WIDTH_STEP: f64 = 2.0;

pub const DEFAULT_PEN_WIDTH: f64 = 5.0;
pub const DEFAULT_ERASER_WIDTH: f64 = 25.0;
pub const DEFAULT_PEN_COLOR: Rgba = Rgba::new(0, 123, 255, 255);

/// The fixed pen color palette.
pub const PALETTE: [Rgba; 15] = [
    Rgba::new(0x00, 0x00, 0x00, 255),
    Rgba::new(0x33, 0x33, 0x33, 255),
    Rgba::new(0x66, 0x66, 0x66, 255),
    Rgba::new(0x99, 0x99, 0x99, 255),
    Rgba::new(0xCC, 0xCC, 0xCC, 255),
    Rgba::new(0x00, 0x7b, 0xff, 255),
    Rgba::new(0x28, 0xa7, 0x45, 255),
    Rgba::new(0xff, 0xc1, 0x07, 255),
    Rgba::new(0xdc, 0x35, 0x45, 255),
    Rgba::new(0x6f, 0x42, 0xc1, 255),
    Rgba::new(0x17, 0xa2, 0xb8, 255),
    Rgba::new(0xfd, 0x7e, 0x14, 255),
    Rgba::new(0xe8, 0x3e, 0x8c, 255),
    Rgba::new(0x20, 0xc9, 0x97, 255),
    Rgba::new(0x6c, 0x75, 0x7d, 255),
];

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Pen,
    Eraser,
    Select,
}

impl ToolKind {
    /// Map a single-letter keyboard shortcut to a tool.
    pub fn from_shortcut(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'p' => Some(ToolKind::Pen),
            'e' => Some(ToolKind::Eraser),
            's' => Some(ToolKind::Select),
            _ => None,
        }
    }
}

/// State of the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A pen or eraser stroke; `last` is the most recent stroke point.
    Drawing { last: Point },
    /// A rectangular selection between `start` and `current`.
    Selecting { start: Point, current: Point },
}

/// What a finished gesture asks of the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// Nothing to do (no gesture was active).
    None,
    /// A stroke ended; the surface was already mutated incrementally.
    StrokeDone,
    /// A selection ended; clear this virtual-coordinate region.
    ClearSelection(Rect),
}

/// Manages the active tool, its configuration and the gesture state
/// machine. Tool configuration is transient: a fresh manager (with
/// defaults) is created on each sheet activation.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Pen stroke color.
    pub pen_color: Rgba,
    /// Pen stroke width in surface pixels.
    pub pen_width: f64,
    /// Eraser stroke width in surface pixels.
    pub eraser_width: f64,
    state: GestureState,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self {
            current_tool: ToolKind::default(),
            pen_color: DEFAULT_PEN_COLOR,
            pen_width: DEFAULT_PEN_WIDTH,
            eraser_width: DEFAULT_ERASER_WIDTH,
            state: GestureState::Idle,
        }
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch tools. An in-progress gesture is cancelled; in particular
    /// a live selection is discarded without mutating the raster.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
        self.state = GestureState::Idle;
    }

    /// Begin a gesture at `point` with the current tool.
    pub fn begin(&mut self, point: Point) {
        self.state = match self.current_tool {
            ToolKind::Pen | ToolKind::Eraser => GestureState::Drawing { last: point },
            ToolKind::Select => GestureState::Selecting { start: point, current: point },
        };
    }

    /// Advance the gesture to `point`. For a drawing gesture, returns
    /// the previous point so the caller can compose the new segment.
    pub fn advance(&mut self, point: Point) -> Option<Point> {
        match &mut self.state {
            GestureState::Drawing { last } => {
                let previous = *last;
                *last = point;
                Some(previous)
            }
            GestureState::Selecting { current, .. } => {
                *current = point;
                None
            }
            GestureState::Idle => None,
        }
    }

    /// End the gesture and report what the surface should do.
    pub fn end(&mut self) -> GestureOutcome {
        let outcome = match self.state {
            GestureState::Idle => GestureOutcome::None,
            GestureState::Drawing { .. } => GestureOutcome::StrokeDone,
            GestureState::Selecting { start, current } => {
                GestureOutcome::ClearSelection(Rect::from_points(start, current))
            }
        };
        self.state = GestureState::Idle;
        outcome
    }

    /// Cancel the gesture without any effect on the surface.
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// The live selection rectangle (normalized), if a selection
    /// gesture is in progress.
    pub fn selection_rect(&self) -> Option<Rect> {
        match self.state {
            GestureState::Selecting { start, current } => Some(Rect::from_points(start, current)),
            _ => None,
        }
    }

    /// Stroke width of the active drawing tool.
    pub fn active_width(&self) -> f64 {
        match self.current_tool {
            ToolKind::Eraser => self.eraser_width,
            _ => self.pen_width,
        }
    }

    /// Compositing mode of the active tool; `None` for select, which
    /// never draws.
    pub fn composite_mode(&self) -> Option<CompositeMode> {
        match self.current_tool {
            ToolKind::Pen => Some(CompositeMode::Paint),
            ToolKind::Eraser => Some(CompositeMode::Erase),
            ToolKind::Select => None,
        }
    }

    /// Grow the active tool's stroke width (the `+` shortcut). The
    /// eraser steps by 2 within [5, 100]; any other tool adjusts the
    /// pen width by 1 within [2, 50].
    pub fn increase_size(&mut self) {
        match self.current_tool {
            ToolKind::Eraser => {
                self.eraser_width = (self.eraser_width + ERASER_WIDTH_STEP).min(ERASER_WIDTH_MAX);
            }
            _ => {
                self.pen_width = (self.pen_width + PEN_WIDTH_STEP).min(PEN_WIDTH_MAX);
            }
        }
    }

    /// Shrink the active tool's stroke width (the `-` shortcut).
    pub fn decrease_size(&mut self) {
        match self.current_tool {
            ToolKind::Eraser => {
                self.eraser_width = (self.eraser_width - ERASER_WIDTH_STEP).max(ERASER_WIDTH_MIN);
            }
            _ => {
                self.pen_width = (self.pen_width - PEN_WIDTH_STEP).max(PEN_WIDTH_MIN);
            }
        }
    }
}
