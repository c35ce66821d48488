//! A whiteboard bound to one sheet: raster surface, on-screen viewport
//! and gesture routing.

use crate::input::{CanvasGeometry, RawPointer, translate};
use crate::sheet::{Sheet, sheet_save_key};
use crate::storage::Storage;
use crate::surface::{RasterSurface, SurfaceError};
use crate::tools::{GestureOutcome, GestureState, ToolKind, ToolManager};
use crate::viewport::{ScreenBuffer, render_selection_overlay, render_visible};
use kurbo::Rect;

/// Runtime state for one sheet's drawing session.
///
/// Owns the sheet's raster surface for its active lifetime. Every
/// mutation is an explicit method call followed by an explicit repaint;
/// there is no implicit re-render graph.
pub struct Whiteboard {
    sheet_id: String,
    sheet_name: String,
    surface: RasterSurface,
    screen: ScreenBuffer,
    scroll_y: f64,
    /// Tool configuration and gesture state machine.
    pub tools: ToolManager,
    /// Pre-gesture screen snapshot for rubber-band redraw.
    saved_screen: Option<ScreenBuffer>,
    dirty: bool,
}

impl Whiteboard {
    /// Create a whiteboard with a blank surface for `sheet`. Tool
    /// configuration starts at defaults.
    pub fn new(sheet: &Sheet, viewport_height: u32) -> Self {
        let surface = RasterSurface::page();
        let screen_height = viewport_height.min(surface.height());
        let screen = ScreenBuffer::new(surface.width(), screen_height);
        let mut board = Self {
            sheet_id: sheet.id.clone(),
            sheet_name: sheet.name.clone(),
            surface,
            screen,
            scroll_y: 0.0,
            tools: ToolManager::new(),
            saved_screen: None,
            dirty: false,
        };
        board.repaint();
        board
    }

    /// Create a whiteboard for `sheet`, restoring its persisted
    /// snapshot when one exists. A missing or undecodable snapshot
    /// falls back to a blank surface.
    pub async fn open<S: Storage>(sheet: &Sheet, storage: &S, viewport_height: u32) -> Self {
        let mut board = Self::new(sheet, viewport_height);
        match storage.get(&sheet_save_key(&sheet.id)).await {
            Ok(Some(encoded)) => {
                if let Err(e) = board.surface.restore_from_encoding(&encoded) {
                    log::warn!("could not restore snapshot for sheet {}: {}", sheet.id, e);
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("could not load snapshot for sheet {}: {}", sheet.id, e),
        }
        board.repaint();
        board
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    /// The on-screen bitmap as of the last repaint.
    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Resize the on-screen viewport (e.g. after a window resize).
    pub fn set_viewport_height(&mut self, viewport_height: u32) {
        let height = viewport_height.min(self.surface.height());
        self.screen = ScreenBuffer::new(self.surface.width(), height);
        self.repaint();
    }

    /// Scroll the viewport and repaint.
    pub fn scroll_to(&mut self, scroll_y: f64) {
        self.scroll_y = scroll_y.max(0.0);
        self.repaint();
    }

    /// Switch tools. A selection gesture in progress is discarded
    /// without mutating the raster.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tools.set_tool(tool);
        self.saved_screen = None;
        self.repaint();
    }

    /// Gesture start: begins a stroke (painting an initial dot) or a
    /// rectangular selection, depending on the active tool.
    pub fn pointer_down(&mut self, event: &RawPointer, geometry: &CanvasGeometry) {
        let Some(point) = translate(event, geometry, self.scroll_y) else {
            return;
        };

        match self.tools.composite_mode() {
            Some(mode) => {
                self.tools.begin(point.position);
                self.surface.compose_stroke(
                    &[point.position],
                    mode,
                    self.tools.pen_color,
                    self.tools.active_width(),
                );
                self.dirty = true;
                self.repaint();
            }
            None => {
                self.saved_screen = Some(self.screen.clone());
                self.tools.begin(point.position);
            }
        }
    }

    /// Gesture move: extends the stroke by one segment, or updates the
    /// selection rectangle (overlay only).
    pub fn pointer_move(&mut self, event: &RawPointer, geometry: &CanvasGeometry) {
        let Some(point) = translate(event, geometry, self.scroll_y) else {
            return;
        };

        match self.tools.state() {
            GestureState::Drawing { .. } => {
                let Some(previous) = self.tools.advance(point.position) else {
                    return;
                };
                let Some(mode) = self.tools.composite_mode() else {
                    return;
                };
                self.surface.compose_stroke(
                    &[previous, point.position],
                    mode,
                    self.tools.pen_color,
                    self.tools.active_width(),
                );
                self.dirty = true;
                self.repaint();
            }
            GestureState::Selecting { .. } => {
                self.tools.advance(point.position);
                self.repaint();
            }
            GestureState::Idle => {}
        }
    }

    /// Gesture end: closes a stroke, or clears the selected region.
    /// Also used for pointer-leave and pointer-cancel.
    pub fn pointer_up(&mut self) {
        match self.tools.end() {
            GestureOutcome::ClearSelection(rect) => {
                self.surface.clear_region(rect);
                self.saved_screen = None;
                self.dirty = true;
                self.repaint();
            }
            GestureOutcome::StrokeDone | GestureOutcome::None => {
                self.saved_screen = None;
            }
        }
    }

    /// Wipe the whole surface. Confirmation is the caller's concern.
    pub fn clear_all(&mut self) {
        self.surface.clear_all();
        self.dirty = true;
        self.repaint();
    }

    /// Encode the surface for on-demand persistence.
    pub fn snapshot(&self) -> Result<String, SurfaceError> {
        self.surface.snapshot_encode()
    }

    /// Whether the surface changed since the last call; used to drive
    /// the autosave manager's dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Recompute the on-screen bitmap from the surface and scroll
    /// offset, plus the rubber-band overlay during a selection.
    pub fn repaint(&mut self) {
        render_visible(&self.surface, self.scroll_y, &mut self.screen);
        if let (Some(saved), Some(rect)) = (&self.saved_screen, self.tools.selection_rect()) {
            let screen_rect = Rect::new(
                rect.x0,
                rect.y0 - self.scroll_y,
                rect.x1,
                rect.y1 - self.scroll_y,
            );
            render_selection_overlay(&mut self.screen, saved, screen_rect);
        }
    }
}
