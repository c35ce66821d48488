//! Inkfolio Core Library
//!
//! Core data structures and logic for the Inkfolio paginated drawing
//! whiteboard: the raster surface, viewport renderer, input translation,
//! tool state machine, content-bounds detection, sheet registry and
//! persistence.

pub mod board;
pub mod bounds;
pub mod input;
pub mod sheet;
pub mod storage;
pub mod surface;
pub mod tools;
pub mod viewport;

pub use board::Whiteboard;
pub use bounds::{PixelRect, find_content_bounds};
pub use input::{CanvasGeometry, RawPointer, StrokePoint, translate};
pub use sheet::{SHEET_LIST_KEY, Sheet, SheetRegistry, sheet_save_key};
pub use storage::{AutoSaveManager, FileStorage, MemoryStorage, Storage, StorageError, StorageResult};
pub use surface::{CompositeMode, RasterSurface, Rgba, SurfaceError};
pub use tools::{GestureOutcome, GestureState, ToolKind, ToolManager};
pub use viewport::{ScreenBuffer, render_selection_overlay, render_visible};

#[cfg(test)]
pub(crate) mod test_support {
    //! Minimal blocking executor for storage futures in tests.

    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    pub fn block_on<F: std::future::Future>(f: F) -> F::Output {
        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {}
            }
        }
    }
}
