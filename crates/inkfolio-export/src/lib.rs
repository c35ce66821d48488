//! PDF export pipeline for Inkfolio sheets.
//!
//! Two distinct paths on purpose: [`export_sheet`] places the live
//! surface's page slices full-bleed onto A4 pages, while [`export_all`]
//! reads persisted snapshots, strips the decorative border, crops to
//! the detected content bounds and centers the result within page
//! margins. Failures are local: a sheet that cannot be exported
//! contributes nothing instead of aborting the batch.

use inkfolio_core::board::Whiteboard;
use inkfolio_core::bounds::{PixelRect, find_content_bounds};
use inkfolio_core::sheet::{Sheet, sheet_save_key};
use inkfolio_core::storage::Storage;
use inkfolio_core::surface::{
    A4_HEIGHT_PX, A4_WIDTH_PX, BORDER_COLOR, BORDER_TOLERANCE, RasterSurface, Rgba,
};
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Px,
};
use std::io::BufWriter;
use thiserror::Error;

/// A4 portrait page size in millimeters.
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;
/// Page margin used by the batch export path.
pub const EXPORT_MARGIN_MM: f32 = 10.0;
/// Fixed output filename of the batch export path.
pub const BATCH_EXPORT_FILENAME: &str = "all_sheets.pdf";

const MM_PER_INCH: f32 = 25.4;
const NO_CONTENT_NOTICE: &str = "No content to export";
const NO_CONTENT_FONT_SIZE: f32 = 16.0;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF error: {0}")]
    Pdf(String),
}

/// A finished PDF document ready to hand to the download trigger.
#[derive(Debug, Clone)]
pub struct PdfExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Placement of batch-export content on an A4 page: uniformly scaled to
/// fit the printable area (never upscaled) and centered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentPlacement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
    pub scale: f32,
}

/// Compute where detected content lands on the physical page.
pub fn content_placement(bounds: &PixelRect) -> ContentPlacement {
    let pixels_per_mm = A4_WIDTH_PX as f32 / A4_WIDTH_MM;
    let content_width_mm = bounds.width as f32 / pixels_per_mm;
    let content_height_mm = bounds.height as f32 / pixels_per_mm;

    let available_width_mm = A4_WIDTH_MM - 2.0 * EXPORT_MARGIN_MM;
    let available_height_mm = A4_HEIGHT_MM - 2.0 * EXPORT_MARGIN_MM;

    let width_ratio = available_width_mm / content_width_mm;
    let height_ratio = available_height_mm / content_height_mm;
    let scale = width_ratio.min(height_ratio).min(1.0);

    let width_mm = content_width_mm * scale;
    let height_mm = content_height_mm * scale;
    ContentPlacement {
        x_mm: (A4_WIDTH_MM - width_mm) / 2.0,
        y_mm: (A4_HEIGHT_MM - height_mm) / 2.0,
        width_mm,
        height_mm,
        scale,
    }
}

/// Derive a download filename from a sheet name: every non-alphanumeric
/// character becomes `_`; an empty name falls back to `sheet`.
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return "sheet".to_string();
    }
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Export one sheet's live surface.
///
/// The surface is partitioned vertically into page-unit slices; each
/// nonzero slice is cropped to the left A4-width column and placed
/// full-bleed onto a full A4 page. No margins, no content cropping, and
/// the decorative border comes along — this path is intentionally
/// different from [`export_all`].
pub fn export_sheet(surface: &RasterSurface, sheet_name: &str) -> Result<PdfExport, ExportError> {
    let (doc, page1, layer1) = PdfDocument::new(
        sheet_name,
        Mm(A4_WIDTH_MM),
        Mm(A4_HEIGHT_MM),
        "Layer 1",
    );

    let column_width = surface.width().min(A4_WIDTH_PX);
    let page_count = surface.height().div_ceil(A4_HEIGHT_PX);
    let mut first_page = true;

    for page in 0..page_count {
        let source_y = page * A4_HEIGHT_PX;
        let slice_height = (surface.height() - source_y).min(A4_HEIGHT_PX);
        if slice_height == 0 {
            continue;
        }

        let layer = next_layer(&doc, page1, layer1, &mut first_page);
        let slice = PixelRect {
            x: 0,
            y: source_y,
            width: column_width,
            height: slice_height,
        };
        let rgb = region_rgb(surface, &slice);
        place_image(
            &layer,
            rgb,
            slice.width,
            slice.height,
            0.0,
            0.0,
            A4_WIDTH_MM,
            A4_HEIGHT_MM,
        );
    }

    save(doc, format!("{}.pdf", sanitize_filename(sheet_name)))
}

/// Export the live surface of an active whiteboard.
pub fn export_board(board: &Whiteboard) -> Result<PdfExport, ExportError> {
    export_sheet(board.surface(), board.sheet_name())
}

/// Export every sheet's persisted snapshot into one document, in
/// registry order.
///
/// Sheets are processed strictly sequentially: each snapshot load is
/// awaited before the next sheet starts, which keeps page order
/// deterministic and bounds memory to one decoded image. Sheets without
/// a snapshot, with an undecodable snapshot or without detectable
/// content are skipped silently. If nothing survives, the document
/// holds a single placeholder-text page.
pub async fn export_all<S: Storage>(sheets: &[Sheet], storage: &S) -> Result<PdfExport, ExportError> {
    let (doc, page1, layer1) = PdfDocument::new(
        "All sheets",
        Mm(A4_WIDTH_MM),
        Mm(A4_HEIGHT_MM),
        "Layer 1",
    );
    let mut first_page = true;

    for sheet in sheets {
        let encoded = match storage.get(&sheet_save_key(&sheet.id)).await {
            Ok(Some(encoded)) => encoded,
            Ok(None) => {
                log::debug!("sheet {} has no snapshot, skipping", sheet.id);
                continue;
            }
            Err(e) => {
                log::warn!("could not load snapshot for sheet {}: {}", sheet.id, e);
                continue;
            }
        };

        let mut surface = RasterSurface::page();
        if let Err(e) = surface.restore_from_encoding(&encoded) {
            log::warn!("undecodable snapshot for sheet {}: {}", sheet.id, e);
            continue;
        }
        strip_border(&mut surface);

        let Some(bounds) = find_content_bounds(&surface) else {
            log::debug!("sheet {} has no content, skipping", sheet.id);
            continue;
        };
        let placement = content_placement(&bounds);

        let layer = next_layer(&doc, page1, layer1, &mut first_page);
        let rgb = region_rgb(&surface, &bounds);
        place_image(
            &layer,
            rgb,
            bounds.width,
            bounds.height,
            placement.x_mm,
            placement.y_mm,
            placement.width_mm,
            placement.height_mm,
        );
    }

    if first_page {
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page1).get_layer(layer1);
        layer.use_text(
            NO_CONTENT_NOTICE,
            NO_CONTENT_FONT_SIZE,
            Mm(10.0),
            Mm(A4_HEIGHT_MM - 20.0),
            &font,
        );
    }

    save(doc, BATCH_EXPORT_FILENAME.to_string())
}

/// Replace all border-colored pixels with fully transparent white, so
/// neither bounds detection nor the exported image sees the border.
fn strip_border(surface: &mut RasterSurface) {
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            if surface.pixel(x, y).near(BORDER_COLOR, BORDER_TOLERANCE) {
                surface.put_pixel(x, y, Rgba::new(255, 255, 255, 0));
            }
        }
    }
}

/// The initial page's layer on first use, a fresh A4 page afterwards.
fn next_layer(
    doc: &PdfDocumentReference,
    page1: printpdf::PdfPageIndex,
    layer1: printpdf::PdfLayerIndex,
    first_page: &mut bool,
) -> PdfLayerReference {
    if *first_page {
        *first_page = false;
        doc.get_page(page1).get_layer(layer1)
    } else {
        let (page, layer) = doc.add_page(Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Layer 1");
        doc.get_page(page).get_layer(layer)
    }
}

/// Copy a surface region into raw RGB rows, compositing transparency
/// onto a white background (PDF images carry no alpha here).
fn region_rgb(surface: &RasterSurface, rect: &PixelRect) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((rect.width * rect.height * 3) as usize);
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            let pixel = surface.pixel(x, y);
            let alpha = pixel.a as f32 / 255.0;
            let over_white = |channel: u8| (channel as f32 * alpha + 255.0 * (1.0 - alpha)) as u8;
            rgb.push(over_white(pixel.r));
            rgb.push(over_white(pixel.g));
            rgb.push(over_white(pixel.b));
        }
    }
    rgb
}

/// Embed raw RGB pixels on a layer at the given physical position and
/// size. The DPI is chosen so the pixel width maps to `width_mm`; a
/// vertical scale covers the full-bleed path's page stretch.
#[allow(clippy::too_many_arguments)]
fn place_image(
    layer: &PdfLayerReference,
    rgb: Vec<u8>,
    width_px: u32,
    height_px: u32,
    x_mm: f32,
    y_mm: f32,
    width_mm: f32,
    height_mm: f32,
) {
    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb,
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    let dpi = width_px as f32 / (width_mm / MM_PER_INCH);
    let natural_height_mm = height_px as f32 / dpi * MM_PER_INCH;
    let scale_y = height_mm / natural_height_mm;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x_mm)),
            translate_y: Some(Mm(y_mm)),
            dpi: Some(dpi),
            scale_y: Some(scale_y),
            ..Default::default()
        },
    );
}

fn save(doc: PdfDocumentReference, filename: String) -> Result<PdfExport, ExportError> {
    let mut bytes = Vec::new();
    {
        let mut writer = BufWriter::new(&mut bytes);
        doc.save(&mut writer)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
    }
    Ok(PdfExport { filename, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkfolio_core::storage::MemoryStorage;
    use inkfolio_core::surface::CompositeMode;
    use kurbo::Point;
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        // Simple blocking executor for tests
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

    /// Count page objects in serialized PDF bytes: printpdf writes one
    /// /MediaBox entry per page.
    fn page_count(bytes: &[u8]) -> usize {
        let needle = b"/MediaBox";
        bytes
            .windows(needle.len())
            .filter(|window| window == needle)
            .count()
    }

    fn sheet(id: &str, name: &str) -> Sheet {
        Sheet {
            id: id.to_string(),
            name: name.to_string(),
            created_at: 0,
        }
    }

    fn surface_with_dot(x: f64, y: f64) -> RasterSurface {
        let mut surface = RasterSurface::page();
        surface.compose_stroke(
            &[Point::new(x, y)],
            CompositeMode::Paint,
            Rgba::new(0, 0, 0, 255),
            8.0,
        );
        surface
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Sheet 1"), "Sheet_1");
        assert_eq!(sanitize_filename("méeting/notes!"), "m_eting_notes_");
        assert_eq!(sanitize_filename(""), "sheet");
    }

    #[test]
    fn test_content_placement_small_content_is_not_upscaled() {
        // The 50x50 px worked example: ~13.2 mm, unscaled and centered.
        let bounds = PixelRect { x: 100, y: 100, width: 50, height: 50 };
        let placement = content_placement(&bounds);

        assert!((placement.scale - 1.0).abs() < f32::EPSILON);
        assert!((placement.width_mm - 13.22).abs() < 0.05);
        assert!((placement.x_mm - (A4_WIDTH_MM - placement.width_mm) / 2.0).abs() < 1e-4);
        assert!((placement.y_mm - (A4_HEIGHT_MM - placement.height_mm) / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_content_placement_large_content_shrinks_to_fit() {
        let bounds = PixelRect { x: 0, y: 0, width: 1588, height: 1123 };
        let placement = content_placement(&bounds);

        assert!(placement.scale < 1.0);
        assert!(placement.width_mm <= A4_WIDTH_MM - 2.0 * EXPORT_MARGIN_MM + 1e-3);
        assert!(placement.height_mm <= A4_HEIGHT_MM - 2.0 * EXPORT_MARGIN_MM + 1e-3);
    }

    #[test]
    fn test_export_sheet_single_page() {
        let surface = surface_with_dot(200.0, 300.0);
        let export = export_sheet(&surface, "Sheet 1").unwrap();

        assert_eq!(export.filename, "Sheet_1.pdf");
        assert!(export.bytes.starts_with(b"%PDF"));
        assert_eq!(page_count(&export.bytes), 1);
    }

    #[test]
    fn test_export_sheet_partitions_tall_surface() {
        let surface = RasterSurface::with_pages(3);
        let export = export_sheet(&surface, "tall").unwrap();
        assert_eq!(page_count(&export.bytes), 3);
    }

    #[test]
    fn test_export_board_derives_filename_from_sheet_name() {
        let board = Whiteboard::new(&sheet("9", "Notes & ideas"), 600);
        let export = export_board(&board).unwrap();
        assert_eq!(export.filename, "Notes___ideas.pdf");
        assert_eq!(page_count(&export.bytes), 1);
    }

    #[test]
    fn test_export_all_skips_sheets_without_snapshot() {
        let storage = MemoryStorage::new();
        let sheets = vec![sheet("1", "first"), sheet("2", "second"), sheet("3", "third")];

        for id in ["1", "3"] {
            let surface = surface_with_dot(400.0, 400.0);
            let encoded = surface.snapshot_encode().unwrap();
            block_on(storage.set(&sheet_save_key(id), &encoded)).unwrap();
        }

        let export = block_on(export_all(&sheets, &storage)).unwrap();
        assert_eq!(export.filename, BATCH_EXPORT_FILENAME);
        // Sheet 2 has no snapshot: exactly the other two became pages.
        assert_eq!(page_count(&export.bytes), 2);
    }

    #[test]
    fn test_export_all_without_content_produces_placeholder_page() {
        let storage = MemoryStorage::new();
        let sheets = vec![sheet("1", "empty")];

        let export = block_on(export_all(&sheets, &storage)).unwrap();
        assert!(export.bytes.starts_with(b"%PDF"));
        assert_eq!(page_count(&export.bytes), 1);
    }

    #[test]
    fn test_export_all_skips_border_only_snapshot() {
        let storage = MemoryStorage::new();
        let sheets = vec![sheet("1", "blank")];

        // A blank surface still carries its border ring; after border
        // stripping there is nothing left to export.
        let encoded = RasterSurface::page().snapshot_encode().unwrap();
        block_on(storage.set(&sheet_save_key("1"), &encoded)).unwrap();

        let export = block_on(export_all(&sheets, &storage)).unwrap();
        assert_eq!(page_count(&export.bytes), 1); // placeholder page only
    }

    #[test]
    fn test_export_all_skips_undecodable_snapshot() {
        let storage = MemoryStorage::new();
        let sheets = vec![sheet("1", "broken"), sheet("2", "fine")];

        block_on(storage.set(&sheet_save_key("1"), "data:image/png;base64,@@@")).unwrap();
        let encoded = surface_with_dot(500.0, 500.0).snapshot_encode().unwrap();
        block_on(storage.set(&sheet_save_key("2"), &encoded)).unwrap();

        let export = block_on(export_all(&sheets, &storage)).unwrap();
        assert_eq!(page_count(&export.bytes), 1);
    }

    #[test]
    fn test_region_rgb_composites_transparency_onto_white() {
        let surface = RasterSurface::new(30, 30);
        let rect = PixelRect { x: 10, y: 10, width: 2, height: 1 };
        let rgb = region_rgb(&surface, &rect);
        // Transparent pixels export as white.
        assert_eq!(rgb, vec![255, 255, 255, 255, 255, 255]);
    }
}
