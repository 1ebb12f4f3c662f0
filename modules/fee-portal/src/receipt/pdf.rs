use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Greyscale, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Point,
    Polygon,
};
use std::io::BufWriter;

use super::layout::{FontStyle, QrPlacement, ReceiptLayout, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::ReceiptError;

fn pdf_error(e: impl std::fmt::Display) -> ReceiptError {
    ReceiptError::PdfError(e.to_string())
}

/// Draw a layout onto a single A4 page and return the PDF bytes
pub fn draw(layout: &ReceiptLayout) -> Result<Vec<u8>, ReceiptError> {
    let (doc, page, layer) = PdfDocument::new(
        &layout.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Receipt",
    );

    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;
    let italic = doc
        .add_builtin_font(BuiltinFont::HelveticaOblique)
        .map_err(pdf_error)?;

    let canvas = doc.get_page(page).get_layer(layer);
    canvas.set_fill_color(Color::Greyscale(Greyscale::new(0.0, None)));

    for item in &layout.items {
        let font: &IndirectFontRef = match item.style {
            FontStyle::Regular => &regular,
            FontStyle::Bold => &bold,
            FontStyle::Italic => &italic,
        };
        canvas.use_text(
            item.text.clone(),
            item.size_pt,
            Mm(item.x_mm),
            Mm(item.y_mm),
            font,
        );
    }

    draw_qr(&canvas, &layout.qr);

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer).map_err(pdf_error)?;
    writer.into_inner().map_err(pdf_error)
}

/// One filled square per dark module; row 0 is the top of the code
fn draw_qr(canvas: &PdfLayerReference, qr: &QrPlacement) {
    let module = qr.module_size_mm();
    let top = qr.y_mm + qr.size_mm;

    for (col, row) in qr.matrix.dark_modules() {
        let x0 = qr.x_mm + col as f32 * module;
        let y1 = top - row as f32 * module;
        let y0 = y1 - module;
        let x1 = x0 + module;

        canvas.add_polygon(Polygon {
            rings: vec![vec![
                (Point::new(Mm(x0), Mm(y0)), false),
                (Point::new(Mm(x1), Mm(y0)), false),
                (Point::new(Mm(x1), Mm(y1)), false),
                (Point::new(Mm(x0), Mm(y1)), false),
            ]],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }
}
