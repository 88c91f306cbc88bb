// 📄 Order List Export - Paginated PDF of the items to reorder
//
// Layout is computed first as plain data (ExportLayout) and only then drawn
// with printpdf, so pagination can be checked without parsing a PDF.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::error::{StockError, StockResult};
use crate::items::OrderLine;

pub const TITLE: &str = "Order List (Items Below Threshold)";
pub const COLUMN_HEADERS: [&str; 3] = ["Item", "Type", "Order Quantity"];
pub const FILE_NAME: &str = "order_list.pdf";

// ============================================================================
// PAGE GEOMETRY (points, origin bottom-left)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub title_x: f32,
    pub title_y: f32,
    pub header_y: f32,
    pub column_x: [f32; 3],
    pub first_row_y: f32,
    pub row_pitch: f32,
    pub bottom_margin: f32,
}

impl PageGeometry {
    /// US Letter, Helvetica 10.
    pub fn letter() -> Self {
        PageGeometry {
            width: 612.0,
            height: 792.0,
            font_size: 10.0,
            title_x: 200.0,
            title_y: 750.0,
            header_y: 720.0,
            column_x: [30.0, 150.0, 250.0],
            first_row_y: 700.0,
            row_pitch: 20.0,
            bottom_margin: 40.0,
        }
    }

    pub fn rows_per_page(&self) -> usize {
        if self.first_row_y < self.bottom_margin || self.row_pitch <= 0.0 {
            return 1;
        }
        ((self.first_row_y - self.bottom_margin) / self.row_pitch) as usize + 1
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::letter()
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    pub y: f32,
    pub cells: [String; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Only the first page carries the title.
    pub show_title: bool,
    pub rows: Vec<PlacedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportLayout {
    pub geometry: PageGeometry,
    pub pages: Vec<PageLayout>,
}

impl ExportLayout {
    pub fn new(lines: &[OrderLine], geometry: PageGeometry) -> Self {
        let per_page = geometry.rows_per_page();
        let mut pages: Vec<PageLayout> = lines
            .chunks(per_page)
            .enumerate()
            .map(|(page_index, chunk)| PageLayout {
                show_title: page_index == 0,
                rows: chunk
                    .iter()
                    .enumerate()
                    .map(|(i, line)| PlacedRow {
                        y: geometry.first_row_y - geometry.row_pitch * i as f32,
                        cells: [
                            line.item.clone(),
                            line.item_type.to_string(),
                            line.order_quantity.to_string(),
                        ],
                    })
                    .collect(),
            })
            .collect();

        if pages.is_empty() {
            pages.push(PageLayout {
                show_title: true,
                rows: Vec::new(),
            });
        }

        ExportLayout { geometry, pages }
    }

    /// All rows across pages, in drawing order.
    pub fn rows(&self) -> impl Iterator<Item = &PlacedRow> {
        self.pages.iter().flat_map(|page| page.rows.iter())
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn pt(value: f32) -> Mm {
    Mm(value * 25.4 / 72.0)
}

fn draw_page(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    geometry: &PageGeometry,
    page: &PageLayout,
) {
    let size = geometry.font_size;

    if page.show_title {
        layer.use_text(TITLE, size, pt(geometry.title_x), pt(geometry.title_y), font);
    }
    for (x, header) in geometry.column_x.iter().zip(COLUMN_HEADERS) {
        layer.use_text(header, size, pt(*x), pt(geometry.header_y), font);
    }
    for row in &page.rows {
        for (x, cell) in geometry.column_x.iter().zip(&row.cells) {
            layer.use_text(cell.as_str(), size, pt(*x), pt(row.y), font);
        }
    }
}

/// Draw a computed layout into PDF bytes.
pub fn render_layout(layout: &ExportLayout) -> StockResult<Vec<u8>> {
    let geometry = &layout.geometry;
    let (width, height) = (pt(geometry.width), pt(geometry.height));

    let (doc, first_page, first_layer) = PdfDocument::new(TITLE, width, height, "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| StockError::Export(e.to_string()))?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) = doc.add_page(width, height, format!("Layer {}", index + 1));
            doc.get_page(page_index).get_layer(layer_index)
        };
        draw_page(&layer, &font, geometry, page);
    }

    doc.save_to_bytes()
        .map_err(|e| StockError::Export(e.to_string()))
}

/// Order list to PDF bytes on US Letter.
pub fn render_order_list(lines: &[OrderLine]) -> StockResult<Vec<u8>> {
    let layout = ExportLayout::new(lines, PageGeometry::letter());
    tracing::debug!(rows = lines.len(), pages = layout.pages.len(), "rendering order list");
    render_layout(&layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ItemType;

    fn line(item: &str, qty: i64) -> OrderLine {
        OrderLine {
            item: item.to_string(),
            item_type: ItemType::Box,
            order_quantity: qty,
        }
    }

    #[test]
    fn test_flour_layout_matches_input() {
        let layout = ExportLayout::new(&[line("Flour", 5)], PageGeometry::letter());

        assert_eq!(layout.pages.len(), 1);
        let rows: Vec<_> = layout.rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells, ["Flour".to_string(), "box".to_string(), "5".to_string()]);
        assert_eq!(rows[0].y, 700.0);
    }

    #[test]
    fn test_rows_step_down_the_page() {
        let layout = ExportLayout::new(&[line("A", 1), line("B", 2), line("C", 3)], PageGeometry::letter());
        let ys: Vec<f32> = layout.rows().map(|r| r.y).collect();
        assert_eq!(ys, vec![700.0, 680.0, 660.0]);
    }

    #[test]
    fn test_overflow_starts_new_page() {
        let geometry = PageGeometry::letter();
        let per_page = geometry.rows_per_page();
        assert_eq!(per_page, 34);

        let lines: Vec<_> = (0..per_page + 5).map(|i| line(&format!("item-{i}"), 1)).collect();
        let layout = ExportLayout::new(&lines, geometry);

        assert_eq!(layout.pages.len(), 2);
        assert!(layout.pages[0].show_title);
        assert!(!layout.pages[1].show_title);
        assert_eq!(layout.pages[1].rows.len(), 5);
        assert_eq!(layout.pages[1].rows[0].y, 700.0);

        // Every row stays above the bottom margin
        assert!(layout.rows().all(|r| r.y >= geometry.bottom_margin));

        // Order preserved across pages
        let names: Vec<_> = layout.rows().map(|r| r.cells[0].clone()).collect();
        let expected: Vec<_> = lines.iter().map(|l| l.item.clone()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_empty_list_has_one_page() {
        let layout = ExportLayout::new(&[], PageGeometry::letter());
        assert_eq!(layout.pages.len(), 1);
        assert!(layout.pages[0].rows.is_empty());
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render_order_list(&[line("Flour", 5)]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    /// Text operands in uncompressed page streams, as written by the PDF writer.
    fn hex_operand(text: &str) -> Vec<u8> {
        let hex: String = text.bytes().map(|b| format!("{b:02X}")).collect();
        format!("<{hex}>").into_bytes()
    }

    fn find_from(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
        haystack[start..]
            .windows(needle.len())
            .position(|window| window == needle)
            .map(|offset| start + offset)
    }

    #[test]
    fn test_render_draws_every_cell_in_order() {
        let lines = vec![
            line("Flour", 5),
            OrderLine {
                item: "Butter".to_string(),
                item_type: ItemType::Tub,
                order_quantity: 12,
            },
        ];
        let bytes = render_order_list(&lines).unwrap();

        let mut cursor = 0;
        for header in COLUMN_HEADERS {
            cursor = find_from(&bytes, &hex_operand(header), cursor).expect("header drawn");
        }
        for cell in ["Flour", "box", "5", "Butter", "tub", "12"] {
            cursor = find_from(&bytes, &hex_operand(cell), cursor)
                .unwrap_or_else(|| panic!("{cell} missing or out of order"));
        }
    }
}
