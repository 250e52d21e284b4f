//! PDF text extraction using lopdf and pdf-extract.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{PageContent, PageInput, PdfSource, Result};
use crate::error::PdfError;
use crate::models::config::ExtractionMode;
use crate::models::report::PositionedFragment;

/// Fallback page height (US Letter) when no MediaBox can be resolved.
const DEFAULT_PAGE_TOP: f32 = 792.0;

/// PDF source reading positioned text runs straight from page content streams.
///
/// Pages whose content yields no text fall back to pdf-extract's plain text
/// in [`ExtractionMode::Auto`].
pub struct LopdfSource {
    mode: ExtractionMode,
}

impl LopdfSource {
    /// Create a new source using the given extraction mode.
    pub fn new(mode: ExtractionMode) -> Self {
        Self { mode }
    }

    /// Load the document, trying an empty password on encrypted files.
    ///
    /// Returns the document plus the bytes pdf-extract should read.
    fn open(&self, data: &[u8]) -> Result<(Document, Vec<u8>)> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        Ok((doc, raw))
    }

    fn text_pages(raw: &[u8]) -> Result<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(raw)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

impl Default for LopdfSource {
    fn default() -> Self {
        Self::new(ExtractionMode::Auto)
    }
}

impl PdfSource for LopdfSource {
    fn load_pages(&self, data: &[u8]) -> Result<Vec<PageInput>> {
        let (doc, raw) = self.open(data)?;
        let pages = doc.get_pages();
        debug!("Loaded PDF with {} pages", pages.len());

        if self.mode == ExtractionMode::Text {
            return Ok(Self::text_pages(&raw)?
                .into_iter()
                .enumerate()
                .map(|(i, text)| PageInput {
                    number: i as u32 + 1,
                    content: PageContent::Lines(text.lines().map(str::to_string).collect()),
                })
                .collect());
        }

        let mut inputs = Vec::with_capacity(pages.len());
        for (&number, &page_id) in &pages {
            let fragments = extract_page_fragments(&doc, page_id)?;
            trace!("Page {} yielded {} fragments", number, fragments.len());
            inputs.push(PageInput {
                number,
                content: PageContent::Fragments(fragments),
            });
        }

        if self.mode == ExtractionMode::Auto && inputs.iter().any(|p| p.content.is_empty()) {
            match Self::text_pages(&raw) {
                Ok(texts) => {
                    for page in inputs.iter_mut().filter(|p| p.content.is_empty()) {
                        if let Some(text) = texts.get(page.number as usize - 1) {
                            debug!("Page {} has no positioned text, using plain text", page.number);
                            page.content =
                                PageContent::Lines(text.lines().map(str::to_string).collect());
                        }
                    }
                }
                Err(e) => warn!("Plain text fallback failed: {}", e),
            }
        }

        Ok(inputs)
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}

/// Walk one page's content stream and collect text runs with top-down coordinates.
fn extract_page_fragments(doc: &Document, page_id: ObjectId) -> Result<Vec<PositionedFragment>> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| PdfError::Parse(e.to_string()))?;

    let page_top = page_top(doc, page_id).unwrap_or(DEFAULT_PAGE_TOP);
    let mut state = TextState::default();
    let mut saved: Vec<Matrix> = Vec::new();
    let mut fragments = Vec::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => saved.push(state.ctm),
            "Q" => {
                if let Some(ctm) = saved.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix(operands) {
                    state.ctm = multiply(&m, &state.ctm);
                }
            }
            "BT" => {
                state.in_text = true;
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "ET" => state.in_text = false,
            "Tf" => {
                if let Some(Ok(name)) = operands.first().map(Object::as_name) {
                    state.font = String::from_utf8_lossy(name).to_string();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = Some(leading);
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = Some(-ty);
                }
                state.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(m) = matrix(operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(|o| decode(o, doc, &fonts, &state.font)) {
                    state.emit(text, page_top, &mut fragments);
                }
            }
            "TJ" => {
                if let Some(Ok(array)) = operands.first().map(Object::as_array) {
                    let combined =
                        join_tj(array, |item| decode(item, doc, &fonts, &state.font));
                    state.emit(combined, page_top, &mut fragments);
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = operands.first().and_then(|o| decode(o, doc, &fonts, &state.font)) {
                    state.emit(text, page_top, &mut fragments);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = operands.get(2).and_then(|o| decode(o, doc, &fonts, &state.font)) {
                    state.emit(text, page_top, &mut fragments);
                }
            }
            _ => {}
        }
    }

    Ok(fragments)
}

/// Kerning offset (thousandths of an em) wide enough to read as a word gap.
const TJ_WORD_GAP: f32 = 200.0;

/// Join the string pieces of a `TJ` array, turning wide negative offsets into spaces.
fn join_tj(items: &[Object], mut decode: impl FnMut(&Object) -> Option<String>) -> String {
    let mut combined = String::new();
    for item in items {
        if let Some(offset) = number(item) {
            if -offset >= TJ_WORD_GAP && !combined.is_empty() && !combined.ends_with(' ') {
                combined.push(' ');
            }
        } else if let Some(text) = decode(item) {
            combined.push_str(&text);
        }
    }
    combined
}

/// Affine matrix `[a b c d e f]` in PDF row-vector form.
type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `lhs × rhs`.
fn multiply(lhs: &Matrix, rhs: &Matrix) -> Matrix {
    let [a1, b1, c1, d1, e1, f1] = *lhs;
    let [a2, b2, c2, d2, e2, f2] = *rhs;
    [
        a1 * a2 + b1 * c2,
        a1 * b2 + b1 * d2,
        c1 * a2 + d1 * c2,
        c1 * b2 + d1 * d2,
        e1 * a2 + f1 * c2 + e2,
        e1 * b2 + f1 * d2 + f2,
    ]
}

fn matrix(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(m)
}

/// Graphics and text state tracked while walking a content stream.
struct TextState {
    in_text: bool,
    font: String,
    font_size: f32,
    leading: Option<f32>,
    ctm: Matrix,
    text_matrix: Matrix,
    line_matrix: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            in_text: false,
            font: String::new(),
            font_size: 12.0,
            leading: None,
            ctm: IDENTITY,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.leading.unwrap_or(self.font_size * 1.2);
        self.move_line(0.0, -leading);
    }

    /// Text origin in default user space.
    fn origin(&self) -> (f32, f32) {
        let device = multiply(&self.text_matrix, &self.ctm);
        (device[4], device[5])
    }

    fn emit(&self, text: String, page_top: f32, out: &mut Vec<PositionedFragment>) {
        if !self.in_text || text.trim().is_empty() {
            return;
        }
        let (x, y) = self.origin();
        out.push(PositionedFragment {
            text,
            x,
            y: page_top - y,
        });
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode a string operand through the current font's encoding.
fn decode(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    current_font: &str,
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    Some(bytes.iter().map(|&b| b as char).collect())
}

/// Top edge of the page (MediaBox `ury`), following page-tree inheritance.
fn page_top(doc: &Document, page_id: ObjectId) -> Option<f32> {
    let mut node_id = page_id;
    // Page trees are shallow; the bound guards against reference cycles.
    for _ in 0..32 {
        let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
            return None;
        };

        if let Ok(media_box) = dict.get(b"MediaBox") {
            if let Ok((_, Object::Array(values))) = doc.dereference(media_box) {
                return values.get(3).and_then(number);
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node_id = *parent_id,
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream};

    /// Build a one-page Letter PDF from raw content operations.
    fn build_page(operations: Vec<Operation>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// One Helvetica `Tj` run per `(x, y, text)`, positioned with `Td`.
    fn build_pdf(runs: &[(i64, i64, &str)]) -> Vec<u8> {
        let mut operations = Vec::new();
        for (x, y, text) in runs {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
            operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        build_page(operations)
    }

    fn positioned(pdf: &[u8]) -> Vec<PositionedFragment> {
        let mut pages = LopdfSource::new(ExtractionMode::Positioned)
            .load_pages(pdf)
            .unwrap();
        match pages.remove(0).content {
            PageContent::Fragments(fragments) => fragments,
            PageContent::Lines(_) => panic!("expected positioned fragments"),
        }
    }

    #[test]
    fn test_positioned_fragments_are_top_down() {
        let pdf = build_pdf(&[(20, 700, "Department: Deli"), (20, 650, "12345-01")]);
        let pages = LopdfSource::new(ExtractionMode::Positioned)
            .load_pages(&pdf)
            .unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 1);
        let PageContent::Fragments(fragments) = &pages[0].content else {
            panic!("expected positioned fragments");
        };
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "Department: Deli");
        assert_eq!(fragments[0].x, 20.0);
        assert_eq!(fragments[0].y, 92.0);
        assert!(fragments[1].y > fragments[0].y);
    }

    #[test]
    fn test_flipped_ctm_keeps_reading_order() {
        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![1.into(), 0.into(), 0.into(), (-1).into(), 0.into(), 792.into()],
            ),
        ];
        for (y, text) in [(50, "Department: Deli"), (80, "Conf # Date User"), (110, "12345-01 03/14 ABC")] {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 9.into()]));
            operations.push(Operation::new(
                "Tm",
                vec![1.into(), 0.into(), 0.into(), (-1).into(), 20.into(), y.into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        operations.push(Operation::new("Q", vec![]));
        // Drawn after Q: back in unflipped space.
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Td", vec![20.into(), 42.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal("Total")]));
        operations.push(Operation::new("ET", vec![]));

        let fragments = positioned(&build_page(operations));
        let ys: Vec<f32> = fragments.iter().map(|f| f.y).collect();
        assert_eq!(ys, vec![50.0, 80.0, 110.0, 750.0]);
        assert!(fragments.iter().all(|f| f.x == 20.0));
    }

    #[test]
    fn test_td_moves_along_scaled_line_matrix() {
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tm",
                vec![2.into(), 0.into(), 0.into(), 2.into(), 10.into(), 700.into()],
            ),
            Operation::new("Td", vec![5.into(), (-10).into()]),
            Operation::new("Tj", vec![Object::string_literal("Deli")]),
            Operation::new("ET", vec![]),
        ];

        let fragments = positioned(&build_page(operations));
        assert_eq!(fragments[0].x, 20.0);
        assert_eq!(fragments[0].y, 112.0);
    }

    #[test]
    fn test_tj_kerning_gaps_split_words() {
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 9.into()]),
            Operation::new("Td", vec![20.into(), 700.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("12345-01"),
                    (-3000).into(),
                    Object::string_literal("03/14"),
                    (-3000).into(),
                    Object::string_literal("AB"),
                    (-40).into(),
                    Object::string_literal("C"),
                ])],
            ),
            Operation::new("ET", vec![]),
        ];

        let fragments = positioned(&build_page(operations));
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "12345-01 03/14 ABC");
    }

    #[test]
    fn test_join_tj_ignores_leading_gap() {
        let items = vec![
            (-500).into(),
            Object::string_literal("Deli"),
            Object::Real(-250.0),
            Object::string_literal("Meat"),
        ];
        let joined = join_tj(&items, |item| match item {
            Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        });
        assert_eq!(joined, "Deli Meat");
    }

    #[test]
    fn test_rejects_garbage() {
        let err = LopdfSource::default().load_pages(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_next_line_uses_leading() {
        let mut state = TextState {
            leading: Some(14.0),
            ..TextState::default()
        };
        state.line_matrix[5] = 700.0;
        state.next_line();
        assert_eq!(state.text_matrix[5], 686.0);
    }
}
