//! Minimal streaming PDF 1.4 writer for the log report.
//!
//! Landscape A4, one built-in monospaced font, plain text lines. Each page is
//! emitted as soon as it is full; the page tree and cross-reference table go
//! out at the end, once every object offset is known.

use super::{ExportError, ExportRenderer, ExportRow, HEADERS};

const PAGE_WIDTH: u32 = 842;
const PAGE_HEIGHT: u32 = 595;
const MARGIN: u32 = 36;
const FONT_SIZE: u32 = 7;
const TITLE_SIZE: u32 = 14;
const LEADING: u32 = 9;
/// Courier advances 0.6 em per glyph: (842 - 2 * 36) / (0.6 * 7)
const CHARS_PER_LINE: usize = 183;
/// (595 - 2 * 36) / 9
const LINES_PER_PAGE: usize = 58;
/// Title plus the blank line below it
const TITLE_LINES: usize = 2;

const TITLE: &str = "Logs Report";
const SEPARATOR: &str = " | ";

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_ID: usize = 3;

pub struct DocumentRenderer {
    /// Bytes handed out so far
    written: usize,
    /// Byte offset of object `n` at index `n - 1`
    offsets: Vec<usize>,
    page_ids: Vec<usize>,
    content: Vec<u8>,
    lines_on_page: usize,
}

impl DocumentRenderer {
    pub fn new() -> Self {
        Self {
            written: 0,
            offsets: Vec::new(),
            page_ids: Vec::new(),
            content: Vec::new(),
            lines_on_page: 0,
        }
    }

    fn next_id(&self) -> usize {
        self.offsets.len() + 1
    }

    /// Appends `id 0 obj ... endobj` to `out`, recording its file offset
    fn write_object(&mut self, out: &mut Vec<u8>, id: usize, body: &[u8]) {
        let offset = self.written + out.len();
        if id > self.offsets.len() {
            self.offsets.resize(id, 0);
        }
        self.offsets[id - 1] = offset;

        out.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    fn sent(&mut self, out: Vec<u8>) -> Vec<u8> {
        self.written += out.len();
        out
    }

    fn start_page(&mut self) {
        self.content = format!(
            "BT\n/F1 {} Tf\n{} TL\n{} {} Td\n",
            FONT_SIZE,
            LEADING,
            MARGIN,
            PAGE_HEIGHT - MARGIN - FONT_SIZE
        )
        .into_bytes();
        self.lines_on_page = 0;
    }

    fn add_title(&mut self) {
        self.content.extend_from_slice(
            format!(
                "/F1 {} Tf\n({}) Tj\n/F1 {} Tf\nT* T*\n",
                TITLE_SIZE, TITLE, FONT_SIZE
            )
            .as_bytes(),
        );
        self.lines_on_page += TITLE_LINES;
    }

    /// Adds one logical line, wrapping it and breaking pages as needed.
    /// Returns the bytes of any pages completed on the way.
    fn add_line(&mut self, text: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for segment in wrap(text) {
            if self.lines_on_page >= LINES_PER_PAGE {
                self.close_page(&mut out);
                self.start_page();
            }
            self.content.push(b'(');
            self.content.extend(segment);
            self.content.extend_from_slice(b") Tj T*\n");
            self.lines_on_page += 1;
        }
        out
    }

    fn close_page(&mut self, out: &mut Vec<u8>) {
        let mut content = std::mem::take(&mut self.content);
        content.extend_from_slice(b"ET");

        let content_id = self.next_id();
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend(content);
        stream.extend_from_slice(b"\nendstream");
        self.write_object(out, content_id, &stream);

        let page_id = self.next_id();
        let page = format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
            PAGES_ID, PAGE_WIDTH, PAGE_HEIGHT, FONT_ID, content_id
        );
        self.write_object(out, page_id, page.as_bytes());
        self.page_ids.push(page_id);
        self.lines_on_page = 0;
    }
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportRenderer for DocumentRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn file_name(&self) -> &'static str {
        "logs.pdf"
    }

    fn begin(&mut self) -> Result<Vec<u8>, ExportError> {
        let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();

        let catalog = format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID);
        self.write_object(&mut out, CATALOG_ID, catalog.as_bytes());
        self.write_object(
            &mut out,
            FONT_ID,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>",
        );

        self.start_page();
        self.add_title();
        out.extend(self.add_line(&HEADERS.join(SEPARATOR)));

        Ok(self.sent(out))
    }

    fn push(&mut self, row: &ExportRow) -> Result<Option<Vec<u8>>, ExportError> {
        let out = self.add_line(&row.fields().join(SEPARATOR));
        if out.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.sent(out)))
    }

    fn finish(&mut self) -> Result<Vec<u8>, ExportError> {
        let mut out = Vec::new();
        self.close_page(&mut out);

        let kids = self
            .page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        let pages = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            self.page_ids.len()
        );
        self.write_object(&mut out, PAGES_ID, pages.as_bytes());

        let xref_offset = self.written + out.len();
        let size = self.offsets.len() + 1;
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", size).as_bytes());
        for offset in &self.offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                size, CATALOG_ID, xref_offset
            )
            .as_bytes(),
        );

        Ok(self.sent(out))
    }
}

/// WinAnsi byte of a character, `?` for anything the encoding lacks
fn encode_char(c: char) -> u8 {
    match c as u32 {
        0x09 | 0x0A | 0x0D => b' ',
        code @ 0x20..=0x7E => code as u8,
        code @ 0xA0..=0xFF => code as u8,
        _ => b'?',
    }
}

/// Splits text into line-sized runs of encoded, string-escaped bytes
fn wrap(text: &str) -> Vec<Vec<u8>> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![Vec::new()];
    }

    chars
        .chunks(CHARS_PER_LINE)
        .map(|chunk| {
            let mut line = Vec::with_capacity(chunk.len());
            for &c in chunk {
                let byte = encode_char(c);
                if matches!(byte, b'\\' | b'(' | b')') {
                    line.push(b'\\');
                }
                line.push(byte);
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_audit_log::export::render_all;

    fn row(message: &str) -> ExportRow {
        ExportRow {
            user: "Ms.Aom S".to_string(),
            endpoint: "/api/lab/approve".to_string(),
            method: "POST".to_string(),
            timestamp: "2024-01-05T08:00:00.000Z".to_string(),
            labnumber: "L1".to_string(),
            action: "approve".to_string(),
            status: "200".to_string(),
            message: message.to_string(),
            time_ms: "15".to_string(),
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    /// Every xref entry must point at the start of its object
    fn assert_xref_consistent(pdf: &[u8]) {
        let xref_at = find(pdf, b"\nxref\n").unwrap() + 1;
        let table = std::str::from_utf8(&pdf[xref_at..]).unwrap();
        let mut lines = table.lines().skip(1);
        let size: usize = lines
            .next()
            .unwrap()
            .split(' ')
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        lines.next();

        for id in 1..size {
            let offset: usize = lines.next().unwrap()[..10].parse().unwrap();
            let expected = format!("{} 0 obj", id);
            assert!(pdf[offset..].starts_with(expected.as_bytes()), "object {}", id);
        }

        let startxref: usize = table
            .lines()
            .skip_while(|l| *l != "startxref")
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(startxref, xref_at);
    }

    #[test]
    fn test_empty_report_has_title_and_header() {
        let pdf = render_all(&mut DocumentRenderer::new(), &[]).unwrap();

        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(find(&pdf, b"(Logs Report) Tj").is_some());
        assert!(find(&pdf, b"(User | Endpoint | Method | Timestamp").is_some());
        assert!(find(&pdf, b"/Count 1 >>").is_some());
        assert_xref_consistent(&pdf);
    }

    #[test]
    fn test_rows_flow_onto_new_pages() {
        let first_page_rows = LINES_PER_PAGE - TITLE_LINES - 1;
        let rows: Vec<ExportRow> = (0..first_page_rows + 1).map(|_| row("OK")).collect();

        let mut renderer = DocumentRenderer::new();
        let mut out = renderer.begin().unwrap();
        let mut emitted = 0;
        for r in &rows {
            if let Some(chunk) = renderer.push(r).unwrap() {
                emitted += 1;
                out.extend(chunk);
            }
        }
        out.extend(renderer.finish().unwrap());

        assert_eq!(emitted, 1);
        assert!(find(&out, b"/Count 2 >>").is_some());
        assert_eq!(count(&out, b"/Type /Page "), 2);
        assert_eq!(count(&out, b"| approve | 200 | OK | 15) Tj"), rows.len());
        assert_xref_consistent(&out);
    }

    #[test]
    fn test_long_lines_wrap() {
        let long = row(&"x".repeat(CHARS_PER_LINE * 2));
        let pdf = render_all(&mut DocumentRenderer::new(), &[long.clone()]).unwrap();

        let line: Vec<char> = long.fields().join(SEPARATOR).chars().collect();
        let segments: Vec<String> = line
            .chunks(CHARS_PER_LINE)
            .map(|chunk| chunk.iter().collect())
            .collect();
        assert_eq!(segments.len(), 3);
        for segment in &segments {
            let shown = format!("({}) Tj", segment);
            assert!(find(&pdf, shown.as_bytes()).is_some());
        }
        assert_xref_consistent(&pdf);
    }

    #[test]
    fn test_text_is_escaped_and_encoded() {
        assert_eq!(wrap("a(b)\\c"), vec![b"a\\(b\\)\\\\c".to_vec()]);
        assert_eq!(wrap("ยาA"), vec![b"??A".to_vec()]);
        assert_eq!(wrap("caf\u{e9}"), vec![b"caf\xE9".to_vec()]);
        assert_eq!(wrap(""), vec![Vec::<u8>::new()]);
    }
}
