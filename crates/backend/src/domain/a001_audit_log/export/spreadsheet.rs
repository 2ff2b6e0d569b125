use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{ExportError, ExportRenderer, ExportRow, HEADERS};

const SHEET_NAME: &str = "Logs";
const SHEET_PATH: &str = "xl/worksheets/sheet1.xml";

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"</Types>"#,
);

const ROOT_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#,
);

const WORKBOOK_RELS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"</Relationships>"#,
);

const SHEET_OPEN: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<sheetData>"#,
);

const SHEET_CLOSE: &str = "</sheetData></worksheet>";

fn workbook() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        SHEET_NAME
    )
}

/// Excel workbook with a single `Logs` sheet, header row first.
///
/// The package is assembled in a deflated in-memory archive and handed out
/// whole by `finish`, since the zip central directory can only be written
/// once every row is known.
pub struct SpreadsheetRenderer {
    zip: Option<ZipWriter<Cursor<Vec<u8>>>>,
    next_row: usize,
}

impl SpreadsheetRenderer {
    pub fn new() -> Self {
        Self {
            zip: Some(ZipWriter::new(Cursor::new(Vec::new()))),
            next_row: 1,
        }
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
    }

    fn archive(&mut self) -> Result<&mut ZipWriter<Cursor<Vec<u8>>>, ExportError> {
        self.zip.as_mut().ok_or(ExportError::Finished)
    }

    fn write_row<'r>(&mut self, cells: impl IntoIterator<Item = Cell<'r>>) -> Result<(), ExportError> {
        let mut xml = format!(r#"<row r="{}">"#, self.next_row);
        for cell in cells {
            cell.write_to(&mut xml);
        }
        xml.push_str("</row>");
        self.next_row += 1;

        self.archive()?.write_all(xml.as_bytes())?;
        Ok(())
    }
}

impl Default for SpreadsheetRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportRenderer for SpreadsheetRenderer {
    fn content_type(&self) -> &'static str {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    }

    fn file_name(&self) -> &'static str {
        "logs.xlsx"
    }

    fn begin(&mut self) -> Result<Vec<u8>, ExportError> {
        let workbook = workbook();
        let zip = self.archive()?;
        let parts: [(&str, &str); 4] = [
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", &workbook),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ];
        for (name, body) in parts {
            zip.start_file(name, Self::options())?;
            zip.write_all(body.as_bytes())?;
        }

        zip.start_file(SHEET_PATH, Self::options())?;
        zip.write_all(SHEET_OPEN.as_bytes())?;
        self.write_row(HEADERS.iter().map(|h| Cell::Text(*h)))?;

        Ok(Vec::new())
    }

    fn push(&mut self, row: &ExportRow) -> Result<Option<Vec<u8>>, ExportError> {
        let mut cells: Vec<Cell> = row.fields()[..8].iter().map(|f| Cell::Text(*f)).collect();
        cells.push(match row.time_ms.parse::<i64>() {
            Ok(n) => Cell::Number(n),
            Err(_) => Cell::Text(&row.time_ms),
        });
        self.write_row(cells)?;
        Ok(None)
    }

    fn finish(&mut self) -> Result<Vec<u8>, ExportError> {
        let mut zip = self.zip.take().ok_or(ExportError::Finished)?;
        zip.write_all(SHEET_CLOSE.as_bytes())?;
        Ok(zip.finish()?.into_inner())
    }
}

enum Cell<'a> {
    Text(&'a str),
    Number(i64),
}

impl Cell<'_> {
    fn write_to(&self, xml: &mut String) {
        match self {
            Cell::Text(text) => {
                xml.push_str(r#"<c t="inlineStr"><is><t xml:space="preserve">"#);
                escape_into(xml, text);
                xml.push_str("</t></is></c>");
            }
            Cell::Number(n) => {
                xml.push_str("<c><v>");
                xml.push_str(&n.to_string());
                xml.push_str("</v></c>");
            }
        }
    }
}

/// XML text escaping; characters XML 1.0 cannot carry are dropped
fn escape_into(xml: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => xml.push_str("&amp;"),
            '<' => xml.push_str("&lt;"),
            '>' => xml.push_str("&gt;"),
            '"' => xml.push_str("&quot;"),
            '\t' | '\n' | '\r' => xml.push(ch),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => xml.push(c),
        }
    }
}

/// Cell texts of every row of the `Logs` sheet, header included
#[cfg(test)]
pub fn read_sheet(bytes: &[u8]) -> Vec<Vec<String>> {
    use std::io::Read;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name(SHEET_PATH)
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();

    let unescape = |s: &str| {
        s.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&amp;", "&")
    };
    let between = |s: &str, open: &str, close: &str| -> Option<String> {
        let start = s.find(open)? + open.len();
        let start = start + s[start..].find('>')? + 1;
        let end = start + s[start..].find(close)?;
        Some(unescape(&s[start..end]))
    };

    xml.split("<row ")
        .skip(1)
        .map(|row| {
            let row = &row[..row.find("</row>").unwrap()];
            row.split("<c")
                .skip(1)
                .map(|cell| {
                    between(cell, "<t", "</t>")
                        .or_else(|| between(cell, "<v", "</v>"))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_audit_log::export::render_all;
    use std::io::Read;

    fn row(n: usize, message: &str) -> ExportRow {
        ExportRow {
            user: "Ms.Aom S".to_string(),
            endpoint: "/api/lab/approve".to_string(),
            method: "POST".to_string(),
            timestamp: format!("2024-01-05T08:00:{:02}.000Z", n % 60),
            labnumber: "L1, L2".to_string(),
            action: "approve".to_string(),
            status: "200".to_string(),
            message: message.to_string(),
            time_ms: n.to_string(),
        }
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_header_only_workbook() {
        let mut renderer = SpreadsheetRenderer::new();
        assert_eq!(renderer.file_name(), "logs.xlsx");
        assert_eq!(
            renderer.content_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        let bytes = render_all(&mut renderer, &[]).unwrap();

        assert!(bytes.starts_with(b"PK\x03\x04"));
        assert_eq!(read_sheet(&bytes), vec![HEADERS.to_vec()]);
        assert!(part(&bytes, "xl/workbook.xml").contains(r#"<sheet name="Logs""#));
        assert!(part(&bytes, "[Content_Types].xml").contains("/xl/worksheets/sheet1.xml"));
    }

    #[test]
    fn test_cells_are_escaped_and_time_is_numeric() {
        let bytes = render_all(
            &mut SpreadsheetRenderer::new(),
            &[row(7, "a < b & \"c\"\u{1}")],
        )
        .unwrap();

        let sheet = part(&bytes, SHEET_PATH);
        assert!(sheet.contains("a &lt; b &amp; &quot;c&quot;</t>"));
        assert!(sheet.contains("<c><v>7</v></c></row>"));

        let rows = read_sheet(&bytes);
        assert_eq!(rows[1][7], "a < b & \"c\"");
        assert_eq!(rows[1][8], "7");
    }

    #[test]
    fn test_every_row_kept_in_order() {
        let rows: Vec<ExportRow> = (0..600).map(|n| row(n, "OK")).collect();
        let bytes = render_all(&mut SpreadsheetRenderer::new(), &rows).unwrap();

        let sheet = read_sheet(&bytes);
        assert_eq!(sheet.len(), rows.len() + 1);
        let times: Vec<&str> = sheet[1..].iter().map(|r| r[8].as_str()).collect();
        let expected: Vec<String> = (0..rows.len()).map(|n| n.to_string()).collect();
        assert_eq!(times, expected);
    }

    #[test]
    fn test_finish_closes_the_workbook() {
        let mut renderer = SpreadsheetRenderer::new();
        renderer.begin().unwrap();
        renderer.finish().unwrap();
        assert!(matches!(renderer.push(&row(1, "OK")), Err(ExportError::Finished)));
    }
}
