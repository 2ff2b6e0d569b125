//! File exports of a log query.
//!
//! Both formats consume the same ordered row stream as the listing and project
//! each row to the same nine columns. Renderers are push based so rows can be
//! written out as they arrive from the store.

pub mod document;
pub mod spreadsheet;

use contracts::domain::a001_audit_log::dto::LogEntryView;
use sea_orm::DbErr;
use thiserror::Error;

pub use document::DocumentRenderer;
pub use spreadsheet::SpreadsheetRenderer;

/// Column titles shared by every export format
pub const HEADERS: [&str; 9] = [
    "User",
    "Endpoint",
    "Method",
    "Timestamp",
    "Labnumber",
    "Action",
    "Status",
    "Message",
    "TimeMs",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("store error: {0}")]
    Store(#[from] DbErr),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export already finished")]
    Finished,
}

/// One exported row, columns in [`HEADERS`] order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub user: String,
    pub endpoint: String,
    pub method: String,
    pub timestamp: String,
    pub labnumber: String,
    pub action: String,
    pub status: String,
    pub message: String,
    pub time_ms: String,
}

impl ExportRow {
    pub fn fields(&self) -> [&str; 9] {
        [
            &self.user,
            &self.endpoint,
            &self.method,
            &self.timestamp,
            &self.labnumber,
            &self.action,
            &self.status,
            &self.message,
            &self.time_ms,
        ]
    }
}

impl From<&LogEntryView> for ExportRow {
    fn from(view: &LogEntryView) -> Self {
        let entry = &view.entry;
        Self {
            user: view.user_name.clone(),
            endpoint: entry.request.endpoint.clone(),
            method: entry.request.method.clone(),
            timestamp: entry.timestamp.clone(),
            labnumber: entry.labnumber.join(", "),
            action: entry.action.clone(),
            status: entry.response.status_code.clone(),
            message: entry.response.message.clone(),
            time_ms: entry.response.time_ms.to_string(),
        }
    }
}

/// Incremental file writer.
///
/// `begin` yields the preamble, `push` may hold rows back and return a chunk
/// once enough have accumulated, `finish` flushes whatever is left and closes
/// the file.
pub trait ExportRenderer: Send {
    fn content_type(&self) -> &'static str;

    fn file_name(&self) -> &'static str;

    fn begin(&mut self) -> Result<Vec<u8>, ExportError>;

    fn push(&mut self, row: &ExportRow) -> Result<Option<Vec<u8>>, ExportError>;

    fn finish(&mut self) -> Result<Vec<u8>, ExportError>;
}

/// Renders a whole row set in memory
#[cfg(test)]
pub fn render_all<R: ExportRenderer>(
    renderer: &mut R,
    rows: &[ExportRow],
) -> Result<Vec<u8>, ExportError> {
    let mut out = renderer.begin()?;
    for row in rows {
        if let Some(chunk) = renderer.push(row)? {
            out.extend(chunk);
        }
    }
    out.extend(renderer.finish()?);
    Ok(out)
}
