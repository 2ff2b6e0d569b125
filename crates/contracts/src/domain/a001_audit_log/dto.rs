use serde::{Deserialize, Serialize};

/// Request part of a log entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub method: String,
    pub endpoint: String,
}

/// Response part of a log entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
    pub status_code: String,
    pub message: String,
    pub time_ms: i64,
}

/// One immutable audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub action: String,
    pub labnumber: Vec<String>,
    pub request: RequestInfo,
    pub response: ResponseInfo,
    pub user_id: String,
}

/// Log entry with the owner's display name attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryView {
    #[serde(flatten)]
    pub entry: LogEntry,
    pub user_name: String,
}

/// Raw criteria of GET /api/logs and the export routes.
///
/// Every field is kept as an optional string: malformed values are coerced to
/// defaults on the server, they never reject the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    pub action: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub status_code: Option<String>,
    pub labnumber: Option<String>,
    pub min_time_ms: Option<String>,
    pub max_time_ms: Option<String>,
    pub user_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Response of GET /api/logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogListResponse {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub data: Vec<LogEntryView>,
}
