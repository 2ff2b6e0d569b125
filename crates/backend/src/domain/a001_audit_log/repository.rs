use chrono::{DateTime, SecondsFormat, Utc};
use contracts::domain::a001_audit_log::dto::{LogEntry, RequestInfo, ResponseInfo};
use sea_orm::entity::prelude::*;
use sea_orm::{Condition, ConnectionTrait, QueryFilter, QuerySelect, StreamTrait};
use tokio_stream::{Stream, StreamExt};

use super::pagination::PageWindow;
use super::sort::SortSpec;

/// Audit log row. The log is append-only; this service only reads it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    /// JSON array of strings
    pub labnumbers: String,
    pub request_method: String,
    pub request_endpoint: String,
    pub response_status_code: String,
    pub response_message: String,
    pub response_time_ms: i64,
    pub user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LogEntry {
    fn from(m: Model) -> Self {
        // A malformed labnumber column reads back as an empty set
        let labnumber = serde_json::from_str::<Vec<String>>(&m.labnumbers).unwrap_or_default();
        LogEntry {
            id: m.id,
            timestamp: m.timestamp,
            action: m.action,
            labnumber,
            request: RequestInfo {
                method: m.request_method,
                endpoint: m.request_endpoint,
            },
            response: ResponseInfo {
                status_code: m.response_status_code,
                message: m.response_message,
                time_ms: m.response_time_ms,
            },
            user_id: m.user_id,
        }
    }
}

/// Storage form of a timestamp: RFC 3339, UTC, milliseconds, `Z` suffix.
/// Fixed width keeps text order equal to time order.
///
/// Range filters and the timestamp sort compare the `timestamp` column as
/// text, so every writer of `audit_log` must store exactly this form
/// (`YYYY-MM-DDTHH:MM:SS.mmmZ`). Rows in any other shape sort and filter
/// wrongly.
pub fn storage_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Number of entries matching the condition, independent of any page window
pub async fn count<C: ConnectionTrait>(conn: &C, condition: Condition) -> Result<u64, DbErr> {
    Entity::find().filter(condition).count(conn).await
}

/// One page of matching entries in sort order
pub async fn fetch_page<C: ConnectionTrait>(
    conn: &C,
    condition: Condition,
    sort: SortSpec,
    window: PageWindow,
) -> Result<Vec<LogEntry>, DbErr> {
    let rows = sort
        .apply(Entity::find().filter(condition))
        .limit(window.limit)
        .offset(window.offset())
        .all(conn)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Every matching entry in sort order, read row by row from the store
pub async fn stream_all<'a, C>(
    conn: &'a C,
    condition: Condition,
    sort: SortSpec,
) -> Result<impl Stream<Item = Result<LogEntry, DbErr>> + Send + 'a, DbErr>
where
    C: ConnectionTrait + StreamTrait + Send,
{
    let rows = sort
        .apply(Entity::find().filter(condition))
        .stream(conn)
        .await?;

    Ok(rows.map(|row| row.map(LogEntry::from)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn model(labnumbers: &str) -> Model {
        Model {
            id: 1,
            timestamp: "2024-01-05T08:00:00.000Z".to_string(),
            action: "approve".to_string(),
            labnumbers: labnumbers.to_string(),
            request_method: "POST".to_string(),
            request_endpoint: "/api/lab/approve".to_string(),
            response_status_code: "200".to_string(),
            response_message: "OK".to_string(),
            response_time_ms: 42,
            user_id: "u-1".to_string(),
        }
    }

    #[test]
    fn test_model_to_entry() {
        let entry = LogEntry::from(model(r#"["L001","L002"]"#));
        assert_eq!(entry.labnumber, vec!["L001", "L002"]);
        assert_eq!(entry.request.endpoint, "/api/lab/approve");
        assert_eq!(entry.response.time_ms, 42);
    }

    #[test]
    fn test_malformed_labnumbers_read_as_empty() {
        assert!(LogEntry::from(model("L001")).labnumber.is_empty());
    }

    #[test]
    fn test_storage_timestamp_is_fixed_width() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        assert_eq!(storage_timestamp(&ts), "2024-01-05T08:00:00.000Z");

        let later = ts + chrono::Duration::milliseconds(5);
        assert_eq!(storage_timestamp(&later), "2024-01-05T08:00:00.005Z");
        assert_eq!(storage_timestamp(&later).len(), storage_timestamp(&ts).len());
        assert!(storage_timestamp(&later) > storage_timestamp(&ts));
    }
}
