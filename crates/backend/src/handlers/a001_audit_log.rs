use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use contracts::domain::a001_audit_log::dto::{LogListResponse, LogQuery};
use tokio_stream::StreamExt;

use super::server_error;
use crate::domain::a001_audit_log::export::{DocumentRenderer, ExportRenderer, SpreadsheetRenderer};
use crate::domain::a001_audit_log::service;
use crate::shared::data::db::get_connection;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/logs
pub async fn list_logs(
    user: CurrentUser,
    Query(query): Query<LogQuery>,
) -> Result<Json<LogListResponse>, Response> {
    service::list(get_connection(), &user.caller(), &query)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to list logs: {:#}", e);
            server_error()
        })
}

/// GET /api/logs/export/excel
pub async fn export_excel(user: CurrentUser, Query(query): Query<LogQuery>) -> Response {
    export(user, query, SpreadsheetRenderer::new()).await
}

/// GET /api/logs/export/pdf
pub async fn export_pdf(user: CurrentUser, Query(query): Query<LogQuery>) -> Response {
    export(user, query, DocumentRenderer::new()).await
}

/// Resolves the query and reads its first row before any byte is sent, so
/// identity and query failures still produce a clean 500. Only a failure
/// further into the result set cuts the body short.
async fn export<R: ExportRenderer + 'static>(
    user: CurrentUser,
    query: LogQuery,
    renderer: R,
) -> Response {
    let conn = get_connection();
    let source = match service::resolve(conn, &user.caller(), &query).await {
        Ok(resolution) => service::open_export(conn, resolution).await,
        Err(e) => Err(e),
    };
    let source = match source {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("Failed to prepare log export: {:#}", e);
            return server_error();
        }
    };

    let content_type = renderer.content_type();
    let disposition = format!("attachment; filename={}", renderer.file_name());

    let body = service::export_stream(source, renderer).map(|chunk| {
        if let Err(e) = &chunk {
            tracing::error!("Log export aborted: {}", e);
        }
        chunk
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(body))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to build export response: {}", e);
            server_error()
        })
}
