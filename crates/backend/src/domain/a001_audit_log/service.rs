use anyhow::{Context, Result};
use axum::body::Bytes;
use contracts::domain::a001_audit_log::dto::{LogEntry, LogListResponse, LogQuery};
use sea_orm::{ConnectionTrait, DbErr, StreamTrait};
use std::pin::Pin;
use tokio_stream::{Stream, StreamExt};

use super::enrich::OwnerDirectory;
use super::export::{ExportError, ExportRenderer, ExportRow};
use super::filter::{Caller, LogFilter};
use super::pagination::PageWindow;
use super::repository;
use super::sort::SortSpec;
use crate::system::users;

/// Everything a listing or an export needs, resolved once per request
#[derive(Debug)]
pub struct QueryPlan {
    pub filter: LogFilter,
    pub sort: SortSpec,
    pub owners: OwnerDirectory,
}

#[derive(Debug)]
pub enum Resolution {
    /// The requested owner is not visible to the caller
    NoVisibleOwner,
    Plan(QueryPlan),
}

/// Reads the identity table once and turns raw criteria into a plan.
/// Shared by the listing and both exports so they can never disagree.
pub async fn resolve<C: ConnectionTrait>(
    conn: &C,
    caller: &Caller,
    query: &LogQuery,
) -> Result<Resolution> {
    let identities = users::repository::list(conn, true)
        .await
        .context("Failed to read identities")?;
    let owners = OwnerDirectory::from_users(identities);
    let sort = SortSpec::from_params(query.sort_by.as_deref(), query.sort_dir.as_deref());

    Ok(match LogFilter::build(query, caller, &owners) {
        Some(filter) => Resolution::Plan(QueryPlan {
            filter,
            sort,
            owners,
        }),
        None => Resolution::NoVisibleOwner,
    })
}

/// One page of the log plus the total number of matches
pub async fn list<C: ConnectionTrait>(
    conn: &C,
    caller: &Caller,
    query: &LogQuery,
) -> Result<LogListResponse> {
    let window = PageWindow::from_params(query.page.as_deref(), query.limit.as_deref());

    let plan = match resolve(conn, caller, query).await? {
        Resolution::Plan(plan) => plan,
        Resolution::NoVisibleOwner => {
            return Ok(LogListResponse {
                total: 0,
                page: window.page,
                limit: window.limit,
                data: Vec::new(),
            })
        }
    };

    let condition = plan.filter.condition();
    let total = repository::count(conn, condition.clone())
        .await
        .context("Failed to count log entries")?;
    let entries = repository::fetch_page(conn, condition, plan.sort, window)
        .await
        .context("Failed to read log entries")?;

    Ok(LogListResponse {
        total,
        page: window.page,
        limit: window.limit,
        data: entries
            .into_iter()
            .map(|entry| plan.owners.enrich(entry))
            .collect(),
    })
}

type RowStream<'a> = Pin<Box<dyn Stream<Item = Result<LogEntry, DbErr>> + Send + 'a>>;

/// Rows of an export whose query has already been accepted by the store
pub struct ExportSource<'a> {
    owners: OwnerDirectory,
    first: Option<LogEntry>,
    rest: Option<RowStream<'a>>,
}

/// Runs the export query and reads its first row.
///
/// Anything the store rejects up front (bad SQL, missing table, locked
/// database) fails here, before a response has been committed.
pub async fn open_export<'a, C>(conn: &'a C, resolution: Resolution) -> Result<ExportSource<'a>>
where
    C: ConnectionTrait + StreamTrait + Send + Sync,
{
    let plan = match resolution {
        Resolution::Plan(plan) => plan,
        Resolution::NoVisibleOwner => {
            return Ok(ExportSource {
                owners: OwnerDirectory::default(),
                first: None,
                rest: None,
            })
        }
    };

    let mut rows: RowStream<'a> = Box::pin(
        repository::stream_all(conn, plan.filter.condition(), plan.sort)
            .await
            .context("Failed to query log entries")?,
    );
    let first = rows
        .next()
        .await
        .transpose()
        .context("Failed to read log entries")?;
    let rest = first.is_some().then_some(rows);

    Ok(ExportSource {
        owners: plan.owners,
        first,
        rest,
    })
}

fn render_entry<R: ExportRenderer>(
    renderer: &mut R,
    owners: &OwnerDirectory,
    entry: LogEntry,
) -> Result<Option<Vec<u8>>, ExportError> {
    renderer.push(&ExportRow::from(&owners.enrich(entry)))
}

/// Renders every matching entry, unpaginated, in listing order.
///
/// The remaining rows are pulled from the store one at a time; the stream
/// ends after the first error, so a failed export never looks like a
/// complete file.
pub fn export_stream<'a, R>(
    source: ExportSource<'a>,
    mut renderer: R,
) -> impl Stream<Item = Result<Bytes, ExportError>> + Send + 'a
where
    R: ExportRenderer + 'a,
{
    async_stream::stream! {
        let ExportSource { owners, first, rest } = source;

        match renderer.begin() {
            Ok(chunk) if chunk.is_empty() => {}
            Ok(chunk) => yield Ok(Bytes::from(chunk)),
            Err(e) => {
                yield Err(e);
                return;
            }
        }

        if let Some(entry) = first {
            match render_entry(&mut renderer, &owners, entry) {
                Ok(Some(chunk)) => yield Ok(Bytes::from(chunk)),
                Ok(None) => {}
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if let Some(mut rows) = rest {
            while let Some(row) = rows.next().await {
                let entry = match row {
                    Ok(entry) => entry,
                    Err(e) => {
                        yield Err(ExportError::from(e));
                        return;
                    }
                };
                match render_entry(&mut renderer, &owners, entry) {
                    Ok(Some(chunk)) => yield Ok(Bytes::from(chunk)),
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }

        yield renderer.finish().map(Bytes::from);
    }
}
