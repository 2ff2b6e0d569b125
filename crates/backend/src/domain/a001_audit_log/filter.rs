use chrono::{DateTime, Utc};
use contracts::domain::a001_audit_log::dto::LogQuery;
use contracts::system::auth::Role;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition};

use super::enrich::OwnerDirectory;
use super::params::{non_empty, parse_number, parse_time_bound, split_list};
use super::repository::{storage_timestamp, Column};

/// Sentinel accepted by `action` and `userId` meaning "no restriction"
pub const ALL: &str = "all";

pub const DEFAULT_MIN_TIME_MS: f64 = 0.0;
pub const DEFAULT_MAX_TIME_MS: f64 = 999_999.0;

/// Authenticated caller as supplied by the auth layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

/// Which owners' entries a query may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerScope {
    /// `user` role: the caller's own entries, whatever was requested
    Own(String),
    /// One explicitly requested active owner
    Exact(String),
    /// Every currently active owner
    Active(Vec<String>),
    /// No active owners at all: nothing to restrict by
    Unrestricted,
}

impl OwnerScope {
    /// `None` when a non-`user` caller asks for an owner outside the active set.
    /// That is answered with an explicit empty result, not an empty predicate.
    pub fn resolve(caller: &Caller, requested: Option<&str>, owners: &OwnerDirectory) -> Option<Self> {
        if caller.role == Role::User {
            return Some(OwnerScope::Own(caller.id.clone()));
        }

        match non_empty(requested) {
            Some(id) if id != ALL => {
                if owners.is_active(id) {
                    Some(OwnerScope::Exact(id.to_string()))
                } else {
                    None
                }
            }
            _ if owners.has_active() => Some(OwnerScope::Active(owners.active_ids())),
            _ => Some(OwnerScope::Unrestricted),
        }
    }
}

/// Normalized criteria; every clause is conjunctive
#[derive(Debug, Clone, PartialEq)]
pub struct LogFilter {
    pub owner: OwnerScope,
    pub actions: Option<Vec<String>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub status_code: Option<String>,
    pub labnumbers: Option<Vec<String>>,
    pub min_time_ms: f64,
    pub max_time_ms: f64,
}

impl LogFilter {
    /// Build the filter for a caller. `None` means the requested owner is not
    /// visible and the caller gets `total = 0`.
    pub fn build(query: &LogQuery, caller: &Caller, owners: &OwnerDirectory) -> Option<Self> {
        let owner = OwnerScope::resolve(caller, query.user_id.as_deref(), owners)?;

        let actions = match non_empty(query.action.as_deref()) {
            Some(ALL) | None => None,
            Some(raw) => split_list(Some(raw)),
        };

        Some(Self {
            owner,
            actions,
            start: parse_time_bound(query.start.as_deref()),
            end: parse_time_bound(query.end.as_deref()),
            status_code: non_empty(query.status_code.as_deref()).map(str::to_string),
            labnumbers: split_list(query.labnumber.as_deref()),
            min_time_ms: parse_number(query.min_time_ms.as_deref(), DEFAULT_MIN_TIME_MS),
            max_time_ms: parse_number(query.max_time_ms.as_deref(), DEFAULT_MAX_TIME_MS),
        })
    }

    /// Store-side predicate. An `end` before `start` simply matches nothing.
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        condition = match &self.owner {
            OwnerScope::Own(id) | OwnerScope::Exact(id) => {
                condition.add(Column::UserId.eq(id.as_str()))
            }
            OwnerScope::Active(ids) => condition.add(Column::UserId.is_in(ids.clone())),
            OwnerScope::Unrestricted => condition,
        };

        if let Some(actions) = &self.actions {
            condition = condition.add(Column::Action.is_in(actions.clone()));
        }
        if let Some(start) = &self.start {
            condition = condition.add(Column::Timestamp.gte(storage_timestamp(start)));
        }
        if let Some(end) = &self.end {
            condition = condition.add(Column::Timestamp.lte(storage_timestamp(end)));
        }
        if let Some(status_code) = &self.status_code {
            condition = condition.add(Column::ResponseStatusCode.eq(status_code.as_str()));
        }
        if let Some(labnumbers) = &self.labnumbers {
            condition = condition.add(labnumber_overlap(labnumbers));
        }

        condition
            .add(Column::ResponseTimeMs.gte(self.min_time_ms))
            .add(Column::ResponseTimeMs.lte(self.max_time_ms))
    }
}

/// Entry matches when any of its labnumbers is in the requested set.
/// A column that is not valid JSON counts as an empty set.
fn labnumber_overlap(labnumbers: &[String]) -> SimpleExpr {
    let placeholders = vec!["?"; labnumbers.len()].join(", ");
    Expr::cust_with_values(
        format!(
            "EXISTS (SELECT 1 FROM json_each(CASE WHEN json_valid(\"audit_log\".\"labnumbers\") \
             THEN \"audit_log\".\"labnumbers\" ELSE '[]' END) WHERE json_each.value IN ({}))",
            placeholders
        ),
        labnumbers.iter().cloned(),
    )
}
