use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ColumnTrait, Order, QueryOrder};

use super::repository::Column;

/// Priority of the known actions for the action sort.
/// Actions missing from the table rank after all of them.
pub const ACTION_ORDER: [&str; 14] = [
    "labOrder",
    "labResult",
    "receive",
    "accept",
    "approve",
    "reapprove",
    "unapprove",
    "unreceive",
    "rerun",
    "save",
    "listTransactions",
    "getTransaction",
    "analyzerResult",
    "analyzerRequest",
];

/// Rank of an action name: its position in [`ACTION_ORDER`], or the table
/// length for anything unknown
pub fn action_rank(action: &str) -> usize {
    ACTION_ORDER
        .iter()
        .position(|known| *known == action)
        .unwrap_or(ACTION_ORDER.len())
}

/// Per-row rank computed by the store:
/// `CASE WHEN action = 'labOrder' THEN 0 ... ELSE 14 END`
fn action_rank_expr() -> SimpleExpr {
    let case = ACTION_ORDER
        .iter()
        .skip(1)
        .fold(
            Expr::case(Column::Action.eq(ACTION_ORDER[0]), action_rank(ACTION_ORDER[0]) as i32),
            |case, action| case.case(Column::Action.eq(*action), action_rank(action) as i32),
        )
        .finally(ACTION_ORDER.len() as i32);

    case.into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Only an explicit `asc` sorts ascending
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    fn order(self) -> Order {
        match self {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Timestamp,
    ResponseTime,
}

impl SortField {
    fn column(self) -> Column {
        match self {
            SortField::Timestamp => Column::Timestamp,
            SortField::ResponseTime => Column::ResponseTimeMs,
        }
    }
}

/// Resolved ordering of a log query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSpec {
    /// Direct comparison of one column; id breaks ties in the same direction
    Field {
        field: SortField,
        direction: SortDirection,
    },
    /// Action rank in the requested direction, then timestamp descending
    /// whatever the direction, then id descending
    ActionRank { direction: SortDirection },
}

impl SortSpec {
    /// `sortBy`: `action`, `timeMs`, anything else sorts by timestamp
    pub fn from_params(sort_by: Option<&str>, sort_dir: Option<&str>) -> Self {
        let direction = SortDirection::from_param(sort_dir);
        match sort_by.map(str::trim) {
            Some("action") => SortSpec::ActionRank { direction },
            Some("timeMs") => SortSpec::Field {
                field: SortField::ResponseTime,
                direction,
            },
            _ => SortSpec::Field {
                field: SortField::Timestamp,
                direction,
            },
        }
    }

    pub fn apply<Q: QueryOrder>(self, query: Q) -> Q {
        match self {
            SortSpec::Field { field, direction } => query
                .order_by(field.column(), direction.order())
                .order_by(Column::Id, direction.order()),
            SortSpec::ActionRank { direction } => query
                .order_by(action_rank_expr(), direction.order())
                .order_by_desc(Column::Timestamp)
                .order_by_desc(Column::Id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_audit_log::repository::Entity;
    use sea_orm::{DbBackend, EntityTrait, QueryTrait};

    #[test]
    fn test_action_rank_follows_table() {
        assert_eq!(action_rank("labOrder"), 0);
        assert_eq!(action_rank("approve"), 4);
        assert_eq!(action_rank("reapprove"), 5);
        assert_eq!(action_rank("analyzerRequest"), 13);
        assert_eq!(action_rank("printLabel"), 14);
        assert_eq!(action_rank(""), 14);
    }

    #[test]
    fn test_from_params() {
        assert_eq!(
            SortSpec::from_params(None, None),
            SortSpec::Field {
                field: SortField::Timestamp,
                direction: SortDirection::Desc
            }
        );
        assert_eq!(
            SortSpec::from_params(Some("timeMs"), Some("asc")),
            SortSpec::Field {
                field: SortField::ResponseTime,
                direction: SortDirection::Asc
            }
        );
        assert_eq!(
            SortSpec::from_params(Some("action"), Some("ASC")),
            SortSpec::ActionRank {
                direction: SortDirection::Desc
            }
        );
        assert_eq!(
            SortSpec::from_params(Some("endpoint"), Some("asc")),
            SortSpec::Field {
                field: SortField::Timestamp,
                direction: SortDirection::Asc
            }
        );
    }

    #[test]
    fn test_action_sort_keeps_timestamp_descending() {
        let sql = SortSpec::ActionRank {
            direction: SortDirection::Asc,
        }
        .apply(Entity::find())
        .build(DbBackend::Sqlite)
        .to_string();

        let rank_at = sql.find("ELSE 14 END").unwrap();
        let timestamp_at = sql.find(r#""audit_log"."timestamp" DESC"#).unwrap();
        assert!(sql.contains("CASE WHEN"));
        assert!(rank_at < timestamp_at);
        assert!(sql[rank_at..timestamp_at].contains("ASC"));
    }
}
