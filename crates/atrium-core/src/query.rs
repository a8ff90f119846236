//! Query option/result value objects and the query-plan builder.
//!
//! Incoming list requests carry a [`QueryOptions`]: pagination, an
//! optional free-text filter, explicit equality filters, ordering, and
//! scope hints (tenant, user, `all`, `exclude_mine`). The plan builder
//! folds these into a [`Selection`] of typed predicates combined with
//! logical AND; the storage layer compiles the selection into a
//! parameterized query. Membership scope hints are resolved by the
//! access services, which append `IdIn`/`IdNotIn` predicates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Page size applied when `take` is absent.
pub const DEFAULT_TAKE: u32 = 10;

/// An explicit field = value condition. Field names are passed through
/// to storage unvalidated semantically (an unknown field matches
/// nothing) but must be lexical identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqualityFilter {
    pub field: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl Default for OrderBy {
    fn default() -> Self {
        Self {
            field: "created_at".into(),
            direction: Direction::Desc,
        }
    }
}

/// Per-request list query options.
///
/// `take`/`skip` are unsigned, so negative values are rejected before
/// they reach the engine; absent values default to 10 and 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    pub take: Option<u32>,
    pub skip: Option<u32>,
    /// Case-insensitive substring match against the entity's display
    /// field (username for users, name for tenants).
    pub filter: Option<String>,
    /// Explicit equality conditions, ANDed with everything else.
    #[serde(default)]
    pub where_clause: Vec<EqualityFilter>,
    pub order: Option<OrderBy>,
    /// Restrict users to members of this tenant (or pin a tenant list
    /// to this single tenant).
    pub tenant_id: Option<Uuid>,
    /// Restrict tenants to those this user is a member of.
    pub user_id: Option<Uuid>,
    /// Bypass tenant/user scoping entirely.
    #[serde(default)]
    pub all: bool,
    /// Invert the user-membership restriction: tenants the user is
    /// NOT a member of.
    #[serde(default)]
    pub exclude_mine: bool,
}

impl QueryOptions {
    pub fn effective_take(&self) -> u32 {
        self.take.unwrap_or(DEFAULT_TAKE)
    }

    pub fn effective_skip(&self) -> u32 {
        self.skip.unwrap_or(0)
    }

    /// Build the storage-independent query plan. `text_field` is the
    /// entity's designated display field for the free-text filter.
    ///
    /// Scope hints (`tenant_id`, `user_id`, `all`, `exclude_mine`) are
    /// not resolved here: they require membership lookups and are
    /// appended by the access services as id-set predicates.
    pub fn selection(&self, text_field: &str) -> Selection {
        let mut predicates = Vec::new();

        if let Some(filter) = self.filter.as_deref() {
            let needle = filter.trim();
            if !needle.is_empty() {
                predicates.push(Predicate::TextContains {
                    field: text_field.to_string(),
                    needle: needle.to_string(),
                });
            }
        }

        for clause in &self.where_clause {
            predicates.push(Predicate::Equals {
                field: clause.field.clone(),
                value: clause.value.clone(),
            });
        }

        Selection {
            predicates,
            order: self.order.clone().unwrap_or_default(),
            take: self.effective_take(),
            skip: self.effective_skip(),
        }
    }
}

/// A single filter condition. All predicates of a selection are
/// combined with logical AND.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Case-insensitive substring match.
    TextContains { field: String, needle: String },
    /// Exact field equality.
    Equals {
        field: String,
        value: serde_json::Value,
    },
    /// Entity id is one of the given set.
    IdIn(Vec<Uuid>),
    /// Entity id is none of the given set.
    IdNotIn(Vec<Uuid>),
}

/// Compiled query plan: predicates, ordering, and a bounded page.
#[derive(Debug, Clone)]
pub struct Selection {
    pub predicates: Vec<Predicate>,
    pub order: OrderBy,
    pub take: u32,
    pub skip: u32,
}

/// One returned entity with its id alongside the projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryItem<T> {
    pub item: T,
    pub id: Uuid,
}

/// A bounded, ordered result page plus the total matching count.
///
/// Invariants: `items.len() <= take as usize`, and `total` counts the
/// full filtered set ignoring `take`/`skip`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult<T> {
    pub items: Vec<QueryItem<T>>,
    pub total: u64,
    pub take: u32,
    pub skip: u32,
}

impl<T> QueryResult<T> {
    /// The result for a scope that matches nothing (e.g. a user with
    /// zero memberships): empty page, zero total, not an error.
    pub fn empty(take: u32, skip: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            take,
            skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied_when_absent() {
        let options = QueryOptions::default();
        let selection = options.selection("name");

        assert_eq!(selection.take, 10);
        assert_eq!(selection.skip, 0);
        assert!(selection.predicates.is_empty());
        assert_eq!(selection.order.field, "created_at");
        assert_eq!(selection.order.direction, Direction::Desc);
    }

    #[test]
    fn explicit_take_and_skip_are_kept() {
        let options = QueryOptions {
            take: Some(25),
            skip: Some(50),
            ..Default::default()
        };
        let selection = options.selection("name");
        assert_eq!(selection.take, 25);
        assert_eq!(selection.skip, 50);
    }

    #[test]
    fn filter_targets_the_display_field() {
        let options = QueryOptions {
            filter: Some("Acme".into()),
            ..Default::default()
        };
        let selection = options.selection("name");

        assert_eq!(selection.predicates.len(), 1);
        match &selection.predicates[0] {
            Predicate::TextContains { field, needle } => {
                assert_eq!(field, "name");
                assert_eq!(needle, "Acme");
            }
            other => panic!("unexpected predicate: {other:?}"),
        }
    }

    #[test]
    fn blank_filter_is_ignored() {
        let options = QueryOptions {
            filter: Some("   ".into()),
            ..Default::default()
        };
        assert!(options.selection("name").predicates.is_empty());
    }

    #[test]
    fn where_clause_merges_with_filter() {
        let options = QueryOptions {
            filter: Some("ali".into()),
            where_clause: vec![EqualityFilter {
                field: "role".into(),
                value: serde_json::json!("admin"),
            }],
            ..Default::default()
        };
        let selection = options.selection("username");

        assert_eq!(selection.predicates.len(), 2);
        assert!(matches!(
            selection.predicates[1],
            Predicate::Equals { ref field, .. } if field == "role"
        ));
    }

    #[test]
    fn explicit_order_overrides_default() {
        let options = QueryOptions {
            order: Some(OrderBy {
                field: "username".into(),
                direction: Direction::Asc,
            }),
            ..Default::default()
        };
        let selection = options.selection("username");
        assert_eq!(selection.order.field, "username");
        assert_eq!(selection.order.direction, Direction::Asc);
    }

    #[test]
    fn empty_result_has_zero_total() {
        let result = QueryResult::<()>::empty(10, 20);
        assert!(result.items.is_empty());
        assert_eq!(result.total, 0);
        assert_eq!(result.take, 10);
        assert_eq!(result.skip, 20);
    }
}
