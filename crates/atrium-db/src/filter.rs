//! Compiles a [`Selection`] into SurrealQL clause fragments.
//!
//! Predicate values always travel as bound parameters. Field names
//! cannot be parameterized in SurrealQL, so they are validated as
//! plain identifiers before being spliced into the statement text.

use atrium_core::query::{Direction, Predicate, Selection};

use crate::error::DbError;

/// A value bound to a query parameter.
pub(crate) enum BindValue {
    Text(String),
    Json(serde_json::Value),
    TextList(Vec<String>),
}

/// WHERE/ORDER fragments plus the parameters they reference.
pub(crate) struct CompiledSelection {
    /// Empty, or a leading-space `" WHERE ..."` fragment.
    pub where_clause: String,
    /// `"ORDER BY <field> <dir>"`.
    pub order_clause: String,
    pub binds: Vec<(String, BindValue)>,
}

fn check_identifier(field: &str) -> Result<(), DbError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .enumerate()
            .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidField(field.to_string()))
    }
}

pub(crate) fn compile(selection: &Selection) -> Result<CompiledSelection, DbError> {
    let mut parts = Vec::new();
    let mut binds = Vec::new();

    for (i, predicate) in selection.predicates.iter().enumerate() {
        let param = format!("f{i}");
        match predicate {
            Predicate::TextContains { field, needle } => {
                check_identifier(field)?;
                parts.push(format!(
                    "string::contains(string::lowercase({field}), \
                     string::lowercase(${param}))"
                ));
                binds.push((param, BindValue::Text(needle.clone())));
            }
            Predicate::Equals { field, value } => {
                check_identifier(field)?;
                parts.push(format!("{field} = ${param}"));
                binds.push((param, BindValue::Json(value.clone())));
            }
            Predicate::IdIn(ids) => {
                parts.push(format!("meta::id(id) IN ${param}"));
                let ids = ids.iter().map(|id| id.to_string()).collect();
                binds.push((param, BindValue::TextList(ids)));
            }
            Predicate::IdNotIn(ids) => {
                parts.push(format!("meta::id(id) NOT IN ${param}"));
                let ids = ids.iter().map(|id| id.to_string()).collect();
                binds.push((param, BindValue::TextList(ids)));
            }
        }
    }

    let where_clause = if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    };

    check_identifier(&selection.order.field)?;
    let direction = match selection.order.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    };
    let order_clause = format!("ORDER BY {} {}", selection.order.field, direction);

    Ok(CompiledSelection {
        where_clause,
        order_clause,
        binds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_core::query::OrderBy;
    use uuid::Uuid;

    fn selection(predicates: Vec<Predicate>) -> Selection {
        Selection {
            predicates,
            order: OrderBy::default(),
            take: 10,
            skip: 0,
        }
    }

    #[test]
    fn no_predicates_yields_empty_where() {
        let compiled = compile(&selection(vec![])).unwrap();
        assert!(compiled.where_clause.is_empty());
        assert_eq!(compiled.order_clause, "ORDER BY created_at DESC");
        assert!(compiled.binds.is_empty());
    }

    #[test]
    fn predicates_are_joined_with_and() {
        let compiled = compile(&selection(vec![
            Predicate::TextContains {
                field: "username".into(),
                needle: "al".into(),
            },
            Predicate::Equals {
                field: "role".into(),
                value: serde_json::json!("admin"),
            },
        ]))
        .unwrap();

        assert!(compiled.where_clause.starts_with(" WHERE "));
        assert!(compiled.where_clause.contains(" AND "));
        assert!(compiled.where_clause.contains("$f0"));
        assert!(compiled.where_clause.contains("role = $f1"));
        assert_eq!(compiled.binds.len(), 2);
    }

    #[test]
    fn id_scoping_compiles_to_membership_lists() {
        let id = Uuid::new_v4();
        let compiled = compile(&selection(vec![Predicate::IdIn(vec![id])])).unwrap();
        assert!(compiled.where_clause.contains("meta::id(id) IN $f0"));

        let compiled = compile(&selection(vec![Predicate::IdNotIn(vec![id])])).unwrap();
        assert!(compiled.where_clause.contains("meta::id(id) NOT IN $f0"));
    }

    #[test]
    fn hostile_field_names_are_rejected() {
        let result = compile(&selection(vec![Predicate::Equals {
            field: "role = 'admin' OR 1".into(),
            value: serde_json::json!(true),
        }]));
        assert!(matches!(result, Err(DbError::InvalidField(_))));
    }

    #[test]
    fn hostile_order_field_is_rejected() {
        let mut sel = selection(vec![]);
        sel.order.field = "created_at; DELETE user".into();
        assert!(matches!(compile(&sel), Err(DbError::InvalidField(_))));
    }
}
