//! SQL text generation for fetches and counts.
//!
//! Identifiers are always quoted and values always bound as parameters. The
//! row identity alias is the only unquoted name and comes from a fixed list.

use crate::db::quote_ident;
use crate::model::value::Value;
use crate::query::predicate::Predicate;
use crate::query::request::FetchRequest;

/// Builds the `SELECT` for `request`.
///
/// Column 0 is the row id; columns `1..` follow `request.entity.attributes()`.
pub(crate) fn build_select(request: &FetchRequest<'_>, binds: &mut Vec<Value>) -> String {
    let mut sql = String::from("SELECT ");
    sql.push_str(request.entity.row_id_column());
    for attribute in request.entity.attributes() {
        sql.push_str(", ");
        sql.push_str(&quote_ident(attribute));
    }
    sql.push_str(" FROM ");
    sql.push_str(&quote_ident(request.entity.name()));
    push_where(&mut sql, request.predicate, binds);

    if !request.sort.is_empty() {
        sql.push_str(" ORDER BY ");
        for (index, term) in request.sort.iter().enumerate() {
            if index > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&quote_ident(&term.attribute));
            sql.push_str(if term.ascending { " ASC" } else { " DESC" });
        }
    }

    if let Some(limit) = request.limit {
        sql.push_str(" LIMIT ?");
        binds.push(Value::Integer(i64::from(limit)));
    }

    sql
}

/// Builds a `SELECT COUNT(*)` over the rows `request` matches; sort and limit
/// do not apply.
pub(crate) fn build_count(request: &FetchRequest<'_>, binds: &mut Vec<Value>) -> String {
    let mut sql = String::from("SELECT COUNT(*) FROM ");
    sql.push_str(&quote_ident(request.entity.name()));
    push_where(&mut sql, request.predicate, binds);
    sql
}

fn push_where(sql: &mut String, predicate: &Predicate, binds: &mut Vec<Value>) {
    if !predicate.is_match_all() {
        sql.push_str(" WHERE ");
        push_predicate(sql, predicate, binds);
    }
}

fn push_predicate(sql: &mut String, predicate: &Predicate, binds: &mut Vec<Value>) {
    match predicate {
        Predicate::All => sql.push_str("1 = 1"),
        Predicate::Eq(attribute, value) => push_comparison(sql, attribute, "IS", value, binds),
        Predicate::Ne(attribute, value) => push_comparison(sql, attribute, "IS NOT", value, binds),
        Predicate::Lt(attribute, value) => push_comparison(sql, attribute, "<", value, binds),
        Predicate::Le(attribute, value) => push_comparison(sql, attribute, "<=", value, binds),
        Predicate::Gt(attribute, value) => push_comparison(sql, attribute, ">", value, binds),
        Predicate::Ge(attribute, value) => push_comparison(sql, attribute, ">=", value, binds),
        Predicate::IsNull(attribute) => {
            sql.push_str(&quote_ident(attribute));
            sql.push_str(" IS NULL");
        }
        Predicate::IsNotNull(attribute) => {
            sql.push_str(&quote_ident(attribute));
            sql.push_str(" IS NOT NULL");
        }
        // Empty conjunction is true, empty disjunction is false.
        Predicate::And(terms) => push_group(sql, terms, " AND ", "1 = 1", binds),
        Predicate::Or(terms) => push_group(sql, terms, " OR ", "1 = 0", binds),
        Predicate::Not(inner) => {
            sql.push_str("NOT (");
            push_predicate(sql, inner, binds);
            sql.push(')');
        }
    }
}

fn push_comparison(
    sql: &mut String,
    attribute: &str,
    operator: &str,
    value: &Value,
    binds: &mut Vec<Value>,
) {
    sql.push_str(&quote_ident(attribute));
    sql.push(' ');
    sql.push_str(operator);
    sql.push_str(" ?");
    binds.push(value.clone());
}

fn push_group(
    sql: &mut String,
    terms: &[Predicate],
    separator: &str,
    empty: &str,
    binds: &mut Vec<Value>,
) {
    if terms.is_empty() {
        sql.push_str(empty);
        return;
    }
    sql.push('(');
    for (index, term) in terms.iter().enumerate() {
        if index > 0 {
            sql.push_str(separator);
        }
        push_predicate(sql, term, binds);
    }
    sql.push(')');
}
