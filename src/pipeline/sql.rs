//! SQL text construction for runtime-discovered tables.
//!
//! Identifiers cannot be bound as statement parameters, so table and column
//! names are validated and quoted here; data values always go through the
//! driver's parameter binding.

use crate::error::FerryError;
use std::collections::HashSet;

/// Conservative cap; PostgreSQL identifiers truncate at 63 bytes.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// PostgreSQL caps bind parameters per statement at u16::MAX.
const MAX_BIND_PARAMETERS: usize = u16::MAX as usize;

/// Quote an identifier for PostgreSQL, escaping embedded double quotes.
pub fn quote_ident(name: &str) -> Result<String, FerryError> {
    if name.is_empty() {
        return Err(FerryError::config("Identifier cannot be empty"));
    }
    if name.contains('\0') {
        return Err(FerryError::config(format!(
            "Identifier contains null byte: {name:?}"
        )));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(FerryError::config(format!(
            "Identifier exceeds {MAX_IDENTIFIER_LENGTH} bytes: {name:?}"
        )));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Qualify a table name with its schema, both quoted.
pub fn qualify(schema: &str, table: &str) -> Result<String, FerryError> {
    Ok(format!("{}.{}", quote_ident(schema)?, quote_ident(table)?))
}

/// Build one parameterized multi-row INSERT statement.
///
/// The column list and the `$n` placeholder grid are derived from the
/// runtime column set: `INSERT INTO "t" ("a", "b") VALUES ($1, $2), ($3, $4)`.
/// Placeholders are numbered row-major to match a flattened parameter list.
pub fn build_insert(
    table: &str,
    columns: &[String],
    row_count: usize,
) -> Result<String, FerryError> {
    if columns.is_empty() {
        return Err(FerryError::load(format!(
            "No columns to insert into table {table}"
        )));
    }

    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(FerryError::load(format!(
                "Duplicate column {column:?} in insert into table {table}"
            )));
        }
    }

    if row_count == 0 {
        return Err(FerryError::load(format!(
            "No rows to insert into table {table}"
        )));
    }

    let parameter_count = columns.len() * row_count;
    if parameter_count > MAX_BIND_PARAMETERS {
        return Err(FerryError::load(format!(
            "Batch for table {table} needs {parameter_count} bind parameters, over the {MAX_BIND_PARAMETERS} limit"
        )));
    }

    let quoted_columns = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ",
        quote_ident(table)?,
        quoted_columns.join(", ")
    );

    let mut parameter = 0;
    let mut value_clauses = Vec::with_capacity(row_count);
    for _ in 0..row_count {
        let placeholders: Vec<String> = columns
            .iter()
            .map(|_| {
                parameter += 1;
                format!("${parameter}")
            })
            .collect();
        value_clauses.push(format!("({})", placeholders.join(", ")));
    }
    sql.push_str(&value_clauses.join(", "));

    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_quote_ident_normal() {
        assert_eq!(quote_ident("users").unwrap(), "\"users\"");
        assert_eq!(quote_ident("activity_day").unwrap(), "\"activity_day\"");
    }

    #[test]
    fn test_quote_ident_escapes_double_quote() {
        assert_eq!(quote_ident("ta\"ble").unwrap(), "\"ta\"\"ble\"");
    }

    #[test]
    fn test_quote_ident_injection_is_just_a_name() {
        let quoted = quote_ident("x\"; DROP TABLE users;--").unwrap();
        assert_eq!(quoted, "\"x\"\"; DROP TABLE users;--\"");
    }

    #[test]
    fn test_quote_ident_rejects_invalid() {
        assert!(quote_ident("").is_err());
        assert!(quote_ident("ta\0ble").is_err());
        assert!(quote_ident(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_qualify() {
        assert_eq!(
            qualify("public", "activity_day").unwrap(),
            "\"public\".\"activity_day\""
        );
    }

    #[test]
    fn test_build_insert_placeholders_row_major() {
        let sql = build_insert("t", &cols(&["id", "value"]), 2).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"t\" (\"id\", \"value\") VALUES ($1, $2), ($3, $4)"
        );
    }

    #[test]
    fn test_build_insert_single_row() {
        let sql = build_insert("t", &cols(&["a"]), 1).unwrap();
        assert_eq!(sql, "INSERT INTO \"t\" (\"a\") VALUES ($1)");
    }

    #[test]
    fn test_build_insert_quotes_reserved_words() {
        let sql = build_insert("order", &cols(&["select", "from"]), 1).unwrap();
        assert!(sql.starts_with("INSERT INTO \"order\" (\"select\", \"from\")"));
    }

    #[test]
    fn test_build_insert_rejects_empty_columns() {
        let err = build_insert("t", &[], 1).unwrap_err();
        assert!(matches!(err, FerryError::Load { .. }));
    }

    #[test]
    fn test_build_insert_rejects_duplicate_columns() {
        let err = build_insert("t", &cols(&["id", "id"]), 1).unwrap_err();
        assert!(err.to_string().contains("Duplicate column"));
    }

    #[test]
    fn test_build_insert_rejects_zero_rows() {
        assert!(build_insert("t", &cols(&["id"]), 0).is_err());
    }

    #[test]
    fn test_build_insert_rejects_parameter_overflow() {
        let err = build_insert("t", &cols(&["a", "b"]), 40_000).unwrap_err();
        assert!(err.to_string().contains("bind parameters"));
    }
}
