//! Catalog introspection.
//!
//! Reads tables, operators and functions from the Postgres-compatible system
//! views and maps them onto the generator's type system. Anything that uses
//! a type the generator does not model is skipped silently; rows that cannot
//! be decoded are skipped with a warning.

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use sqlsmith::{BaseType, Catalog, Column, Function, Operator, SqlType, Table, Writability};
use tokio_postgres::{Client, Row};

const COLUMNS_QUERY: &str = "
SELECT
    table_catalog,
    table_schema,
    table_name,
    column_name,
    crdb_sql_type,
    generation_expression != '' AS computed,
    is_nullable = 'YES' AS nullable
FROM
    information_schema.columns
WHERE
    table_schema = 'public'
ORDER BY
    table_catalog, table_schema, table_name";

const OPERATORS_QUERY: &str = "
SELECT
    oprname, oprleft::INT8, oprright::INT8, oprresult::INT8
FROM
    pg_catalog.pg_operator
WHERE
    0 NOT IN (oprresult, oprright, oprleft)";

const FUNCTIONS_QUERY: &str = "
SELECT
    proname, proargtypes::INT8[], prorettype::INT8
FROM
    pg_catalog.pg_proc
WHERE
    NOT proisagg
    AND NOT proiswindow
    AND NOT proretset
    AND proname NOT IN ('crdb_internal.force_panic', 'crdb_internal.force_log_fatal')";

/// One row of `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub table_catalog: String,
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
    pub sql_type: String,
    pub computed: bool,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorRow {
    pub name: String,
    pub left: i64,
    pub right: i64,
    pub result: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRow {
    pub name: String,
    pub args: Vec<i64>,
    pub result: i64,
}

fn oid_type(oid: i64) -> Option<SqlType> {
    let base = BaseType::from_oid(u32::try_from(oid).ok()?)?;
    Some(SqlType::nullable(base))
}

/// Groups column rows into tables, keeping introspection order. A table with
/// any column of an unmodelled type is dropped entirely.
pub fn group_tables(rows: impl IntoIterator<Item = ColumnRow>) -> Vec<Table> {
    let mut tables: IndexMap<(String, String, String), Option<Vec<Column>>> = IndexMap::new();
    for row in rows {
        let key = (row.table_catalog, row.table_schema, row.table_name);
        let entry = tables.entry(key).or_insert_with(|| Some(Vec::new()));
        let Some(columns) = entry.as_mut() else {
            continue;
        };
        let Some(base) = BaseType::from_name(&row.sql_type) else {
            tracing::debug!(column = %row.column_name, ty = %row.sql_type, "skipping table with unsupported column type");
            *entry = None;
            continue;
        };
        let writability = if row.computed {
            Writability::NotWritable
        } else {
            Writability::Writable
        };
        columns.push(
            Column::new(row.column_name, SqlType::new(base, row.nullable))
                .with_writability(writability),
        );
    }
    tables
        .into_iter()
        .filter_map(|((_, _, name), columns)| Some(Table::new(name, columns?)))
        .collect()
}

pub fn map_operator(row: OperatorRow) -> Option<Operator> {
    Some(Operator::new(
        row.name,
        oid_type(row.left)?,
        oid_type(row.right)?,
        oid_type(row.result)?,
    ))
}

pub fn map_function(row: FunctionRow) -> Option<Function> {
    let inputs = row
        .args
        .iter()
        .map(|&oid| oid_type(oid))
        .collect::<Option<Vec<_>>>()?;
    Some(Function::new(row.name, inputs, oid_type(row.result)?))
}

pub fn build_catalog(
    columns: impl IntoIterator<Item = ColumnRow>,
    operators: impl IntoIterator<Item = OperatorRow>,
    functions: impl IntoIterator<Item = FunctionRow>,
) -> Catalog {
    let builder = group_tables(columns)
        .into_iter()
        .fold(Catalog::builder(), |b, table| b.add_table(table));
    let builder = operators
        .into_iter()
        .filter_map(map_operator)
        .fold(builder, |b, op| b.add_operator(op));
    functions
        .into_iter()
        .filter_map(map_function)
        .fold(builder, |b, func| b.add_function(func))
        .build()
}

/// Decodes every row with `decode`, skipping rows that fail.
fn decode_rows<T>(
    rows: Vec<Row>,
    what: &str,
    decode: impl Fn(&Row) -> Result<T, tokio_postgres::Error>,
) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match decode(row) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%err, "skipping malformed {what} row");
                None
            }
        })
        .collect()
}

/// Reads the current catalog from a live database.
pub async fn load_catalog(client: &Client) -> Result<Catalog> {
    let columns = client
        .query(COLUMNS_QUERY, &[])
        .await
        .context("failed to query columns")?;
    let columns = decode_rows(columns, "column", |row| {
        Ok(ColumnRow {
            table_catalog: row.try_get(0)?,
            table_schema: row.try_get(1)?,
            table_name: row.try_get(2)?,
            column_name: row.try_get(3)?,
            sql_type: row.try_get(4)?,
            computed: row.try_get(5)?,
            nullable: row.try_get(6)?,
        })
    });

    let operators = client
        .query(OPERATORS_QUERY, &[])
        .await
        .context("failed to query operators")?;
    let operators = decode_rows(operators, "operator", |row| {
        Ok(OperatorRow {
            name: row.try_get(0)?,
            left: row.try_get(1)?,
            right: row.try_get(2)?,
            result: row.try_get(3)?,
        })
    });

    let functions = client
        .query(FUNCTIONS_QUERY, &[])
        .await
        .context("failed to query functions")?;
    let functions = decode_rows(functions, "function", |row| {
        Ok(FunctionRow {
            name: row.try_get(0)?,
            args: row.try_get(1)?,
            result: row.try_get(2)?,
        })
    });

    let catalog = build_catalog(columns, operators, functions);
    tracing::debug!(
        tables = catalog.tables().len(),
        operators = catalog.operators().count(),
        functions = catalog.functions().count(),
        "loaded catalog"
    );
    Ok(catalog)
}

/// Reads a catalog from its JSON form.
pub fn read_catalog_file(path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path.display()))?;
    let catalog = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse catalog file {}", path.display()))?;
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(table: &str, column: &str, ty: &str, computed: bool, nullable: bool) -> ColumnRow {
        ColumnRow {
            table_catalog: "defaultdb".to_string(),
            table_schema: "public".to_string(),
            table_name: table.to_string(),
            column_name: column.to_string(),
            sql_type: ty.to_string(),
            computed,
            nullable,
        }
    }

    #[test]
    fn groups_rows_into_tables() {
        let tables = group_tables([
            col("t", "a", "INT8", false, false),
            col("t", "b", "STRING", false, true),
            col("t", "g", "INT8", true, true),
            col("u", "c", "BOOL", false, true),
        ]);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "t");
        assert_eq!(tables[0].columns.len(), 3);
        assert_eq!(tables[0].columns[0].ty, SqlType::INT_NOT_NULL);
        assert_eq!(tables[0].columns[1].ty, SqlType::STRING);
        assert_eq!(tables[0].columns[2].writability, Writability::NotWritable);
        assert_eq!(tables[1].name, "u");
        assert_eq!(tables[1].columns[0].ty, SqlType::BOOL);
    }

    #[test]
    fn tables_with_unsupported_columns_are_dropped() {
        let tables = group_tables([
            col("t", "a", "INT8", false, false),
            col("t", "d", "DECIMAL", false, true),
            col("t", "b", "STRING", false, true),
            col("u", "c", "bool", false, true),
        ]);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "u");
    }

    #[test]
    fn same_name_in_another_schema_is_another_table() {
        let mut other = col("t", "x", "INT", false, true);
        other.table_schema = "other".to_string();
        let tables = group_tables([col("t", "a", "INT8", false, false), other]);
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn operators_and_functions_need_modelled_types() {
        let op = map_operator(OperatorRow {
            name: "=".to_string(),
            left: 20,
            right: 20,
            result: 16,
        })
        .unwrap();
        assert_eq!(op.out, SqlType::BOOL);
        assert!(map_operator(OperatorRow {
            name: "+".to_string(),
            left: 1700,
            right: 1700,
            result: 1700,
        })
        .is_none());

        let func = map_function(FunctionRow {
            name: "length".to_string(),
            args: vec![25],
            result: 20,
        })
        .unwrap();
        assert_eq!(func.inputs, [SqlType::STRING]);
        assert!(map_function(FunctionRow {
            name: "now".to_string(),
            args: vec![],
            result: 1184,
        })
        .is_none());
        assert!(map_function(FunctionRow {
            name: "f".to_string(),
            args: vec![20, -1],
            result: 20,
        })
        .is_none());
    }

    #[test]
    fn builds_an_indexed_catalog() {
        let catalog = build_catalog(
            [col("t", "a", "INT8", false, false)],
            [
                OperatorRow {
                    name: "+".to_string(),
                    left: 20,
                    right: 20,
                    result: 20,
                },
                OperatorRow {
                    name: "@>".to_string(),
                    left: 3802,
                    right: 3802,
                    result: 16,
                },
            ],
            [FunctionRow {
                name: "upper".to_string(),
                args: vec![25],
                result: 25,
            }],
        );
        assert_eq!(catalog.tables().len(), 1);
        assert_eq!(catalog.operators_for(SqlType::INT).len(), 1);
        assert!(catalog.operators_for(SqlType::BOOL).is_empty());
        assert_eq!(catalog.functions_for(SqlType::STRING)[0].name, "upper");
    }
}
