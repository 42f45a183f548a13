use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{BaseType, SqlType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Writability {
    NotWritable,
    #[default]
    Writable,
    MustBeWritten,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SqlType,
    #[serde(default)]
    pub writability: Writability,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
            writability: Writability::Writable,
        }
    }

    pub fn with_writability(mut self, writability: Writability) -> Self {
        self.writability = writability;
        self
    }

    /// Whether an INSERT may name this column as a target.
    pub fn is_insert_target(&self) -> bool {
        self.writability != Writability::NotWritable
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    fn is_concrete(&self) -> bool {
        !self.columns.is_empty() && self.columns.iter().all(|c| !c.ty.is_wildcard())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub name: String,
    pub left: SqlType,
    pub right: SqlType,
    pub out: SqlType,
}

impl Operator {
    pub fn new(name: impl Into<String>, left: SqlType, right: SqlType, out: SqlType) -> Self {
        Self {
            name: name.into(),
            left,
            right,
            out,
        }
    }

    fn is_concrete(&self) -> bool {
        ![self.left, self.right, self.out]
            .iter()
            .any(SqlType::is_wildcard)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<SqlType>,
    pub out: SqlType,
}

impl Function {
    pub fn new(name: impl Into<String>, inputs: Vec<SqlType>, out: SqlType) -> Self {
        Self {
            name: name.into(),
            inputs,
            out,
        }
    }

    fn is_concrete(&self) -> bool {
        !self.out.is_wildcard() && !self.inputs.iter().any(SqlType::is_wildcard)
    }
}

/// Read-only snapshot of everything the generator may reference.
///
/// Operators and functions are indexed by the base of their output type.
/// Nothing in here ever mentions the wildcard type: the builder drops any
/// table, operator or function that does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CatalogDef", into = "CatalogDef")]
pub struct Catalog {
    tables: Vec<Arc<Table>>,
    operators: BTreeMap<BaseType, Vec<Operator>>,
    functions: BTreeMap<BaseType, Vec<Function>>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn tables(&self) -> &[Arc<Table>] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Arc<Table>> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn has_tables(&self) -> bool {
        !self.tables.is_empty()
    }

    /// Operators producing exactly `out`. Callers resolve wildcards first; a
    /// wildcard request yields no candidates.
    pub fn operators_for(&self, out: SqlType) -> &[Operator] {
        self.operators
            .get(&out.base)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Functions producing exactly `out`, with the same wildcard rule as
    /// [`Catalog::operators_for`].
    pub fn functions_for(&self, out: SqlType) -> &[Function] {
        self.functions
            .get(&out.base)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn operators(&self) -> impl Iterator<Item = &Operator> {
        self.operators.values().flatten()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values().flatten()
    }

    /// Returns a copy of this catalog with `table` added, replacing any table of
    /// the same name.
    pub fn with_table(&self, table: Table) -> Catalog {
        let mut builder = CatalogBuilder::from(self.clone());
        builder.tables.retain(|t| t.name != table.name);
        builder.add_table(table).build()
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    tables: Vec<Arc<Table>>,
    operators: Vec<Operator>,
    functions: Vec<Function>,
}

impl CatalogBuilder {
    pub fn add_table(mut self, table: Table) -> Self {
        self.tables.push(Arc::new(table));
        self
    }

    pub fn add_operator(mut self, op: Operator) -> Self {
        self.operators.push(op);
        self
    }

    pub fn add_function(mut self, func: Function) -> Self {
        self.functions.push(func);
        self
    }

    pub fn build(self) -> Catalog {
        let mut catalog = Catalog::default();
        for table in self.tables {
            if table.is_concrete() {
                catalog.tables.push(table);
            } else {
                tracing::debug!(table = %table.name, "dropping table with untyped columns");
            }
        }
        for op in self.operators.into_iter().filter(Operator::is_concrete) {
            catalog.operators.entry(op.out.base).or_default().push(op);
        }
        for func in self.functions.into_iter().filter(Function::is_concrete) {
            catalog.functions.entry(func.out.base).or_default().push(func);
        }
        catalog
    }
}

impl From<Catalog> for CatalogBuilder {
    fn from(catalog: Catalog) -> Self {
        let Catalog {
            tables,
            operators,
            functions,
        } = catalog;
        Self {
            tables,
            operators: operators.into_values().flatten().collect(),
            functions: functions.into_values().flatten().collect(),
        }
    }
}

/// Flat serialized form of a [`Catalog`].
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CatalogDef {
    tables: Vec<Table>,
    operators: Vec<Operator>,
    functions: Vec<Function>,
}

impl From<CatalogDef> for Catalog {
    fn from(def: CatalogDef) -> Self {
        let builder = def
            .tables
            .into_iter()
            .fold(Catalog::builder(), CatalogBuilder::add_table);
        let builder = def
            .operators
            .into_iter()
            .fold(builder, CatalogBuilder::add_operator);
        def.functions
            .into_iter()
            .fold(builder, CatalogBuilder::add_function)
            .build()
    }
}

impl From<Catalog> for CatalogDef {
    fn from(catalog: Catalog) -> Self {
        let CatalogBuilder {
            tables,
            operators,
            functions,
        } = catalog.into();
        Self {
            tables: tables.iter().map(|t| Table::clone(t)).collect(),
            operators,
            functions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::builder()
            .add_table(Table::new(
                "t",
                vec![
                    Column::new("a", SqlType::INT_NOT_NULL),
                    Column::new("b", SqlType::STRING),
                ],
            ))
            .add_operator(Operator::new("+", SqlType::INT, SqlType::INT, SqlType::INT))
            .add_operator(Operator::new("=", SqlType::INT, SqlType::INT, SqlType::BOOL))
            .add_function(Function::new("length", vec![SqlType::STRING], SqlType::INT))
            .build()
    }

    #[test]
    fn lookup_by_output_type() {
        let catalog = sample();
        let int_ops = catalog.operators_for(SqlType::INT);
        assert_eq!(int_ops.len(), 1);
        assert_eq!(int_ops[0].name, "+");
        assert_eq!(catalog.operators_for(SqlType::BOOL_NOT_NULL)[0].name, "=");
        assert!(catalog.operators_for(SqlType::STRING).is_empty());
        assert_eq!(catalog.functions_for(SqlType::INT)[0].name, "length");
        assert!(catalog.functions_for(SqlType::BOOL).is_empty());
    }

    #[test]
    fn wildcard_lookup_is_empty() {
        let catalog = sample();
        assert!(catalog.operators_for(SqlType::ANY).is_empty());
        assert!(catalog.functions_for(SqlType::ANY).is_empty());
    }

    #[test]
    fn builder_drops_untyped_entries() {
        let catalog = Catalog::builder()
            .add_table(Table::new("ok", vec![Column::new("x", SqlType::INT)]))
            .add_table(Table::new("bad", vec![Column::new("y", SqlType::ANY)]))
            .add_table(Table::new("empty", vec![]))
            .add_operator(Operator::new("||", SqlType::ANY, SqlType::STRING, SqlType::STRING))
            .add_function(Function::new("f", vec![SqlType::INT], SqlType::ANY))
            .build();
        assert_eq!(catalog.tables().len(), 1);
        assert_eq!(catalog.tables()[0].name, "ok");
        assert_eq!(catalog.operators().count(), 0);
        assert_eq!(catalog.functions().count(), 0);
    }

    #[test]
    fn with_table_replaces_by_name() {
        let catalog = sample();
        let grown = catalog.with_table(Table::new("u", vec![Column::new("c", SqlType::BOOL)]));
        assert_eq!(grown.tables().len(), 2);
        assert_eq!(catalog.tables().len(), 1);

        let replaced = grown.with_table(Table::new("u", vec![Column::new("d", SqlType::INT)]));
        assert_eq!(replaced.tables().len(), 2);
        assert_eq!(replaced.table("u").unwrap().columns[0].name, "d");
        assert_eq!(replaced.operators().count(), 2);
    }

    #[test]
    fn json_round_trip_keeps_indexes() {
        let catalog = sample();
        let json = serde_json::to_string(&catalog).unwrap();
        let back: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn json_defaults() {
        let catalog: Catalog = serde_json::from_str(
            r#"{
                "tables": [
                    {"name": "t", "columns": [
                        {"name": "a", "type": {"base": "int", "nullable": false}},
                        {"name": "g", "type": {"base": "int"}, "writability": "not_writable"}
                    ]}
                ]
            }"#,
        )
        .unwrap();
        let t = catalog.table("t").unwrap();
        assert_eq!(t.columns[0].writability, Writability::Writable);
        assert!(t.columns[1].ty.nullable);
        assert!(!t.columns[1].is_insert_target());
        assert_eq!(catalog.operators().count(), 0);
    }
}
