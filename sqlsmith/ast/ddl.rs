use std::fmt::{self, Display};

use itertools::Itertools;

use crate::catalog::{Column, Table, Writability};
use crate::types::SqlType;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: SqlType,
    /// Expression of a stored computed column.
    pub computed: Option<String>,
}

impl Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)?;
        if !self.ty.nullable {
            f.write_str(" not null")?;
        }
        if let Some(expr) = &self.computed {
            write!(f, " as ({expr}) stored")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl CreateTable {
    /// The catalog entry this statement creates.
    pub fn to_table(&self) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|def| {
                let writability = if def.computed.is_some() {
                    Writability::NotWritable
                } else {
                    Writability::Writable
                };
                Column::new(def.name.clone(), def.ty).with_writability(writability)
            })
            .collect();
        Table::new(self.name.clone(), columns)
    }
}

impl Display for CreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "create table {} ({})",
            self.name,
            self.columns.iter().format(", ")
        )
    }
}
