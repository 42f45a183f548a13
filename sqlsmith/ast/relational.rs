use std::fmt::{self, Display};
use std::sync::Arc;

use itertools::Itertools;

use crate::ast::ScalarExpr;
use crate::catalog::{Column, Table, Writability};

/// Output column name the engine assigns to a non-column select item.
const ANONYMOUS_COLUMN: &str = "?column?";

#[derive(Debug, Clone, PartialEq)]
pub enum RelExpr {
    TableRef(TableRef),
    Join(Join),
    Select(Select),
    SetOp(SetOp),
    Values(Values),
    Insert(Insert),
}

impl RelExpr {
    /// Output columns in order. Statement-only nodes expose none.
    pub fn columns(&self) -> Vec<Column> {
        match self {
            RelExpr::TableRef(t) => t.columns().to_vec(),
            RelExpr::Join(j) => j.columns.clone(),
            RelExpr::Select(s) => s.columns(),
            RelExpr::SetOp(s) => s.left.columns(),
            RelExpr::Values(_) | RelExpr::Insert(_) => Vec::new(),
        }
    }

    /// Visits every scalar expression in the tree, outermost first.
    pub fn for_each_scalar<'a>(&'a self, f: &mut impl FnMut(&'a ScalarExpr)) {
        match self {
            RelExpr::TableRef(_) => {}
            RelExpr::Join(j) => {
                j.lhs.for_each_scalar(f);
                j.rhs.for_each_scalar(f);
                j.on.for_each(f);
            }
            RelExpr::Select(s) => s.for_each_scalar(f),
            RelExpr::SetOp(s) => {
                s.left.for_each_scalar(f);
                s.right.for_each_scalar(f);
            }
            RelExpr::Values(v) => v.rows.iter().flatten().for_each(|e| e.for_each(f)),
            RelExpr::Insert(i) => i.source.for_each_scalar(f),
        }
    }
}

impl Display for RelExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelExpr::TableRef(t) => t.fmt(f),
            RelExpr::Join(j) => j.fmt(f),
            RelExpr::Select(s) => s.fmt(f),
            RelExpr::SetOp(s) => s.fmt(f),
            RelExpr::Values(v) => v.fmt(f),
            RelExpr::Insert(i) => i.fmt(f),
        }
    }
}

/// A catalog table under a statement-unique alias. Also serves as the
/// reference a scope resolves column names against.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub table: Arc<Table>,
    pub alias: String,
}

impl TableRef {
    pub fn columns(&self) -> &[Column] {
        &self.table.columns
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.table.name, self.alias)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub lhs: Box<RelExpr>,
    pub rhs: Box<RelExpr>,
    pub on: ScalarExpr,
    /// Left columns followed by right columns, duplicates kept.
    pub columns: Vec<Column>,
}

impl Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} join ", self.lhs)?;
        match self.rhs.as_ref() {
            RelExpr::Join(_) => write!(f, "({})", self.rhs)?,
            rhs => write!(f, "{rhs}")?,
        }
        write!(f, " on {}", self.on)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub distinct: bool,
    pub items: Vec<ScalarExpr>,
    pub from: Box<RelExpr>,
    pub filter: Option<ScalarExpr>,
    pub order_by: Vec<ScalarExpr>,
    pub limit: Option<u32>,
}

impl Select {
    pub fn columns(&self) -> Vec<Column> {
        self.items
            .iter()
            .map(|item| {
                let name = match item {
                    ScalarExpr::ColumnRef { column, .. } => column.as_str(),
                    _ => ANONYMOUS_COLUMN,
                };
                Column::new(name, item.ty()).with_writability(Writability::NotWritable)
            })
            .collect()
    }

    pub fn for_each_scalar<'a>(&'a self, f: &mut impl FnMut(&'a ScalarExpr)) {
        self.from.for_each_scalar(f);
        for item in &self.items {
            item.for_each(f);
        }
        if let Some(filter) = &self.filter {
            filter.for_each(f);
        }
        for term in &self.order_by {
            term.for_each(f);
        }
    }
}

impl Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("select ")?;
        if self.distinct {
            f.write_str("distinct ")?;
        }
        write!(f, "{} from {}", self.items.iter().format(", "), self.from)?;
        if let Some(filter) = &self.filter {
            write!(f, " where {filter}")?;
        }
        if !self.order_by.is_empty() {
            write!(f, " order by {}", self.order_by.iter().format(", "))?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {limit}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::VariantArray)]
pub enum SetOperator {
    Union,
    UnionAll,
    Except,
    ExceptAll,
    Intersect,
    IntersectAll,
}

impl SetOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            SetOperator::Union => "union",
            SetOperator::UnionAll => "union all",
            SetOperator::Except => "except",
            SetOperator::ExceptAll => "except all",
            SetOperator::Intersect => "intersect",
            SetOperator::IntersectAll => "intersect all",
        }
    }
}

impl Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOp {
    pub op: SetOperator,
    pub left: Box<RelExpr>,
    pub right: Box<RelExpr>,
}

impl Display for SetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {} ({})", self.left, self.op, self.right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Values {
    pub rows: Vec<Vec<ScalarExpr>>,
}

impl Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("values ")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "({})", row.iter().format(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub targets: Vec<Column>,
    pub source: Box<RelExpr>,
}

impl Display for Insert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insert into {} ({}) {}",
            self.table,
            self.targets.iter().map(|c| &c.name).format(", "),
            self.source
        )
    }
}
