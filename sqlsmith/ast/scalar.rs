use std::fmt::{self, Display};

use itertools::Itertools;

use crate::ast::Select;
use crate::catalog::{Function, Operator};
use crate::types::SqlType;

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    Case {
        condition: Box<ScalarExpr>,
        then: Box<ScalarExpr>,
        otherwise: Box<ScalarExpr>,
    },
    Coalesce {
        first: Box<ScalarExpr>,
        second: Box<ScalarExpr>,
    },
    Const(Literal),
    ColumnRef {
        qualifier: String,
        column: String,
        ty: SqlType,
    },
    BinOp {
        op: Operator,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
    FuncCall {
        function: Function,
        args: Vec<ScalarExpr>,
    },
    Exists(Box<Select>),
    ScalarSubquery {
        query: Box<Select>,
        ty: SqlType,
    },
}

impl ScalarExpr {
    pub fn ty(&self) -> SqlType {
        match self {
            ScalarExpr::Case { then, .. } => then.ty(),
            ScalarExpr::Coalesce { first, .. } => first.ty(),
            ScalarExpr::Const(lit) => lit.ty,
            ScalarExpr::ColumnRef { ty, .. } => *ty,
            ScalarExpr::BinOp { op, .. } => op.out,
            ScalarExpr::FuncCall { function, .. } => function.out,
            ScalarExpr::Exists(_) => SqlType::BOOL_NOT_NULL,
            ScalarExpr::ScalarSubquery { ty, .. } => *ty,
        }
    }

    /// Visits this expression and everything below it, including the bodies
    /// of subqueries.
    pub fn for_each<'a>(&'a self, f: &mut impl FnMut(&'a ScalarExpr)) {
        f(self);
        match self {
            ScalarExpr::Case {
                condition,
                then,
                otherwise,
            } => {
                condition.for_each(f);
                then.for_each(f);
                otherwise.for_each(f);
            }
            ScalarExpr::Coalesce { first, second } => {
                first.for_each(f);
                second.for_each(f);
            }
            ScalarExpr::BinOp { left, right, .. } => {
                left.for_each(f);
                right.for_each(f);
            }
            ScalarExpr::FuncCall { args, .. } => args.iter().for_each(|arg| arg.for_each(f)),
            ScalarExpr::Exists(query) | ScalarExpr::ScalarSubquery { query, .. } => {
                query.for_each_scalar(f)
            }
            ScalarExpr::Const(_) | ScalarExpr::ColumnRef { .. } => {}
        }
    }
}

impl Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Case {
                condition,
                then,
                otherwise,
            } => write!(f, "case when {condition} then {then} else {otherwise} end"),
            ScalarExpr::Coalesce { first, second } => write!(
                f,
                "cast(coalesce({first}, {second}) as {})",
                first.ty().base.sql_name()
            ),
            ScalarExpr::Const(lit) => lit.fmt(f),
            ScalarExpr::ColumnRef {
                qualifier, column, ..
            } => write!(f, "{qualifier}.{column}"),
            ScalarExpr::BinOp { op, left, right } => write!(f, "({left} {} {right})", op.name),
            ScalarExpr::FuncCall { function, args } => {
                write!(f, "{}({})", function.name, args.iter().format(", "))
            }
            ScalarExpr::Exists(query) => write!(f, "exists({query})"),
            ScalarExpr::ScalarSubquery { query, .. } => write!(f, "({query})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub ty: SqlType,
    pub value: LiteralValue,
}

impl Literal {
    pub fn new(ty: SqlType, value: LiteralValue) -> Self {
        Self { ty, value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    /// Rendered with a cast so the engine knows its type.
    Null,
    Int(i64),
    Bool(bool),
    String(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            LiteralValue::Null => write!(f, "null::{}", self.ty.base.sql_name()),
            LiteralValue::Int(n) => write!(f, "{n}"),
            LiteralValue::Bool(b) => write!(f, "{b}"),
            LiteralValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}
