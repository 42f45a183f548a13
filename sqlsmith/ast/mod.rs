//! Generated statement trees.
//!
//! Both node families are closed enums. Every node renders itself as SQL
//! through [`std::fmt::Display`]; relational nodes also expose their output
//! columns and scalar nodes their result type.

mod ddl;
mod relational;
mod scalar;

pub use ddl::{ColumnDef, CreateTable};
pub use relational::{Insert, Join, RelExpr, Select, SetOp, SetOperator, TableRef, Values};
pub use scalar::{Literal, LiteralValue, ScalarExpr};
