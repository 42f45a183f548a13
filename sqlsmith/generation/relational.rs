use rand::Rng;
use strum::VariantArray;

use crate::ast::{
    Insert, Join, RelExpr, ScalarExpr, Select, SetOp, SetOperator, TableRef, Values,
};
use crate::catalog::{Column, Writability};
use crate::dice::{coin, d6, pick};
use crate::generation::{backtrack, desired_or_random};
use crate::scope::Scope;
use crate::types::SqlType;

impl<'a> Scope<'a> {
    /// Top-level entry: an INSERT or a row-returning statement.
    pub fn make_statement<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<RelExpr> {
        if rng.random_bool(self.opts.insert_prob) {
            self.make_insert(rng).map(RelExpr::Insert)
        } else {
            self.make_returning_statement(rng, None)
        }
    }

    /// A SELECT, VALUES or set operation producing `desired` column types, or
    /// a random non-empty list of them when `desired` is `None`.
    pub fn make_returning_statement<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        desired: Option<&[SqlType]>,
    ) -> Option<RelExpr> {
        if desired.is_some_and(<[SqlType]>::is_empty) {
            return None;
        }
        if self.at_depth_limit() {
            return self.make_values(rng, desired).map(RelExpr::Values);
        }
        let stmt = backtrack(self.opts.retry_count, || {
            if self.level < d6(rng) && d6(rng) < 3 {
                self.make_set_op(rng, desired).map(RelExpr::SetOp)
            } else if d6(rng) < 3 {
                self.make_values(rng, desired).map(RelExpr::Values)
            } else {
                self.make_select(rng, desired).map(RelExpr::Select)
            }
        });
        if stmt.is_none() {
            tracing::trace!(level = self.level, "statement generation exhausted retries");
        }
        stmt
    }

    pub fn make_select<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        desired: Option<&[SqlType]>,
    ) -> Option<Select> {
        let (from_scope, from) = self.make_data_source(rng)?;
        let items = from_scope.make_select_list(rng, desired)?;
        let filter = if coin(rng) {
            Some(from_scope.make_bool_expr(rng)?)
        } else {
            None
        };
        let mut order_by = Vec::new();
        while coin(rng) {
            order_by.push(from_scope.make_scalar(rng, SqlType::ANY)?);
        }
        let distinct = rng.random_bool(self.opts.distinct_prob);
        let limit = if rng.random_bool(self.opts.limit_prob) {
            Some(rng.random_range(1..=self.opts.max_limit))
        } else {
            None
        };
        Some(Select {
            distinct,
            items,
            from: Box::new(from),
            filter,
            order_by,
            limit,
        })
    }

    /// One expression per desired type, generated against this (the FROM)
    /// scope so column references resolve.
    pub fn make_select_list<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        desired: Option<&[SqlType]>,
    ) -> Option<Vec<ScalarExpr>> {
        desired_or_random(rng, desired)?
            .into_iter()
            .map(|ty| self.make_scalar(rng, ty))
            .collect()
    }

    /// A FROM item plus the scope that sees it: this scope's refs followed by
    /// the references the item introduces.
    pub fn make_data_source<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Scope<'a>, RelExpr)> {
        if !self.at_depth_limit() && self.level < 3 + d6(rng) && d6(rng) > 4 {
            let (scope, join) = self.make_join(rng)?;
            return Some((scope, RelExpr::Join(join)));
        }
        let (scope, table_ref) = self.make_table_ref(rng)?;
        Some((scope, RelExpr::TableRef(table_ref)))
    }

    /// Inner join of two independent data sources. Each side is generated
    /// without seeing the other; the ON predicate sees both.
    pub fn make_join<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Scope<'a>, Join)> {
        let mut scope = self.push();
        let inherited = scope.refs.len();
        let (left_scope, lhs) = scope.make_data_source(rng)?;
        let (right_scope, rhs) = scope.make_data_source(rng)?;

        scope.refs.extend_from_slice(&left_scope.refs[inherited..]);
        scope.refs.extend_from_slice(&right_scope.refs[inherited..]);
        let on = scope.make_bool_expr(rng)?;

        let mut columns = lhs.columns();
        columns.extend(rhs.columns());
        let join = Join {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            on,
            columns,
        };
        Some((scope, join))
    }

    /// A random catalog table under a fresh alias. Fails on an empty catalog.
    pub fn make_table_ref<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(Scope<'a>, TableRef)> {
        let table = pick(self.catalog.tables(), rng)?.clone();
        let table_ref = TableRef {
            table,
            alias: self.allocate_name("tab"),
        };
        let mut scope = self.push();
        scope.refs.push(table_ref.clone());
        Some((scope, table_ref))
    }

    pub fn make_values<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        desired: Option<&[SqlType]>,
    ) -> Option<Values> {
        let scope = self.push();
        let types = desired_or_random(rng, desired)?;
        let count = rng.random_range(1..=self.opts.max_values_rows);
        let rows = (0..count)
            .map(|_| {
                types
                    .iter()
                    .map(|&ty| scope.make_scalar(rng, ty))
                    .collect::<Option<Vec<_>>>()
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Values { rows })
    }

    /// Both sides are generated for the same column types.
    pub fn make_set_op<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        desired: Option<&[SqlType]>,
    ) -> Option<SetOp> {
        let scope = self.push();
        let types = desired_or_random(rng, desired)?;
        let left = scope.make_returning_statement(rng, Some(&types))?;
        let right = scope.make_returning_statement(rng, Some(&types))?;
        let op = *pick(SetOperator::VARIANTS, rng)?;
        Some(SetOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Targets every column that must be written, every non-nullable writable
    /// column, and each nullable writable column on a coin flip. Fails when
    /// nothing ends up targeted.
    pub fn make_insert<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Insert> {
        let table = pick(self.catalog.tables(), rng)?.clone();
        let targets: Vec<Column> = table
            .columns
            .iter()
            .filter(|column| {
                column.is_insert_target()
                    && (column.writability == Writability::MustBeWritten
                        || !column.ty.nullable
                        || coin(rng))
            })
            .cloned()
            .collect();
        if targets.is_empty() {
            return None;
        }
        let types: Vec<SqlType> = targets.iter().map(|c| c.ty).collect();
        let source = self.make_returning_statement(rng, Some(&types))?;
        Some(Insert {
            table: table.name.clone(),
            targets,
            source: Box::new(source),
        })
    }
}
