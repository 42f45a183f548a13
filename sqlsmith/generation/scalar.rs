use rand::Rng;

use crate::ast::{Literal, LiteralValue, ScalarExpr};
use crate::dice::{coin, d20, d42, d6, d9, pick};
use crate::generation::backtrack;
use crate::scope::Scope;
use crate::types::{BaseType, SqlType};

impl<'a> Scope<'a> {
    /// Generates a scalar of type `ty` in a fresh child scope.
    ///
    /// A wildcard request is resolved once up front. The resolved type feeds
    /// the variants that need a concrete type, while column references still
    /// accept any column.
    pub fn make_scalar<R: Rng + ?Sized>(&self, rng: &mut R, ty: SqlType) -> Option<ScalarExpr> {
        let picked = ty.resolve(rng);
        let scope = self.push();
        let expr = backtrack(self.opts.retry_count, || scope.scalar_attempt(rng, ty, picked));
        if expr.is_none() {
            tracing::trace!(level = scope.level, %ty, "scalar generation exhausted retries");
        }
        expr
    }

    fn scalar_attempt<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        requested: SqlType,
        picked: SqlType,
    ) -> Option<ScalarExpr> {
        let has_refs = !self.refs.is_empty();
        if self.at_depth_limit() {
            return if has_refs && d20(rng) > 1 {
                self.make_column_ref(rng, requested)
            } else {
                Some(self.make_const(rng, picked))
            };
        }

        if self.level < d6(rng) && d9(rng) == 1 {
            self.make_case(rng, picked)
        } else if self.level < d6(rng) && d42(rng) == 1 {
            self.make_coalesce(rng, picked)
        } else if has_refs && d20(rng) > 1 {
            self.make_column_ref(rng, requested)
        } else if self.level < d6(rng) && d9(rng) == 1 {
            self.make_bin_op(rng, requested)
        } else if self.level < d6(rng) && d9(rng) == 1 {
            self.make_func_call(rng, requested)
        } else if self.level < d6(rng) && d6(rng) == 1 {
            self.make_scalar_subquery(rng, picked)
        } else {
            Some(self.make_const(rng, picked))
        }
    }

    /// Generates a predicate. Comparisons and existence checks are favoured
    /// over the generic scalar machinery.
    pub fn make_bool_expr<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ScalarExpr> {
        if self.at_depth_limit() {
            return self.make_scalar(rng, SqlType::BOOL);
        }
        let scope = self.push();
        let expr = backtrack(self.opts.retry_count, || {
            if d6(rng) < 4 {
                scope.make_bin_op(rng, SqlType::BOOL)
            } else if d6(rng) < 4 {
                scope.make_scalar(rng, SqlType::BOOL)
            } else {
                scope.make_exists(rng)
            }
        });
        if expr.is_none() {
            tracing::trace!(level = scope.level, "predicate generation exhausted retries");
        }
        expr
    }

    pub fn make_case<R: Rng + ?Sized>(&self, rng: &mut R, ty: SqlType) -> Option<ScalarExpr> {
        let condition = self.make_scalar(rng, SqlType::BOOL)?;
        let then = self.make_scalar(rng, ty)?;
        let otherwise = self.make_scalar(rng, ty)?;
        Some(ScalarExpr::Case {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    pub fn make_coalesce<R: Rng + ?Sized>(&self, rng: &mut R, ty: SqlType) -> Option<ScalarExpr> {
        let first = self.make_scalar(rng, ty)?;
        let second = self.make_scalar(rng, ty)?;
        Some(ScalarExpr::Coalesce {
            first: Box::new(first),
            second: Box::new(second),
        })
    }

    /// Never fails. `NULL` is only produced for nullable types.
    pub fn make_const<R: Rng + ?Sized>(&self, rng: &mut R, ty: SqlType) -> ScalarExpr {
        let ty = ty.resolve(rng);
        let value = if ty.nullable && rng.random_bool(self.opts.null_literal_prob) {
            LiteralValue::Null
        } else {
            match ty.base {
                // Kept small: large constants mostly exercise overflow errors.
                BaseType::Int => LiteralValue::Int(i64::from(d6(rng))),
                BaseType::Bool => LiteralValue::Bool(coin(rng)),
                BaseType::String | BaseType::Any => {
                    let s = if coin(rng) { "hello" } else { "goodbye" };
                    LiteralValue::String(s.to_string())
                }
            }
        };
        ScalarExpr::Const(Literal::new(ty, value))
    }

    /// Picks a random visible column; fails if it does not match `ty`.
    pub fn make_column_ref<R: Rng + ?Sized>(&self, rng: &mut R, ty: SqlType) -> Option<ScalarExpr> {
        let table_ref = pick(&self.refs, rng)?;
        let column = pick(table_ref.columns(), rng)?;
        if !ty.matches(&column.ty) {
            return None;
        }
        Some(ScalarExpr::ColumnRef {
            qualifier: table_ref.alias.clone(),
            column: column.name.clone(),
            ty: column.ty,
        })
    }

    pub fn make_bin_op<R: Rng + ?Sized>(&self, rng: &mut R, ty: SqlType) -> Option<ScalarExpr> {
        let ty = ty.resolve(rng);
        let op = pick(self.catalog.operators_for(ty), rng)?;
        let left = self.make_scalar(rng, op.left)?;
        let right = self.make_scalar(rng, op.right)?;
        Some(ScalarExpr::BinOp {
            op: op.clone(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn make_func_call<R: Rng + ?Sized>(&self, rng: &mut R, ty: SqlType) -> Option<ScalarExpr> {
        let ty = ty.resolve(rng);
        let function = pick(self.catalog.functions_for(ty), rng)?;
        let args = function
            .inputs
            .iter()
            .map(|&input| self.make_scalar(rng, input))
            .collect::<Option<Vec<_>>>()?;
        Some(ScalarExpr::FuncCall {
            function: function.clone(),
            args,
        })
    }

    pub fn make_exists<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ScalarExpr> {
        let select = self.make_select(rng, None)?;
        Some(ScalarExpr::Exists(Box::new(select)))
    }

    /// A one-column, one-row select of type `ty`.
    pub fn make_scalar_subquery<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ty: SqlType,
    ) -> Option<ScalarExpr> {
        let mut select = self.make_select(rng, Some(&[ty]))?;
        select.limit = Some(1);
        let ty = select.items.first()?.ty();
        Some(ScalarExpr::ScalarSubquery {
            query: Box::new(select),
            ty,
        })
    }
}
