use std::sync::Arc;

use garde::Validate;
use rand::Rng;

use crate::ast::{CreateTable, RelExpr};
use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::generation::make_create_table;
use crate::names::NameAllocator;
use crate::opts::GenerationOpts;
use crate::scope::Scope;

/// One generation session: a catalog snapshot, a private name allocator and
/// the random source every statement is drawn from.
///
/// Sessions never share allocators. Several sessions may share one catalog.
#[derive(Debug)]
pub struct Session<R> {
    catalog: Arc<Catalog>,
    names: NameAllocator,
    opts: GenerationOpts,
    rng: R,
}

impl<R: Rng> Session<R> {
    /// Fails with [`Error::EmptyCatalog`] when there is nothing to query.
    pub fn new(catalog: impl Into<Arc<Catalog>>, rng: R) -> Result<Self> {
        Self::with_opts(catalog, GenerationOpts::default(), rng)
    }

    pub fn with_opts(
        catalog: impl Into<Arc<Catalog>>,
        opts: GenerationOpts,
        rng: R,
    ) -> Result<Self> {
        opts.validate()?;
        let catalog = catalog.into();
        if !catalog.has_tables() {
            return Err(Error::EmptyCatalog);
        }
        Ok(Self {
            catalog,
            names: NameAllocator::new(),
            opts,
            rng,
        })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn opts(&self) -> &GenerationOpts {
        &self.opts
    }

    /// Installs a reloaded catalog. The old one stays in place on error.
    pub fn set_catalog(&mut self, catalog: impl Into<Arc<Catalog>>) -> Result<()> {
        let catalog = catalog.into();
        if !catalog.has_tables() {
            return Err(Error::EmptyCatalog);
        }
        self.catalog = catalog;
        Ok(())
    }

    /// Generates one statement tree. `None` means this attempt produced
    /// nothing and the caller should simply ask again.
    pub fn generate_ast(&mut self) -> Option<RelExpr> {
        self.names.reset();
        let scope = Scope::root(&self.catalog, &self.names, &self.opts);
        let stmt = scope.make_statement(&mut self.rng);
        if stmt.is_none() {
            tracing::debug!("statement generation failed");
        }
        stmt
    }

    /// [`Session::generate_ast`], rendered.
    pub fn generate_statement(&mut self) -> Option<String> {
        self.generate_ast().map(|stmt| stmt.to_string())
    }

    /// A random `CREATE TABLE` for a table not yet in the catalog.
    pub fn generate_create_table(&mut self) -> CreateTable {
        make_create_table(&self.catalog, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use sqlparser::dialect::PostgreSqlDialect;
    use sqlparser::parser::Parser;

    use super::*;
    use crate::ast::ScalarExpr;
    use crate::generation::test_support;
    use crate::types::BaseType;

    fn session(seed: u64) -> Session<ChaCha8Rng> {
        Session::new(
            test_support::two_table_catalog(),
            ChaCha8Rng::seed_from_u64(seed),
        )
        .unwrap()
    }

    fn assert_parses(sql: &str) {
        if let Err(err) = Parser::parse_sql(&PostgreSqlDialect {}, sql) {
            panic!("generated statement does not parse: {err}\n{sql}");
        }
    }

    /// Aliases declared by table references anywhere in the statement,
    /// including inside subqueries.
    fn declared_aliases(stmt: &RelExpr) -> Vec<String> {
        fn from_rel(rel: &RelExpr, out: &mut Vec<String>) {
            match rel {
                RelExpr::TableRef(t) => out.push(t.alias.clone()),
                RelExpr::Join(j) => {
                    from_rel(&j.lhs, out);
                    from_rel(&j.rhs, out);
                }
                RelExpr::Select(s) => from_rel(&s.from, out),
                RelExpr::SetOp(s) => {
                    from_rel(&s.left, out);
                    from_rel(&s.right, out);
                }
                RelExpr::Insert(i) => from_rel(&i.source, out),
                RelExpr::Values(_) => {}
            }
        }
        let mut out = Vec::new();
        from_rel(stmt, &mut out);
        stmt.for_each_scalar(&mut |e| {
            if let ScalarExpr::Exists(q) | ScalarExpr::ScalarSubquery { query: q, .. } = e {
                from_rel(&q.from, &mut out);
            }
        });
        out
    }

    #[test]
    fn empty_catalog_is_a_startup_error() {
        let err = Session::new(Catalog::default(), ChaCha8Rng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, Error::EmptyCatalog));

        let mut session = session(0);
        assert!(session.set_catalog(Catalog::default()).is_err());
        assert!(session.catalog().has_tables());
    }

    #[test]
    fn invalid_opts_are_rejected() {
        let opts = GenerationOpts {
            limit_prob: -0.5,
            ..Default::default()
        };
        let err = Session::with_opts(test_support::catalog(), opts, ChaCha8Rng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOpts(_)));
    }

    #[test]
    fn same_seed_same_statements() {
        let mut a = session(1234);
        let mut b = session(1234);
        for _ in 0..50 {
            assert_eq!(a.generate_statement(), b.generate_statement());
        }
    }

    #[test]
    fn most_attempts_produce_a_statement() {
        let mut session = session(99);
        let produced = (0..200).filter(|_| session.generate_statement().is_some()).count();
        assert!(produced > 100, "only {produced} of 200 attempts succeeded");
    }

    #[test]
    fn aliases_restart_per_statement() {
        let mut session = session(5);
        let mut first_aliases = HashSet::new();
        for _ in 0..50 {
            let Some(stmt) = session.generate_ast() else {
                continue;
            };
            if let Some(first) = declared_aliases(&stmt).into_iter().min() {
                first_aliases.insert(first);
            }
        }
        assert!(first_aliases.contains("tab_1"));
    }

    #[test]
    fn create_table_is_new_to_the_catalog() {
        let mut session = session(6);
        for _ in 0..10 {
            let create = session.generate_create_table();
            assert!(session.catalog().table(&create.name).is_none());
            assert!(create.to_string().starts_with("create table table_"));
            let grown = session.catalog().with_table(create.to_table());
            session.set_catalog(grown).unwrap();
        }
        assert_eq!(session.catalog().tables().len(), 12);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn generated_statements_parse(seed in any::<u64>()) {
            let mut session = session(seed);
            for _ in 0..8 {
                if let Some(sql) = session.generate_statement() {
                    prop_assert!(!sql.contains("<any>"), "{}", sql);
                    assert_parses(&sql);
                }
            }
        }

        #[test]
        fn typing_holds_throughout(seed in any::<u64>()) {
            let mut session = session(seed);
            for _ in 0..8 {
                let Some(stmt) = session.generate_ast() else {
                    continue;
                };
                let mut ok = true;
                stmt.for_each_scalar(&mut |e| match e {
                    ScalarExpr::BinOp { op, left, right } => {
                        ok &= left.ty().base == op.left.base && right.ty().base == op.right.base;
                    }
                    ScalarExpr::FuncCall { function, args } => {
                        ok &= args.len() == function.inputs.len()
                            && args.iter().zip(&function.inputs).all(|(a, t)| a.ty().base == t.base);
                    }
                    ScalarExpr::Case { condition, then, otherwise } => {
                        ok &= condition.ty().base == BaseType::Bool
                            && then.ty().base == otherwise.ty().base;
                    }
                    other => ok &= !other.ty().is_wildcard(),
                });
                prop_assert!(ok, "{}", stmt);
            }
        }

        #[test]
        fn aliases_are_unique_within_a_statement(seed in any::<u64>()) {
            let mut session = session(seed);
            for _ in 0..8 {
                let Some(stmt) = session.generate_ast() else {
                    continue;
                };
                let aliases = declared_aliases(&stmt);
                let unique: HashSet<_> = aliases.iter().collect();
                prop_assert_eq!(unique.len(), aliases.len(), "{}", stmt);
            }
        }

        #[test]
        fn formatting_is_idempotent(seed in any::<u64>()) {
            let mut session = session(seed);
            if let Some(stmt) = session.generate_ast() {
                prop_assert_eq!(stmt.to_string(), stmt.to_string());
            }
        }
    }
}
