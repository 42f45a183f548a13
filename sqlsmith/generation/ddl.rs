use rand::Rng;

use crate::ast::{ColumnDef, CreateTable};
use crate::catalog::Catalog;
use crate::dice::{coin, d6, one_in, pick};
use crate::types::{BaseType, SqlType};

const MAX_COLUMNS: usize = 8;
const NAME_DRAWS: usize = 16;

/// A random `CREATE TABLE` whose name is not already in `catalog`.
pub fn make_create_table<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> CreateTable {
    let name = table_name(catalog, rng);
    let count = rng.random_range(1..=MAX_COLUMNS);
    let mut columns: Vec<ColumnDef> = (1..=count)
        .map(|i| ColumnDef {
            name: format!("col_{i}"),
            ty: SqlType::new(SqlType::random(rng).base, coin(rng)),
            computed: None,
        })
        .collect();

    if one_in(10, rng) {
        let ints: Vec<&str> = columns
            .iter()
            .filter(|c| c.ty.base == BaseType::Int)
            .map(|c| c.name.as_str())
            .collect();
        if let Some(source) = pick(&ints, rng) {
            let computed = ColumnDef {
                name: format!("col_{}", count + 1),
                ty: SqlType::INT,
                computed: Some(format!("{source} + {}", d6(rng))),
            };
            columns.push(computed);
        }
    }

    CreateTable { name, columns }
}

fn table_name<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> String {
    let taken = |name: &str| catalog.table(name).is_some();
    for _ in 0..NAME_DRAWS {
        let name = format!("table_{}", rng.random_range(0..1_000_000u32));
        if !taken(&name) {
            return name;
        }
    }
    (0..)
        .map(|i: u64| format!("table_{i}"))
        .find(|name| !taken(name))
        .unwrap_or_default()
}
