//! Type-directed generation.
//!
//! Every generator is a method on [`Scope`](crate::scope::Scope) that takes
//! the random source explicitly and returns `None` when it could not build
//! something of the requested shape. `None` is ordinary: the caller either
//! tries another random choice or gives up on its own subtree.

mod ddl;
mod relational;
mod scalar;

pub use ddl::make_create_table;

use rand::Rng;

use crate::dice::d6;
use crate::types::SqlType;

/// Runs `attempt` up to `attempts` times and returns the first success.
fn backtrack<T>(attempts: u32, mut attempt: impl FnMut() -> Option<T>) -> Option<T> {
    (0..attempts).find_map(|_| attempt())
}

/// A random non-empty column type list, one more entry for every roll that is
/// not a one.
fn random_type_list<R: Rng + ?Sized>(rng: &mut R) -> Vec<SqlType> {
    let mut types = vec![SqlType::random(rng)];
    while d6(rng) != 1 {
        types.push(SqlType::random(rng));
    }
    types
}

/// The explicit list if one was given, otherwise a random one. An explicit
/// empty list yields `None`: no statement has zero output columns.
fn desired_or_random<R: Rng + ?Sized>(
    rng: &mut R,
    desired: Option<&[SqlType]>,
) -> Option<Vec<SqlType>> {
    match desired {
        Some([]) => None,
        Some(types) => Some(types.to_vec()),
        None => Some(random_type_list(rng)),
    }
}
