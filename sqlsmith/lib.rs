//! Random, type- and scope-aware SQL generation for fuzzing database engines.
//!
//! Statements are built top-down. Each level asks for an input of a given
//! shape (a relation with certain column types, or a scalar of a certain
//! type) in a scope that knows which tables are visible. Instead of solving
//! constraints, every generator simply tries random alternatives a bounded
//! number of times and reports failure to its parent, which may retry at a
//! higher level.
//!
//! ```no_run
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use sqlsmith::{Catalog, Column, Session, SqlType, Table};
//!
//! let catalog = Catalog::builder()
//!     .add_table(Table::new("t", vec![Column::new("a", SqlType::INT_NOT_NULL)]))
//!     .build();
//! let mut session = Session::new(catalog, ChaCha8Rng::seed_from_u64(0))?;
//! if let Some(sql) = session.generate_statement() {
//!     println!("{sql}");
//! }
//! # Ok::<(), sqlsmith::Error>(())
//! ```

pub mod ast;
pub mod catalog;
mod dice;
mod error;
mod generation;
mod names;
mod opts;
mod scope;
mod session;
pub mod types;

pub use catalog::{Catalog, CatalogBuilder, Column, Function, Operator, Table, Writability};
pub use error::{Error, Result};
pub use generation::make_create_table;
pub use names::NameAllocator;
pub use opts::GenerationOpts;
pub use scope::Scope;
pub use session::Session;
pub use types::{BaseType, SqlType};
