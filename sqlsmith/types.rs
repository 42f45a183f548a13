//! The closed type system the generator reasons about.
//!
//! Only three concrete base types are modelled. `Any` exists purely as a
//! request wildcard: it is resolved to a concrete type before anything that
//! needs type identity, and a generated node never reports it as its own type.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    Any,
    Int,
    Bool,
    String,
}

impl BaseType {
    /// Every base type a generated node may carry.
    pub const CONCRETE: [BaseType; 3] = [BaseType::Int, BaseType::Bool, BaseType::String];

    pub fn is_wildcard(self) -> bool {
        self == BaseType::Any
    }

    /// Maps a Postgres type oid onto a base type.
    pub fn from_oid(oid: u32) -> Option<Self> {
        match oid {
            20 => Some(BaseType::Int),
            16 => Some(BaseType::Bool),
            25 => Some(BaseType::String),
            _ => None,
        }
    }

    /// Maps an engine type name (as reported by `information_schema`) onto a
    /// base type. Matching is case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "INT" | "INT2" | "INT4" | "INT8" | "INTEGER" | "BIGINT" | "SMALLINT" => {
                Some(BaseType::Int)
            }
            "BOOL" | "BOOLEAN" => Some(BaseType::Bool),
            "STRING" | "TEXT" | "VARCHAR" | "CHAR" => Some(BaseType::String),
            _ => None,
        }
    }

    /// The type name used in casts and `NULL` literals.
    pub fn sql_name(self) -> &'static str {
        match self {
            BaseType::Any => "<any>",
            BaseType::Int => "int",
            BaseType::Bool => "bool",
            BaseType::String => "string",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

fn default_nullable() -> bool {
    true
}

/// A base type plus nullability.
///
/// Nullability never takes part in matching; it is carried so that constants
/// know whether a `NULL` literal is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SqlType {
    pub base: BaseType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

impl SqlType {
    pub const ANY: SqlType = SqlType::nullable(BaseType::Any);
    pub const INT: SqlType = SqlType::nullable(BaseType::Int);
    pub const BOOL: SqlType = SqlType::nullable(BaseType::Bool);
    pub const STRING: SqlType = SqlType::nullable(BaseType::String);
    pub const INT_NOT_NULL: SqlType = SqlType::not_null(BaseType::Int);
    pub const BOOL_NOT_NULL: SqlType = SqlType::not_null(BaseType::Bool);
    pub const STRING_NOT_NULL: SqlType = SqlType::not_null(BaseType::String);

    pub const fn new(base: BaseType, nullable: bool) -> Self {
        Self { base, nullable }
    }

    pub const fn nullable(base: BaseType) -> Self {
        Self::new(base, true)
    }

    pub const fn not_null(base: BaseType) -> Self {
        Self::new(base, false)
    }

    pub fn is_wildcard(&self) -> bool {
        self.base.is_wildcard()
    }

    /// Returns true if a node of type `candidate` satisfies this request.
    pub fn matches(&self, candidate: &SqlType) -> bool {
        self.is_wildcard() || self.base == candidate.base
    }

    /// Draws a nullable concrete type uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let base = BaseType::CONCRETE[rng.random_range(0..BaseType::CONCRETE.len())];
        SqlType::nullable(base)
    }

    /// Returns `self` if concrete, otherwise a random concrete type.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        if self.is_wildcard() {
            SqlType::random(rng)
        } else {
            self
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)
    }
}
