//! Drives [`sqlsmith`] against a database speaking the Postgres wire
//! protocol. Each step submits one random statement and classifies the
//! outcome; a lost connection is reported as a crash together with the
//! statement that caused it.

pub mod backend;
pub mod introspect;
pub mod profile;
pub mod runner;

pub use backend::{Backend, ConnectOpts, DryRunBackend, ExecError, PgBackend};
pub use profile::{Profile, ProfileType};
pub use runner::{CrashReport, RunConfig, RunStats, Runner};
