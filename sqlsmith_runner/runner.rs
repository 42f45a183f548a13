use anyhow::{bail, Context};
use garde::Validate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sqlsmith::{make_create_table, Session};

use crate::backend::{Backend, ExecError};
use crate::profile::Profile;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub seed: u64,
    pub iterations: u64,
    /// Log every generated statement at `info` instead of `debug`.
    pub verbose: bool,
    pub profile: Profile,
}

/// The statement that took the server down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashReport {
    pub statement: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub generated: u64,
    pub generation_failures: u64,
    pub executed_ok: u64,
    pub rejected: u64,
    pub internal_errors: u64,
    pub tables_created: u64,
    pub ddl_failures: u64,
    pub crash: Option<CrashReport>,
}

impl RunStats {
    fn record_crash(&mut self, statement: String, message: String) {
        tracing::error!(%statement, %message, "server crashed");
        self.crash = Some(CrashReport { statement, message });
    }
}

/// Drives one session against one backend.
pub struct Runner<B> {
    backend: B,
    session: Session<ChaCha8Rng>,
    config: RunConfig,
}

impl<B: Backend> Runner<B> {
    /// Loads the catalog and starts a session seeded from `config.seed`.
    ///
    /// An empty database gets one random table first, unless the profile
    /// disables schema changes, in which case it is a startup error.
    pub async fn new(mut backend: B, config: RunConfig) -> anyhow::Result<Self> {
        config.profile.validate().context("invalid profile")?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut catalog = backend
            .load_catalog()
            .await
            .context("failed to load catalog")?;

        if !catalog.has_tables() && config.profile.ddl_interval > 0 {
            let create = make_create_table(&catalog, &mut rng);
            tracing::info!(statement = %create, "catalog is empty, creating a table");
            backend
                .create_table(&create)
                .await
                .context("failed to create the first table")?;
            catalog = backend
                .load_catalog()
                .await
                .context("failed to reload catalog")?;
        }

        let session = Session::with_opts(catalog, config.profile.generation.clone(), rng)
            .context("failed to start a generation session")?;
        tracing::info!(
            seed = config.seed,
            tables = session.catalog().tables().len(),
            "session started"
        );
        Ok(Self {
            backend,
            session,
            config,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> &Session<ChaCha8Rng> {
        &self.session
    }

    /// Runs until `iterations` steps are done or the server crashes.
    ///
    /// Fails only when generation keeps failing, which points at a catalog
    /// the generator cannot work with.
    pub async fn run(&mut self) -> anyhow::Result<RunStats> {
        let profile = &self.config.profile;
        let ddl_interval = profile.ddl_interval;
        let progress_interval = profile.progress_interval;
        let max_consecutive_failures = profile.max_consecutive_failures;

        let mut stats = RunStats::default();
        let mut consecutive_failures = 0;

        for step in 0..self.config.iterations {
            if ddl_interval > 0 && step % ddl_interval == 0 {
                self.mutate_schema(&mut stats).await?;
                if stats.crash.is_some() {
                    break;
                }
            }

            let Some(sql) = self.session.generate_statement() else {
                stats.generation_failures += 1;
                consecutive_failures += 1;
                if consecutive_failures >= max_consecutive_failures {
                    bail!("statement generation failed {consecutive_failures} times in a row");
                }
                continue;
            };
            consecutive_failures = 0;
            stats.generated += 1;

            if self.config.verbose {
                tracing::info!(step, "{sql}");
            } else {
                tracing::debug!(step, "{sql}");
            }

            match self.backend.execute(&sql).await {
                Ok(()) => stats.executed_ok += 1,
                Err(ExecError::Rejected(message)) => {
                    tracing::debug!(%message, "rejected");
                    stats.rejected += 1;
                }
                Err(ExecError::Internal(message)) => {
                    tracing::error!(statement = %sql, %message, "internal error");
                    stats.internal_errors += 1;
                }
                Err(ExecError::ConnectionLost(message)) => {
                    stats.record_crash(sql, message);
                    break;
                }
            }

            if (step + 1) % progress_interval == 0 {
                tracing::info!(
                    step = step + 1,
                    generated = stats.generated,
                    ok = stats.executed_ok,
                    rejected = stats.rejected,
                    internal_errors = stats.internal_errors,
                    "progress"
                );
            }
        }

        tracing::info!(
            generated = stats.generated,
            generation_failures = stats.generation_failures,
            ok = stats.executed_ok,
            rejected = stats.rejected,
            internal_errors = stats.internal_errors,
            tables_created = stats.tables_created,
            ddl_failures = stats.ddl_failures,
            crashed = stats.crash.is_some(),
            "run finished"
        );
        Ok(stats)
    }

    /// Creates a random table and swaps the reloaded catalog into the
    /// session.
    async fn mutate_schema(&mut self, stats: &mut RunStats) -> anyhow::Result<()> {
        let create = self.session.generate_create_table();
        match self.backend.create_table(&create).await {
            Ok(()) => stats.tables_created += 1,
            Err(ExecError::ConnectionLost(message)) => {
                stats.record_crash(create.to_string(), message);
                return Ok(());
            }
            Err(ExecError::Internal(message)) => {
                tracing::error!(statement = %create, %message, "internal error");
                stats.internal_errors += 1;
                stats.ddl_failures += 1;
                return Ok(());
            }
            Err(ExecError::Rejected(message)) => {
                tracing::debug!(statement = %create, %message, "create table rejected");
                stats.ddl_failures += 1;
                return Ok(());
            }
        }

        let catalog = self
            .backend
            .load_catalog()
            .await
            .context("failed to reload catalog")?;
        if let Err(err) = self.session.set_catalog(catalog) {
            tracing::warn!(%err, "keeping the previous catalog");
        }
        Ok(())
    }
}
