use std::io::{stdin, IsTerminal};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::RngCore;
use sqlsmith_runner::introspect::read_catalog_file;
use sqlsmith_runner::{
    Backend, ConnectOpts, DryRunBackend, PgBackend, Profile, ProfileType, RunConfig, RunStats,
    Runner,
};

/// Random SQL fuzzer for Postgres-compatible databases.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Random seed for deterministic generation.
    #[arg(short, long, default_value_t = rand::rng().next_u64())]
    seed: u64,

    /// Number of statements to generate and execute.
    #[arg(short = 'n', long, default_value_t = 10000)]
    iterations: u64,

    #[arg(long, default_value = "localhost")]
    host: String,

    #[arg(long, default_value_t = 26257)]
    port: u16,

    #[arg(long, default_value = "root")]
    user: String,

    #[arg(long, default_value = "defaultdb")]
    dbname: String,

    /// Predefined profile name or path to a JSON5 profile file.
    #[arg(long, default_value = "default", value_parser = ProfileType::parse)]
    profile: ProfileType,

    /// Generate against a JSON catalog without connecting to a database.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Log every generated statement.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logger() {
    let mut subscriber = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::INFO.into()),
    );
    if !stdin().is_terminal() {
        subscriber = subscriber.with_ansi(false);
    }
    subscriber.init();
}

async fn run<B: Backend>(backend: B, config: RunConfig) -> Result<RunStats> {
    let mut runner = Runner::new(backend, config).await?;
    runner.run().await
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let profile = Profile::parse_from_type(args.profile.clone())?;
    let config = RunConfig {
        seed: args.seed,
        iterations: args.iterations,
        verbose: args.verbose,
        profile,
    };
    tracing::info!(seed = config.seed, profile = ?args.profile, "starting sqlsmith");

    let stats = match &args.catalog {
        Some(path) => run(DryRunBackend::new(read_catalog_file(path)?), config).await?,
        None => {
            let opts = ConnectOpts {
                host: args.host,
                port: args.port,
                user: args.user,
                dbname: args.dbname,
            };
            run(PgBackend::connect(&opts).await?, config).await?
        }
    };

    if let Some(crash) = &stats.crash {
        tracing::error!(
            seed = args.seed,
            statement = %crash.statement,
            "crash detected: {}",
            crash.message
        );
        std::process::exit(1);
    }
    Ok(())
}
