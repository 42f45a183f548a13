use async_trait::async_trait;
use sqlsmith::ast::CreateTable;
use sqlsmith::Catalog;
use tokio::task::JoinHandle;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, Config, NoTls};

use crate::introspect;

/// How a submitted statement failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    /// An ordinary error such as a type mismatch or a constraint violation.
    #[error("statement rejected: {0}")]
    Rejected(String),
    /// The engine reported an internal error. Worth a bug report, but the
    /// server is still up.
    #[error("internal error: {0}")]
    Internal(String),
    /// The server went away, most likely because it crashed.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

impl ExecError {
    /// Classifies an error reported by the server itself.
    pub fn from_server(code: &SqlState, message: &str) -> Self {
        if *code == SqlState::INTERNAL_ERROR {
            ExecError::Internal(message.to_string())
        } else {
            ExecError::Rejected(message.to_string())
        }
    }
}

impl From<tokio_postgres::Error> for ExecError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.is_closed() {
            return ExecError::ConnectionLost(err.to_string());
        }
        match err.as_db_error() {
            Some(db) => ExecError::from_server(db.code(), db.message()),
            // Anything that is not a server response means the wire is gone.
            None => ExecError::ConnectionLost(err.to_string()),
        }
    }
}

/// The database under test.
#[async_trait]
pub trait Backend: Send {
    async fn load_catalog(&mut self) -> anyhow::Result<Catalog>;

    async fn execute(&mut self, sql: &str) -> Result<(), ExecError>;

    async fn create_table(&mut self, create: &CreateTable) -> Result<(), ExecError> {
        self.execute(&create.to_string()).await
    }
}

#[derive(Debug, Clone)]
pub struct ConnectOpts {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub dbname: String,
}

/// A server speaking the Postgres wire protocol.
pub struct PgBackend {
    client: Client,
    connection: JoinHandle<()>,
}

impl PgBackend {
    pub async fn connect(opts: &ConnectOpts) -> anyhow::Result<Self> {
        let (client, connection) = Config::new()
            .host(&opts.host)
            .port(opts.port)
            .user(&opts.user)
            .dbname(&opts.dbname)
            .connect(NoTls)
            .await?;
        let connection = tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!(%err, "connection error");
            }
        });
        Ok(Self { client, connection })
    }
}

impl Drop for PgBackend {
    fn drop(&mut self) {
        self.connection.abort();
    }
}

#[async_trait]
impl Backend for PgBackend {
    async fn load_catalog(&mut self) -> anyhow::Result<Catalog> {
        introspect::load_catalog(&self.client).await
    }

    async fn execute(&mut self, sql: &str) -> Result<(), ExecError> {
        self.client.simple_query(sql).await?;
        Ok(())
    }
}

/// Runs without a database: every statement succeeds and created tables are
/// added to the catalog it reports.
#[derive(Debug, Default)]
pub struct DryRunBackend {
    catalog: Catalog,
}

impl DryRunBackend {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Backend for DryRunBackend {
    async fn load_catalog(&mut self) -> anyhow::Result<Catalog> {
        Ok(self.catalog.clone())
    }

    async fn execute(&mut self, _sql: &str) -> Result<(), ExecError> {
        Ok(())
    }

    async fn create_table(&mut self, create: &CreateTable) -> Result<(), ExecError> {
        self.catalog = self.catalog.with_table(create.to_table());
        Ok(())
    }
}
