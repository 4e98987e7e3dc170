use std::sync::Arc;
use std::time::Duration;

use posts_core::config::{Backend, PostsConfig, DB_BINDING};
use tracing::{error, info};

use crate::context::ExecutionContext;
use crate::db::MIGRATIONS;
use crate::error::{Result, StoreError};
use crate::local::LocalStore;
use crate::managed::{D1Connector, D1Store};
use crate::store::RecordStore;

const D1_TIMEOUT: Duration = Duration::from_secs(30);

/// The record store client, chosen once at startup from `database.backend`.
///
/// Built by the hosting entry point and shared by reference; there is no
/// process-global connection holder.
#[derive(Clone)]
pub enum StoreClient {
    /// One SQLite connection for the life of the process.
    Local(Arc<LocalStore>),
    /// D1 over HTTP; the binding is read from each execution context.
    Managed(D1Connector),
}

impl StoreClient {
    /// Build the client described by `config.database`.
    pub fn from_config(config: &PostsConfig) -> Result<Self> {
        match config.database.backend {
            Backend::Local => {
                let store = LocalStore::open(&config.database.url)?;
                Ok(Self::Local(Arc::new(store)))
            }
            Backend::Managed => {
                info!("record store: managed (binding {DB_BINDING})");
                Ok(Self::Managed(D1Connector::new(D1_TIMEOUT)?))
            }
        }
    }

    pub fn local(store: LocalStore) -> Self {
        Self::Local(Arc::new(store))
    }

    pub fn backend(&self) -> Backend {
        match self {
            StoreClient::Local(_) => Backend::Local,
            StoreClient::Managed(_) => Backend::Managed,
        }
    }

    /// The process-wide local store. Every call returns the same instance.
    pub fn local_handle(&self) -> Option<Arc<LocalStore>> {
        match self {
            StoreClient::Local(store) => Some(Arc::clone(store)),
            StoreClient::Managed(_) => None,
        }
    }

    /// Wrap the context's `DB` binding in a fresh handle.
    ///
    /// Fails with [`StoreError::BindingNotFound`] when the runtime supplied no
    /// such binding. Only meaningful on a managed client; a local client has no
    /// connector and reports the binding as absent.
    pub fn managed_handle(&self, ctx: &ExecutionContext) -> Result<D1Store> {
        let connector = match self {
            StoreClient::Managed(connector) => connector,
            StoreClient::Local(_) => {
                return Err(StoreError::BindingNotFound {
                    name: DB_BINDING.to_string(),
                })
            }
        };
        let binding = ctx.binding(DB_BINDING).ok_or_else(|| {
            error!(binding = DB_BINDING, "D1 database binding not found in execution context");
            StoreError::BindingNotFound {
                name: DB_BINDING.to_string(),
            }
        })?;
        Ok(connector.connect(binding))
    }

    /// Backend-agnostic handle for one invocation.
    pub fn handle(&self, ctx: &ExecutionContext) -> Result<Arc<dyn RecordStore>> {
        match self {
            StoreClient::Local(store) => Ok(Arc::clone(store) as Arc<dyn RecordStore>),
            StoreClient::Managed(_) => Ok(Arc::new(self.managed_handle(ctx)?)),
        }
    }

    /// Apply the schema through whichever backend is active (idempotent).
    pub async fn migrate(&self, ctx: &ExecutionContext) -> Result<()> {
        let store = self.handle(ctx)?;
        for stmt in MIGRATIONS {
            store.execute(stmt, &[]).await?;
        }
        info!(backend = %self.backend(), "schema migrations complete");
        Ok(())
    }
}
