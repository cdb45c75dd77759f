use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use model::RepositoryError;
use model::entities::user::{self, PasswordAuthenticated};
use sea_orm::DatabaseTransaction;
use tracing::{debug, trace};

/// Hook run after a successful interactive login, inside the login
/// transaction. An error aborts the login.
#[async_trait]
pub trait LoginListener: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    async fn on_interactive_login(
        &self,
        txn: &DatabaseTransaction,
        identity: &dyn PasswordAuthenticated,
    ) -> Result<(), RepositoryError>;
}

/// Records when a stored user last signed in.
#[derive(Debug, Default)]
pub struct LastConnectedAtListener;

#[async_trait]
impl LoginListener for LastConnectedAtListener {
    fn name(&self) -> &'static str {
        "last_connected_at"
    }

    async fn on_interactive_login(
        &self,
        txn: &DatabaseTransaction,
        identity: &dyn PasswordAuthenticated,
    ) -> Result<(), RepositoryError> {
        let Some(stored) = identity.as_user() else {
            trace!(kind = identity.kind(), "Not a stored user, nothing to stamp");
            return Ok(());
        };
        user::repository::touch_last_connected(txn, stored, Utc::now().naive_utc()).await?;
        Ok(())
    }
}

/// Listeners in the order they run.
#[derive(Debug, Default)]
pub struct LoginListeners {
    listeners: Vec<Box<dyn LoginListener>>,
}

impl LoginListeners {
    pub fn with_defaults() -> Self {
        Self::default().register(LastConnectedAtListener)
    }

    pub fn register(mut self, listener: impl LoginListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Runs every listener, stopping at the first failure.
    pub async fn dispatch(
        &self,
        txn: &DatabaseTransaction,
        identity: &dyn PasswordAuthenticated,
    ) -> Result<(), RepositoryError> {
        for listener in &self.listeners {
            debug!(listener = listener.name(), user = identity.identifier(), "Running login listener");
            listener.on_interactive_login(txn, identity).await?;
        }
        Ok(())
    }
}
