use std::{fmt, sync::Arc, time::Duration};

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Account, AccountRole, DocumentStore, EngineError, FsDocumentStore, NotificationSink,
    ResultEngine, TracingNotifier, accounts, util::is_unique_violation,
};

mod access;
mod documents;
mod identity;
mod ledger;
mod notify;
mod requests;
mod services;
mod settlement;
mod tasks;
mod wallets;

pub use requests::{CreatedRequest, PurgeSummary};
pub use settlement::Settlement;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Engine {
    database: DatabaseConnection,
    documents: Arc<dyn DocumentStore>,
    notifier: Arc<dyn NotificationSink>,
    platform_account_id: Uuid,
    collaborator_timeout: Duration,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("database", &self.database)
            .field("platform_account_id", &self.platform_account_id)
            .field("collaborator_timeout", &self.collaborator_timeout)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Account that receives the platform's share of every settlement.
    pub fn platform_account_id(&self) -> Uuid {
        self.platform_account_id
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    documents: Option<Arc<dyn DocumentStore>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    collaborator_timeout: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Document store used for uploads. Defaults to files under `./documents`.
    pub fn documents(mut self, store: Arc<dyn DocumentStore>) -> EngineBuilder {
        self.documents = Some(store);
        self
    }

    /// Notification sink. Defaults to writing notifications to the log.
    pub fn notifier(mut self, sink: Arc<dyn NotificationSink>) -> EngineBuilder {
        self.notifier = Some(sink);
        self
    }

    /// Upper bound for a single document-store or notification call.
    pub fn collaborator_timeout(mut self, timeout: Duration) -> EngineBuilder {
        self.collaborator_timeout = Some(timeout);
        self
    }

    /// Construct `Engine`
    ///
    /// Creates the platform account on first start.
    pub async fn build(self) -> ResultEngine<Engine> {
        let platform_account_id = ensure_platform_account(&self.database).await?;
        Ok(Engine {
            database: self.database,
            documents: self
                .documents
                .unwrap_or_else(|| Arc::new(FsDocumentStore::new("documents"))),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            platform_account_id,
            collaborator_timeout: self
                .collaborator_timeout
                .unwrap_or(DEFAULT_COLLABORATOR_TIMEOUT),
        })
    }
}

async fn find_platform_account(db: &DatabaseConnection) -> ResultEngine<Option<Uuid>> {
    let existing = accounts::Entity::find()
        .filter(accounts::Column::Role.eq(AccountRole::Platform.as_str()))
        .one(db)
        .await?;
    Ok(existing.map(|model| model.id))
}

/// The platform account's custom id is fixed, so the unique index on custom
/// ids keeps two engines starting together from creating two of them.
async fn ensure_platform_account(db: &DatabaseConnection) -> ResultEngine<Uuid> {
    if let Some(id) = find_platform_account(db).await? {
        return Ok(id);
    }

    let platform = Account {
        id: Uuid::new_v4(),
        role: AccountRole::Platform,
        display_name: "Platform".to_string(),
        custom_id: format!("{}-0001", AccountRole::Platform.custom_id_prefix()),
        balance: 0,
        is_available: false,
        created_at: Utc::now(),
    };
    match accounts::ActiveModel::from(&platform).insert(db).await {
        Ok(_) => {
            tracing::info!(account_id = %platform.id, "created platform account");
            Ok(platform.id)
        }
        Err(err) if is_unique_violation(&err) => find_platform_account(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("platform account".to_string())),
        Err(err) => Err(err.into()),
    }
}
