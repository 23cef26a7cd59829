#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};
use tokio::sync::Notify;

use engine::{
    Account, AccountRole, CollaboratorError, DocumentStore, DocumentUpload, Engine, Notification,
    NotificationSink, NotifyTarget, StoredDocument,
};
use migration::MigratorTrait;

/// Holds an upload until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

/// Keeps uploads in memory. Can be told to store fewer files than asked,
/// to fail outright or to wait at a [`Gate`].
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    store_at_most: Option<usize>,
    unavailable: bool,
    gate: Option<Arc<Gate>>,
}

impl MemoryStore {
    pub fn short(store_at_most: usize) -> Self {
        Self {
            store_at_most: Some(store_at_most),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn gated() -> (Self, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        let store = Self {
            gate: Some(gate.clone()),
            ..Default::default()
        };
        (store, gate)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upload(
        &self,
        files: &[DocumentUpload],
        folder_key: &str,
    ) -> Result<Vec<StoredDocument>, CollaboratorError> {
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.unavailable {
            return Err(CollaboratorError::Unavailable("store offline".to_string()));
        }
        let take = self.store_at_most.unwrap_or(files.len()).min(files.len());
        let mut map = self.files.lock().unwrap();
        let mut stored = Vec::new();
        for (idx, file) in files.iter().take(take).enumerate() {
            let path = format!("{folder_key}/{idx}-{}-{}", map.len(), file.name);
            map.insert(path.clone(), file.bytes.clone());
            stored.push(StoredDocument {
                name: file.name.clone(),
                size: file.bytes.len() as i64,
                mime: file.mime.clone(),
                path,
            });
        }
        Ok(stored)
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, CollaboratorError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| CollaboratorError::Rejected(format!("missing {path}")))
    }

    async fn remove(&self, paths: &[String]) -> Result<(), CollaboratorError> {
        let mut map = self.files.lock().unwrap();
        for path in paths {
            map.remove(path);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    broken: bool,
    hung: bool,
}

impl RecordingNotifier {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    /// Never answers.
    pub fn hung() -> Self {
        Self {
            hung: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn titles_for(&self, target: NotifyTarget) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|n| n.target == target)
            .map(|n| n.title)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), CollaboratorError> {
        if self.hung {
            std::future::pending::<()>().await;
        }
        if self.broken {
            return Err(CollaboratorError::Unavailable("push gateway down".to_string()));
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

pub struct World {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub admin: Account,
    pub customer: Account,
    pub agent: Account,
    pub other_agent: Account,
}

pub async fn world() -> World {
    world_with(MemoryStore::default(), RecordingNotifier::default()).await
}

pub async fn world_with(store: MemoryStore, notifier: RecordingNotifier) -> World {
    world_timed(store, notifier, Duration::from_secs(30)).await
}

pub async fn world_timed(
    store: MemoryStore,
    notifier: RecordingNotifier,
    collaborator_timeout: Duration,
) -> World {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let store = Arc::new(store);
    let notifier = Arc::new(notifier);
    let engine = Engine::builder()
        .database(db.clone())
        .documents(store.clone())
        .notifier(notifier.clone())
        .collaborator_timeout(collaborator_timeout)
        .build()
        .await
        .unwrap();

    let admin = engine
        .create_account(AccountRole::Admin, "Asha Admin")
        .await
        .unwrap();
    let customer = engine
        .create_account(AccountRole::Customer, "Ravi Kumar")
        .await
        .unwrap();
    let agent = engine
        .create_account(AccountRole::Agent, "Meena Agent")
        .await
        .unwrap();
    let other_agent = engine
        .create_account(AccountRole::Agent, "Suresh Agent")
        .await
        .unwrap();

    World {
        engine,
        db,
        store,
        notifier,
        admin,
        customer,
        agent,
        other_agent,
    }
}

pub fn pdf(name: &str) -> DocumentUpload {
    DocumentUpload::new(name, "application/pdf", b"%PDF-1.4".to_vec())
}

/// Sum of every ledger row of `account_id`.
pub async fn ledger_sum(engine: &Engine, account_id: uuid::Uuid) -> i64 {
    engine
        .ledger_transactions(account_id)
        .await
        .unwrap()
        .iter()
        .map(|tx| tx.amount_minor)
        .sum()
}
