//! Command structs for engine operations.
//!
//! These types group the parameters of the write operations that take more
//! than a couple of arguments, keeping call sites readable.

use uuid::Uuid;

use crate::{DocumentUpload, TaskStatus};

/// A customer books a service for themselves.
#[derive(Clone, Debug)]
pub struct BookingCmd {
    pub service_id: String,
    pub customer_id: Uuid,
    pub documents: Vec<DocumentUpload>,
}

impl BookingCmd {
    #[must_use]
    pub fn new(service_id: impl Into<String>, customer_id: Uuid) -> Self {
        Self {
            service_id: service_id.into(),
            customer_id,
            documents: Vec::new(),
        }
    }

    #[must_use]
    pub fn document(mut self, document: DocumentUpload) -> Self {
        self.documents.push(document);
        self
    }

    #[must_use]
    pub fn documents(mut self, documents: Vec<DocumentUpload>) -> Self {
        self.documents = documents;
        self
    }
}

/// An agent registers (and prepays) a request for a walk-in customer.
#[derive(Clone, Debug)]
pub struct LeadCmd {
    pub service_id: String,
    pub agent_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub documents: Vec<DocumentUpload>,
}

impl LeadCmd {
    #[must_use]
    pub fn new(
        service_id: impl Into<String>,
        agent_id: Uuid,
        customer_name: impl Into<String>,
        customer_phone: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            agent_id,
            customer_name: customer_name.into(),
            customer_phone: customer_phone.into(),
            documents: Vec::new(),
        }
    }

    #[must_use]
    pub fn document(mut self, document: DocumentUpload) -> Self {
        self.documents.push(document);
        self
    }

    #[must_use]
    pub fn documents(mut self, documents: Vec<DocumentUpload>) -> Self {
        self.documents = documents;
        self
    }
}

/// Requestor (or agent/admin) answers a document request.
#[derive(Clone, Debug)]
pub struct SupplyDocsCmd {
    pub task_id: Uuid,
    pub actor_id: Uuid,
    pub documents: Vec<DocumentUpload>,
    pub remark: Option<String>,
    /// Status the task resumes at; never inferred.
    pub resume_at: TaskStatus,
}

impl SupplyDocsCmd {
    #[must_use]
    pub fn new(task_id: Uuid, actor_id: Uuid, resume_at: TaskStatus) -> Self {
        Self {
            task_id,
            actor_id,
            documents: Vec::new(),
            remark: None,
            resume_at,
        }
    }

    #[must_use]
    pub fn document(mut self, document: DocumentUpload) -> Self {
        self.documents.push(document);
        self
    }

    #[must_use]
    pub fn documents(mut self, documents: Vec<DocumentUpload>) -> Self {
        self.documents = documents;
        self
    }

    #[must_use]
    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }
}

/// Filter for [`Engine::tasks`](crate::Engine::tasks).
#[derive(Clone, Debug, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub assigned_agent_id: Option<Uuid>,
}

impl TaskFilter {
    #[must_use]
    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn assigned_to(mut self, agent_id: Uuid) -> Self {
        self.assigned_agent_id = Some(agent_id);
        self
    }
}

/// Partial update of a catalog entry.
#[derive(Clone, Debug, Default)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub fee_minor: Option<i64>,
}

impl ServiceUpdate {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn fee_minor(mut self, fee_minor: i64) -> Self {
        self.fee_minor = Some(fee_minor);
        self
    }
}
