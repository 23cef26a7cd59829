use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use engine::{
    Account, AccountRole, CollaboratorError, DocumentStore, DocumentUpload, Engine,
    StoredDocument,
};

#[derive(Default)]
struct MemoryStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upload(
        &self,
        files: &[DocumentUpload],
        folder_key: &str,
    ) -> Result<Vec<StoredDocument>, CollaboratorError> {
        let mut map = self.files.lock().unwrap();
        let mut stored = Vec::new();
        for file in files {
            let path = format!("{folder_key}/{}-{}", map.len(), file.name);
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

struct Api {
    app: Router,
    engine: Arc<Engine>,
    admin: Account,
    customer: Account,
    agent: Account,
}

async fn api() -> Api {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .documents(Arc::new(MemoryStore::default()))
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

    let engine = Arc::new(engine);
    Api {
        app: server::router(engine.clone()),
        engine,
        admin,
        customer,
        agent,
    }
}

impl Api {
    async fn call(
        &self,
        method: Method,
        uri: &str,
        actor: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header("x-account-id", actor.to_string());
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn post(&self, uri: &str, actor: &Account, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(actor.id), Some(body)).await
    }

    async fn get(&self, uri: &str, actor: &Account) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(actor.id), None).await
    }
}

fn pdf(name: &str) -> Value {
    json!({
        "name": name,
        "mime": "application/pdf",
        "content_base64": STANDARD.encode(b"%PDF-1.4"),
    })
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn requests_without_a_known_account_are_unauthorized() {
    let api = api().await;

    let (status, _) = api.call(Method::GET, "/services", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = api
        .call(Method::GET, "/services", Some(Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = api.get("/services", &api.customer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn booking_to_settlement_over_http() {
    let api = api().await;

    let (status, _) = api
        .post("/wallet/deposit", &api.customer, json!({ "amount_minor": 20_000 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, created) = api
        .post(
            "/bookings",
            &api.customer,
            json!({ "service_id": "income-cert", "documents": [pdf("aadhaar.pdf")] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["task"]["status"], "pending_assignment");
    let task_id = id_of(&created["task"]);
    let request_id = id_of(&created["request"]);

    let (status, queue) = api
        .get("/tasks?status=pending_assignment", &api.admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().unwrap().len(), 1);

    let (status, task) = api
        .post(
            &format!("/tasks/{task_id}/assign"),
            &api.admin,
            json!({ "agent_id": api.agent.id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "assigned");

    let (status, mine) = api.get("/tasks", &api.agent).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, _) = api
        .call(
            Method::POST,
            &format!("/tasks/{task_id}/accept"),
            Some(api.agent.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, task) = api
        .post(
            &format!("/tasks/{task_id}/ack"),
            &api.agent,
            json!({ "ack_number": "ACK-2024-77" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["ack_number"], "ACK-2024-77");

    let (status, task) = api
        .post(
            &format!("/tasks/{task_id}/complete"),
            &api.agent,
            json!({ "proof": [pdf("certificate.pdf")] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "pending_commission_approval");

    let (status, settlement) = api
        .post(
            &format!("/tasks/{task_id}/commission/approve"),
            &api.admin,
            json!({ "remark": "Looks good" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settlement["entry"]["assigned_share"], 9_000);
    assert_eq!(settlement["entry"]["admin_share"], 1_000);

    let (status, again) = api
        .post(
            &format!("/tasks/{task_id}/commission/approve"),
            &api.admin,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(again["error"].as_str().is_some());

    let (_, summary) = api.get("/commissions", &api.admin).await;
    assert_eq!(summary["platform_balance_minor"], 1_000);
    assert_eq!(summary["entries"].as_array().unwrap().len(), 1);

    let (_, wallet) = api.get("/wallet", &api.agent).await;
    assert_eq!(wallet["balance"], 9_000);

    let (status, audit) = api.get("/wallet/audit", &api.customer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(audit["replayed_balance"], 10_000);
    assert_eq!(audit["mismatched"].as_array().unwrap().len(), 0);

    let (status, request) = api
        .get(&format!("/requests/{request_id}"), &api.customer)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(request["request"]["status"], "commission_approved");
    assert_eq!(request["documents"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn roles_are_enforced() {
    let api = api().await;

    let (status, _) = api
        .post(
            "/accounts",
            &api.customer,
            json!({ "role": "agent", "display_name": "Intruder" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, account) = api
        .post(
            "/accounts",
            &api.admin,
            json!({ "role": "agent", "display_name": "Kiran" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(account["custom_id"], "VLE-0002");

    let (status, _) = api.get("/tasks", &api.customer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = api
        .get(&format!("/accounts/{}", api.agent.id), &api.customer)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = api.get("/commissions", &api.agent).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = api.post("/admin/reset", &api.agent, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn engine_failures_map_to_status_codes() {
    let api = api().await;

    let (status, body) = api
        .post("/bookings", &api.customer, json!({ "service_id": "pan-card" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Insufficient funds"));

    let (status, _) = api
        .post("/bookings", &api.customer, json!({ "service_id": "passport" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = api
        .post("/wallet/deposit", &api.customer, json!({ "amount_minor": 0 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = api
        .post(
            "/bookings",
            &api.customer,
            json!({
                "service_id": "voter-id",
                "documents": [{ "name": "a.pdf", "mime": "application/pdf", "content_base64": "%%%" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn documents_download_as_base64() {
    let api = api().await;
    let created = api
        .engine
        .create_booking(
            engine::BookingCmd::new("voter-id", api.customer.id).document(DocumentUpload::new(
                "photo.pdf",
                "application/pdf",
                b"%PDF-1.4".to_vec(),
            )),
        )
        .await
        .unwrap();
    let path = api
        .engine
        .request(created.request.id)
        .await
        .unwrap()
        .documents[0]
        .path
        .clone();

    let (status, body) = api
        .get(&format!("/documents?path={path}"), &api.customer)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        STANDARD
            .decode(body["content_base64"].as_str().unwrap())
            .unwrap(),
        b"%PDF-1.4".to_vec()
    );

    let (status, _) = api
        .get(&format!("/documents?path={path}"), &api.agent)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
