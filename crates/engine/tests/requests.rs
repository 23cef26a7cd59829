mod common;

use common::{MemoryStore, RecordingNotifier, ledger_sum, pdf, world, world_with};
use engine::{
    AccountRole, BookingCmd, EngineError, LeadCmd, NotifyTarget, OriginKind, TaskFilter,
    TaskStatus, TransactionKind,
};

#[tokio::test]
async fn booking_charges_fee_and_opens_pending_task() {
    let w = world().await;
    w.engine.deposit(w.customer.id, 20_000).await.unwrap();

    let created = w
        .engine
        .create_booking(BookingCmd::new("income-cert", w.customer.id).document(pdf("aadhaar.pdf")))
        .await
        .unwrap();

    assert_eq!(created.request.kind, OriginKind::Booking);
    assert_eq!(created.request.fee_minor, 10_000);
    assert_eq!(created.task.origin_id, created.request.id);
    assert_eq!(created.task.status, TaskStatus::PendingAssignment);
    assert_eq!(created.task.phase, 0);
    assert_eq!(created.task.assigned_agent_id, None);
    assert_eq!(created.task.generated_by, None);

    assert_eq!(w.engine.balance(w.customer.id).await.unwrap(), 10_000);
    let ledger = w.engine.ledger_transactions(w.customer.id).await.unwrap();
    let fee = ledger.last().unwrap();
    assert_eq!(fee.kind, TransactionKind::Debit);
    assert_eq!(fee.amount_minor, -10_000);
    assert_eq!(fee.balance_after, 10_000);
    assert_eq!(fee.reference_id, Some(created.request.id));

    let details = w.engine.request(created.request.id).await.unwrap();
    assert_eq!(details.task_id, Some(created.task.id));
    assert_eq!(details.documents.len(), 1);
    assert_eq!(details.documents[0].name, "aadhaar.pdf");
    assert!(!details.documents[0].is_proof);
    assert_eq!(details.history.len(), 1);
    assert_eq!(w.store.len(), 1);

    let admin_titles = w.notifier.titles_for(NotifyTarget::Role(AccountRole::Admin));
    assert_eq!(admin_titles, vec!["New Task Created".to_string()]);
}

#[tokio::test]
async fn booking_without_funds_creates_nothing() {
    let w = world().await;
    let service = w
        .engine
        .add_service(w.admin.id, "Land Record Extract", "Revenue", 50)
        .await
        .unwrap();
    w.engine.deposit(w.customer.id, 40).await.unwrap();

    let err = w
        .engine
        .create_booking(BookingCmd::new(service.id, w.customer.id).document(pdf("deed.pdf")))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(w.engine.balance(w.customer.id).await.unwrap(), 40);
    assert_eq!(
        w.engine.ledger_transactions(w.customer.id).await.unwrap().len(),
        1
    );
    assert!(w.engine.tasks(TaskFilter::default()).await.unwrap().is_empty());
    assert_eq!(w.store.len(), 0);
}

#[tokio::test]
async fn partial_upload_fails_creation_without_debit() {
    let w = world_with(MemoryStore::short(1), RecordingNotifier::default()).await;
    w.engine.deposit(w.customer.id, 20_000).await.unwrap();

    let err = w
        .engine
        .create_booking(
            BookingCmd::new("birth-cert", w.customer.id)
                .documents(vec![pdf("hospital-slip.pdf"), pdf("parents-id.pdf")]),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::PartialUploadFailure {
            expected: 2,
            uploaded: 1
        }
    );
    assert_eq!(w.engine.balance(w.customer.id).await.unwrap(), 20_000);
    assert!(w.engine.tasks(TaskFilter::default()).await.unwrap().is_empty());
    assert_eq!(w.store.len(), 0, "stored half of the batch must be removed");
}

#[tokio::test]
async fn balance_spent_during_upload_fails_at_the_debit() {
    let (store, gate) = MemoryStore::gated();
    let w = world_with(store, RecordingNotifier::default()).await;
    w.engine.deposit(w.customer.id, 10_000).await.unwrap();

    let booking = w
        .engine
        .create_booking(BookingCmd::new("income-cert", w.customer.id).document(pdf("aadhaar.pdf")));
    let spend = async {
        gate.entered.notified().await;
        w.engine
            .debit(w.customer.id, 9_990, "Counter purchase")
            .await
            .unwrap();
        gate.release.notify_one();
    };
    let (result, ()) = tokio::join!(booking, spend);

    assert!(matches!(result, Err(EngineError::InsufficientFunds(_))));
    assert_eq!(w.engine.balance(w.customer.id).await.unwrap(), 10);
    assert_eq!(ledger_sum(&w.engine, w.customer.id).await, 10);
    assert!(w.engine.tasks(TaskFilter::default()).await.unwrap().is_empty());
    assert_eq!(w.store.len(), 0);
}

#[tokio::test]
async fn unavailable_store_is_retryable() {
    let w = world_with(MemoryStore::unavailable(), RecordingNotifier::default()).await;
    w.engine.deposit(w.customer.id, 20_000).await.unwrap();

    let err = w
        .engine
        .create_booking(BookingCmd::new("birth-cert", w.customer.id).document(pdf("a.pdf")))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Unavailable(_)));
    assert!(err.is_retryable());
    assert_eq!(w.engine.balance(w.customer.id).await.unwrap(), 20_000);
}

#[tokio::test]
async fn free_service_books_without_ledger_rows() {
    let w = world().await;

    let created = w
        .engine
        .create_booking(BookingCmd::new("voter-id", w.customer.id))
        .await
        .unwrap();

    assert_eq!(created.request.fee_minor, 0);
    assert!(
        w.engine
            .ledger_transactions(w.customer.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn lead_is_prepaid_by_generating_agent() {
    let w = world().await;
    w.engine.deposit(w.agent.id, 10_000).await.unwrap();

    let created = w
        .engine
        .create_lead(LeadCmd::new(
            "caste-cert",
            w.agent.id,
            "  Lakshmi Devi ",
            "+91 98765 43210",
        ))
        .await
        .unwrap();

    assert_eq!(created.request.kind, OriginKind::Lead);
    assert_eq!(created.request.customer_name.as_deref(), Some("Lakshmi Devi"));
    assert_eq!(created.request.customer_phone.as_deref(), Some("9876543210"));
    assert_eq!(created.task.generated_by, Some(w.agent.id));
    assert_eq!(created.task.requestor_id, w.agent.id);
    assert_eq!(w.engine.balance(w.agent.id).await.unwrap(), 2_500);
    assert_eq!(ledger_sum(&w.engine, w.agent.id).await, 2_500);
}

#[tokio::test]
async fn lead_inputs_are_validated() {
    let w = world().await;
    w.engine.deposit(w.agent.id, 10_000).await.unwrap();

    let bad_phone = w
        .engine
        .create_lead(LeadCmd::new("pan-card", w.agent.id, "Gopal", "12345"))
        .await
        .unwrap_err();
    assert!(matches!(bad_phone, EngineError::Validation(_)));

    let not_an_agent = w
        .engine
        .create_lead(LeadCmd::new("pan-card", w.customer.id, "Gopal", "9876543210"))
        .await
        .unwrap_err();
    assert!(matches!(not_an_agent, EngineError::Validation(_)));

    let unknown_service = w
        .engine
        .create_lead(LeadCmd::new("passport", w.agent.id, "Gopal", "9876543210"))
        .await
        .unwrap_err();
    assert!(matches!(unknown_service, EngineError::KeyNotFound(_)));

    assert_eq!(w.engine.balance(w.agent.id).await.unwrap(), 10_000);
}

#[tokio::test]
async fn documents_are_readable_only_by_involved_accounts() {
    let w = world().await;
    w.engine.deposit(w.customer.id, 20_000).await.unwrap();
    let created = w
        .engine
        .create_booking(BookingCmd::new("ration-card", w.customer.id).document(pdf("family.pdf")))
        .await
        .unwrap();
    let path = w.engine.request(created.request.id).await.unwrap().documents[0]
        .path
        .clone();

    let bytes = w.engine.download_document(w.customer.id, &path).await.unwrap();
    assert_eq!(bytes, b"%PDF-1.4".to_vec());
    assert!(w.engine.download_document(w.admin.id, &path).await.is_ok());

    let err = w
        .engine
        .download_document(w.agent.id, &path)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    w.engine
        .assign_task(w.admin.id, created.task.id, w.agent.id)
        .await
        .unwrap();
    assert!(w.engine.download_document(w.agent.id, &path).await.is_ok());
}

#[tokio::test]
async fn purge_removes_requests_but_keeps_ledger() {
    let w = world().await;
    w.engine.deposit(w.customer.id, 20_000).await.unwrap();
    w.engine
        .create_booking(BookingCmd::new("death-cert", w.customer.id).document(pdf("a.pdf")))
        .await
        .unwrap();
    w.engine
        .create_booking(BookingCmd::new("birth-cert", w.customer.id))
        .await
        .unwrap();

    let err = w.engine.purge_requests(w.customer.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let summary = w.engine.purge_requests(w.admin.id).await.unwrap();
    assert_eq!(summary.requests, 2);
    assert_eq!(summary.tasks, 2);
    assert_eq!(summary.documents, 1);
    assert_eq!(summary.history_entries, 4);

    assert!(w.engine.tasks(TaskFilter::default()).await.unwrap().is_empty());
    assert_eq!(w.store.len(), 0);
    assert_eq!(
        w.engine.ledger_transactions(w.customer.id).await.unwrap().len(),
        3
    );
    assert_eq!(w.engine.balance(w.customer.id).await.unwrap(), 10_000);
}
