mod common;

use common::world;
use engine::{BookingCmd, EngineError, ServiceUpdate};

#[tokio::test]
async fn launch_catalog_is_seeded() {
    let w = world().await;

    let services = w.engine.services().await.unwrap();
    assert_eq!(services.len(), 8);

    let pan = w.engine.service("pan-card").await.unwrap();
    assert_eq!(pan.name, "PAN Card");
    assert_eq!(pan.category, "Income Tax");
    assert_eq!(pan.fee_minor, 11_000);

    assert_eq!(w.engine.service("voter-id").await.unwrap().fee_minor, 0);
    assert!(matches!(
        w.engine.service("passport").await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn service_names_are_unique_after_normalization() {
    let w = world().await;

    let added = w
        .engine
        .add_service(w.admin.id, "Marriage Certificate", "Civil", 15_000)
        .await
        .unwrap();
    assert_eq!(added.id, "marriage-certificate");

    let err = w
        .engine
        .add_service(w.admin.id, "  marriage   CERTIFICATE ", "Civil", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let err = w
        .engine
        .add_service(w.customer.id, "Trade Licence", "Municipal", 1_000)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = w
        .engine
        .update_service(
            w.admin.id,
            "marriage-certificate",
            ServiceUpdate::default().name("Income   Certificate"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn fee_changes_do_not_touch_existing_requests() {
    let w = world().await;
    w.engine.deposit(w.customer.id, 50_000).await.unwrap();
    let before = w
        .engine
        .create_booking(BookingCmd::new("birth-cert", w.customer.id))
        .await
        .unwrap();

    let updated = w
        .engine
        .update_service(
            w.admin.id,
            "birth-cert",
            ServiceUpdate::default().fee_minor(6_000).category("Civil Registry"),
        )
        .await
        .unwrap();
    assert_eq!(updated.fee_minor, 6_000);
    assert_eq!(updated.category, "Civil Registry");
    assert_eq!(updated.name, "Birth Certificate");

    let task = w.engine.task(before.task.id).await.unwrap().task;
    assert_eq!(task.fee_minor, 5_000);

    let after = w
        .engine
        .create_booking(BookingCmd::new("birth-cert", w.customer.id))
        .await
        .unwrap();
    assert_eq!(after.task.fee_minor, 6_000);
    assert_eq!(w.engine.balance(w.customer.id).await.unwrap(), 39_000);
}

#[tokio::test]
async fn services_in_use_cannot_be_removed() {
    let w = world().await;
    w.engine.deposit(w.customer.id, 50_000).await.unwrap();
    w.engine
        .create_booking(BookingCmd::new("ration-card", w.customer.id))
        .await
        .unwrap();

    let err = w
        .engine
        .remove_service(w.admin.id, "ration-card")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    w.engine.remove_service(w.admin.id, "death-cert").await.unwrap();
    assert_eq!(w.engine.services().await.unwrap().len(), 7);

    let err = w
        .engine
        .remove_service(w.admin.id, "death-cert")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
