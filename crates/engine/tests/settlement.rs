mod common;

use common::{World, ledger_sum, pdf, world};
use engine::{
    BookingCmd, EngineError, LeadCmd, MAX_FEE_MINOR, NotifyTarget, Task, TaskStatus,
    TransactionKind, tasks,
};
use sea_orm::{EntityTrait, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

/// Drives `task` from pending assignment to pending commission approval.
async fn complete(w: &World, task: &Task, agent_id: Uuid) {
    w.engine
        .assign_task(w.admin.id, task.id, agent_id)
        .await
        .unwrap();
    w.engine.accept_task(agent_id, task.id, None).await.unwrap();
    w.engine
        .submit_ack(agent_id, task.id, "ACK-42", None)
        .await
        .unwrap();
    w.engine
        .complete_task(agent_id, task.id, vec![pdf("proof.pdf")], None)
        .await
        .unwrap();
}

async fn completed_booking(w: &World, service_id: &str) -> Task {
    w.engine.deposit(w.customer.id, 20_000).await.unwrap();
    let task = w
        .engine
        .create_booking(BookingCmd::new(service_id, w.customer.id))
        .await
        .unwrap()
        .task;
    complete(w, &task, w.agent.id).await;
    task
}

#[tokio::test]
async fn booking_pays_ninety_ten() {
    let w = world().await;
    let task = completed_booking(&w, "income-cert").await;

    let settlement = w
        .engine
        .approve_commission(w.admin.id, task.id, None)
        .await
        .unwrap();

    assert_eq!(settlement.task.status, TaskStatus::CommissionApproved);
    assert_eq!(settlement.task.phase, 5);
    assert_eq!(settlement.entry.assigned_share, 9_000);
    assert_eq!(settlement.entry.generating_share, 0);
    assert_eq!(settlement.entry.admin_share, 1_000);
    assert_eq!(settlement.entry.service_name, "Income Certificate");

    assert_eq!(w.engine.balance(w.agent.id).await.unwrap(), 9_000);
    assert_eq!(w.engine.platform_commission_balance().await.unwrap(), 1_000);
    assert_eq!(w.engine.balance(w.customer.id).await.unwrap(), 10_000);

    let payout = w.engine.ledger_transactions(w.agent.id).await.unwrap();
    assert_eq!(payout.len(), 1);
    assert_eq!(payout[0].kind, TransactionKind::Payout);
    assert_eq!(payout[0].reference_id, Some(task.id));

    let platform = w
        .engine
        .ledger_transactions(w.engine.platform_account_id())
        .await
        .unwrap();
    assert_eq!(platform.len(), 1);
    assert_eq!(platform[0].kind, TransactionKind::Commission);

    let entries = w.engine.commission_entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].task_id, task.id);

    for account in [w.agent.id, w.customer.id, w.engine.platform_account_id()] {
        let audit = w.engine.verify_ledger(account).await.unwrap();
        assert!(audit.is_consistent(), "{audit:?}");
        assert_eq!(
            w.engine.balance(account).await.unwrap(),
            ledger_sum(&w.engine, account).await
        );
    }

    let agent_titles = w.notifier.titles_for(NotifyTarget::Account(w.agent.id));
    assert!(agent_titles.contains(&"Commission Approved".to_string()));
}

#[tokio::test]
async fn lead_splits_between_both_agents() {
    let w = world().await;
    w.engine.deposit(w.agent.id, 10_000).await.unwrap();
    let lead = w
        .engine
        .create_lead(LeadCmd::new("caste-cert", w.agent.id, "Imran", "9123456789"))
        .await
        .unwrap();
    complete(&w, &lead.task, w.other_agent.id).await;

    let settlement = w
        .engine
        .approve_commission(w.admin.id, lead.task.id, Some("Verified"))
        .await
        .unwrap();

    assert_eq!(settlement.entry.assigned_share, 3_375);
    assert_eq!(settlement.entry.generating_share, 3_375);
    assert_eq!(settlement.entry.admin_share, 750);

    assert_eq!(w.engine.balance(w.other_agent.id).await.unwrap(), 3_375);
    assert_eq!(w.engine.balance(w.agent.id).await.unwrap(), 10_000 - 7_500 + 3_375);
    assert_eq!(w.engine.platform_commission_balance().await.unwrap(), 750);

    let history = w.engine.task(lead.task.id).await.unwrap().history;
    assert_eq!(history.last().unwrap().remark, "Verified");
}

#[tokio::test]
async fn generator_working_own_lead_gets_the_sole_share() {
    let w = world().await;
    w.engine.deposit(w.agent.id, 10_000).await.unwrap();
    let lead = w
        .engine
        .create_lead(LeadCmd::new("domicile-cert", w.agent.id, "Imran", "9123456789"))
        .await
        .unwrap();
    w.engine
        .assign_task(w.admin.id, lead.task.id, w.other_agent.id)
        .await
        .unwrap();
    w.engine
        .reject_task(w.other_agent.id, lead.task.id, "out of area")
        .await
        .unwrap();
    complete(&w, &lead.task, w.agent.id).await;

    let settlement = w
        .engine
        .approve_commission(w.admin.id, lead.task.id, None)
        .await
        .unwrap();

    assert_eq!(settlement.entry.assigned_share, 9_000);
    assert_eq!(settlement.entry.generating_share, 0);
    assert_eq!(settlement.entry.admin_share, 1_000);
    assert_eq!(w.engine.balance(w.agent.id).await.unwrap(), 9_000);
}

#[tokio::test]
async fn second_approval_is_refused() {
    let w = world().await;
    let task = completed_booking(&w, "income-cert").await;
    w.engine
        .approve_commission(w.admin.id, task.id, None)
        .await
        .unwrap();

    let err = w
        .engine
        .approve_commission(w.admin.id, task.id, None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidTransition(_)));
    assert_eq!(w.engine.balance(w.agent.id).await.unwrap(), 9_000);
    assert_eq!(w.engine.platform_commission_balance().await.unwrap(), 1_000);
    assert_eq!(w.engine.commission_entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_payout_rolls_back_the_whole_settlement() {
    let w = world().await;
    let task = completed_booking(&w, "income-cert").await;

    // Point the generating agent at an account that does not exist so the
    // second credit fails after the first one was applied.
    tasks::Entity::update_many()
        .col_expr(tasks::Column::GeneratedBy, Expr::value(Some(Uuid::new_v4())))
        .filter(tasks::Column::Id.eq(task.id))
        .exec(&w.db)
        .await
        .unwrap();

    let err = w
        .engine
        .approve_commission(w.admin.id, task.id, None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::SettlementFailure(_)));
    assert!(err.is_retryable());
    assert_eq!(
        w.engine.task(task.id).await.unwrap().task.status,
        TaskStatus::PendingCommissionApproval
    );
    assert_eq!(w.engine.balance(w.agent.id).await.unwrap(), 0);
    assert!(
        w.engine
            .ledger_transactions(w.agent.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(w.engine.platform_commission_balance().await.unwrap(), 0);
    assert!(w.engine.commission_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_commission_pays_nobody() {
    let w = world().await;
    let task = completed_booking(&w, "pan-card").await;

    let err = w
        .engine
        .reject_commission(w.admin.id, task.id, "")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let rejected = w
        .engine
        .reject_commission(w.admin.id, task.id, "Proof is illegible")
        .await
        .unwrap();
    assert_eq!(rejected.status, TaskStatus::CommissionRejected);
    assert_eq!(rejected.phase, 4);

    assert_eq!(w.engine.balance(w.agent.id).await.unwrap(), 0);
    assert_eq!(w.engine.platform_commission_balance().await.unwrap(), 0);
    assert!(w.engine.commission_entries().await.unwrap().is_empty());

    let err = w
        .engine
        .approve_commission(w.admin.id, task.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    let agent_titles = w.notifier.titles_for(NotifyTarget::Account(w.agent.id));
    assert!(agent_titles.contains(&"Commission Rejected".to_string()));
}

#[tokio::test]
async fn only_admins_settle() {
    let w = world().await;
    let task = completed_booking(&w, "income-cert").await;

    let err = w
        .engine
        .approve_commission(w.agent.id, task.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = w
        .engine
        .reject_commission(w.customer.id, task.id, "no")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn free_service_settles_with_zero_shares() {
    let w = world().await;
    let task = completed_booking(&w, "voter-id").await;

    let settlement = w
        .engine
        .approve_commission(w.admin.id, task.id, None)
        .await
        .unwrap();

    assert_eq!(settlement.entry.assigned_share, 0);
    assert_eq!(settlement.entry.admin_share, 0);
    assert!(
        w.engine
            .ledger_transactions(w.agent.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(w.engine.commission_entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn the_largest_fee_settles_and_larger_ones_are_refused() {
    let w = world().await;

    let err = w
        .engine
        .add_service(w.admin.id, "Mining Lease", "Revenue", 2_000_000_000_000_000)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    let err = w
        .engine
        .update_service(
            w.admin.id,
            "income-cert",
            engine::ServiceUpdate::default().fee_minor(MAX_FEE_MINOR + 1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let service = w
        .engine
        .add_service(w.admin.id, "Mining Lease", "Revenue", MAX_FEE_MINOR)
        .await
        .unwrap();
    w.engine
        .deposit(w.customer.id, MAX_FEE_MINOR)
        .await
        .unwrap();
    let task = w
        .engine
        .create_booking(BookingCmd::new(&service.id, w.customer.id))
        .await
        .unwrap()
        .task;
    complete(&w, &task, w.agent.id).await;

    let settlement = w
        .engine
        .approve_commission(w.admin.id, task.id, None)
        .await
        .unwrap();
    assert_eq!(settlement.entry.assigned_share, 900_000_000);
    assert_eq!(settlement.entry.admin_share, 100_000_000);
    assert_eq!(w.engine.balance(w.agent.id).await.unwrap(), 900_000_000);
}
