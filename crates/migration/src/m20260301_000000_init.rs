//! Initial schema.
//!
//! - `accounts`: customers, agents, admins and the platform, with balances
//! - `bank_accounts`: withdrawal targets owned by an account
//! - `ledger_transactions`: append-only balance movements
//! - `services`: the catalog
//! - `service_requests`: bookings and leads
//! - `tasks`: one per request, the operational lifecycle
//! - `documents`: uploaded files, owned by a request
//! - `history_entries`: status log of tasks and requests
//! - `commission_ledger`: one row per settled task

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Role,
    DisplayName,
    CustomId,
    Balance,
    IsAvailable,
    CreatedAt,
}

#[derive(Iden)]
enum BankAccounts {
    Table,
    Id,
    AccountId,
    AccountNumber,
    Ifsc,
    HolderName,
}

#[derive(Iden)]
enum LedgerTransactions {
    Table,
    Id,
    AccountId,
    Seq,
    Kind,
    AmountMinor,
    Description,
    ReferenceId,
    OccurredAt,
    BalanceAfter,
}

#[derive(Iden)]
pub(crate) enum Services {
    Table,
    Id,
    Name,
    NameNorm,
    Category,
    FeeMinor,
}

#[derive(Iden)]
enum ServiceRequests {
    Table,
    Id,
    Kind,
    ServiceId,
    ServiceName,
    FeeMinor,
    RequestorId,
    GeneratedBy,
    CustomerName,
    CustomerPhone,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    OriginKind,
    OriginId,
    ServiceId,
    ServiceName,
    FeeMinor,
    AssignedAgentId,
    GeneratedBy,
    RequestorId,
    Phase,
    Status,
    AckNumber,
    Revision,
    AssignedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Documents {
    Table,
    Id,
    RequestId,
    Name,
    Size,
    Mime,
    Path,
    IsProof,
    UploadedAt,
}

#[derive(Iden)]
enum HistoryEntries {
    Table,
    Id,
    SubjectId,
    Seq,
    Status,
    Remark,
    RecordedAt,
}

#[derive(Iden)]
enum CommissionLedger {
    Table,
    Id,
    TaskId,
    ServiceName,
    AdminShare,
    AssignedShare,
    GeneratingShare,
    RecordedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Role).string().not_null())
                    .col(ColumnDef::new(Accounts::DisplayName).string().not_null())
                    .col(ColumnDef::new(Accounts::CustomId).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-custom_id-unique")
                    .table(Accounts::Table)
                    .col(Accounts::CustomId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-role")
                    .table(Accounts::Table)
                    .col(Accounts::Role)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Bank accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BankAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BankAccounts::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BankAccounts::AccountId).blob().not_null())
                    .col(
                        ColumnDef::new(BankAccounts::AccountNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BankAccounts::Ifsc).string().not_null())
                    .col(ColumnDef::new(BankAccounts::HolderName).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bank_accounts-account_id")
                            .from(BankAccounts::Table, BankAccounts::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bank_accounts-account-number-unique")
                    .table(BankAccounts::Table)
                    .col(BankAccounts::AccountId)
                    .col(BankAccounts::AccountNumber)
                    .col(BankAccounts::Ifsc)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Ledger transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerTransactions::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerTransactions::AccountId)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerTransactions::Seq)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerTransactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(LedgerTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerTransactions::Description)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerTransactions::ReferenceId).blob())
                    .col(
                        ColumnDef::new(LedgerTransactions::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_transactions-account_id")
                            .from(LedgerTransactions::Table, LedgerTransactions::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_transactions-account_id-seq-unique")
                    .table(LedgerTransactions::Table)
                    .col(LedgerTransactions::AccountId)
                    .col(LedgerTransactions::Seq)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_transactions-reference_id")
                    .table(LedgerTransactions::Table)
                    .col(LedgerTransactions::ReferenceId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Services
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Services::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Services::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Services::Name).string().not_null())
                    .col(ColumnDef::new(Services::NameNorm).string().not_null())
                    .col(ColumnDef::new(Services::Category).string().not_null())
                    .col(ColumnDef::new(Services::FeeMinor).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-services-name_norm-unique")
                    .table(Services::Table)
                    .col(Services::NameNorm)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Service requests
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ServiceRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceRequests::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceRequests::Kind).string().not_null())
                    .col(ColumnDef::new(ServiceRequests::ServiceId).string().not_null())
                    .col(
                        ColumnDef::new(ServiceRequests::ServiceName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceRequests::FeeMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ServiceRequests::RequestorId).blob().not_null())
                    .col(ColumnDef::new(ServiceRequests::GeneratedBy).blob())
                    .col(ColumnDef::new(ServiceRequests::CustomerName).string())
                    .col(ColumnDef::new(ServiceRequests::CustomerPhone).string())
                    .col(ColumnDef::new(ServiceRequests::Status).string().not_null())
                    .col(
                        ColumnDef::new(ServiceRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-service_requests-requestor_id")
                    .table(ServiceRequests::Table)
                    .col(ServiceRequests::RequestorId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Tasks
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tasks::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Tasks::OriginKind).string().not_null())
                    .col(ColumnDef::new(Tasks::OriginId).blob().not_null())
                    .col(ColumnDef::new(Tasks::ServiceId).string().not_null())
                    .col(ColumnDef::new(Tasks::ServiceName).string().not_null())
                    .col(ColumnDef::new(Tasks::FeeMinor).big_integer().not_null())
                    .col(ColumnDef::new(Tasks::AssignedAgentId).blob())
                    .col(ColumnDef::new(Tasks::GeneratedBy).blob())
                    .col(ColumnDef::new(Tasks::RequestorId).blob().not_null())
                    .col(ColumnDef::new(Tasks::Phase).integer().not_null())
                    .col(ColumnDef::new(Tasks::Status).string().not_null())
                    .col(ColumnDef::new(Tasks::AckNumber).string())
                    .col(
                        ColumnDef::new(Tasks::Revision)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Tasks::AssignedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Tasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tasks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tasks-origin_id")
                            .from(Tasks::Table, Tasks::OriginId)
                            .to(ServiceRequests::Table, ServiceRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tasks-origin_id-unique")
                    .table(Tasks::Table)
                    .col(Tasks::OriginId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tasks-status")
                    .table(Tasks::Table)
                    .col(Tasks::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tasks-assigned_agent_id")
                    .table(Tasks::Table)
                    .col(Tasks::AssignedAgentId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Documents
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Documents::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Documents::RequestId).blob().not_null())
                    .col(ColumnDef::new(Documents::Name).string().not_null())
                    .col(ColumnDef::new(Documents::Size).big_integer().not_null())
                    .col(ColumnDef::new(Documents::Mime).string().not_null())
                    .col(ColumnDef::new(Documents::Path).string().not_null())
                    .col(
                        ColumnDef::new(Documents::IsProof)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Documents::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-documents-request_id")
                            .from(Documents::Table, Documents::RequestId)
                            .to(ServiceRequests::Table, ServiceRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-documents-request_id")
                    .table(Documents::Table)
                    .col(Documents::RequestId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. History entries
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(HistoryEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HistoryEntries::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HistoryEntries::SubjectId).blob().not_null())
                    .col(ColumnDef::new(HistoryEntries::Seq).big_integer().not_null())
                    .col(ColumnDef::new(HistoryEntries::Status).string().not_null())
                    .col(ColumnDef::new(HistoryEntries::Remark).string().not_null())
                    .col(
                        ColumnDef::new(HistoryEntries::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-history_entries-subject_id-seq-unique")
                    .table(HistoryEntries::Table)
                    .col(HistoryEntries::SubjectId)
                    .col(HistoryEntries::Seq)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Commission ledger
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CommissionLedger::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommissionLedger::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CommissionLedger::TaskId).blob().not_null())
                    .col(
                        ColumnDef::new(CommissionLedger::ServiceName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionLedger::AdminShare)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionLedger::AssignedShare)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionLedger::GeneratingShare)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CommissionLedger::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-commission_ledger-task_id-unique")
                    .table(CommissionLedger::Table)
                    .col(CommissionLedger::TaskId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Reverse order so foreign keys never dangle.
        manager
            .drop_table(Table::drop().table(CommissionLedger::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HistoryEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Documents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ServiceRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Services::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
