use std::{error::Error, io::Write, path::PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use csv::Writer;
use engine::{AccountRole, Engine, Money};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "seva_admin")]
#[command(about = "Admin utilities for Seva (bootstrap accounts, catalog and wallets)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./seva.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(Account),
    Service(Service),
    Wallet(Wallet),
    Ledger(Ledger),
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Role {
    Customer,
    Agent,
    Admin,
}

impl From<Role> for AccountRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Customer => AccountRole::Customer,
            Role::Agent => AccountRole::Agent,
            Role::Admin => AccountRole::Admin,
        }
    }
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long, value_enum)]
    role: Role,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct Service {
    #[command(subcommand)]
    command: ServiceCommand,
}

#[derive(Subcommand, Debug)]
enum ServiceCommand {
    Add(ServiceAddArgs),
    List,
}

#[derive(Args, Debug)]
struct ServiceAddArgs {
    /// Admin account performing the change (also read from `SEVA_ADMIN_ID`).
    #[arg(long, env = "SEVA_ADMIN_ID")]
    admin: Uuid,
    #[arg(long)]
    name: String,
    #[arg(long)]
    category: String,
    /// Fee in rupees, e.g. `75` or `74,50`.
    #[arg(long)]
    fee: String,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Deposit(DepositArgs),
}

#[derive(Args, Debug)]
struct DepositArgs {
    #[arg(long)]
    account: Uuid,
    /// Amount in rupees, e.g. `500` or `499.99`.
    #[arg(long)]
    amount: String,
}

#[derive(Args, Debug)]
struct Ledger {
    #[command(subcommand)]
    command: LedgerCommand,
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    Audit(AuditArgs),
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct AuditArgs {
    #[arg(long)]
    account: Uuid,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long)]
    account: Uuid,
    /// Write to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct ExportRow {
    seq: i64,
    occurred_at: String,
    kind: &'static str,
    amount_minor: i64,
    amount: String,
    balance_after: i64,
    description: String,
    reference_id: Option<String>,
    id: String,
}

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn export_ledger(
    engine: &Engine,
    args: ExportArgs,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };

    let mut writer = Writer::from_writer(out);
    for tx in engine.ledger_transactions(args.account).await? {
        writer.serialize(ExportRow {
            seq: tx.seq,
            occurred_at: tx.occurred_at.to_rfc3339(),
            kind: tx.kind.as_str(),
            amount_minor: tx.amount_minor,
            amount: Money::new(tx.amount_minor).to_string(),
            balance_after: tx.balance_after,
            description: tx.description,
            reference_id: tx.reference_id.map(|id| id.to_string()),
            id: tx.id.to_string(),
        })?;
    }
    writer.flush()?;

    if let Some(path) = args.output {
        eprintln!("exported ledger of {} to {}", args.account, path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Account(Account {
            command: AccountCommand::Create(args),
        }) => {
            let account = engine.create_account(args.role.into(), &args.name).await?;
            println!("created account: {} ({})", account.custom_id, account.id);
        }
        Command::Service(Service {
            command: ServiceCommand::Add(args),
        }) => {
            let fee = match parse_money(&args.fee) {
                Ok(fee) => fee,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            let service = engine
                .add_service(args.admin, &args.name, &args.category, fee.minor())
                .await?;
            println!("created service: {} ({})", service.name, service.id);
        }
        Command::Service(Service {
            command: ServiceCommand::List,
        }) => {
            for service in engine.services().await? {
                println!(
                    "{:<16} {:<28} {:<16} {}",
                    service.id,
                    service.name,
                    service.category,
                    Money::new(service.fee_minor)
                );
            }
        }
        Command::Wallet(Wallet {
            command: WalletCommand::Deposit(args),
        }) => {
            let amount = match parse_money(&args.amount) {
                Ok(amount) => amount,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            let tx = engine.deposit(args.account, amount.minor()).await?;
            println!(
                "deposited {amount}, balance is now {}",
                Money::new(tx.balance_after)
            );
        }
        Command::Ledger(Ledger {
            command: LedgerCommand::Audit(args),
        }) => {
            let audit = engine.verify_ledger(args.account).await?;
            println!(
                "{} transactions, stored {}, replayed {}",
                audit.transactions,
                Money::new(audit.stored_balance),
                Money::new(audit.replayed_balance)
            );
            if !audit.is_consistent() {
                for id in &audit.mismatched {
                    eprintln!("balance_after mismatch at transaction {id}");
                }
                std::process::exit(1);
            }
        }
        Command::Ledger(Ledger {
            command: LedgerCommand::Export(args),
        }) => export_ledger(&engine, args).await?,
    }

    Ok(())
}
