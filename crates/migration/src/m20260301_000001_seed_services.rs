//! Seeds the service catalog the platform launched with.
//!
//! Fees are in paise.

use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;
use unicode_normalization::UnicodeNormalization;

use crate::m20260301_000000_init::Services;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CATALOG: [(&str, &str, &str, i64); 8] = [
    ("birth-cert", "Birth Certificate", "Civil", 5_000),
    ("death-cert", "Death Certificate", "Civil", 5_000),
    ("income-cert", "Income Certificate", "Revenue", 10_000),
    ("caste-cert", "Caste Certificate", "Social Welfare", 7_500),
    ("domicile-cert", "Domicile Certificate", "Revenue", 10_000),
    ("ration-card", "Ration Card", "Food & Supplies", 2_500),
    ("voter-id", "Voter ID Card", "Election", 0),
    ("pan-card", "PAN Card", "Income Tax", 11_000),
];

// Same normalization the engine applies when checking for duplicate names.
fn normalize_name(name: &str) -> String {
    name.nfkc()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        let mut insert = Query::insert()
            .into_table(Services::Table)
            .columns([
                Services::Id,
                Services::Name,
                Services::NameNorm,
                Services::Category,
                Services::FeeMinor,
            ])
            .to_owned();
        for (id, name, category, fee_minor) in CATALOG {
            insert
                .values([
                    id.into(),
                    name.into(),
                    normalize_name(name).into(),
                    category.into(),
                    fee_minor.into(),
                ])
                .map_err(|err| DbErr::Migration(err.to_string()))?;
        }
        db.execute(backend.build(&insert)).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        let ids: Vec<&str> = CATALOG.iter().map(|(id, ..)| *id).collect();
        let delete = Query::delete()
            .from_table(Services::Table)
            .and_where(Expr::col(Services::Id).is_in(ids))
            .to_owned();
        db.execute(backend.build(&delete)).await?;
        Ok(())
    }
}
