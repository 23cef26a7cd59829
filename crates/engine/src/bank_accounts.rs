//! Bank accounts registered by wallet holders as withdrawal targets.
//!
//! The engine treats the details as opaque; it only checks that a
//! withdrawal names one of the holder's own accounts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: Uuid,
    pub account_id: Uuid,
    pub account_number: String,
    pub ifsc: String,
    pub holder_name: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub account_number: String,
    pub ifsc: String,
    pub holder_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for BankAccount {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            account_number: model.account_number,
            ifsc: model.ifsc,
            holder_name: model.holder_name,
        }
    }
}
