use sea_orm::{
    ActiveModelTrait, ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, Service, ServiceUpdate, TaskStatus,
    services::{self, MAX_FEE_MINOR, normalize_service_name, slugify},
    tasks,
    util::normalize_required_text,
};

use super::{Engine, with_tx};

fn validate_fee(fee_minor: i64) -> ResultEngine<i64> {
    if !(0..=MAX_FEE_MINOR).contains(&fee_minor) {
        return Err(EngineError::InvalidAmount(format!(
            "fee must be between {} and {}",
            Money::ZERO,
            Money::new(MAX_FEE_MINOR)
        )));
    }
    Ok(fee_minor)
}

impl Engine {
    /// The catalog, ordered by category then name.
    pub async fn services(&self) -> ResultEngine<Vec<Service>> {
        let rows = services::Entity::find()
            .order_by_asc(services::Column::Category)
            .order_by_asc(services::Column::Name)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(Service::from).collect())
    }

    pub async fn service(&self, service_id: &str) -> ResultEngine<Service> {
        services::Entity::find_by_id(service_id.to_string())
            .one(&self.database)
            .await?
            .map(Service::from)
            .ok_or_else(|| EngineError::KeyNotFound("service not exists".to_string()))
    }

    /// Adds a catalog entry. The id is a slug of the name.
    ///
    /// Authorization: admin only.
    pub async fn add_service(
        &self,
        actor_id: Uuid,
        name: &str,
        category: &str,
        fee_minor: i64,
    ) -> ResultEngine<Service> {
        let name = normalize_required_text(name, "service name")?;
        let category = normalize_required_text(category, "category")?;
        let fee_minor = validate_fee(fee_minor)?;
        let id = slugify(&name);
        if id.is_empty() {
            return Err(EngineError::Validation(format!(
                "service name '{name}' has no usable characters"
            )));
        }

        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            self.ensure_service_name_free(&db_tx, &name, None).await?;
            if services::Entity::find_by_id(id.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(id));
            }

            let service = Service {
                id,
                name,
                category,
                fee_minor,
            };
            services::ActiveModel::from(&service).insert(&db_tx).await?;
            Ok(service)
        })
    }

    /// Changes name, category or fee. Requests already created keep the fee
    /// they were charged.
    ///
    /// Authorization: admin only.
    pub async fn update_service(
        &self,
        actor_id: Uuid,
        service_id: &str,
        update: ServiceUpdate,
    ) -> ResultEngine<Service> {
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_required_text(name, "service name"))
            .transpose()?;
        let category = update
            .category
            .as_deref()
            .map(|category| normalize_required_text(category, "category"))
            .transpose()?;
        let fee_minor = update.fee_minor.map(validate_fee).transpose()?;

        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let model = services::Entity::find_by_id(service_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("service not exists".to_string()))?;

            let mut active: services::ActiveModel = model.into();
            if let Some(name) = name {
                self.ensure_service_name_free(&db_tx, &name, Some(service_id))
                    .await?;
                active.name_norm = ActiveValue::Set(normalize_service_name(&name));
                active.name = ActiveValue::Set(name);
            }
            if let Some(category) = category {
                active.category = ActiveValue::Set(category);
            }
            if let Some(fee_minor) = fee_minor {
                active.fee_minor = ActiveValue::Set(fee_minor);
            }
            let updated = active.update(&db_tx).await?;
            Ok(Service::from(updated))
        })
    }

    /// Removes a catalog entry that no open task refers to.
    ///
    /// Authorization: admin only.
    pub async fn remove_service(&self, actor_id: Uuid, service_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, actor_id).await?;
            let open_tasks = tasks::Entity::find()
                .filter(tasks::Column::ServiceId.eq(service_id.to_string()))
                .filter(tasks::Column::Status.is_not_in([
                    TaskStatus::CommissionApproved.as_str(),
                    TaskStatus::CommissionRejected.as_str(),
                ]))
                .count(&db_tx)
                .await?;
            if open_tasks > 0 {
                return Err(EngineError::Validation(format!(
                    "service {service_id} still has {open_tasks} open task(s)"
                )));
            }
            let result = services::Entity::delete_by_id(service_id.to_string())
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("service not exists".to_string()));
            }
            Ok(())
        })
    }

    async fn ensure_service_name_free<C: sea_orm::ConnectionTrait>(
        &self,
        db: &C,
        name: &str,
        except_id: Option<&str>,
    ) -> ResultEngine<()> {
        let mut query = services::Entity::find()
            .filter(services::Column::NameNorm.eq(normalize_service_name(name)));
        if let Some(id) = except_id {
            query = query.filter(services::Column::Id.ne(id.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
