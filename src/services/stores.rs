use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{bill, brand, kitchen_station, store, table_area},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateStoreInput {
    pub brand_id: Uuid,
    #[validate(length(min = 1, max = 20))]
    pub store_code: String,
    #[validate(length(min = 1, max = 200))]
    pub store_name: String,
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub timezone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStoreInput {
    #[validate(length(min = 1, max = 200))]
    pub store_name: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub timezone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StoreFilter {
    pub brand_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct StoreService {
    db_pool: Arc<DbPool>,
}

impl StoreService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(store_code = %input.store_code))]
    pub async fn create_store(&self, input: CreateStoreInput) -> Result<store::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;

        brand::Entity::find_by_id(input.brand_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {} not found", input.brand_id)))?;

        let code = input.store_code.trim().to_string();
        let taken = store::Entity::find()
            .filter(store::Column::StoreCode.eq(code.as_str()))
            .count(db)
            .await?;
        if taken > 0 {
            return Err(ServiceError::IntegrityError(format!(
                "Store code '{}' already exists",
                code
            )));
        }

        let now = Utc::now();
        let created = store::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(input.brand_id),
            store_code: Set(code),
            store_name: Set(input.store_name.trim().to_string()),
            address: Set(input.address),
            phone: Set(input.phone),
            timezone: Set(input
                .timezone
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(store_id = %created.id, brand_id = %created.brand_id, "store created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_store(&self, id: Uuid) -> Result<store::Model, ServiceError> {
        store::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_stores(&self, filter: &StoreFilter) -> Result<Vec<store::Model>, ServiceError> {
        let mut query = store::Entity::find();
        if let Some(brand_id) = filter.brand_id {
            query = query.filter(store::Column::BrandId.eq(brand_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(store::Column::IsActive.eq(is_active));
        }
        Ok(query
            .order_by_asc(store::Column::StoreCode)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_store(
        &self,
        id: Uuid,
        input: UpdateStoreInput,
    ) -> Result<store::Model, ServiceError> {
        input.validate()?;
        let mut active: store::ActiveModel = self.get_store(id).await?.into();

        if let Some(name) = input.store_name {
            active.store_name = Set(name.trim().to_string());
        }
        if input.address.is_some() {
            active.address = Set(input.address);
        }
        if input.phone.is_some() {
            active.phone = Set(input.phone);
        }
        if let Some(timezone) = input.timezone {
            active.timezone = Set(timezone);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_store(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get_store(id).await?;

        let dependents = [
            (
                "table areas",
                table_area::Entity::find()
                    .filter(table_area::Column::StoreId.eq(id))
                    .count(db)
                    .await?,
            ),
            (
                "kitchen stations",
                kitchen_station::Entity::find()
                    .filter(kitchen_station::Column::StoreId.eq(id))
                    .count(db)
                    .await?,
            ),
            (
                "bills",
                bill::Entity::find()
                    .filter(bill::Column::StoreId.eq(id))
                    .count(db)
                    .await?,
            ),
        ];
        super::ensure_no_dependents("Store", id, &dependents)?;

        store::Entity::delete_by_id(id).exec(db).await?;
        info!(store_id = %id, "store deleted");
        Ok(())
    }
}
