use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{brand, kitchen_station, store},
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

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateStationInput {
    pub brand_id: Uuid,
    /// Leave empty for a station shared by every store of the brand
    pub store_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStationInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub code: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StationFilter {
    pub brand_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub is_active: Option<bool>,
    /// Only stations without a store
    pub brand_wide_only: Option<bool>,
}

/// Kitchen stations are brand-wide or scoped to one store of the brand.
/// A code is unique within its (brand, store) scope, where the brand-wide
/// scope counts as its own store.
#[derive(Clone)]
pub struct KitchenStationService {
    db_pool: Arc<DbPool>,
}

impl KitchenStationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(brand_id = %input.brand_id, code = %input.code))]
    pub async fn create_station(
        &self,
        input: CreateStationInput,
    ) -> Result<kitchen_station::Model, ServiceError> {
        input.validate()?;
        let code = non_blank("code", &input.code)?;
        let db = &*self.db_pool;

        brand::Entity::find_by_id(input.brand_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {} not found", input.brand_id)))?;

        if let Some(store_id) = input.store_id {
            let store = store::Entity::find_by_id(store_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Store {} not found", store_id)))?;
            if store.brand_id != input.brand_id {
                return Err(ServiceError::ValidationError(format!(
                    "Store {} does not belong to brand {}",
                    store_id, input.brand_id
                )));
            }
        }

        self.ensure_code_available(input.brand_id, input.store_id, &code, None)
            .await?;

        let now = Utc::now();
        let created = kitchen_station::ActiveModel {
            id: Set(Uuid::new_v4()),
            brand_id: Set(input.brand_id),
            store_id: Set(input.store_id),
            name: Set(input.name.trim().to_string()),
            code: Set(code),
            description: Set(input.description),
            sort_order: Set(input.sort_order.unwrap_or(0)),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(station_id = %created.id, brand_wide = created.is_brand_wide(), "kitchen station created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_station(&self, id: Uuid) -> Result<kitchen_station::Model, ServiceError> {
        kitchen_station::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Kitchen station {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_stations(
        &self,
        filter: &StationFilter,
    ) -> Result<Vec<kitchen_station::Model>, ServiceError> {
        let mut query = kitchen_station::Entity::find();
        if let Some(brand_id) = filter.brand_id {
            query = query.filter(kitchen_station::Column::BrandId.eq(brand_id));
        }
        if filter.brand_wide_only.unwrap_or(false) {
            query = query.filter(kitchen_station::Column::StoreId.is_null());
        } else if let Some(store_id) = filter.store_id {
            query = query.filter(kitchen_station::Column::StoreId.eq(store_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(kitchen_station::Column::IsActive.eq(is_active));
        }
        Ok(query
            .order_by_asc(kitchen_station::Column::SortOrder)
            .order_by_asc(kitchen_station::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_station(
        &self,
        id: Uuid,
        input: UpdateStationInput,
    ) -> Result<kitchen_station::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_station(id).await?;

        let code = match input.code.as_deref() {
            Some(code) => {
                let code = non_blank("code", code)?;
                self.ensure_code_available(existing.brand_id, existing.store_id, &code, Some(id))
                    .await?;
                Some(code)
            }
            None => None,
        };

        let mut active: kitchen_station::ActiveModel = existing.into();
        if let Some(code) = code {
            active.code = Set(code);
        }
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if input.description.is_some() {
            active.description = Set(input.description);
        }
        if let Some(sort_order) = input.sort_order {
            active.sort_order = Set(sort_order);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_station(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = kitchen_station::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Kitchen station {} not found",
                id
            )));
        }
        info!(station_id = %id, "kitchen station deleted");
        Ok(())
    }

    /// SQL unique indexes treat NULL store ids as distinct, so the brand-wide
    /// scope is checked here.
    async fn ensure_code_available(
        &self,
        brand_id: Uuid,
        store_id: Option<Uuid>,
        code: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = kitchen_station::Entity::find()
            .filter(kitchen_station::Column::BrandId.eq(brand_id))
            .filter(kitchen_station::Column::Code.eq(code));
        query = match store_id {
            Some(store_id) => query.filter(kitchen_station::Column::StoreId.eq(store_id)),
            None => query.filter(kitchen_station::Column::StoreId.is_null()),
        };
        if let Some(id) = exclude {
            query = query.filter(kitchen_station::Column::Id.ne(id));
        }

        if query.count(&*self.db_pool).await? > 0 {
            return Err(ServiceError::IntegrityError(format!(
                "Kitchen station code '{}' already exists for this brand and store",
                code
            )));
        }
        Ok(())
    }
}

fn non_blank(field: &str, value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be blank",
            field
        )));
    }
    Ok(trimmed.to_string())
}
