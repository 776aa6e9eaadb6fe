use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        brand, store, table_area,
        tables::{self, TableStatus},
    },
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
pub struct CreateAreaInput {
    pub store_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    #[validate(range(min = 1))]
    pub floor_width: Option<i32>,
    #[validate(range(min = 1))]
    pub floor_height: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AreaFilter {
    pub store_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTableInput {
    pub area_id: Uuid,
    #[validate(length(min = 1, max = 20))]
    pub number: String,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: Option<i32>,
    pub qr_code: Option<String>,
    pub pos_x: Option<i32>,
    pub pos_y: Option<i32>,
    pub status: Option<TableStatus>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TableFilter {
    pub area_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Floor layout of a store: areas and the seating tables inside them.
#[derive(Clone)]
pub struct TableAreaService {
    db_pool: Arc<DbPool>,
}

impl TableAreaService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates an area; its brand and company are taken from the store.
    #[instrument(skip(self, input), fields(store_id = %input.store_id))]
    pub async fn create_area(
        &self,
        input: CreateAreaInput,
    ) -> Result<table_area::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;

        let (store, brand) = store::Entity::find_by_id(input.store_id)
            .find_also_related(brand::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store {} not found", input.store_id)))?;

        let name = input.name.trim().to_string();
        let taken = table_area::Entity::find()
            .filter(table_area::Column::StoreId.eq(store.id))
            .filter(table_area::Column::Name.eq(name.as_str()))
            .count(db)
            .await?;
        if taken > 0 {
            return Err(ServiceError::IntegrityError(format!(
                "Table area '{}' already exists in store {}",
                name, store.id
            )));
        }

        let now = Utc::now();
        let created = table_area::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(brand.map(|b| b.company_id)),
            brand_id: Set(store.brand_id),
            store_id: Set(store.id),
            name: Set(name),
            description: Set(input.description),
            sort_order: Set(input.sort_order.unwrap_or(0)),
            floor_width: Set(input.floor_width.unwrap_or(800)),
            floor_height: Set(input.floor_height.unwrap_or(600)),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(area_id = %created.id, "table area created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_area(&self, id: Uuid) -> Result<table_area::Model, ServiceError> {
        table_area::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Table area {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_areas(
        &self,
        filter: &AreaFilter,
    ) -> Result<Vec<table_area::Model>, ServiceError> {
        let mut query = table_area::Entity::find();
        if let Some(store_id) = filter.store_id {
            query = query.filter(table_area::Column::StoreId.eq(store_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(table_area::Column::IsActive.eq(is_active));
        }
        Ok(query
            .order_by_asc(table_area::Column::SortOrder)
            .order_by_asc(table_area::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_area(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get_area(id).await?;

        let dependents = [(
            "tables",
            tables::Entity::find()
                .filter(tables::Column::AreaId.eq(id))
                .count(db)
                .await?,
        )];
        super::ensure_no_dependents("Table area", id, &dependents)?;

        table_area::Entity::delete_by_id(id).exec(db).await?;
        info!(area_id = %id, "table area deleted");
        Ok(())
    }

    #[instrument(skip(self, input), fields(area_id = %input.area_id, number = %input.number))]
    pub async fn create_table(&self, input: CreateTableInput) -> Result<tables::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let area = self.get_area(input.area_id).await?;

        let number = input.number.trim().to_string();
        if number.is_empty() {
            return Err(ServiceError::ValidationError(
                "number must not be blank".to_string(),
            ));
        }
        let taken = tables::Entity::find()
            .filter(tables::Column::AreaId.eq(area.id))
            .filter(tables::Column::Number.eq(number.as_str()))
            .count(db)
            .await?;
        if taken > 0 {
            return Err(ServiceError::IntegrityError(format!(
                "Table '{}' already exists in area {}",
                number, area.id
            )));
        }

        let now = Utc::now();
        let created = tables::ActiveModel {
            id: Set(Uuid::new_v4()),
            area_id: Set(area.id),
            number: Set(number),
            capacity: Set(input.capacity.unwrap_or(4)),
            qr_code: Set(input.qr_code),
            pos_x: Set(input.pos_x.unwrap_or(0)),
            pos_y: Set(input.pos_y.unwrap_or(0)),
            status: Set(input.status.unwrap_or(TableStatus::Available)),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(table_id = %created.id, "table created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_table(&self, id: Uuid) -> Result<tables::Model, ServiceError> {
        tables::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Table {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_tables(&self, filter: &TableFilter) -> Result<Vec<tables::Model>, ServiceError> {
        let mut query = tables::Entity::find();
        if let Some(area_id) = filter.area_id {
            query = query.filter(tables::Column::AreaId.eq(area_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(tables::Column::IsActive.eq(is_active));
        }
        Ok(query
            .order_by_asc(tables::Column::Number)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_table(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = tables::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Table {} not found", id)));
        }
        info!(table_id = %id, "table deleted");
        Ok(())
    }
}
