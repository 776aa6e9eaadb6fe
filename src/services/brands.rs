use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{bill, brand, company, kitchen_station, store, table_area},
};
use chrono::Utc;
use rust_decimal::Decimal;
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
pub struct CreateBrandInput {
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub tax_rate: Option<Decimal>,
    pub service_charge: Option<Decimal>,
    #[validate(range(min = 0, max = 120))]
    pub point_expiry_months_override: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateBrandInput {
    #[validate(length(min = 1, max = 32))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub service_charge: Option<Decimal>,
    #[validate(range(min = 0, max = 120))]
    pub point_expiry_months_override: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BrandFilter {
    pub company_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Brands of a company. Brand names are unique across the whole system.
#[derive(Clone)]
pub struct BrandService {
    db_pool: Arc<DbPool>,
}

impl BrandService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_brand(&self, input: CreateBrandInput) -> Result<brand::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;

        company::Entity::find_by_id(input.company_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Company {} not found", input.company_id))
            })?;
        self.ensure_name_available(&input.name, None).await?;

        let now = Utc::now();
        let created = brand::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            code: Set(input.code.trim().to_string()),
            name: Set(input.name.trim().to_string()),
            tax_rate: Set(input.tax_rate.unwrap_or(Decimal::ZERO)),
            service_charge: Set(input.service_charge.unwrap_or(Decimal::ZERO)),
            point_expiry_months_override: Set(input.point_expiry_months_override),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(brand_id = %created.id, "brand created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_brand(&self, id: Uuid) -> Result<brand::Model, ServiceError> {
        brand::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_brands(&self, filter: &BrandFilter) -> Result<Vec<brand::Model>, ServiceError> {
        let mut query = brand::Entity::find();
        if let Some(company_id) = filter.company_id {
            query = query.filter(brand::Column::CompanyId.eq(company_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(brand::Column::IsActive.eq(is_active));
        }
        Ok(query
            .order_by_asc(brand::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_brand(
        &self,
        id: Uuid,
        input: UpdateBrandInput,
    ) -> Result<brand::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_brand(id).await?;
        if let Some(name) = input.name.as_deref() {
            self.ensure_name_available(name, Some(id)).await?;
        }

        let mut active: brand::ActiveModel = existing.into();
        if let Some(code) = input.code {
            active.code = Set(code.trim().to_string());
        }
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(tax_rate) = input.tax_rate {
            active.tax_rate = Set(tax_rate);
        }
        if let Some(service_charge) = input.service_charge {
            active.service_charge = Set(service_charge);
        }
        if input.point_expiry_months_override.is_some() {
            active.point_expiry_months_override = Set(input.point_expiry_months_override);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db_pool).await?)
    }

    /// Deletes a brand that nothing references any more.
    #[instrument(skip(self))]
    pub async fn delete_brand(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        self.get_brand(id).await?;

        let dependents = [
            (
                "stores",
                store::Entity::find()
                    .filter(store::Column::BrandId.eq(id))
                    .count(db)
                    .await?,
            ),
            (
                "kitchen stations",
                kitchen_station::Entity::find()
                    .filter(kitchen_station::Column::BrandId.eq(id))
                    .count(db)
                    .await?,
            ),
            (
                "table areas",
                table_area::Entity::find()
                    .filter(table_area::Column::BrandId.eq(id))
                    .count(db)
                    .await?,
            ),
            (
                "bills",
                bill::Entity::find()
                    .filter(bill::Column::BrandId.eq(id))
                    .count(db)
                    .await?,
            ),
        ];
        super::ensure_no_dependents("Brand", id, &dependents)?;

        brand::Entity::delete_by_id(id).exec(db).await?;
        info!(brand_id = %id, "brand deleted");
        Ok(())
    }

    async fn ensure_name_available(
        &self,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = brand::Entity::find().filter(brand::Column::Name.eq(name.trim()));
        if let Some(id) = exclude {
            query = query.filter(brand::Column::Id.ne(id));
        }
        if query.count(&*self.db_pool).await? > 0 {
            return Err(ServiceError::IntegrityError(format!(
                "Brand name '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }
}
