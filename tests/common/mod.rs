#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use fnb_backoffice::{
    config::AppConfig,
    db,
    message_queue::{InMemoryMessageQueue, MessageQueue},
    models::{
        bill::{self, BillStatus},
        bill_item, bill_promotion, brand, company, member,
        member_transaction::{self, TransactionType},
        payment::{self, PaymentStatus},
        store,
    },
    services::{brands::CreateBrandInput, stores::CreateStoreInput},
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Business offset used by every test: UTC+07:00.
pub const OFFSET_MINUTES: i32 = 7 * 60;

pub fn offset() -> FixedOffset {
    FixedOffset::east_opt(OFFSET_MINUTES * 60).unwrap()
}

/// UTC instant of a local wall-clock time in the test business zone.
pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    offset()
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Application state backed by a fresh in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_queue(Arc::new(InMemoryMessageQueue::new())).await
    }

    pub async fn with_queue(queue: Arc<dyn MessageQueue>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "redis://127.0.0.1:6379".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.business_utc_offset_minutes = OFFSET_MINUTES;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg, queue);
        let router = fnb_backoffice::app_router(state.clone());

        Self { router, state }
    }

    pub fn db(&self) -> &sea_orm::DatabaseConnection {
        &self.state.db
    }

    /// Sends a request and returns the status with the decoded JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is json")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    pub async fn seed_company(&self, code: &str, point_expiry_months: i32) -> company::Model {
        let now = Utc::now();
        company::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            name: Set(format!("Company {}", code)),
            timezone: Set("Asia/Jakarta".to_string()),
            point_expiry_months: Set(point_expiry_months),
            points_per_currency: Set(Decimal::ONE),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db())
        .await
        .expect("seed company")
    }

    pub async fn seed_brand(&self, company_id: Uuid, code: &str) -> brand::Model {
        self.state
            .services
            .brands
            .create_brand(CreateBrandInput {
                company_id,
                code: code.to_string(),
                name: format!("Brand {}", code),
                tax_rate: None,
                service_charge: None,
                point_expiry_months_override: None,
                is_active: None,
            })
            .await
            .expect("seed brand")
    }

    pub async fn seed_store(&self, brand_id: Uuid, code: &str) -> store::Model {
        self.state
            .services
            .stores
            .create_store(CreateStoreInput {
                brand_id,
                store_code: code.to_string(),
                store_name: format!("Store {}", code),
                address: None,
                phone: None,
                timezone: None,
                is_active: None,
            })
            .await
            .expect("seed store")
    }

    /// Company, brand and store in one go.
    pub async fn seed_outlet(&self, code: &str) -> (company::Model, brand::Model, store::Model) {
        let company = self.seed_company(code, 12).await;
        let brand = self.seed_brand(company.id, code).await;
        let store = self.seed_store(brand.id, &format!("{}-01", code)).await;
        (company, brand, store)
    }

    pub async fn seed_member(&self, company_id: Uuid, code: &str, points: i32) -> member::Model {
        let now = Utc::now();
        member::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            member_code: Set(code.to_string()),
            full_name: Set(format!("Member {}", code)),
            phone: Set(None),
            tier: Set("regular".to_string()),
            points: Set(points),
            point_balance: Set(Decimal::ZERO),
            total_visits: Set(0),
            total_spent: Set(Decimal::ZERO),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db())
        .await
        .expect("seed member")
    }

    pub async fn seed_earn(
        &self,
        member_id: Uuid,
        points: i32,
        created_at: DateTime<Utc>,
    ) -> member_transaction::Model {
        member_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            member_id: Set(member_id),
            bill_id: Set(None),
            transaction_type: Set(TransactionType::Earn),
            points_change: Set(points),
            points_before: Set(0),
            points_after: Set(points),
            is_expired: Set(false),
            expired_at: Set(None),
            reference: Set(None),
            notes: Set(None),
            created_at: Set(created_at),
        }
        .insert(self.db())
        .await
        .expect("seed earn transaction")
    }
}

/// Builder for a synced bill with its items, payments and promotions.
pub struct BillFixture {
    pub store: store::Model,
    pub company_id: Uuid,
    pub number: String,
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
    pub member_id: Option<Uuid>,
    pub cashier_id: Option<Uuid>,
    pub discount: Decimal,
    pub tax: Decimal,
    /// (product id, sku, quantity, unit price, unit cost)
    pub items: Vec<(Uuid, &'static str, i32, Decimal, Decimal)>,
    /// (method, amount, status)
    pub payments: Vec<(&'static str, Decimal, PaymentStatus)>,
    /// (promotion id, name, discount, cashback)
    pub promotions: Vec<(Uuid, &'static str, Decimal, Decimal)>,
}

impl BillFixture {
    pub fn paid(company_id: Uuid, store: &store::Model, number: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            store: store.clone(),
            company_id,
            number: number.to_string(),
            status: BillStatus::Paid,
            created_at,
            member_id: None,
            cashier_id: None,
            discount: Decimal::ZERO,
            tax: Decimal::ZERO,
            items: Vec::new(),
            payments: Vec::new(),
            promotions: Vec::new(),
        }
    }

    pub fn status(mut self, status: BillStatus) -> Self {
        self.status = status;
        self
    }

    pub fn member(mut self, member_id: Uuid) -> Self {
        self.member_id = Some(member_id);
        self
    }

    pub fn cashier(mut self, cashier_id: Uuid) -> Self {
        self.cashier_id = Some(cashier_id);
        self
    }

    pub fn tax(mut self, tax: Decimal) -> Self {
        self.tax = tax;
        self
    }

    pub fn item(mut self, product_id: Uuid, sku: &'static str, quantity: i32, price: Decimal, cost: Decimal) -> Self {
        self.items.push((product_id, sku, quantity, price, cost));
        self
    }

    pub fn payment(mut self, method: &'static str, amount: Decimal, status: PaymentStatus) -> Self {
        self.payments.push((method, amount, status));
        self
    }

    pub fn promotion(mut self, promotion_id: Uuid, name: &'static str, discount: Decimal, cashback: Decimal) -> Self {
        self.discount += discount;
        self.promotions.push((promotion_id, name, discount, cashback));
        self
    }

    /// Inserts the bill; totals are derived from the items.
    pub async fn insert(self, app: &TestApp) -> bill::Model {
        let db = app.db();
        let subtotal: Decimal = self
            .items
            .iter()
            .map(|(_, _, qty, price, _)| *price * Decimal::from(*qty))
            .sum();
        let bill = bill::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(self.company_id),
            brand_id: Set(self.store.brand_id),
            store_id: Set(self.store.id),
            terminal_code: Set(Some("POS-1".to_string())),
            bill_number: Set(self.number.clone()),
            status: Set(self.status),
            member_id: Set(self.member_id),
            member_code: Set(None),
            subtotal: Set(subtotal),
            tax_amount: Set(self.tax),
            service_charge: Set(Decimal::ZERO),
            discount_amount: Set(self.discount),
            total: Set(subtotal + self.tax - self.discount),
            created_by: Set(self.cashier_id),
            created_at: Set(self.created_at),
            synced_at: Set(Some(self.created_at)),
        }
        .insert(db)
        .await
        .expect("seed bill");

        for (product_id, sku, quantity, price, cost) in self.items {
            bill_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                bill_id: Set(bill.id),
                product_id: Set(product_id),
                product_sku: Set(sku.to_string()),
                product_name: Set(format!("Product {}", sku)),
                category_id: Set(None),
                quantity: Set(quantity),
                unit_price: Set(price),
                unit_cost: Set(cost),
                discount_amount: Set(Decimal::ZERO),
                total: Set(price * Decimal::from(quantity)),
                is_void: Set(false),
                created_at: Set(self.created_at),
            }
            .insert(db)
            .await
            .expect("seed bill item");
        }

        for (method, amount, status) in self.payments {
            payment::ActiveModel {
                id: Set(Uuid::new_v4()),
                bill_id: Set(bill.id),
                payment_method: Set(method.to_string()),
                amount: Set(amount),
                status: Set(status),
                created_at: Set(self.created_at),
            }
            .insert(db)
            .await
            .expect("seed payment");
        }

        for (promotion_id, name, discount, cashback) in self.promotions {
            bill_promotion::ActiveModel {
                id: Set(Uuid::new_v4()),
                bill_id: Set(bill.id),
                promotion_id: Set(promotion_id),
                promotion_name: Set(name.to_string()),
                promotion_code: Set(None),
                discount_amount: Set(discount),
                cashback_amount: Set(cashback),
                applied_at: Set(self.created_at),
            }
            .insert(db)
            .await
            .expect("seed bill promotion");
        }

        bill
    }
}

/// Decimal fields serialize as strings; compare them numerically.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}
