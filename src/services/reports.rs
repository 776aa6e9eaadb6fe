//! Sales analytics over paid bills.
//!
//! Every report reads the same slice of data: bills with status `PAID`
//! created within the requested business days, narrowed by brand and store.
//! Each [`ReportKind`] maps to exactly one query in [`ReportService::run`].

use crate::{
    common::{business_date, DateRange},
    db::DbPool,
    errors::ServiceError,
    models::{
        bill::{self, BillStatus},
        bill_item, bill_promotion,
        payment::{self, PaymentStatus},
    },
};
use chrono::{FixedOffset, NaiveDate};
use metrics::histogram;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    DailySales,
    ProductSales,
    PromotionPerformance,
    MemberAnalytics,
    InventoryCogs,
    CashierPerformance,
    PaymentMethods,
}

impl ReportKind {
    /// URL segment and snapshot key of the report.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::DailySales => "daily-sales",
            Self::ProductSales => "product-sales",
            Self::PromotionPerformance => "promotion-performance",
            Self::MemberAnalytics => "member-analytics",
            Self::InventoryCogs => "inventory-cogs",
            Self::CashierPerformance => "cashier-performance",
            Self::PaymentMethods => "payment-methods",
        }
    }

    pub fn all() -> Vec<ReportKind> {
        Self::iter().collect()
    }
}

/// Validated report parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilter {
    pub range: DateRange,
    pub brand_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub promotion_id: Option<Uuid>,
    pub member_id: Option<Uuid>,
    pub cashier_id: Option<Uuid>,
    pub payment_method: Option<String>,
}

impl ReportFilter {
    pub fn for_range(range: DateRange) -> Self {
        Self {
            range,
            brand_id: None,
            store_id: None,
            product_id: None,
            category_id: None,
            promotion_id: None,
            member_id: None,
            cashier_id: None,
            payment_method: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Report<R, S> {
    pub report: ReportKind,
    pub period: DateRange,
    pub results: Vec<R>,
    pub summary: S,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailySalesRow {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub bill_count: u64,
    pub gross_sales: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub service_charge: Decimal,
    pub net_sales: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailySalesSummary {
    pub bill_count: u64,
    pub gross_sales: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub service_charge: Decimal,
    pub net_sales: Decimal,
    pub average_bill: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductSalesRow {
    pub product_id: Uuid,
    pub product_sku: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Decimal,
    pub bill_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductSalesSummary {
    pub product_count: u64,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromotionPerformanceRow {
    pub promotion_id: Uuid,
    pub promotion_name: String,
    pub promotion_code: Option<String>,
    pub usage_count: u64,
    pub bill_count: u64,
    pub total_discount: Decimal,
    pub total_cashback: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromotionPerformanceSummary {
    pub promotion_count: u64,
    pub total_usage: u64,
    pub total_discount: Decimal,
    pub total_cashback: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MemberAnalyticsRow {
    pub member_id: Uuid,
    pub member_code: Option<String>,
    pub visit_count: u64,
    pub total_spent: Decimal,
    pub average_spent: Decimal,
    #[schema(value_type = String, format = Date)]
    pub first_visit: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub last_visit: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MemberAnalyticsSummary {
    pub member_count: u64,
    pub total_visits: u64,
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventoryCogsRow {
    pub product_id: Uuid,
    pub product_sku: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Decimal,
    pub cogs: Decimal,
    pub gross_margin: Decimal,
    pub margin_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InventoryCogsSummary {
    pub total_quantity: i64,
    pub total_revenue: Decimal,
    pub total_cogs: Decimal,
    pub gross_margin: Decimal,
    pub margin_percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CashierPerformanceRow {
    pub cashier_id: Uuid,
    pub bill_count: u64,
    pub total_sales: Decimal,
    pub total_discount: Decimal,
    pub average_bill: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CashierPerformanceSummary {
    pub cashier_count: u64,
    pub total_bills: u64,
    pub total_sales: Decimal,
    pub total_discount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethodRow {
    pub payment_method: String,
    pub transaction_count: u64,
    pub total_amount: Decimal,
    /// Share of the total amount, 0-100
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethodSummary {
    pub total_transactions: u64,
    pub total_amount: Decimal,
}

pub type DailySalesReport = Report<DailySalesRow, DailySalesSummary>;
pub type ProductSalesReport = Report<ProductSalesRow, ProductSalesSummary>;
pub type PromotionPerformanceReport = Report<PromotionPerformanceRow, PromotionPerformanceSummary>;
pub type MemberAnalyticsReport = Report<MemberAnalyticsRow, MemberAnalyticsSummary>;
pub type InventoryCogsReport = Report<InventoryCogsRow, InventoryCogsSummary>;
pub type CashierPerformanceReport = Report<CashierPerformanceRow, CashierPerformanceSummary>;
pub type PaymentMethodReport = Report<PaymentMethodRow, PaymentMethodSummary>;

/// Result of [`ReportService::run`]; serializes as the inner report.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ReportData {
    DailySales(DailySalesReport),
    ProductSales(ProductSalesReport),
    PromotionPerformance(PromotionPerformanceReport),
    MemberAnalytics(MemberAnalyticsReport),
    InventoryCogs(InventoryCogsReport),
    CashierPerformance(CashierPerformanceReport),
    PaymentMethods(PaymentMethodReport),
}

impl ReportData {
    pub fn row_count(&self) -> usize {
        match self {
            Self::DailySales(r) => r.results.len(),
            Self::ProductSales(r) => r.results.len(),
            Self::PromotionPerformance(r) => r.results.len(),
            Self::MemberAnalytics(r) => r.results.len(),
            Self::InventoryCogs(r) => r.results.len(),
            Self::CashierPerformance(r) => r.results.len(),
            Self::PaymentMethods(r) => r.results.len(),
        }
    }
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        (numerator / denominator).round_dp(2)
    }
}

fn percent(part: Decimal, whole: Decimal) -> Decimal {
    ratio(part * Decimal::ONE_HUNDRED, whole)
}

#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
    offset: FixedOffset,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>, offset: FixedOffset) -> Self {
        Self { db_pool, offset }
    }

    #[instrument(skip(self, filter), fields(report = %kind, start = %filter.range.start, end = %filter.range.end))]
    pub async fn run(
        &self,
        kind: ReportKind,
        filter: &ReportFilter,
    ) -> Result<ReportData, ServiceError> {
        let started = Instant::now();
        let data = match kind {
            ReportKind::DailySales => ReportData::DailySales(self.daily_sales(filter).await?),
            ReportKind::ProductSales => ReportData::ProductSales(self.product_sales(filter).await?),
            ReportKind::PromotionPerformance => {
                ReportData::PromotionPerformance(self.promotion_performance(filter).await?)
            }
            ReportKind::MemberAnalytics => {
                ReportData::MemberAnalytics(self.member_analytics(filter).await?)
            }
            ReportKind::InventoryCogs => {
                ReportData::InventoryCogs(self.inventory_cogs(filter).await?)
            }
            ReportKind::CashierPerformance => {
                ReportData::CashierPerformance(self.cashier_performance(filter).await?)
            }
            ReportKind::PaymentMethods => {
                ReportData::PaymentMethods(self.payment_methods(filter).await?)
            }
        };

        let elapsed = started.elapsed();
        histogram!("fnb_reports.duration_ms", elapsed.as_secs_f64() * 1000.0, "report" => kind.slug());
        debug!(rows = data.row_count(), ?elapsed, "report generated");
        Ok(data)
    }

    /// Paid bills inside the business-day window, narrowed by brand and store.
    fn paid_bills(&self, filter: &ReportFilter) -> Condition {
        let (from, until) = filter.range.utc_bounds(self.offset);
        let mut condition = Condition::all()
            .add(bill::Column::Status.eq(BillStatus::Paid))
            .add(bill::Column::CreatedAt.gte(from))
            .add(bill::Column::CreatedAt.lt(until));
        if let Some(brand_id) = filter.brand_id {
            condition = condition.add(bill::Column::BrandId.eq(brand_id));
        }
        if let Some(store_id) = filter.store_id {
            condition = condition.add(bill::Column::StoreId.eq(store_id));
        }
        condition
    }

    async fn sold_items(&self, filter: &ReportFilter) -> Result<Vec<bill_item::Model>, ServiceError> {
        let mut query = bill_item::Entity::find()
            .inner_join(bill::Entity)
            .filter(self.paid_bills(filter))
            .filter(bill_item::Column::IsVoid.eq(false));
        if let Some(product_id) = filter.product_id {
            query = query.filter(bill_item::Column::ProductId.eq(product_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(bill_item::Column::CategoryId.eq(category_id));
        }
        Ok(query.all(&*self.db_pool).await?)
    }

    pub async fn daily_sales(&self, filter: &ReportFilter) -> Result<DailySalesReport, ServiceError> {
        let bills = bill::Entity::find()
            .filter(self.paid_bills(filter))
            .order_by_asc(bill::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;

        let mut days: BTreeMap<NaiveDate, DailySalesRow> = BTreeMap::new();
        for b in bills {
            let date = business_date(b.created_at, self.offset);
            let row = days.entry(date).or_insert_with(|| DailySalesRow {
                date,
                bill_count: 0,
                gross_sales: Decimal::ZERO,
                discount: Decimal::ZERO,
                tax: Decimal::ZERO,
                service_charge: Decimal::ZERO,
                net_sales: Decimal::ZERO,
            });
            row.bill_count += 1;
            row.gross_sales += b.subtotal;
            row.discount += b.discount_amount;
            row.tax += b.tax_amount;
            row.service_charge += b.service_charge;
            row.net_sales += b.total;
        }

        let results: Vec<DailySalesRow> = days.into_values().collect();
        let bill_count = results.iter().map(|r| r.bill_count).sum();
        let net_sales: Decimal = results.iter().map(|r| r.net_sales).sum();
        let summary = DailySalesSummary {
            bill_count,
            gross_sales: results.iter().map(|r| r.gross_sales).sum(),
            discount: results.iter().map(|r| r.discount).sum(),
            tax: results.iter().map(|r| r.tax).sum(),
            service_charge: results.iter().map(|r| r.service_charge).sum(),
            net_sales,
            average_bill: ratio(net_sales, Decimal::from(bill_count)),
        };

        Ok(Report {
            report: ReportKind::DailySales,
            period: filter.range,
            results,
            summary,
        })
    }

    pub async fn product_sales(
        &self,
        filter: &ReportFilter,
    ) -> Result<ProductSalesReport, ServiceError> {
        let items = self.sold_items(filter).await?;

        let mut products: BTreeMap<Uuid, (ProductSalesRow, BTreeSet<Uuid>)> = BTreeMap::new();
        for item in items {
            let (row, bills) = products.entry(item.product_id).or_insert_with(|| {
                (
                    ProductSalesRow {
                        product_id: item.product_id,
                        product_sku: item.product_sku.clone(),
                        product_name: item.product_name.clone(),
                        quantity: 0,
                        revenue: Decimal::ZERO,
                        bill_count: 0,
                    },
                    BTreeSet::new(),
                )
            });
            row.quantity += i64::from(item.quantity);
            row.revenue += item.total;
            bills.insert(item.bill_id);
        }

        let mut results: Vec<ProductSalesRow> = products
            .into_values()
            .map(|(mut row, bills)| {
                row.bill_count = bills.len() as u64;
                row
            })
            .collect();
        results.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });

        let summary = ProductSalesSummary {
            product_count: results.len() as u64,
            total_quantity: results.iter().map(|r| r.quantity).sum(),
            total_revenue: results.iter().map(|r| r.revenue).sum(),
        };

        Ok(Report {
            report: ReportKind::ProductSales,
            period: filter.range,
            results,
            summary,
        })
    }

    pub async fn promotion_performance(
        &self,
        filter: &ReportFilter,
    ) -> Result<PromotionPerformanceReport, ServiceError> {
        let mut query = bill_promotion::Entity::find()
            .inner_join(bill::Entity)
            .filter(self.paid_bills(filter));
        if let Some(promotion_id) = filter.promotion_id {
            query = query.filter(bill_promotion::Column::PromotionId.eq(promotion_id));
        }
        let applied = query.all(&*self.db_pool).await?;

        let mut promotions: BTreeMap<Uuid, (PromotionPerformanceRow, BTreeSet<Uuid>)> =
            BTreeMap::new();
        for p in applied {
            let (row, bills) = promotions.entry(p.promotion_id).or_insert_with(|| {
                (
                    PromotionPerformanceRow {
                        promotion_id: p.promotion_id,
                        promotion_name: p.promotion_name.clone(),
                        promotion_code: p.promotion_code.clone(),
                        usage_count: 0,
                        bill_count: 0,
                        total_discount: Decimal::ZERO,
                        total_cashback: Decimal::ZERO,
                    },
                    BTreeSet::new(),
                )
            });
            row.usage_count += 1;
            row.total_discount += p.discount_amount;
            row.total_cashback += p.cashback_amount;
            bills.insert(p.bill_id);
        }

        let mut results: Vec<PromotionPerformanceRow> = promotions
            .into_values()
            .map(|(mut row, bills)| {
                row.bill_count = bills.len() as u64;
                row
            })
            .collect();
        results.sort_by(|a, b| {
            b.total_discount
                .cmp(&a.total_discount)
                .then_with(|| a.promotion_id.cmp(&b.promotion_id))
        });

        let summary = PromotionPerformanceSummary {
            promotion_count: results.len() as u64,
            total_usage: results.iter().map(|r| r.usage_count).sum(),
            total_discount: results.iter().map(|r| r.total_discount).sum(),
            total_cashback: results.iter().map(|r| r.total_cashback).sum(),
        };

        Ok(Report {
            report: ReportKind::PromotionPerformance,
            period: filter.range,
            results,
            summary,
        })
    }

    pub async fn member_analytics(
        &self,
        filter: &ReportFilter,
    ) -> Result<MemberAnalyticsReport, ServiceError> {
        let mut query = bill::Entity::find()
            .filter(self.paid_bills(filter))
            .filter(bill::Column::MemberId.is_not_null());
        if let Some(member_id) = filter.member_id {
            query = query.filter(bill::Column::MemberId.eq(member_id));
        }
        let bills = query
            .order_by_asc(bill::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;

        let mut members: BTreeMap<Uuid, MemberAnalyticsRow> = BTreeMap::new();
        for b in bills {
            let Some(member_id) = b.member_id else {
                continue;
            };
            let date = business_date(b.created_at, self.offset);
            let row = members.entry(member_id).or_insert_with(|| MemberAnalyticsRow {
                member_id,
                member_code: None,
                visit_count: 0,
                total_spent: Decimal::ZERO,
                average_spent: Decimal::ZERO,
                first_visit: date,
                last_visit: date,
            });
            row.visit_count += 1;
            row.total_spent += b.total;
            row.first_visit = row.first_visit.min(date);
            row.last_visit = row.last_visit.max(date);
            if b.member_code.is_some() {
                row.member_code = b.member_code;
            }
        }

        let mut results: Vec<MemberAnalyticsRow> = members
            .into_values()
            .map(|mut row| {
                row.average_spent = ratio(row.total_spent, Decimal::from(row.visit_count));
                row
            })
            .collect();
        results.sort_by(|a, b| {
            b.total_spent
                .cmp(&a.total_spent)
                .then_with(|| a.member_id.cmp(&b.member_id))
        });

        let summary = MemberAnalyticsSummary {
            member_count: results.len() as u64,
            total_visits: results.iter().map(|r| r.visit_count).sum(),
            total_spent: results.iter().map(|r| r.total_spent).sum(),
        };

        Ok(Report {
            report: ReportKind::MemberAnalytics,
            period: filter.range,
            results,
            summary,
        })
    }

    /// Cost of goods sold uses the unit cost captured on each bill line.
    pub async fn inventory_cogs(
        &self,
        filter: &ReportFilter,
    ) -> Result<InventoryCogsReport, ServiceError> {
        let items = self.sold_items(filter).await?;

        let mut products: BTreeMap<Uuid, InventoryCogsRow> = BTreeMap::new();
        for item in items {
            let row = products
                .entry(item.product_id)
                .or_insert_with(|| InventoryCogsRow {
                    product_id: item.product_id,
                    product_sku: item.product_sku.clone(),
                    product_name: item.product_name.clone(),
                    quantity: 0,
                    revenue: Decimal::ZERO,
                    cogs: Decimal::ZERO,
                    gross_margin: Decimal::ZERO,
                    margin_percent: Decimal::ZERO,
                });
            row.quantity += i64::from(item.quantity);
            row.revenue += item.total;
            row.cogs += item.unit_cost * Decimal::from(item.quantity);
        }

        let mut results: Vec<InventoryCogsRow> = products
            .into_values()
            .map(|mut row| {
                row.gross_margin = row.revenue - row.cogs;
                row.margin_percent = percent(row.gross_margin, row.revenue);
                row
            })
            .collect();
        results.sort_by(|a, b| {
            b.revenue
                .cmp(&a.revenue)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });

        let total_revenue: Decimal = results.iter().map(|r| r.revenue).sum();
        let total_cogs: Decimal = results.iter().map(|r| r.cogs).sum();
        let gross_margin: Decimal = results.iter().map(|r| r.gross_margin).sum();
        let summary = InventoryCogsSummary {
            total_quantity: results.iter().map(|r| r.quantity).sum(),
            total_revenue,
            total_cogs,
            gross_margin,
            margin_percent: percent(gross_margin, total_revenue),
        };

        Ok(Report {
            report: ReportKind::InventoryCogs,
            period: filter.range,
            results,
            summary,
        })
    }

    pub async fn cashier_performance(
        &self,
        filter: &ReportFilter,
    ) -> Result<CashierPerformanceReport, ServiceError> {
        let mut query = bill::Entity::find()
            .filter(self.paid_bills(filter))
            .filter(bill::Column::CreatedBy.is_not_null());
        if let Some(cashier_id) = filter.cashier_id {
            query = query.filter(bill::Column::CreatedBy.eq(cashier_id));
        }
        let bills = query.all(&*self.db_pool).await?;

        let mut cashiers: BTreeMap<Uuid, CashierPerformanceRow> = BTreeMap::new();
        for b in bills {
            let Some(cashier_id) = b.created_by else {
                continue;
            };
            let row = cashiers
                .entry(cashier_id)
                .or_insert_with(|| CashierPerformanceRow {
                    cashier_id,
                    bill_count: 0,
                    total_sales: Decimal::ZERO,
                    total_discount: Decimal::ZERO,
                    average_bill: Decimal::ZERO,
                });
            row.bill_count += 1;
            row.total_sales += b.total;
            row.total_discount += b.discount_amount;
        }

        let mut results: Vec<CashierPerformanceRow> = cashiers
            .into_values()
            .map(|mut row| {
                row.average_bill = ratio(row.total_sales, Decimal::from(row.bill_count));
                row
            })
            .collect();
        results.sort_by(|a, b| {
            b.total_sales
                .cmp(&a.total_sales)
                .then_with(|| a.cashier_id.cmp(&b.cashier_id))
        });

        let summary = CashierPerformanceSummary {
            cashier_count: results.len() as u64,
            total_bills: results.iter().map(|r| r.bill_count).sum(),
            total_sales: results.iter().map(|r| r.total_sales).sum(),
            total_discount: results.iter().map(|r| r.total_discount).sum(),
        };

        Ok(Report {
            report: ReportKind::CashierPerformance,
            period: filter.range,
            results,
            summary,
        })
    }

    pub async fn payment_methods(
        &self,
        filter: &ReportFilter,
    ) -> Result<PaymentMethodReport, ServiceError> {
        let mut query = payment::Entity::find()
            .inner_join(bill::Entity)
            .filter(self.paid_bills(filter))
            .filter(payment::Column::Status.eq(PaymentStatus::Success));
        if let Some(method) = filter.payment_method.as_deref() {
            query = query.filter(payment::Column::PaymentMethod.eq(method));
        }
        let payments = query
            .select_only()
            .column(payment::Column::PaymentMethod)
            .column(payment::Column::Amount)
            .into_tuple::<(String, Decimal)>()
            .all(&*self.db_pool)
            .await?;

        let mut methods: BTreeMap<String, (u64, Decimal)> = BTreeMap::new();
        for (method, amount) in payments {
            let entry = methods.entry(method).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += amount;
        }

        let total_amount: Decimal = methods.values().map(|(_, amount)| *amount).sum();
        let mut results: Vec<PaymentMethodRow> = methods
            .into_iter()
            .map(|(payment_method, (transaction_count, amount))| PaymentMethodRow {
                payment_method,
                transaction_count,
                total_amount: amount,
                percentage: percent(amount, total_amount),
            })
            .collect();
        results.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then_with(|| a.payment_method.cmp(&b.payment_method))
        });

        let summary = PaymentMethodSummary {
            total_transactions: results.iter().map(|r| r.transaction_count).sum(),
            total_amount,
        };

        Ok(Report {
            report: ReportKind::PaymentMethods,
            period: filter.range,
            results,
            summary,
        })
    }
}
