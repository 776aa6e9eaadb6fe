use crate::{
    common::start_of_local_day,
    db::DbPool,
    errors::ServiceError,
    models::{
        company, member,
        member_transaction::{self, TransactionType},
    },
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Days counted per month of point validity.
pub const DAYS_PER_EXPIRY_MONTH: i64 = 30;

/// Outcome of one point expiry pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirySummary {
    pub as_of: Option<NaiveDate>,
    pub dry_run: bool,
    pub companies_processed: u64,
    pub members_affected: u64,
    pub transactions_expired: u64,
    pub points_expired: i64,
}

/// Last business date whose earned points expire on `as_of`.
pub fn expiry_cutoff(as_of: NaiveDate, months: i32) -> NaiveDate {
    as_of - Duration::days(i64::from(months) * DAYS_PER_EXPIRY_MONTH)
}

/// What settling one member wrote, or would write on a dry run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberExpiry {
    pub transactions: u64,
    pub points: i32,
}

/// Loyalty ledger maintenance.
#[derive(Clone)]
pub struct MemberPointsService {
    db_pool: Arc<DbPool>,
    offset: FixedOffset,
}

impl MemberPointsService {
    pub fn new(db_pool: Arc<DbPool>, offset: FixedOffset) -> Self {
        Self { db_pool, offset }
    }

    /// Expires earned points older than each company's validity window.
    ///
    /// An `earn` transaction whose business date is on or before the cutoff is
    /// flagged expired and the member is debited by an `expired` transaction,
    /// never below zero. Only active members holding points are considered.
    /// Each member is settled in its own database transaction, so a second
    /// or overlapping run on the same day changes nothing.
    #[instrument(skip(self))]
    pub async fn expire_points(
        &self,
        as_of: NaiveDate,
        dry_run: bool,
    ) -> Result<ExpirySummary, ServiceError> {
        let db = &*self.db_pool;
        let mut summary = ExpirySummary {
            as_of: Some(as_of),
            dry_run,
            ..Default::default()
        };

        let companies = company::Entity::find()
            .filter(company::Column::IsActive.eq(true))
            .filter(company::Column::PointExpiryMonths.gt(0))
            .all(db)
            .await?;

        for company in companies {
            let cutoff = expiry_cutoff(as_of, company.point_expiry_months);
            debug!(company_id = %company.id, %cutoff, "expiring member points");

            let member_ids: BTreeSet<Uuid> = expirable_earns(self.threshold(cutoff))
                .join(
                    JoinType::InnerJoin,
                    member_transaction::Relation::Member.def(),
                )
                .filter(member::Column::CompanyId.eq(company.id))
                .filter(member::Column::IsActive.eq(true))
                .filter(member::Column::Points.gt(0))
                .all(db)
                .await?
                .into_iter()
                .map(|t| t.member_id)
                .collect();

            for member_id in member_ids {
                let expired = self.expire_member(member_id, cutoff, dry_run).await?;
                if expired.transactions == 0 {
                    continue;
                }
                summary.members_affected += 1;
                summary.transactions_expired += expired.transactions;
                summary.points_expired += i64::from(expired.points);
            }
            summary.companies_processed += 1;
        }

        if !dry_run {
            counter!("fnb_jobs.points_expired", summary.points_expired.max(0) as u64);
        }
        info!(
            members = summary.members_affected,
            transactions = summary.transactions_expired,
            points = summary.points_expired,
            dry_run,
            "member point expiry finished"
        );
        Ok(summary)
    }

    /// Settles one member against `cutoff`.
    ///
    /// The member row is locked on Postgres and the eligible earns are read
    /// inside the same transaction, so the debit only covers earns this call
    /// flags. Returns an empty [`MemberExpiry`] when nothing is left to expire.
    #[instrument(skip(self))]
    pub async fn expire_member(
        &self,
        member_id: Uuid,
        cutoff: NaiveDate,
        dry_run: bool,
    ) -> Result<MemberExpiry, ServiceError> {
        let txn = self.db_pool.begin().await?;

        let mut query = member::Entity::find_by_id(member_id);
        if txn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        let member = query
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Member {} not found", member_id)))?;
        if !member.is_active || member.points <= 0 {
            txn.rollback().await?;
            return Ok(MemberExpiry::default());
        }

        let earned = expirable_earns(self.threshold(cutoff))
            .filter(member_transaction::Column::MemberId.eq(member_id))
            .all(&txn)
            .await?;
        if earned.is_empty() {
            txn.rollback().await?;
            return Ok(MemberExpiry::default());
        }

        let total: i32 = earned.iter().map(|t| t.points_change).sum();
        let debit = total.min(member.points).max(0);
        let transactions = earned.len() as u64;
        if dry_run {
            txn.rollback().await?;
            return Ok(MemberExpiry {
                transactions,
                points: debit,
            });
        }

        let now = Utc::now();
        let ids: Vec<Uuid> = earned.iter().map(|t| t.id).collect();
        let flagged = member_transaction::Entity::update_many()
            .col_expr(member_transaction::Column::IsExpired, Expr::value(true))
            .col_expr(member_transaction::Column::ExpiredAt, Expr::value(now))
            .filter(member_transaction::Column::Id.is_in(ids))
            .filter(member_transaction::Column::IsExpired.eq(false))
            .exec(&txn)
            .await?
            .rows_affected;
        if flagged != transactions {
            warn!(
                %member_id,
                flagged,
                expected = transactions,
                "earns changed during expiry, skipping member"
            );
            txn.rollback().await?;
            return Ok(MemberExpiry::default());
        }

        if debit > 0 {
            let points_before = member.points;
            member_transaction::ActiveModel {
                id: Set(Uuid::new_v4()),
                member_id: Set(member_id),
                bill_id: Set(None),
                transaction_type: Set(TransactionType::Expired),
                points_change: Set(-debit),
                points_before: Set(points_before),
                points_after: Set(points_before - debit),
                is_expired: Set(false),
                expired_at: Set(None),
                reference: Set(Some(format!("EXP-{}", cutoff.format("%Y%m%d")))),
                notes: Set(Some(format!("Points earned on or before {} expired", cutoff))),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;

            let mut active: member::ActiveModel = member.into();
            active.points = Set(points_before - debit);
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }

        txn.commit().await?;
        debug!(%member_id, debit, "member points expired");
        Ok(MemberExpiry {
            transactions,
            points: debit,
        })
    }

    /// First instant after the cutoff business date.
    fn threshold(&self, cutoff: NaiveDate) -> DateTime<Utc> {
        start_of_local_day(cutoff + Duration::days(1), self.offset)
    }
}

/// Unflagged positive earns created before `threshold`, oldest first.
fn expirable_earns(threshold: DateTime<Utc>) -> Select<member_transaction::Entity> {
    member_transaction::Entity::find()
        .filter(member_transaction::Column::TransactionType.eq(TransactionType::Earn))
        .filter(member_transaction::Column::IsExpired.eq(false))
        .filter(member_transaction::Column::PointsChange.gt(0))
        .filter(member_transaction::Column::CreatedAt.lt(threshold))
        .order_by_asc(member_transaction::Column::CreatedAt)
}
