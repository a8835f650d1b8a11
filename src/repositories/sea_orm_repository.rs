use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, OnConflict},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::coupon::{self, CouponStatus};
use crate::entities::coupon_redemption;
use crate::entities::{Coupon, CouponRedemption};
use crate::errors::ServiceError;
use crate::repositories::CouponRepository;

/// Repository for coupon operations backed by sea-orm.
#[derive(Debug, Clone)]
pub struct SeaOrmCouponRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmCouponRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a coupon built by `NewCoupon::into_model`.
    pub async fn insert(&self, model: coupon::Model) -> Result<coupon::Model, ServiceError> {
        model
            .into_active_model()
            .insert(&*self.db)
            .await
            .map_err(ServiceError::from)
    }
}

#[async_trait]
impl CouponRepository for SeaOrmCouponRepository {
    async fn find_by_id(&self, coupon_id: Uuid) -> Result<Option<coupon::Model>, ServiceError> {
        Coupon::find_by_id(coupon_id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    async fn find_by_code(
        &self,
        store_id: Uuid,
        code: &str,
    ) -> Result<Option<coupon::Model>, ServiceError> {
        Coupon::find()
            .filter(coupon::Column::StoreId.eq(store_id))
            .filter(
                Expr::expr(Func::lower(Expr::col(coupon::Column::Code)))
                    .eq(code.trim().to_lowercase()),
            )
            .one(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    async fn list_auto_apply(&self, store_id: Uuid) -> Result<Vec<coupon::Model>, ServiceError> {
        Coupon::find()
            .filter(coupon::Column::StoreId.eq(store_id))
            .filter(coupon::Column::Status.eq(CouponStatus::Active))
            .filter(coupon::Column::AutoApply.eq(true))
            .order_by_asc(coupon::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::from)
    }

    async fn increment_usage_if_under_limit(
        &self,
        coupon_id: Uuid,
    ) -> Result<bool, ServiceError> {
        // One conditional UPDATE; the affected-row count is the verdict.
        // Matching on a stale read here would reintroduce the check-then-act
        // race this exists to close.
        let result = Coupon::update_many()
            .col_expr(
                coupon::Column::TimesUsedTotal,
                Expr::col(coupon::Column::TimesUsedTotal).add(1),
            )
            .col_expr(coupon::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(coupon::Column::Id.eq(coupon_id))
            .filter(coupon::Column::Status.eq(CouponStatus::Active))
            .filter(
                Condition::any()
                    .add(coupon::Column::UsageLimitTotal.is_null())
                    .add(
                        Expr::col(coupon::Column::TimesUsedTotal)
                            .lt(Expr::col(coupon::Column::UsageLimitTotal)),
                    ),
            )
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn record_redemption(
        &self,
        coupon_id: Uuid,
        order_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let redemption = coupon_redemption::ActiveModel {
            coupon_id: Set(coupon_id),
            order_id: Set(order_id),
            redeemed_at: Set(Utc::now()),
        };

        let inserted = CouponRedemption::insert(redemption)
            .on_conflict(
                OnConflict::columns([
                    coupon_redemption::Column::CouponId,
                    coupon_redemption::Column::OrderId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        Ok(inserted == 1)
    }

    async fn update_status(
        &self,
        coupon_id: Uuid,
        status: CouponStatus,
    ) -> Result<coupon::Model, ServiceError> {
        let found = Coupon::find_by_id(coupon_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", coupon_id)))?;

        let mut active: coupon::ActiveModel = found.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());

        active.update(&*self.db).await.map_err(ServiceError::from)
    }
}
