#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use coupon_engine::{
    config::AppConfig,
    entities::coupon::{
        self, AppliesTo, CombinationPolicy, CouponKind, CouponStatus, DomainScope, NewCoupon,
    },
    events::{Event, EventSender},
    repositories::InMemoryCouponRepository,
    CouponEngine,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Harness wiring the engine over an in-memory repository.
pub struct TestApp {
    pub store_id: Uuid,
    pub repository: Arc<InMemoryCouponRepository>,
    pub engine: CouponEngine,
    /// Held so event sends keep succeeding during the test.
    pub events: mpsc::Receiver<Event>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let repository = Arc::new(InMemoryCouponRepository::new());
        let (event_sender, events) = EventSender::channel(64);
        let engine = CouponEngine::new(repository.clone(), Arc::new(config), event_sender);

        Self {
            store_id: Uuid::new_v4(),
            repository,
            engine,
            events,
        }
    }

    /// Seeds a coupon into the store and returns the stored model.
    pub fn seed(&self, builder: CouponBuilder) -> coupon::Model {
        let model = builder.store(self.store_id).build();
        self.repository.insert(model.clone());
        model
    }
}

/// Fluent builder over `NewCoupon` for test fixtures.
pub struct CouponBuilder {
    payload: NewCoupon,
    times_used_total: i32,
}

impl CouponBuilder {
    fn new(code: &str, kind: CouponKind, percent: Option<i32>, value_cents: Option<i64>) -> Self {
        Self {
            payload: NewCoupon {
                store_id: Uuid::new_v4(),
                code: code.to_string(),
                description: None,
                currency: "EUR".to_string(),
                kind,
                percent_discount: percent,
                value_cents,
                starts_at: None,
                ends_at: None,
                min_subtotal_cents: None,
                applies_to: AppliesTo::All,
                applies_to_ids: None,
                domain_scope: DomainScope::All,
                domain_ids: None,
                customer_emails: None,
                usage_limit_total: None,
                usage_limit_per_customer: None,
                combinable: CombinationPolicy::StackAll,
                status: CouponStatus::Active,
                auto_apply: false,
            },
            times_used_total: 0,
        }
    }

    pub fn percent(code: &str, percent: i32) -> Self {
        Self::new(code, CouponKind::Percent, Some(percent), None)
    }

    pub fn fixed(code: &str, value_cents: i64) -> Self {
        Self::new(code, CouponKind::Fixed, None, Some(value_cents))
    }

    pub fn free_shipping(code: &str) -> Self {
        Self::new(code, CouponKind::FreeShipping, None, None)
    }

    pub fn store(mut self, store_id: Uuid) -> Self {
        self.payload.store_id = store_id;
        self
    }

    pub fn min_subtotal(mut self, cents: i64) -> Self {
        self.payload.min_subtotal_cents = Some(cents);
        self
    }

    pub fn auto_apply(mut self) -> Self {
        self.payload.auto_apply = true;
        self
    }

    pub fn status(mut self, status: CouponStatus) -> Self {
        self.payload.status = status;
        self
    }

    pub fn window(
        mut self,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.payload.starts_at = starts_at;
        self.payload.ends_at = ends_at;
        self
    }

    pub fn usage_limit(mut self, limit: i32) -> Self {
        self.payload.usage_limit_total = Some(limit);
        self
    }

    pub fn times_used(mut self, times: i32) -> Self {
        self.times_used_total = times;
        self
    }

    pub fn combinable(mut self, policy: CombinationPolicy) -> Self {
        self.payload.combinable = policy;
        self
    }

    pub fn build(self) -> coupon::Model {
        let mut model = self
            .payload
            .into_model(Utc::now())
            .expect("test coupon payload should be valid");
        model.times_used_total = self.times_used_total;
        model
    }
}

/// Cart snapshot with the given subtotal and no items.
pub fn cart(subtotal_cents: i64) -> coupon_engine::dto::CartDto {
    coupon_engine::dto::CartDto {
        currency: "EUR".to_string(),
        subtotal_cents,
        customer_email: None,
        items: vec![],
    }
}

pub fn codes(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|code| code.to_string()).collect()
}
