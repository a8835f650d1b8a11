//! Coupon Engine Library
//!
//! Rule evaluation for promotional codes: which codes apply to a cart, what
//! they are worth, final cart totals, and concurrency-safe usage tracking
//! once an order is confirmed. Storage sits behind the `CouponRepository`
//! trait; transport, auth, and catalogs are the embedder's business.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod events;
pub mod export;
pub mod repositories;
pub mod services;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::repositories::CouponRepository;
use crate::services::{CouponLifecycle, UsageFinalizer, ValidationEngine};

/// The wired-up engine: validation, usage finalization, and lifecycle over
/// one repository.
#[derive(Clone)]
pub struct CouponEngine {
    pub validation: ValidationEngine,
    pub finalizer: UsageFinalizer,
    pub lifecycle: CouponLifecycle,
}

impl CouponEngine {
    pub fn new(
        repository: Arc<dyn CouponRepository>,
        config: Arc<AppConfig>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            validation: ValidationEngine::new(repository.clone(), config),
            finalizer: UsageFinalizer::new(repository.clone(), event_sender.clone()),
            lifecycle: CouponLifecycle::new(repository, event_sender),
        }
    }
}

/// Installs a global tracing subscriber honoring `RUST_LOG`, falling back to
/// the given level.
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    fmt().with_env_filter(filter).init();
}
