//! Clinivet — appointment scheduling and lifecycle core for a
//! single-practitioner veterinary clinic.
//!
//! The crate owns two things: the day slot grid ([`slots`]) and the
//! appointment status machine with its guarded prepaid cancellation
//! ([`lifecycle`]). Persistence is local SQLite ([`db`]); the billing
//! side is reached only through the [`billing::SettlementSink`] boundary.

pub mod billing;
pub mod booking;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod slots;

use tracing_subscriber::EnvFilter;

/// Initialize tracing with RUST_LOG, falling back to the crate default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
