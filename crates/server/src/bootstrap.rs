use std::sync::Arc;

use helpdesk_agent::{build_resolver, Resolver, WiringError};
use helpdesk_core::analytics::AnalyticsSink;
use helpdesk_core::audit::{AuditSink, FanoutAuditSink};
use helpdesk_core::config::{AppConfig, ConfigError};
use helpdesk_core::services::TicketingService;
use helpdesk_db::{connect_with_config, migrations, DbPool, SqlLookupService, SqlTicketingService};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub resolver: Arc<dyn Resolver>,
    pub ticketing: Arc<dyn TicketingService>,
    pub analytics: AnalyticsSink,
    pub audit_sink: Arc<dyn AuditSink>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("pipeline wiring failed: {0}")]
    Wiring(#[from] WiringError),
}

#[cfg(test)]
pub async fn bootstrap(
    options: helpdesk_core::config::LoadOptions,
) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let analytics = AnalyticsSink::default();
    let audit_sink: Arc<dyn AuditSink> =
        Arc::new(FanoutAuditSink::new(vec![Arc::new(analytics.clone())]));
    let resolver = build_resolver(
        &config,
        Arc::new(SqlLookupService::new(db_pool.clone())),
        Arc::clone(&audit_sink),
    )?;

    Ok(Application {
        config,
        ticketing: Arc::new(SqlTicketingService::new(db_pool.clone())),
        db_pool,
        resolver,
        analytics,
        audit_sink,
    })
}
