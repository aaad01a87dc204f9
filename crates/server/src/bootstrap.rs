use std::sync::Arc;

use axum::Router;
use huddle_core::billing::{DispatchTable, WebhookVerifier};
use huddle_core::config::{AppConfig, ConfigError, LoadOptions};
use huddle_db::{
    connect_with_settings, migrations, DbPool, SqlBillingEventRepository, SqlProviderRepository,
    SqlSlackChannelRepository,
};
use huddle_slack::{HttpSlackClient, SlackApiError};
use thiserror::Error;
use tracing::info;

use crate::auth::TokenDecoder;
use crate::channels::ChannelLinkService;
use crate::dispatcher::{SchemaExecutor, StripeWebhookDispatcher};
use crate::error_report::TracingErrorReporter;
use crate::graphql::{self, build_schema, AppServices, GraphQlState, HuddleSchema};
use crate::pubsub::PubSub;
use crate::webhook;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub schema: HuddleSchema,
    pub dispatcher: Arc<StripeWebhookDispatcher>,
    pub tokens: TokenDecoder,
}

impl Application {
    /// Public routes: the Stripe webhook and the GraphQL endpoint.
    pub fn router(&self) -> Router {
        webhook::router(self.dispatcher.clone()).merge(graphql::router(GraphQlState {
            schema: self.schema.clone(),
            tokens: self.tokens.clone(),
        }))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("slack client could not be created: {0}")]
    SlackClient(#[source] SlackApiError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
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

    let slack = HttpSlackClient::new(&config.slack.api_base_url, config.slack.timeout_secs)
        .map_err(BootstrapError::SlackClient)?;

    let services = AppServices {
        channels: ChannelLinkService::new(
            Arc::new(SqlProviderRepository::new(db_pool.clone())),
            Arc::new(SqlSlackChannelRepository::new(db_pool.clone())),
            Arc::new(slack),
            PubSub::default(),
        ),
        billing_events: Arc::new(SqlBillingEventRepository::new(db_pool.clone())),
        server_secret: config.auth.server_secret.clone(),
    };
    let schema = build_schema(services);

    let dispatcher = StripeWebhookDispatcher::new(
        WebhookVerifier::new(
            config.stripe.webhook_secret.clone(),
            config.stripe.signature_tolerance_secs,
        ),
        DispatchTable::stripe(),
        Arc::new(SchemaExecutor::new(schema.clone(), config.auth.server_secret.clone())),
        Arc::new(TracingErrorReporter),
    );
    let tokens = TokenDecoder::new(&config.auth.jwt_secret);

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        slack_api_base_url = %config.slack.api_base_url,
        "application services wired"
    );

    Ok(Application { config, db_pool, schema, dispatcher: Arc::new(dispatcher), tokens })
}
