use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use huddle_db::{migrations, DbPool};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: Readiness,
    pub detail: String,
}

impl HealthCheck {
    fn ready(detail: impl Into<String>) -> Self {
        Self { status: Readiness::Ready, detail: detail.into() }
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self { status: Readiness::Degraded, detail: detail.into() }
    }
}

/// Row counts of the tables the webhook and channel-link paths write to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IntegrationTotals {
    pub active_slack_channels: i64,
    pub billing_events: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: Readiness,
    pub database: HealthCheck,
    pub schema: HealthCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<IntegrationTotals>,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

/// Serves `/health` on its own port so readiness checks keep answering when the
/// public listener is saturated.
pub async fn spawn(bind_address: &str, port: u16, db_pool: DbPool) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(db_pool)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

/// Ready only when the database answers and every embedded migration has been
/// applied; totals are reported once the schema is current.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&state.db_pool).await
    {
        Ok(_) => HealthCheck::ready("database query succeeded"),
        Err(error) => HealthCheck::degraded(format!("database query failed: {error}")),
    };

    let schema = if database.status == Readiness::Ready {
        schema_check(&state.db_pool).await
    } else {
        HealthCheck::degraded("skipped because the database is unreachable")
    };

    let totals = if schema.status == Readiness::Ready {
        integration_totals(&state.db_pool).await
    } else {
        None
    };

    let status = if schema.status == Readiness::Ready { Readiness::Ready } else { Readiness::Degraded };
    if status == Readiness::Degraded {
        warn!(
            event_name = "system.health.degraded",
            correlation_id = "health",
            database = %database.detail,
            schema = %schema.detail,
            "health check reported degraded state"
        );
    }

    let status_code =
        if status == Readiness::Ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let payload =
        HealthResponse { status, database, schema, totals, checked_at: Utc::now().to_rfc3339() };
    (status_code, Json(payload))
}

async fn schema_check(pool: &DbPool) -> HealthCheck {
    match migrations::pending(pool).await {
        Ok(pending) if pending.is_empty() => HealthCheck::ready("all migrations applied"),
        Ok(pending) => {
            let listed: Vec<String> = pending
                .iter()
                .map(|migration| format!("{:04} {}", migration.version, migration.description))
                .collect();
            HealthCheck::degraded(format!("pending migrations: {}", listed.join(", ")))
        }
        Err(error) => HealthCheck::degraded(format!("migration state unreadable: {error}")),
    }
}

async fn integration_totals(pool: &DbPool) -> Option<IntegrationTotals> {
    let active_slack_channels =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM slack_channel WHERE is_active = 1")
            .fetch_one(pool)
            .await
            .ok()?;
    let billing_events = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM billing_event")
        .fetch_one(pool)
        .await
        .ok()?;
    Some(IntegrationTotals { active_slack_channels, billing_events })
}
