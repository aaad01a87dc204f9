use huddle_db::{connect_with_settings, migrations, migrations::PendingMigration};
use serde_json::{json, Value};

use crate::commands::{load_config, runtime, CommandFailure, CommandResult};

const COMMAND: &str = "migrate";

/// Applies pending migrations, or with `status_only` just lists them.
pub fn run(status_only: bool) -> CommandResult {
    match execute(status_only) {
        Ok((message, pending)) => {
            CommandResult::success_with_details(COMMAND, message, Some(describe(&pending)))
        }
        Err(failure) => CommandResult::failure(COMMAND, failure),
    }
}

fn execute(status_only: bool) -> Result<(String, Vec<PendingMigration>), CommandFailure> {
    let config = load_config()?;

    runtime()?.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| CommandFailure::new("db_connectivity", error.to_string(), 4))?;

        let pending = migrations::pending(&pool)
            .await
            .map_err(|error| CommandFailure::new("migration_status", error.to_string(), 5))?;

        let message = if status_only {
            format!("{} pending migration(s)", pending.len())
        } else if pending.is_empty() {
            "schema already up to date".to_string()
        } else {
            migrations::run_pending(&pool)
                .await
                .map_err(|error| CommandFailure::new("migration", error.to_string(), 5))?;
            format!("applied {} migration(s)", pending.len())
        };

        pool.close().await;
        Ok::<_, CommandFailure>((message, pending))
    })
}

fn describe(pending: &[PendingMigration]) -> Value {
    let migrations: Vec<Value> = pending
        .iter()
        .map(|migration| json!({ "version": migration.version, "description": migration.description }))
        .collect();
    json!({ "migrations": migrations })
}
