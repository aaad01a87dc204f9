use huddle_core::domain::slack::{Provider, SLACK_SERVICE};
use huddle_core::domain::team::TeamId;
use huddle_db::{connect_with_settings, DbPool, ProviderRepository, SqlProviderRepository};
use secrecy::SecretString;
use serde_json::json;

use crate::commands::{load_config, runtime, CommandFailure, CommandResult};

const COMMAND: &str = "connect-slack";

/// Stores a team's Slack access token so `addSlackChannel` can validate
/// channels for it. An existing active Slack provider keeps its id and gets the
/// new token.
pub fn run(team_id: &str, access_token: &str) -> CommandResult {
    let team_id = team_id.trim();
    let access_token = access_token.trim();
    if team_id.is_empty() || access_token.is_empty() {
        return CommandResult::failure(
            COMMAND,
            CommandFailure::new("invalid_arguments", "team id and access token are required", 2),
        );
    }

    let outcome = load_config().and_then(|config| {
        runtime()?.block_on(async {
            let pool = connect_with_settings(
                &config.database.url,
                config.database.max_connections,
                config.database.timeout_secs,
            )
            .await
            .map_err(|error| CommandFailure::new("db_connectivity", error.to_string(), 4))?;
            huddle_db::migrations::run_pending(&pool)
                .await
                .map_err(|error| CommandFailure::new("migration", error.to_string(), 5))?;

            let result = store_token(&pool, TeamId(team_id.to_string()), access_token).await;
            pool.close().await;
            result
        })
    });

    match outcome {
        Ok((provider_id, replaced)) => CommandResult::success_with_details(
            COMMAND,
            if replaced { "slack token replaced" } else { "slack provider connected" },
            Some(json!({ "team_id": team_id, "provider_id": provider_id })),
        ),
        Err(failure) => CommandResult::failure(COMMAND, failure),
    }
}

pub(crate) async fn store_token(
    pool: &DbPool,
    team_id: TeamId,
    access_token: &str,
) -> Result<(String, bool), CommandFailure> {
    let providers = SqlProviderRepository::new(pool.clone());
    let persistence = |error: huddle_db::RepositoryError| {
        CommandFailure::new("persistence", error.to_string(), 6)
    };

    let token = SecretString::from(access_token.to_string());
    let (provider, replaced) = match providers.find_active(&team_id, SLACK_SERVICE).await.map_err(persistence)? {
        Some(mut existing) => {
            existing.access_token = Some(token);
            (existing, true)
        }
        None => (Provider::new(team_id, SLACK_SERVICE, token), false),
    };

    let provider_id = provider.id.clone();
    providers.save(provider).await.map_err(persistence)?;
    Ok((provider_id, replaced))
}
