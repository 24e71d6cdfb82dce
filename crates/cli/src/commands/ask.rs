use std::sync::Arc;

use crate::commands::{load_config, runtime, CommandResult};
use helpdesk_agent::build_resolver;
use helpdesk_core::audit::NoopAuditSink;
use helpdesk_db::{connect_with_config, migrations, SqlLookupService};

/// One-shot resolution against the configured database.
pub fn run(question: &str, user_id: &str, target_lang: Option<&str>) -> CommandResult {
    if question.trim().is_empty() {
        return CommandResult::failure("ask", "invalid_input", "question must not be empty", 2);
    }

    let config = match load_config("ask") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("ask") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let resolver = build_resolver(
            &config,
            Arc::new(SqlLookupService::new(pool.clone())),
            Arc::new(NoopAuditSink),
        )
        .map_err(|error| ("pipeline_wiring", error.to_string(), 6u8))?;

        let envelope = resolver.resolve(question, user_id, target_lang).await;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(envelope)
    });

    match result {
        Ok(envelope) => {
            let details = serde_json::to_value(&envelope).ok();
            CommandResult::success_with("ask", envelope.answer, details)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}
