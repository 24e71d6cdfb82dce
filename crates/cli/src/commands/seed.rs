use crate::commands::{load_config, runtime, CommandResult};
use helpdesk_db::{connect_with_config, migrations, SupportSeedDataset};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
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

        let seed_result = SupportSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = SupportSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<SeedOutput, (&'static str, String, u8)> =
            if verification.all_present {
                Ok(SeedOutput {
                    orders: seed_result.orders_seeded,
                    products: seed_result.products_seeded,
                })
            } else {
                Err(("seed_verification", verification_failure_message(&verification.checks), 6u8))
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => {
            let message = format!(
                "support dataset loaded: orders {}; products {}",
                output.orders.join(", "),
                output.products.join(", ")
            );
            CommandResult::success_with(
                "seed",
                message,
                Some(serde_json::json!({ "orders": output.orders, "products": output.products })),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

struct SeedOutput {
    orders: Vec<&'static str>,
    products: Vec<&'static str>,
}

fn verification_failure_message(checks: &[(&str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_failure_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [("SH123", true), ("PROD002", false), ("Do you ship internationally?", false)];

        assert_eq!(
            verification_failure_message(&checks),
            "Seed verification failed for checks: PROD002, Do you ship internationally?"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [("SH123", true), ("PROD001", true)];

        assert_eq!(verification_failure_message(&checks), "Some seed data failed to load");
    }
}
