use std::env;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use helpdesk_cli::commands::{ask, config, migrate, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("HELPDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["details"]["applied_versions"][0], 1);
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("HELPDESK_DATABASE_URL", "postgres://localhost/helpdesk")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_reports_loaded_catalogue() {
    with_env(&[("HELPDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.contains("SH123, SH124, SH125"), "message: {message}");
        assert!(message.contains("PROD001"), "message: {message}");
    });
}

#[test]
fn seed_is_idempotent_and_feeds_ask() {
    let database = TempDatabase::new("seed-then-ask");
    let url = database.url();

    with_env(&[("HELPDESK_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        assert_eq!(
            parse_payload(&first.output)["message"],
            parse_payload(&second.output)["message"]
        );

        let result = ask::run("Where is SH124?", "u1", None);
        assert_eq!(result.exit_code, 0, "expected ask success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert!(payload["message"].as_str().unwrap_or("").contains("Processing"));
        assert_eq!(payload["details"]["structured_payload"]["id"], "SH124");
        assert_eq!(payload["details"]["handoff"], false);
    });
}

#[test]
fn ask_flags_handoff_requests() {
    with_env(&[("HELPDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = ask::run("Please connect me to a human", "u1", None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["details"]["handoff"], true);
        assert_eq!(payload["details"]["question"], "Please connect me to a human");
    });
}

#[test]
fn ask_rejects_blank_question() {
    with_env(&[("HELPDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = ask::run("   ", "u1", None);
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
    });
}

#[test]
fn config_redacts_secrets_and_attributes_sources() {
    with_env(
        &[
            ("HELPDESK_DATABASE_URL", "sqlite::memory:"),
            ("HELPDESK_LLM_PROVIDER", "openai"),
            ("HELPDESK_LLM_API_KEY", "sk-very-secret-value"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);
            assert!(!result.output.contains("very-secret"), "secret leaked: {}", result.output);

            let payload = parse_payload(&result.output);
            let fields = payload["details"]["fields"].as_array().cloned().unwrap_or_default();
            let api_key = fields
                .iter()
                .find(|field| field["key"] == "llm.api_key")
                .expect("llm.api_key field");
            assert_eq!(api_key["value"], "sk-***");
            assert_eq!(api_key["source"], "env (HELPDESK_LLM_API_KEY)");

            let deadline = fields
                .iter()
                .find(|field| field["key"] == "pipeline.deadline_secs")
                .expect("deadline field");
            assert_eq!(deadline["value"], "8");
            assert_eq!(deadline["source"], "default");
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    fn new(label: &str) -> Self {
        let path = env::temp_dir().join(format!("helpdesk-cli-{label}-{}.db", std::process::id()));
        let database = Self { path };
        database.remove_files();
        database
    }

    fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }

    fn remove_files(&self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        self.remove_files();
    }
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "HELPDESK_DATABASE_URL",
        "HELPDESK_DATABASE_MAX_CONNECTIONS",
        "HELPDESK_DATABASE_TIMEOUT_SECS",
        "HELPDESK_LLM_PROVIDER",
        "HELPDESK_LLM_API_KEY",
        "HELPDESK_LLM_BASE_URL",
        "HELPDESK_LLM_MODEL",
        "HELPDESK_LLM_TIMEOUT_SECS",
        "OPENAI_API_KEY",
        "HELPDESK_PIPELINE_DEADLINE_SECS",
        "HELPDESK_PIPELINE_DEFAULT_LANGUAGE",
        "HELPDESK_PIPELINE_AUTO_DETECT_LANGUAGE",
        "HELPDESK_TRANSLATION_ENABLED",
        "HELPDESK_TRANSLATION_ENDPOINT",
        "HELPDESK_TRANSLATION_API_KEY",
        "HELPDESK_TRANSLATION_TIMEOUT_SECS",
        "HELPDESK_SERVER_BIND_ADDRESS",
        "HELPDESK_SERVER_PORT",
        "HELPDESK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "HELPDESK_LOGGING_LEVEL",
        "HELPDESK_LOGGING_FORMAT",
        "HELPDESK_LOG_LEVEL",
        "HELPDESK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
