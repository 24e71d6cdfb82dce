use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use helpdesk_core::config::AppConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

struct FieldSpec {
    key: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = field_specs(&config)
        .into_iter()
        .map(|spec| ConfigField {
            key: spec.key,
            source: field_source(
                spec.key,
                spec.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
            value: spec.value,
        })
        .collect::<Vec<_>>();

    CommandResult::success_with(
        "config",
        "effective config (source precedence: env > file > default)",
        serde_json::to_value(&fields).ok().map(|fields| serde_json::json!({ "fields": fields })),
    )
}

fn field_specs(config: &AppConfig) -> Vec<FieldSpec> {
    vec![
        FieldSpec {
            key: "database.url",
            env_keys: &["HELPDESK_DATABASE_URL"],
            value: config.database.url.clone(),
        },
        FieldSpec {
            key: "database.max_connections",
            env_keys: &["HELPDESK_DATABASE_MAX_CONNECTIONS"],
            value: config.database.max_connections.to_string(),
        },
        FieldSpec {
            key: "llm.provider",
            env_keys: &["HELPDESK_LLM_PROVIDER"],
            value: config.llm.provider.as_str().to_string(),
        },
        FieldSpec {
            key: "llm.model",
            env_keys: &["HELPDESK_LLM_MODEL"],
            value: config.llm.model.clone(),
        },
        FieldSpec {
            key: "llm.base_url",
            env_keys: &["HELPDESK_LLM_BASE_URL"],
            value: config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
        },
        FieldSpec {
            key: "llm.api_key",
            env_keys: &["HELPDESK_LLM_API_KEY", "OPENAI_API_KEY"],
            value: redact_secret(config.llm.api_key.as_ref()),
        },
        FieldSpec {
            key: "pipeline.deadline_secs",
            env_keys: &["HELPDESK_PIPELINE_DEADLINE_SECS"],
            value: config.pipeline.deadline_secs.to_string(),
        },
        FieldSpec {
            key: "pipeline.default_language",
            env_keys: &["HELPDESK_PIPELINE_DEFAULT_LANGUAGE"],
            value: config.pipeline.default_language.clone(),
        },
        FieldSpec {
            key: "pipeline.auto_detect_language",
            env_keys: &["HELPDESK_PIPELINE_AUTO_DETECT_LANGUAGE"],
            value: config.pipeline.auto_detect_language.to_string(),
        },
        FieldSpec {
            key: "translation.enabled",
            env_keys: &["HELPDESK_TRANSLATION_ENABLED"],
            value: config.translation.enabled.to_string(),
        },
        FieldSpec {
            key: "translation.endpoint",
            env_keys: &["HELPDESK_TRANSLATION_ENDPOINT"],
            value: config.translation.endpoint.clone().unwrap_or_else(|| "<unset>".to_string()),
        },
        FieldSpec {
            key: "translation.api_key",
            env_keys: &["HELPDESK_TRANSLATION_API_KEY"],
            value: redact_secret(config.translation.api_key.as_ref()),
        },
        FieldSpec {
            key: "server.bind_address",
            env_keys: &["HELPDESK_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        FieldSpec {
            key: "server.port",
            env_keys: &["HELPDESK_SERVER_PORT"],
            value: config.server.port.to_string(),
        },
        FieldSpec {
            key: "logging.level",
            env_keys: &["HELPDESK_LOGGING_LEVEL", "HELPDESK_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        FieldSpec {
            key: "logging.format",
            env_keys: &["HELPDESK_LOGGING_FORMAT", "HELPDESK_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format).to_lowercase(),
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    ["helpdesk.toml", "config/helpdesk.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
