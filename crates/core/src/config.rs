use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub translation: TranslationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub system_instruction: String,
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Ceiling on the generative fallback, in seconds.
    pub deadline_secs: u64,
    pub default_language: String,
    pub auto_detect_language: bool,
}

#[derive(Clone, Debug)]
pub struct TranslationConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Ollama,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub deadline_secs: Option<u64>,
    pub auto_detect_language: Option<bool>,
    pub translation_enabled: Option<bool>,
    pub translation_endpoint: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://helpdesk.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                provider: LlmProvider::None,
                api_key: None,
                base_url: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
                system_instruction: "You are a helpful customer support assistant.".to_string(),
            },
            pipeline: PipelineConfig {
                deadline_secs: 8,
                default_language: "en".to_string(),
                auto_detect_language: false,
            },
            translation: TranslationConfig {
                enabled: false,
                endpoint: None,
                api_key: None,
                timeout_secs: 5,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "none" | "disabled" => Ok(Self::None),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|ollama|none)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::None => "none",
        }
    }
}

impl LlmConfig {
    /// Chat-completions endpoint for OpenAI-compatible providers.
    pub fn completions_endpoint(&self) -> Option<String> {
        let base = match self.provider {
            LlmProvider::None => return None,
            LlmProvider::OpenAi => {
                self.base_url.clone().unwrap_or_else(|| "https://api.openai.com".to_string())
            }
            LlmProvider::Ollama => {
                self.base_url.clone().unwrap_or_else(|| "http://localhost:11434".to_string())
            }
        };
        Some(format!("{}/v1/chat/completions", base.trim_end_matches('/')))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("helpdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(system_instruction) = llm.system_instruction {
                self.llm.system_instruction = system_instruction;
            }
        }

        if let Some(pipeline) = patch.pipeline {
            if let Some(deadline_secs) = pipeline.deadline_secs {
                self.pipeline.deadline_secs = deadline_secs;
            }
            if let Some(default_language) = pipeline.default_language {
                self.pipeline.default_language = default_language;
            }
            if let Some(auto_detect_language) = pipeline.auto_detect_language {
                self.pipeline.auto_detect_language = auto_detect_language;
            }
        }

        if let Some(translation) = patch.translation {
            if let Some(enabled) = translation.enabled {
                self.translation.enabled = enabled;
            }
            if let Some(endpoint) = translation.endpoint {
                self.translation.endpoint = Some(endpoint);
            }
            if let Some(translation_api_key_value) = translation.api_key {
                self.translation.api_key = Some(secret_value(translation_api_key_value));
            }
            if let Some(timeout_secs) = translation.timeout_secs {
                self.translation.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HELPDESK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("HELPDESK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("HELPDESK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("HELPDESK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("HELPDESK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("HELPDESK_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        let llm_api_key = read_env("HELPDESK_LLM_API_KEY").or_else(|| read_env("OPENAI_API_KEY"));
        if let Some(value) = llm_api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("HELPDESK_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("HELPDESK_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("HELPDESK_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("HELPDESK_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("HELPDESK_PIPELINE_DEADLINE_SECS") {
            self.pipeline.deadline_secs = parse_u64("HELPDESK_PIPELINE_DEADLINE_SECS", &value)?;
        }
        if let Some(value) = read_env("HELPDESK_PIPELINE_DEFAULT_LANGUAGE") {
            self.pipeline.default_language = value;
        }
        if let Some(value) = read_env("HELPDESK_PIPELINE_AUTO_DETECT_LANGUAGE") {
            self.pipeline.auto_detect_language =
                parse_bool("HELPDESK_PIPELINE_AUTO_DETECT_LANGUAGE", &value)?;
        }

        if let Some(value) = read_env("HELPDESK_TRANSLATION_ENABLED") {
            self.translation.enabled = parse_bool("HELPDESK_TRANSLATION_ENABLED", &value)?;
        }
        if let Some(value) = read_env("HELPDESK_TRANSLATION_ENDPOINT") {
            self.translation.endpoint = Some(value);
        }
        if let Some(value) = read_env("HELPDESK_TRANSLATION_API_KEY") {
            self.translation.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("HELPDESK_TRANSLATION_TIMEOUT_SECS") {
            self.translation.timeout_secs =
                parse_u64("HELPDESK_TRANSLATION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("HELPDESK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("HELPDESK_SERVER_PORT") {
            self.server.port = parse_u16("HELPDESK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("HELPDESK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("HELPDESK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("HELPDESK_LOGGING_LEVEL").or_else(|| read_env("HELPDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HELPDESK_LOGGING_FORMAT").or_else(|| read_env("HELPDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(deadline_secs) = overrides.deadline_secs {
            self.pipeline.deadline_secs = deadline_secs;
        }
        if let Some(auto_detect_language) = overrides.auto_detect_language {
            self.pipeline.auto_detect_language = auto_detect_language;
        }
        if let Some(enabled) = overrides.translation_enabled {
            self.translation.enabled = enabled;
        }
        if let Some(endpoint) = overrides.translation_endpoint {
            self.translation.endpoint = Some(endpoint);
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_pipeline(&self.pipeline, &self.translation)?;
        validate_translation(&self.translation)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("helpdesk.toml"), PathBuf::from("config/helpdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    match llm.provider {
        LlmProvider::OpenAi => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for the openai provider (or set llm.provider = \"none\")"
                        .to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
        LlmProvider::None => {}
    }

    if llm.provider != LlmProvider::None && llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    Ok(())
}

fn validate_pipeline(
    pipeline: &PipelineConfig,
    translation: &TranslationConfig,
) -> Result<(), ConfigError> {
    if pipeline.deadline_secs == 0 || pipeline.deadline_secs > 120 {
        return Err(ConfigError::Validation(
            "pipeline.deadline_secs must be in range 1..=120".to_string(),
        ));
    }

    let language = pipeline.default_language.trim();
    if language.len() < 2 || !language.chars().all(|ch| ch.is_ascii_alphabetic() || ch == '-') {
        return Err(ConfigError::Validation(
            "pipeline.default_language must be a language code such as `en`".to_string(),
        ));
    }

    if pipeline.auto_detect_language && !translation.enabled {
        return Err(ConfigError::Validation(
            "pipeline.auto_detect_language requires translation.enabled = true".to_string(),
        ));
    }

    Ok(())
}

fn validate_translation(translation: &TranslationConfig) -> Result<(), ConfigError> {
    if !translation.enabled {
        return Ok(());
    }

    match &translation.endpoint {
        Some(endpoint) if endpoint.starts_with("http://") || endpoint.starts_with("https://") => {}
        Some(_) => {
            return Err(ConfigError::Validation(
                "translation.endpoint must start with http:// or https://".to_string(),
            ))
        }
        None => {
            return Err(ConfigError::Validation(
                "translation.enabled is true but translation.endpoint is not set".to_string(),
            ))
        }
    }

    if translation.timeout_secs == 0 || translation.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "translation.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    pipeline: Option<PipelinePatch>,
    translation: Option<TranslationPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    system_instruction: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelinePatch {
    deadline_secs: Option<u64>,
    default_language: Option<String>,
    auto_detect_language: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslationPatch {
    enabled: Option<bool>,
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
