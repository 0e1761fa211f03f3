use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::planner::PlannerWeights;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub planner: PlannerWeights,
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
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub planner: Option<PlannerWeights>,
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
                url: "sqlite://mealweek.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.anthropic.com".to_string(),
                model: "claude-sonnet-4-20250514".to_string(),
                timeout_secs: 15,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                health_check_port: 8081,
            },
            planner: PlannerWeights::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    planner: Option<PlannerPatch>,
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
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct PlannerPatch {
    recently_accepted: Option<i32>,
    recently_rejected: Option<i32>,
    recently_suggested: Option<i32>,
    starred_bonus: Option<i32>,
    never_used: Option<i32>,
    lookback_weeks: Option<u32>,
    history_retention_days: Option<u32>,
    max_recipes: Option<u32>,
    max_ingredients_per_recipe: Option<u32>,
    prompt_candidate_limit: Option<usize>,
    prompt_ingredient_limit: Option<usize>,
    checked_item_limit: Option<u32>,
    plan_size: Option<usize>,
    alternative_count: Option<usize>,
    request_deadline_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
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

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("mealweek.toml"));
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
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(api_key_value.into());
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(planner) = patch.planner {
            let weights = &mut self.planner;
            if let Some(value) = planner.recently_accepted {
                weights.recently_accepted = value;
            }
            if let Some(value) = planner.recently_rejected {
                weights.recently_rejected = value;
            }
            if let Some(value) = planner.recently_suggested {
                weights.recently_suggested = value;
            }
            if let Some(value) = planner.starred_bonus {
                weights.starred_bonus = value;
            }
            if let Some(value) = planner.never_used {
                weights.never_used = value;
            }
            if let Some(value) = planner.lookback_weeks {
                weights.lookback_weeks = value;
            }
            if let Some(value) = planner.history_retention_days {
                weights.history_retention_days = value;
            }
            if let Some(value) = planner.max_recipes {
                weights.max_recipes = value;
            }
            if let Some(value) = planner.max_ingredients_per_recipe {
                weights.max_ingredients_per_recipe = value;
            }
            if let Some(value) = planner.prompt_candidate_limit {
                weights.prompt_candidate_limit = value;
            }
            if let Some(value) = planner.prompt_ingredient_limit {
                weights.prompt_ingredient_limit = value;
            }
            if let Some(value) = planner.checked_item_limit {
                weights.checked_item_limit = value;
            }
            if let Some(value) = planner.plan_size {
                weights.plan_size = value;
            }
            if let Some(value) = planner.alternative_count {
                weights.alternative_count = value;
            }
            if let Some(value) = planner.request_deadline_secs {
                weights.request_deadline_secs = value;
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
        if let Some(value) = read_env("MEALWEEK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("MEALWEEK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("MEALWEEK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("MEALWEEK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("MEALWEEK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MEALWEEK_LLM_API_KEY") {
            self.llm.api_key = Some(value.into());
        }
        if let Some(value) = read_env("MEALWEEK_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("MEALWEEK_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("MEALWEEK_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("MEALWEEK_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MEALWEEK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("MEALWEEK_SERVER_PORT") {
            self.server.port = parse_u16("MEALWEEK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("MEALWEEK_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("MEALWEEK_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        if let Some(value) = read_env("MEALWEEK_PLANNER_LOOKBACK_WEEKS") {
            self.planner.lookback_weeks = parse_u32("MEALWEEK_PLANNER_LOOKBACK_WEEKS", &value)?;
        }
        if let Some(value) = read_env("MEALWEEK_PLANNER_RETENTION_DAYS") {
            self.planner.history_retention_days =
                parse_u32("MEALWEEK_PLANNER_RETENTION_DAYS", &value)?;
        }
        if let Some(value) = read_env("MEALWEEK_PLANNER_REQUEST_DEADLINE_SECS") {
            self.planner.request_deadline_secs =
                parse_u64("MEALWEEK_PLANNER_REQUEST_DEADLINE_SECS", &value)?;
        }

        let log_level =
            read_env("MEALWEEK_LOGGING_LEVEL").or_else(|| read_env("MEALWEEK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MEALWEEK_LOGGING_FORMAT").or_else(|| read_env("MEALWEEK_LOG_FORMAT"));
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
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(llm_api_key.into());
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(planner) = overrides.planner {
            self.planner = planner;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_planner(&self.planner)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("mealweek.toml"), PathBuf::from("config/mealweek.toml")]
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

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
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
    let missing = llm
        .api_key
        .as_ref()
        .map(|value| value.expose_secret().trim().is_empty())
        .unwrap_or(true);
    if missing {
        return Err(ConfigError::Validation("llm.api_key is required".to_string()));
    }

    if !llm.base_url.starts_with("http://") && !llm.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_planner(planner: &PlannerWeights) -> Result<(), ConfigError> {
    // The behavioral contract of the weighting algorithm: never-used wins,
    // accepted is penalized hardest.
    let ordered = planner.never_used > planner.starred_bonus
        && planner.starred_bonus > 0
        && 0 > planner.recently_suggested
        && planner.recently_suggested > planner.recently_rejected
        && planner.recently_rejected > planner.recently_accepted;
    if !ordered {
        return Err(ConfigError::Validation(
            "planner weights must satisfy never_used > starred_bonus > 0 > \
             recently_suggested > recently_rejected > recently_accepted"
                .to_string(),
        ));
    }

    if planner.plan_size == 0 {
        return Err(ConfigError::Validation(
            "planner.plan_size must be greater than zero".to_string(),
        ));
    }

    if planner.alternative_count == 0 {
        return Err(ConfigError::Validation(
            "planner.alternative_count must be greater than zero".to_string(),
        ));
    }

    if planner.prompt_candidate_limit < planner.plan_size {
        return Err(ConfigError::Validation(
            "planner.prompt_candidate_limit must be at least planner.plan_size".to_string(),
        ));
    }

    if planner.lookback_weeks == 0 || planner.history_retention_days == 0 {
        return Err(ConfigError::Validation(
            "planner.lookback_weeks and planner.history_retention_days must be greater than zero"
                .to_string(),
        ));
    }

    if planner.max_recipes == 0 || planner.max_ingredients_per_recipe == 0 {
        return Err(ConfigError::Validation(
            "planner.max_recipes and planner.max_ingredients_per_recipe must be greater than zero"
                .to_string(),
        ));
    }

    if planner.request_deadline_secs == 0 {
        return Err(ConfigError::Validation(
            "planner.request_deadline_secs must be greater than zero".to_string(),
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
