use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Bearer token verification
    pub jwt: JwtAuthConfig,
    /// Completion service used by assisted chat mode
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Event bus and push/poll transport settings
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Requests per minute per caller. 0 disables rate limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    /// Identity provider's RSA public key in PEM format
    pub public_key: String,

    /// RSA private key in PEM format. Only needed to mint tokens locally.
    #[serde(default)]
    pub private_key: Option<String>,

    /// Leeway in seconds for clock skew tolerance (default: 30)
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,

    /// Expected `iss` claim, if any
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected `aud` claim, if any
    #[serde(default)]
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// API key for the completion service. Assisted mode degrades without it.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_assistant_base_url")]
    pub base_url: String,

    #[serde(default = "default_assistant_model")]
    pub model: String,

    #[serde(default = "default_assistant_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_assistant_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_assistant_temperature")]
    pub temperature: f32,

    /// Overrides the built-in tutor prompt
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_assistant_base_url(),
            model: default_assistant_model(),
            timeout_secs: default_assistant_timeout(),
            max_tokens: default_assistant_max_tokens(),
            temperature: default_assistant_temperature(),
            system_prompt: None,
        }
    }
}

impl AssistantConfig {
    /// True when an API key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Events kept per group for polling clients
    #[serde(default = "default_replay_capacity")]
    pub replay_capacity: usize,

    /// Events older than this are dropped from the replay log
    #[serde(default = "default_replay_retention")]
    pub replay_retention_secs: u64,

    /// Window used when a poll arrives without a cursor
    #[serde(default = "default_poll_window")]
    pub poll_default_window_secs: i64,

    /// Interval between WebSocket pings
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,

    /// How often expired replay entries are pruned
    #[serde(default = "default_prune_interval")]
    pub prune_interval_secs: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            replay_capacity: default_replay_capacity(),
            replay_retention_secs: default_replay_retention(),
            poll_default_window_secs: default_poll_window(),
            heartbeat_secs: default_heartbeat(),
            prune_interval_secs: default_prune_interval(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    1_048_576
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    120
}
fn default_jwt_leeway() -> u64 {
    30
}
fn default_assistant_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_assistant_model() -> String {
    "gpt-4o".to_string()
}
fn default_assistant_timeout() -> u64 {
    15
}
fn default_assistant_max_tokens() -> u32 {
    1000
}
fn default_assistant_temperature() -> f32 {
    0.7
}
fn default_replay_capacity() -> usize {
    256
}
fn default_replay_retention() -> u64 {
    300
}
fn default_poll_window() -> i64 {
    60
}
fn default_heartbeat() -> u64 {
    15
}
fn default_prune_interval() -> u64 {
    60
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with CLASSROOM__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("CLASSROOM").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 1048576

            [database]
            url = ""
            max_connections = 20
            min_connections = 2
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 120

            [jwt]
            public_key = "test-public-key"
            leeway_secs = 30

            [assistant]
            base_url = "https://api.openai.com/v1"
            model = "gpt-4o"
            timeout_secs = 15

            [realtime]
            replay_capacity = 256
            replay_retention_secs = 300
            poll_default_window_secs = 60
            heartbeat_secs = 15
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "CLASSROOM__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.jwt.public_key.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "CLASSROOM__JWT__PUBLIC_KEY environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.assistant.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "assistant.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.realtime.replay_capacity == 0 || self.realtime.heartbeat_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "realtime.replay_capacity and realtime.heartbeat_secs must be greater than 0"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
