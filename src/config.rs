use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// TaskDesk server
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "taskdesk-server", version, about = "TaskDesk task-management server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "TASKDESK_PORT", default_value = "5000")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "TASKDESK_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./taskdesk.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "TASKDESK_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Data directory for persistent state (DB, keys)
    #[arg(long, env = "TASKDESK_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Development mode: auth endpoints echo access codes and setup tokens
    /// in responses instead of relying on mail/SMS delivery
    #[arg(long, env = "TASKDESK_DEV_MODE")]
    pub dev_mode: bool,

    /// Frontend base URL used in account-setup links
    #[arg(
        long,
        env = "TASKDESK_FRONTEND_URL",
        default_value = "http://localhost:3000"
    )]
    pub frontend_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "0.0.0.0".to_string(),
            config: "./taskdesk.toml".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            dev_mode: false,
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (TASKDESK_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("TASKDESK_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# TaskDesk Server Configuration
# Place this file at ./taskdesk.toml or specify with --config <path>
# All settings can be overridden via environment variables (TASKDESK_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 5000)
# port = 5000

# Bind address (default: 0.0.0.0 — all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for SQLite database and JWT signing key
# data_dir = "./data"

# Development mode: access codes and setup tokens are echoed back in auth
# responses so no mail/SMS provider is needed. Never enable in production.
# dev_mode = false

# Frontend base URL used in account-setup links mailed to new employees
# frontend_url = "http://localhost:3000"
"#
    .to_string()
}
