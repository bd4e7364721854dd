use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is not set.
    ///
    /// The application requires this environment variable to be defined. Check the
    /// documentation or `.env.example` file for required configuration variables.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

const DEFAULT_REGISTRY_PATH: &str = "data.json";
const DEFAULT_TICKET_PATH: &str = "ticket_data.json";

/// Application configuration loaded from the environment.
pub struct Config {
    pub discord_bot_token: String,

    /// Path to the game registry JSON document.
    pub registry_path: PathBuf,
    /// Path to the ticket module configuration JSON document.
    pub ticket_path: PathBuf,

    /// Whether revoking a game role also removes the member from that
    /// game's threads. See DESIGN.md for why this is a knob.
    pub retract_on_role_removal: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            discord_bot_token: std::env::var("DISCORD_BOT_TOKEN")
                .map_err(|_| ConfigError::MissingEnvVar("DISCORD_BOT_TOKEN".to_string()))?,
            registry_path: std::env::var("GAMEKEEPER_DATA_FILE")
                .unwrap_or_else(|_| DEFAULT_REGISTRY_PATH.to_string())
                .into(),
            ticket_path: std::env::var("GAMEKEEPER_TICKET_FILE")
                .unwrap_or_else(|_| DEFAULT_TICKET_PATH.to_string())
                .into(),
            retract_on_role_removal: std::env::var("RETRACT_ON_ROLE_REMOVAL")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }
}
