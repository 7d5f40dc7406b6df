use std::path::PathBuf;
use std::time::Duration;

use common_utils::consts;
use secrecy::SecretString;

use crate::logger;

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Config {
    pub common: Common,
    pub backend: Backend,
    pub checkout: Checkout,
    pub log: logger::LogConfig,
}

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Common {
    pub environment: String,
}

impl Common {
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        match self.environment.as_str() {
            "development" | "production" => Ok(()),
            _ => Err(config::ConfigError::Message(format!(
                "Invalid environment '{}'. Must be 'development' or 'production'",
                self.environment
            ))),
        }
    }
}

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Backend {
    pub base_url: String,
}

#[derive(Clone, serde::Deserialize, Debug)]
pub struct Checkout {
    pub key_id: SecretString,
    pub display_name: String,
    pub attempt_timeout_secs: Option<u64>,
    pub modal_open_watchdog_secs: Option<u64>,
}

impl Checkout {
    pub fn key_id(&self) -> SecretString {
        self.key_id.clone()
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(consts::CHECKOUT_ATTEMPT_TIMEOUT)
    }

    pub fn modal_open_watchdog(&self) -> Duration {
        self.modal_open_watchdog_secs
            .map(Duration::from_secs)
            .unwrap_or(consts::MODAL_OPEN_WATCHDOG)
    }
}

impl Config {
    /// Function to build the configuration by picking it from default locations
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::new_with_config_path(None)
    }

    pub fn new_with_config_path(
        explicit_config_path: Option<PathBuf>,
    ) -> Result<Self, config::ConfigError> {
        let env = consts::Env::current_env();
        let config_path = Self::config_path(&env, explicit_config_path);

        let config = config::Config::builder()
            .set_override("env", env.to_string())?
            .add_source(config::File::from(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("HISAB")
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()?;

        let config: Self = serde_path_to_error::deserialize(config).map_err(|error| {
            tracing::error!(%error, "Unable to deserialize application configuration");
            error.into_inner()
        })?;

        config.common.validate()?;

        Ok(config)
    }

    /// Config path.
    pub fn config_path(
        environment: &consts::Env,
        explicit_config_path: Option<PathBuf>,
    ) -> PathBuf {
        let mut config_path = PathBuf::new();
        if let Some(explicit_config_path_val) = explicit_config_path {
            config_path.push(explicit_config_path_val);
        } else {
            let config_directory: String = "config".into();
            let config_file_name = environment.config_path();

            config_path.push(workspace_path());
            config_path.push(config_directory);
            config_path.push(config_file_name);
        }
        config_path
    }
}

pub fn workspace_path() -> PathBuf {
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let mut path = PathBuf::from(manifest_dir);
        path.pop();
        path.pop();
        path
    } else {
        PathBuf::from(".")
    }
}
