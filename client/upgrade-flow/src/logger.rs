//! Setup logging subsystem.

use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Clone, Debug, Deserialize)]
pub struct LogConfig {
    pub console: ConsoleConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConsoleConfig {
    pub enabled: bool,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Explicit filtering directive; when absent one is built from the
    /// workspace crates at `level`.
    pub filtering_directive: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn into_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Default,
    Json,
}

const WORKSPACE_CRATES: [&str; 4] = [
    "upgrade_flow",
    "domain_types",
    "interfaces",
    "hisab_common_utils",
];

/// Setup the logging sub-system for the given configuration and service
/// (binary) name. Workspace crates log at the configured level; everything
/// else stays at WARN.
pub fn setup(config: &LogConfig, service_name: &str) {
    if !config.console.enabled {
        return;
    }

    let directive = config
        .console
        .filtering_directive
        .clone()
        .unwrap_or_else(|| {
            get_envfilter_directive(tracing::Level::WARN, config.console.level.into_level())
        });
    let filter = tracing_subscriber::EnvFilter::builder().parse_lossy(directive);

    let fmt_layer = match config.console.log_format {
        LogFormat::Default => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => {
            // Disable color or emphasis related ANSI escape codes for JSON formats
            error_stack::Report::set_color_mode(error_stack::fmt::ColorMode::None);
            tracing_subscriber::fmt::layer().json().boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    tracing::info!(service_name, "Logging subsystem initialized");
}

fn get_envfilter_directive(
    default_log_level: tracing::Level,
    filter_log_level: tracing::Level,
) -> String {
    WORKSPACE_CRATES
        .iter()
        .map(|crate_name| format!("{crate_name}={filter_log_level}"))
        .fold(default_log_level.to_string(), |directive, entry| {
            format!("{directive},{entry}")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_covers_every_workspace_crate() {
        let directive = get_envfilter_directive(tracing::Level::WARN, tracing::Level::DEBUG);
        assert!(directive.starts_with("WARN"));
        for crate_name in WORKSPACE_CRATES {
            assert!(directive.contains(&format!("{crate_name}=DEBUG")));
        }
    }
}
