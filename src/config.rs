use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::loss::LossStrategy;
use crate::variant::{ModelVariant, DEFAULT_EXPORT_DIR};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfig {
    /// Feature layout (mcep40, mcep177)
    #[serde(default)]
    pub variant: ModelVariant,
    /// Overrides the variant's default loss when set
    #[serde(default)]
    pub loss: Option<LossStrategy>,
}

impl NetworkConfig {
    pub fn effective_loss(&self) -> LossStrategy {
        self.loss.unwrap_or_else(|| self.variant.default_loss())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Target export directory (must not exist yet)
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_DIR)
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            export: ExportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("network.variant", ModelVariant::default().as_str())?
            .set_default("export.dir", DEFAULT_EXPORT_DIR)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("MCEPNN_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (MCEPNN__EXPORT__DIR, etc.)
            .add_source(
                Environment::with_prefix("MCEPNN")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
