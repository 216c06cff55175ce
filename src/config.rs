use ::config::{Config, Environment, File};

use crate::error::ConfigError;
use crate::types::AppConfig;

/// Loads configuration from an optional `Settings` file and `APP_*`
/// environment variables. A bare `PORT` variable overrides the port.
pub fn load() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name("Settings").required(false))
        .add_source(Environment::with_prefix("APP"))
        .set_override_option("port", std::env::var("PORT").ok())?
        .build()?;

    let app_config: AppConfig = settings.try_deserialize()?;
    validate(&app_config)?;
    Ok(app_config)
}

pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.tick_interval_ms == 0 {
        return Err(ConfigError::Invalid(
            "tick_interval_ms must be greater than zero".to_string(),
        ));
    }
    if config.chart_base_url.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "chart_base_url must not be empty".to_string(),
        ));
    }
    if config.chart_width == 0 || config.chart_height == 0 {
        return Err(ConfigError::Invalid(
            "chart dimensions must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
