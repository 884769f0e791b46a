//! Configuration loading for the sampler.
//!
//! Parses `SamplerConfig` from TOML and validates it before any handler is
//! built.

use std::path::Path;

use ferro_common::config::{ConfigError, ConfigLoader, SamplerConfig};
use tracing::{info, warn};

/// Load and validate a configuration file.
///
/// # Errors
/// `FileNotFound`, `ParseError` or `ValidationError`.
pub fn load_config(path: &Path) -> Result<SamplerConfig, ConfigError> {
    let config = SamplerConfig::load(path)?;
    config.validate()?;
    info!(
        path = %path.display(),
        period_ticks = config.timing.period_ticks,
        repetition_counter = config.timing.repetition_counter,
        "Configuration loaded"
    );
    Ok(config)
}

/// Parse and validate a configuration from a TOML string.
pub fn load_config_from_str(content: &str) -> Result<SamplerConfig, ConfigError> {
    let config = SamplerConfig::from_toml(content)?;
    config.validate()?;
    Ok(config)
}

/// Load `path`, or fall back to the reference-board defaults if it does
/// not exist. Any other error is returned.
pub fn load_config_or_default(path: &Path) -> Result<SamplerConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::FileNotFound) => {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(SamplerConfig::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_config_or_default(Path::new("/nonexistent/sampler.toml")).unwrap();
        assert_eq!(cfg, SamplerConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected_after_parse() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[brake]\nmax_duty = 1.5").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            load_config_or_default(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn from_str_applies_validation() {
        assert!(load_config_from_str("[timing]\nperiod_ticks = 8000\n").is_ok());
        assert!(load_config_from_str("[timing]\nperiod_ticks = 0\n").is_err());
        assert!(matches!(
            load_config_from_str("[timing]\nrepetition_counter = 4294967295\n"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            load_config_from_str("[analog]\nvbus_divider_ratio = nan\n"),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
