//! Studio configuration
//!
//! Read from a TOML file; every field is optional and falls back to the
//! compiled default.
//!
//! ```toml
//! window_size = [1280, 720]
//! renderer = "pathtracer"
//! light_type = "distant"
//! nav_scale = 0.25
//! log_filter = "studio_sg=debug"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SgError};
use crate::sg::objects::{RendererType, LIGHT_TYPES};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Window size in pixels, `[width, height]`
    pub window_size: [i32; 2],
    pub renderer: RendererType,
    /// Type of the light added to new scenes, one of [`LIGHT_TYPES`]
    pub light_type: String,
    /// Framebuffer scale while navigating
    pub nav_scale: f32,
    /// `env_logger` filter, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            window_size: [1024, 768],
            renderer: RendererType::default(),
            light_type: "ambient".into(),
            nav_scale: 0.5,
            log_filter: "info".into(),
        }
    }
}

impl StudioConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&text)?;
        log::debug!("loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !LIGHT_TYPES.contains(&self.light_type.as_str()) {
            return Err(SgError::UnknownSubtype(format!("light_{}", self.light_type)));
        }
        Ok(())
    }
}

/// Initializes `env_logger` with the configured filter
///
/// `RUST_LOG` wins when set. Safe to call more than once.
pub fn init_logging(config: &StudioConfig) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "renderer = \"pathtracer\"\nwindow_size = [640, 480]").unwrap();

        let config = StudioConfig::load(file.path()).unwrap();
        assert_eq!(config.renderer, RendererType::PathTracer);
        assert_eq!(config.window_size, [640, 480]);
        assert_eq!(config.light_type, "ambient");
        assert_eq!(config.nav_scale, 0.5);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(matches!(
            StudioConfig::from_toml("renderer = \"raycast\""),
            Err(SgError::Config(_))
        ));
        assert!(matches!(
            StudioConfig::from_toml("light_type = \"laser\""),
            Err(SgError::UnknownSubtype(_))
        ));
        assert!(matches!(
            StudioConfig::load("/nonexistent/studio.toml"),
            Err(SgError::Io(_))
        ));
    }

    #[test]
    fn test_logging_can_be_initialised_repeatedly() {
        let config = StudioConfig::from_toml("log_filter = \"studio_sg=debug\"").unwrap();
        init_logging(&config);
        init_logging(&StudioConfig::default());
        log::debug!("logger installed once");
    }
}
