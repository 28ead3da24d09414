// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Host configuration: which windows to open and what renders into them.
//!
//! The configuration is a TOML document with one `[[windows]]` table per window:
//!
//! ```toml
//! [[windows]]
//! title = "OpenGL"
//! backend = "opengl"
//! width = 480
//! height = 320
//! clear_color = [0, 0, 255, 255]
//!
//! [[windows]]
//! title = "Generic"
//! backend = "generic"
//! driver = "software"
//! triangle_color = [255, 0, 0, 255]
//! ```

use crate::math::Rgba8;
use crate::renderer::api::renderer_type::{ParseRendererTypeError, RendererType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const DEFAULT_WIDTH: u32 = 480;
const DEFAULT_HEIGHT: u32 = 320;

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_backend() -> String {
    RendererType::OpenGL3_3.to_string()
}

/// One window the host opens, and the renderer bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title. Defaults to the backend keyword.
    #[serde(default)]
    pub title: Option<String>,
    /// Initial inner width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Initial inner height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
    /// Backend keyword, parsed with [`RendererType`]'s `FromStr`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Driver of the generic backend. Ignored by the other backends.
    #[serde(default)]
    pub driver: Option<String>,
    /// Clear color override.
    #[serde(default)]
    pub clear_color: Option<Rgba8>,
    /// Triangle color override.
    #[serde(default)]
    pub triangle_color: Option<Rgba8>,
}

impl WindowConfig {
    /// A window of the default size running `backend`.
    pub fn new(backend: &RendererType) -> Self {
        let (backend, driver) = match backend {
            RendererType::Generic2D { driver } => ("generic".to_string(), Some(driver.clone())),
            other => (other.to_string(), None),
        };
        Self {
            title: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            backend,
            driver,
            clear_color: None,
            triangle_color: None,
        }
    }

    /// Resolves the backend keyword. A `driver` entry, when present, selects
    /// the generic backend's driver and overrides one given inline.
    pub fn renderer_type(&self) -> Result<RendererType, ParseRendererTypeError> {
        match (self.backend.parse()?, &self.driver) {
            (RendererType::Generic2D { .. }, Some(driver)) => Ok(RendererType::generic(driver)),
            (kind, _) => Ok(kind),
        }
    }

    /// The title to show, falling back to the backend keyword.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => match &self.driver {
                Some(driver) => format!("{} ({driver})", self.backend),
                None => self.backend.clone(),
            },
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new(&RendererType::OpenGL3_3)
    }
}

/// The full host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// The windows to open, in order.
    #[serde(default)]
    pub windows: Vec<WindowConfig>,
}

impl Default for HostConfig {
    /// A single 480x320 OpenGL window.
    fn default() -> Self {
        Self {
            windows: vec![WindowConfig::default()],
        }
    }
}

impl HostConfig {
    /// Parses a configuration from TOML text and validates every backend keyword.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: HostConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        log::info!("Loaded host configuration from '{}'", path.display());
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (index, window) in self.windows.iter().enumerate() {
            window
                .renderer_type()
                .map_err(|e| ConfigError::InvalidBackend {
                    window: index,
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }
}

/// An error raised while loading a [`HostConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be read.
    Io {
        /// The path that was read.
        path: String,
        /// The underlying I/O error.
        message: String,
    },
    /// The text is not valid TOML or does not match the schema.
    Parse(String),
    /// A window names an unknown backend.
    InvalidBackend {
        /// Index of the offending `[[windows]]` entry.
        window: usize,
        /// The parse error.
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Failed to read configuration '{path}': {message}")
            }
            ConfigError::Parse(msg) => write!(f, "Invalid configuration: {msg}"),
            ConfigError::InvalidBackend { window, message } => {
                write!(f, "Window #{window} has an invalid backend: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let text = r#"
            [[windows]]
            title = "GL"
            backend = "opengl"
            width = 640
            height = 480
            clear_color = [100, 100, 100, 128]

            [[windows]]
            backend = "generic"
            driver = "software"
            triangle_color = [0, 255, 0, 255]
        "#;
        let config = HostConfig::from_toml_str(text).unwrap();
        assert_eq!(config.windows.len(), 2);

        let gl = &config.windows[0];
        assert_eq!(gl.renderer_type(), Ok(RendererType::OpenGL3_3));
        assert_eq!((gl.width, gl.height), (640, 480));
        assert_eq!(gl.clear_color, Some(Rgba8::new(100, 100, 100, 128)));
        assert_eq!(gl.display_title(), "GL");

        let generic = &config.windows[1];
        assert_eq!(generic.renderer_type(), Ok(RendererType::generic("software")));
        assert_eq!((generic.width, generic.height), (480, 320));
        assert_eq!(generic.triangle_color, Some(Rgba8::GREEN));
        assert_eq!(generic.display_title(), "generic (software)");
    }

    #[test]
    fn test_inline_generic_driver() {
        let config = HostConfig::from_toml_str(
            r#"
            [[windows]]
            backend = "generic:vulkan"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.windows[0].renderer_type(),
            Ok(RendererType::generic("vulkan"))
        );
    }

    #[test]
    fn test_invalid_backend_is_reported_with_index() {
        let err = HostConfig::from_toml_str(
            r#"
            [[windows]]
            backend = "vulkan"

            [[windows]]
            backend = "glide"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackend { window: 1, .. }));
    }

    #[test]
    fn test_malformed_toml_and_color() {
        assert!(matches!(
            HostConfig::from_toml_str("[[windows]\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            HostConfig::from_toml_str("[[windows]]\nclear_color = [1, 2, 300, 4]\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.windows.len(), 1);
        assert_eq!(
            config.windows[0].renderer_type(),
            Ok(RendererType::OpenGL3_3)
        );
        assert_eq!(HostConfig::from_toml_str("").unwrap().windows.len(), 0);
    }

    #[test]
    fn test_window_config_from_type() {
        let window = WindowConfig::new(&RendererType::generic("gl"));
        assert_eq!(window.renderer_type(), Ok(RendererType::generic("gl")));
        let window = WindowConfig::new(&RendererType::Direct3D11);
        assert_eq!(window.renderer_type(), Ok(RendererType::Direct3D11));
    }

    #[test]
    fn test_missing_file() {
        let err = HostConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
