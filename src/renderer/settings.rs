//! Renderer Settings
//!
//! ```rust,ignore
//! use mosaic::renderer::RendererSettings;
//!
//! let settings = RendererSettings {
//!     max_lights: 2,
//!     ..Default::default()
//! };
//!
//! // Or from a JSON config file read by the application.
//! let settings = RendererSettings::from_json(r#"{ "api_version": "gles2" }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::shader::{GlApiVersion, Precision};

/// Renderer-wide configuration.
///
/// Missing JSON fields take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Overrides the GL API version reported by the device.
    pub api_version: Option<GlApiVersion>,
    /// Default float precision of assembled programs.
    pub precision: Precision,
    /// Log every newly linked program's source at trace level.
    pub log_shader_source: bool,
    /// Light lists longer than this are truncated before assembly.
    pub max_lights: usize,
    /// Sort transparent meshes back to front before drawing.
    pub sort_transparent: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            api_version: None,
            precision: Precision::Mediump,
            log_shader_source: false,
            max_lights: 4,
            sort_transparent: true,
        }
    }
}

impl RendererSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
