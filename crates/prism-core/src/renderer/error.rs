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

//! Defines the error types of the rendering subsystem.

use raw_window_handle::HandleError;
use std::fmt;

/// The shader stage a compilation error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// The vertex stage.
    Vertex,
    /// The fragment (pixel) stage.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// A high-level error that can occur while a renderer is being set up or driven.
#[derive(Debug)]
pub enum RenderError {
    /// The window could not provide a raw window or display handle.
    WindowHandle(String),
    /// The requested backend does not exist on this platform or build.
    UnsupportedPlatform(String),
    /// The generic backend was asked for a driver it does not know.
    UnknownDriver {
        /// The name that was requested.
        requested: String,
        /// The names that would have been accepted.
        available: Vec<&'static str>,
    },
    /// A device, context or swapchain could not be created.
    InitializationFailed(String),
    /// An embedded shader failed to compile or link.
    ShaderCompilation {
        /// The stage that failed.
        stage: ShaderStage,
        /// The compiler's log.
        log: String,
    },
    /// The presentation surface was lost.
    SurfaceLost,
    /// An error reported by the graphics API that fits none of the above.
    Backend(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::WindowHandle(msg) => write!(f, "Window handle unavailable: {msg}"),
            RenderError::UnsupportedPlatform(msg) => {
                write!(f, "Renderer not supported on this platform: {msg}")
            }
            RenderError::UnknownDriver {
                requested,
                available,
            } => write!(
                f,
                "Unknown driver '{requested}' (available: {})",
                available.join(", ")
            ),
            RenderError::InitializationFailed(msg) => {
                write!(f, "Renderer initialization failed: {msg}")
            }
            RenderError::ShaderCompilation { stage, log } => {
                write!(f, "Failed to compile {stage} shader: {log}")
            }
            RenderError::SurfaceLost => write!(f, "The presentation surface was lost"),
            RenderError::Backend(msg) => write!(f, "Backend error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<HandleError> for RenderError {
    fn from(err: HandleError) -> Self {
        RenderError::WindowHandle(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_driver_lists_alternatives() {
        let err = RenderError::UnknownDriver {
            requested: "directfb".to_string(),
            available: vec!["vulkan", "gl"],
        };
        assert_eq!(
            err.to_string(),
            "Unknown driver 'directfb' (available: vulkan, gl)"
        );
    }

    #[test]
    fn test_shader_error_names_stage() {
        let err = RenderError::ShaderCompilation {
            stage: ShaderStage::Fragment,
            log: "syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to compile fragment shader: syntax error"
        );
    }

    #[test]
    fn test_setup_and_surface_messages() {
        let err = RenderError::InitializationFailed("no Vulkan physical device found".to_string());
        assert_eq!(
            err.to_string(),
            "Renderer initialization failed: no Vulkan physical device found"
        );
        assert_eq!(
            RenderError::SurfaceLost.to_string(),
            "The presentation surface was lost"
        );
    }

    #[test]
    fn test_handle_error_conversion() {
        let err: RenderError = HandleError::Unavailable.into();
        assert!(matches!(err, RenderError::WindowHandle(_)));
    }
}
