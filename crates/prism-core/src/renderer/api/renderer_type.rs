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

//! The closed set of backends a host can ask the factory for.

use std::fmt;
use std::str::FromStr;

/// Selects which backend the renderer factory constructs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RendererType {
    /// OpenGL 3.3 core profile.
    OpenGL3_3,
    /// Vulkan 1.x.
    Vulkan,
    /// Direct3D 11. Windows only.
    Direct3D11,
    /// Direct3D 12. Windows only.
    Direct3D12,
    /// A thin wrapper over a generic rendering library. `driver` names the
    /// underlying native driver and is matched case-sensitively.
    Generic2D {
        /// The driver the wrapper binds to.
        driver: String,
    },
}

impl RendererType {
    /// Shorthand for [`RendererType::Generic2D`].
    pub fn generic(driver: impl Into<String>) -> Self {
        RendererType::Generic2D {
            driver: driver.into(),
        }
    }

    /// Returns `false` for variants that can never be constructed on the
    /// platform this crate was compiled for.
    pub fn is_native_to_platform(&self) -> bool {
        match self {
            RendererType::Direct3D11 | RendererType::Direct3D12 => cfg!(windows),
            _ => true,
        }
    }
}

impl fmt::Display for RendererType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererType::OpenGL3_3 => write!(f, "opengl"),
            RendererType::Vulkan => write!(f, "vulkan"),
            RendererType::Direct3D11 => write!(f, "d3d11"),
            RendererType::Direct3D12 => write!(f, "d3d12"),
            RendererType::Generic2D { driver } => write!(f, "generic:{driver}"),
        }
    }
}

/// Returned when a string names no known [`RendererType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRendererTypeError {
    input: String,
}

impl fmt::Display for ParseRendererTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown renderer type '{}' (expected opengl, vulkan, d3d11, d3d12 or generic[:<driver>])",
            self.input
        )
    }
}

impl std::error::Error for ParseRendererTypeError {}

impl FromStr for RendererType {
    type Err = ParseRendererTypeError;

    /// Parses a backend keyword. The keyword is case-insensitive; for
    /// `generic:<driver>` the driver text after the colon is kept verbatim.
    /// A bare `generic` selects the `auto` driver.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (keyword, driver) = match s.split_once(':') {
            Some((keyword, driver)) => (keyword, Some(driver)),
            None => (s, None),
        };

        let parsed = match (keyword.to_ascii_lowercase().as_str(), driver) {
            ("opengl" | "gl" | "opengl3_3", None) => RendererType::OpenGL3_3,
            ("vulkan" | "vk", None) => RendererType::Vulkan,
            ("d3d11" | "dx11", None) => RendererType::Direct3D11,
            ("d3d12" | "dx12", None) => RendererType::Direct3D12,
            ("generic" | "generic2d", None) => RendererType::generic("auto"),
            ("generic" | "generic2d", Some(driver)) => RendererType::generic(driver),
            _ => {
                return Err(ParseRendererTypeError {
                    input: s.to_string(),
                })
            }
        };
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_native_backends() {
        assert_eq!("opengl".parse(), Ok(RendererType::OpenGL3_3));
        assert_eq!("GL".parse(), Ok(RendererType::OpenGL3_3));
        assert_eq!("Vulkan".parse(), Ok(RendererType::Vulkan));
        assert_eq!("vk".parse(), Ok(RendererType::Vulkan));
        assert_eq!("dx11".parse(), Ok(RendererType::Direct3D11));
        assert_eq!(" d3d12 ".parse(), Ok(RendererType::Direct3D12));
    }

    #[test]
    fn test_parse_generic_keeps_driver_case() {
        assert_eq!("generic".parse(), Ok(RendererType::generic("auto")));
        assert_eq!(
            "GENERIC:Vulkan".parse(),
            Ok(RendererType::generic("Vulkan"))
        );
        assert_eq!("generic:gl".parse(), Ok(RendererType::generic("gl")));
    }

    #[test]
    fn test_parse_rejects_unknown_and_stray_driver() {
        assert!("metal".parse::<RendererType>().is_err());
        assert!("vulkan:software".parse::<RendererType>().is_err());
        let err = "".parse::<RendererType>().unwrap_err();
        assert!(err.to_string().contains("unknown renderer type"));
    }

    #[test]
    fn test_display_round_trips() {
        for kind in [
            RendererType::OpenGL3_3,
            RendererType::Vulkan,
            RendererType::Direct3D11,
            RendererType::Direct3D12,
            RendererType::generic("software"),
        ] {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }

    #[test]
    fn test_platform_support() {
        assert!(RendererType::OpenGL3_3.is_native_to_platform());
        assert!(RendererType::generic("gl").is_native_to_platform());
        assert_eq!(
            RendererType::Direct3D12.is_native_to_platform(),
            cfg!(windows)
        );
    }
}
