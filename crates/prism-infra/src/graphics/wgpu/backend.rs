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

//! Driver selection for the generic backend.
//!
//! A driver name maps to a set of wgpu backends and adapter options. Names are
//! matched case-sensitively, so `"Vulkan"` is rejected while `"vulkan"` is not.

use anyhow::Result;
use prism_core::renderer::RenderError;
use wgpu::{
    Adapter, Backend, Backends, Instance, InstanceDescriptor, RequestAdapterOptions, Surface,
};

/// Every driver name [`driver_selection`] accepts.
pub const DRIVER_NAMES: [&str; 6] = ["auto", "vulkan", "dx12", "metal", "gl", "software"];

/// How wgpu is asked for an adapter for a given driver name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSelection {
    /// The native APIs the instance may use.
    pub backends: Backends,
    /// Restricts the search to software (CPU) adapters.
    pub force_fallback_adapter: bool,
}

/// Resolves a driver name.
///
/// ## Returns
/// * `Ok(DriverSelection)` - The backends to enable for `name`.
/// * `Err(RenderError::UnknownDriver)` - `name` is not one of [`DRIVER_NAMES`].
pub fn driver_selection(name: &str) -> Result<DriverSelection, RenderError> {
    let (backends, force_fallback_adapter) = match name {
        "auto" => (Backends::all(), false),
        "vulkan" => (Backends::VULKAN, false),
        "dx12" => (Backends::DX12, false),
        "metal" => (Backends::METAL, false),
        "gl" => (Backends::GL, false),
        "software" => (Backends::all(), true),
        _ => {
            return Err(RenderError::UnknownDriver {
                requested: name.to_string(),
                available: DRIVER_NAMES.to_vec(),
            })
        }
    };
    Ok(DriverSelection {
        backends,
        force_fallback_adapter,
    })
}

/// The instance options for a selection. The display handle is given per
/// surface instead, since each renderer binds to its own window.
pub fn instance_descriptor(selection: &DriverSelection) -> InstanceDescriptor {
    let mut descriptor = InstanceDescriptor::new_without_display_handle();
    descriptor.backends = selection.backends;
    descriptor
}

/// Creates an instance limited to the selected backends.
pub fn create_instance(selection: &DriverSelection) -> Instance {
    Instance::new(instance_descriptor(selection))
}

/// Requests an adapter able to present to `surface`.
pub async fn request_adapter(
    instance: &Instance,
    selection: &DriverSelection,
    surface: &Surface<'_>,
) -> Result<Adapter> {
    instance
        .request_adapter(&RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(surface),
            force_fallback_adapter: selection.force_fallback_adapter,
        })
        .await
        .map_err(|e| {
            RenderError::InitializationFailed(format!(
                "no adapter for backends {:?} (fallback: {}): {}",
                selection.backends, selection.force_fallback_adapter, e
            ))
            .into()
        })
}

/// Returns a human-readable name for a backend.
pub fn backend_name(backend: Backend) -> &'static str {
    match backend {
        Backend::Vulkan => "Vulkan",
        Backend::Metal => "Metal",
        Backend::Dx12 => "DirectX 12",
        Backend::Gl => "OpenGL",
        Backend::BrowserWebGpu => "WebGPU",
        Backend::Noop => "No-op",
        #[allow(unreachable_patterns)]
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_driver_resolves() {
        for name in DRIVER_NAMES {
            assert!(driver_selection(name).is_ok(), "{name} should resolve");
        }
    }

    #[test]
    fn test_native_drivers_select_one_backend() {
        assert_eq!(driver_selection("vulkan").unwrap().backends, Backends::VULKAN);
        assert_eq!(driver_selection("gl").unwrap().backends, Backends::GL);
        assert_eq!(driver_selection("dx12").unwrap().backends, Backends::DX12);
        assert!(!driver_selection("metal").unwrap().force_fallback_adapter);
    }

    #[test]
    fn test_software_forces_fallback_adapter() {
        let selection = driver_selection("software").unwrap();
        assert!(selection.force_fallback_adapter);
        assert_eq!(selection.backends, Backends::all());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        match driver_selection("Vulkan") {
            Err(RenderError::UnknownDriver {
                requested,
                available,
            }) => {
                assert_eq!(requested, "Vulkan");
                assert_eq!(available, DRIVER_NAMES.to_vec());
            }
            other => panic!("expected UnknownDriver, got {other:?}"),
        }
        assert!(driver_selection("").is_err());
        assert!(driver_selection("directfb").is_err());
    }

    #[test]
    fn test_instance_descriptor_enables_only_selected_backends() {
        let descriptor = instance_descriptor(&driver_selection("gl").unwrap());
        assert_eq!(descriptor.backends, Backends::GL);
        assert!(descriptor.display.is_none());

        let descriptor = instance_descriptor(&driver_selection("auto").unwrap());
        assert_eq!(descriptor.backends, Backends::all());
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(backend_name(Backend::Vulkan), "Vulkan");
        assert_eq!(backend_name(Backend::Gl), "OpenGL");
    }
}
