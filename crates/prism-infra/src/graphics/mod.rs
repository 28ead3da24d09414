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

//! Concrete renderer backends and the factory that selects one.
//!
//! Every backend follows the same failure policy: construction never fails.
//! If setup goes wrong the backend logs the cause, reports
//! [`RendererStatus::Failed`] and ignores later `update`/`resize` calls.
//! Backends do not share GPU objects with each other or across windows.

#[cfg(windows)]
mod d3d;
#[cfg(windows)]
pub mod d3d11;
#[cfg(windows)]
pub mod d3d12;
#[cfg(feature = "opengl")]
pub mod gl;
#[cfg(feature = "vulkan")]
pub mod vulkan;
#[cfg(feature = "wgpu")]
pub mod wgpu;

use prism_core::platform::window::PrismWindow;
use prism_core::renderer::{RenderError, Renderer, RendererStatus, RendererType};

/// Constructs the backend selected by `kind`, bound to `window`.
///
/// The returned renderer has already done all of its setup. It may still
/// report a failed [`Renderer::status`]; such an instance is safe to drive but
/// draws nothing.
///
/// ## Returns
/// * `Some(renderer)` - A backend of the requested type.
/// * `None` - The type is not available in this build or on this platform.
pub fn create_renderer(window: &dyn PrismWindow, kind: &RendererType) -> Option<Box<dyn Renderer>> {
    if let Err(e) = check_platform(kind) {
        log::error!("Renderer factory: {e}");
        return None;
    }

    let renderer: Box<dyn Renderer> = match kind {
        #[cfg(feature = "opengl")]
        RendererType::OpenGL3_3 => Box::new(gl::GlRenderer::new(window)),
        #[cfg(feature = "vulkan")]
        RendererType::Vulkan => Box::new(vulkan::VulkanRenderer::new(window)),
        #[cfg(windows)]
        RendererType::Direct3D11 => Box::new(d3d11::D3D11Renderer::new(window)),
        #[cfg(windows)]
        RendererType::Direct3D12 => Box::new(d3d12::D3D12Renderer::new(window)),
        #[cfg(feature = "wgpu")]
        RendererType::Generic2D { driver } => Box::new(wgpu::Wgpu2DRenderer::new(window, driver)),
        #[allow(unreachable_patterns)]
        other => {
            log::error!("No renderer of type '{other}' is available in this build");
            return None;
        }
    };

    log::info!(
        "Renderer factory: created '{}' for window {} ({})",
        renderer.name(),
        window.id(),
        renderer.status()
    );
    Some(renderer)
}

/// Rejects backends that can never run on the platform this crate targets.
fn check_platform(kind: &RendererType) -> Result<(), RenderError> {
    if kind.is_native_to_platform() {
        Ok(())
    } else {
        Err(RenderError::UnsupportedPlatform(format!(
            "'{kind}' is only available on Windows"
        )))
    }
}

/// Like [`create_renderer`], but only yields renderers whose setup succeeded.
pub fn create_ready_renderer(
    window: &dyn PrismWindow,
    kind: &RendererType,
) -> Option<Box<dyn Renderer>> {
    create_renderer(window, kind).filter(|renderer| renderer.is_ready())
}

/// Turns the result of a backend's setup into its state and status, logging
/// the failure if there is one.
pub(crate) fn settle_setup<T>(
    backend: &str,
    setup: anyhow::Result<T>,
) -> (Option<T>, RendererStatus) {
    match setup {
        Ok(state) => (Some(state), RendererStatus::Ready),
        Err(e) => {
            log::error!("{backend}: setup failed, renderer disabled: {e:#}");
            (None, RendererStatus::failed(format!("{e:#}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_platform_check() {
        assert!(check_platform(&RendererType::Vulkan).is_ok());
        assert!(check_platform(&RendererType::generic("gl")).is_ok());

        let d3d = check_platform(&RendererType::Direct3D12);
        if cfg!(windows) {
            assert!(d3d.is_ok());
        } else {
            assert!(matches!(d3d, Err(RenderError::UnsupportedPlatform(_))));
        }
    }

    #[test]
    fn test_settle_setup_success() {
        let (state, status) = settle_setup("Test", Ok(7));
        assert_eq!(state, Some(7));
        assert!(status.is_ready());
    }

    #[test]
    fn test_settle_setup_keeps_error_chain() {
        let err = anyhow!("device lost").context("Failed to create swapchain");
        let (state, status) = settle_setup::<()>("Test", Err(err));
        assert!(state.is_none());
        assert_eq!(
            status,
            RendererStatus::failed("Failed to create swapchain: device lost")
        );
    }
}
