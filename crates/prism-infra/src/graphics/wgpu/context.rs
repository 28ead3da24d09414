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

use super::backend::{self, backend_name, DriverSelection};
use anyhow::{anyhow, Result};
use prism_core::platform::window::PrismWindowHandle;
use std::sync::Arc;
use wgpu::{CurrentSurfaceTexture, SurfaceTargetUnsafe};

/// Holds the core WGPU state objects required for rendering to one window.
#[derive(Debug)]
pub(super) struct WgpuGraphicsContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    // Configuration for the surface's swapchain behavior
    pub surface_config: wgpu::SurfaceConfiguration,

    pub adapter_name: String,
    pub adapter_backend: wgpu::Backend,

    /// Set when the last acquired texture was suboptimal.
    reconfigure_pending: bool,
}

impl WgpuGraphicsContext {
    /// Initializes the graphics context for a window surface.
    ///
    /// ## Arguments
    /// * `selection` - The backends and adapter options resolved from the driver name.
    /// * `window` - The window to present to. The caller keeps this handle alive
    ///   for as long as the context exists.
    /// * `window_size` - The initial physical size of the window surface.
    pub async fn new(
        selection: &DriverSelection,
        window: &PrismWindowHandle,
        window_size: (u32, u32),
    ) -> Result<Self> {
        log::info!("Initializing WGPU Graphics Context for {:?}...", selection.backends);
        let instance = backend::create_instance(selection);

        // --- 1. Create Surface ---
        let surface_target = unsafe {
            SurfaceTargetUnsafe::from_display_and_window(window, window)
                .map_err(|e| anyhow!("Failed to create surface target: {}", e))?
        };
        let surface = unsafe { instance.create_surface_unsafe(surface_target)? };
        log::debug!("WGPU surface created for the window.");

        // --- 2. Adapter, Logical Device and Command Queue ---
        let adapter = backend::request_adapter(&instance, selection, &surface).await?;
        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {})",
            adapter_info.name,
            backend_name(adapter_info.backend)
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Prism Generic2D Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;

        device.on_uncaptured_error(Arc::new(|e: wgpu::Error| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        // --- 3. Configure Surface ---
        // Colors are 8-bit values meant to land in the target unchanged, so a
        // non-sRGB format is preferred.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("The surface reports no supported format for this adapter"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: window_size.0.max(1),
            height: window_size.1.max(1),
            present_mode: wgpu::PresentMode::Fifo, // Fifo is guaranteed to be supported
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Ok(WgpuGraphicsContext {
            surface,
            device,
            queue,
            surface_config,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            reconfigure_pending: false,
        })
    }

    /// Reconfigures the surface when the window is resized.
    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            log::debug!("WgpuGraphicsContext: Resizing surface to {new_width}x{new_height}");
            self.surface_config.width = new_width;
            self.surface_config.height = new_height;
            self.surface.configure(&self.device, &self.surface_config);
        } else {
            log::debug!(
                "WgpuGraphicsContext: Ignoring resize request to zero dimensions: {new_width}x{new_height}"
            );
        }
    }

    /// Acquires the next surface texture.
    ///
    /// A lost or outdated surface is reconfigured and the frame is skipped;
    /// the next call gets a fresh texture. A suboptimal texture is still
    /// drawn, and the surface is reconfigured before the following frame.
    pub fn acquire(&mut self) -> Option<wgpu::SurfaceTexture> {
        if std::mem::take(&mut self.reconfigure_pending) {
            self.surface.configure(&self.device, &self.surface_config);
        }

        let acquired = self.surface.get_current_texture();
        if needs_reconfigure(&acquired) {
            log::debug!(
                "WgpuGraphicsContext: Surface no longer matches its configuration, reconfiguring at {}x{}",
                self.surface_config.width,
                self.surface_config.height
            );
        }

        match acquired {
            CurrentSurfaceTexture::Success(texture) => Some(texture),
            CurrentSurfaceTexture::Suboptimal(texture) => {
                self.reconfigure_pending = true;
                Some(texture)
            }
            CurrentSurfaceTexture::Outdated | CurrentSurfaceTexture::Lost => {
                self.surface.configure(&self.device, &self.surface_config);
                None
            }
            CurrentSurfaceTexture::Timeout => {
                log::warn!("WgpuGraphicsContext: Timeout acquiring frame");
                None
            }
            CurrentSurfaceTexture::Occluded => {
                log::trace!("WgpuGraphicsContext: Window occluded, skipping frame");
                None
            }
            CurrentSurfaceTexture::Validation => {
                log::error!("WgpuGraphicsContext: Validation error while acquiring frame");
                None
            }
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }
}

/// Whether an acquire result means the surface configuration must be redone.
fn needs_reconfigure(acquired: &CurrentSurfaceTexture) -> bool {
    matches!(
        acquired,
        CurrentSurfaceTexture::Suboptimal(_)
            | CurrentSurfaceTexture::Outdated
            | CurrentSurfaceTexture::Lost
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lost_and_outdated_surfaces_are_reconfigured() {
        assert!(needs_reconfigure(&CurrentSurfaceTexture::Outdated));
        assert!(needs_reconfigure(&CurrentSurfaceTexture::Lost));
    }

    #[test]
    fn test_transient_acquire_failures_only_skip_the_frame() {
        assert!(!needs_reconfigure(&CurrentSurfaceTexture::Timeout));
        assert!(!needs_reconfigure(&CurrentSurfaceTexture::Occluded));
        assert!(!needs_reconfigure(&CurrentSurfaceTexture::Validation));
    }
}
