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

use anyhow::{anyhow, Context, Result};
use glutin::config::{Api, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    PossiblyCurrentGlContext, Version,
};
use glutin::display::{Display, DisplayApiPreference, GlDisplay};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::{c_void, CStr};
use std::num::NonZeroU32;

/// A double-buffered window surface with the OpenGL 3.3 core context bound to it.
///
/// Fields are dropped in declaration order: surface, then context, then display.
pub(super) struct WindowContext {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    display: Display,
}

impl WindowContext {
    /// Opens the platform GL display, picks a config with 8-bit alpha, 24-bit
    /// depth and 8-bit stencil, creates a 3.3 core context and makes it current
    /// on a new window surface.
    pub fn new(
        raw_window: RawWindowHandle,
        raw_display: RawDisplayHandle,
        (width, height): (u32, u32),
    ) -> Result<Self> {
        // --- 1. Display and framebuffer config ---
        let display = unsafe { Display::new(raw_display, display_preference(raw_window)) }
            .context("Failed to open a GL display")?;

        let template = ConfigTemplateBuilder::new()
            .with_api(Api::OPENGL)
            .with_alpha_size(8)
            .with_depth_size(24)
            .with_stencil_size(8)
            .with_single_buffering(false)
            .compatible_with_native_window(raw_window)
            .build();

        let config = unsafe { display.find_configs(template) }
            .context("Failed to enumerate GL framebuffer configs")?
            .next()
            .ok_or_else(|| anyhow!("No double-buffered GL config with D24S8 is available"))?;
        log::debug!(
            "GL config selected: depth {}, stencil {}, samples {}",
            config.depth_size(),
            config.stencil_size(),
            config.num_samples()
        );

        // --- 2. Context ---
        let attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_debug(cfg!(debug_assertions))
            .build(Some(raw_window));

        let not_current = unsafe { display.create_context(&config, &attributes) }
            .context("Failed to create an OpenGL 3.3 core context")?;

        // --- 3. Window surface ---
        let (width, height) = non_zero_size(width, height);
        let surface_attributes =
            SurfaceAttributesBuilder::<WindowSurface>::new().build(raw_window, width, height);
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
            .context("Failed to create the GL window surface")?;

        let context = not_current
            .make_current(&surface)
            .context("Failed to make the GL context current")?;

        if let Err(e) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
            log::warn!("WindowContext: vsync unavailable, presenting unthrottled: {e}");
        }

        Ok(Self {
            surface,
            context,
            display,
        })
    }

    /// Resolves a GL entry point, for `glow::Context::from_loader_function_cstr`.
    pub fn get_proc_address(&self, name: &CStr) -> *const c_void {
        self.display.get_proc_address(name)
    }

    /// Binds this context to the calling thread if another context is current.
    ///
    /// Several GL windows share the host's single thread, so this runs before
    /// every frame and every resize.
    pub fn make_current(&self) -> Result<()> {
        if !self.context.is_current() {
            self.context
                .make_current(&self.surface)
                .context("Failed to make the GL context current")?;
        }
        Ok(())
    }

    pub fn swap_buffers(&self) -> Result<()> {
        self.surface
            .swap_buffers(&self.context)
            .context("Failed to swap GL buffers")
    }

    /// Resizes the window surface. Some platforms (Wayland, EGL) need this
    /// before the new size takes effect.
    pub fn resize(&self, width: u32, height: u32) {
        let (width, height) = non_zero_size(width, height);
        self.surface.resize(&self.context, width, height);
    }
}

fn non_zero_size(width: u32, height: u32) -> (NonZeroU32, NonZeroU32) {
    (
        NonZeroU32::new(width).unwrap_or(NonZeroU32::MIN),
        NonZeroU32::new(height).unwrap_or(NonZeroU32::MIN),
    )
}

#[cfg(windows)]
fn display_preference(raw_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Wgl(Some(raw_window))
}

#[cfg(target_os = "macos")]
fn display_preference(_raw_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(not(any(windows, target_os = "macos")))]
fn display_preference(_raw_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Egl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_is_clamped_to_one_pixel() {
        let (w, h) = non_zero_size(0, 320);
        assert_eq!((w.get(), h.get()), (1, 320));
    }
}
