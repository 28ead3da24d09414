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

use super::context::WindowContext;
use super::debug;
use super::pipeline::TrianglePipeline;
use crate::graphics::settle_setup;
use anyhow::Result;
use glow::HasContext;
use prism_core::math::Rgba8;
use prism_core::platform::window::{raw_handles, PrismWindow, PrismWindowHandle};
use prism_core::renderer::{Renderer, RendererColors, RendererStatus};

const NAME: &str = "OpenGL 3.3";

/// Everything that only exists once the context is up.
struct GlState {
    pipeline: TrianglePipeline,
    gl: glow::Context,
    context: WindowContext,
}

impl GlState {
    fn new(window: &dyn PrismWindow) -> Result<Self> {
        let (raw_window, raw_display) = raw_handles(window)?;
        let context = WindowContext::new(raw_window, raw_display, window.inner_size())?;

        let mut gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| context.get_proc_address(name))
        };
        log::info!(
            "GlRenderer: context created ({} / {})",
            unsafe { gl.get_parameter_string(glow::VERSION) },
            unsafe { gl.get_parameter_string(glow::RENDERER) }
        );
        debug::install(&mut gl);

        let pipeline = unsafe { TrianglePipeline::new(&gl)? };
        Ok(Self {
            pipeline,
            gl,
            context,
        })
    }

    fn draw_frame(&self, (width, height): (u32, u32), clear: Rgba8) -> Result<()> {
        self.context.make_current()?;

        // The clear color is premultiplied by its own alpha.
        let [r, g, b, a] = clear.to_premultiplied();
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
            self.pipeline.draw(&self.gl);
        }

        self.context.swap_buffers()
    }
}

impl Drop for GlState {
    fn drop(&mut self) {
        if let Err(e) = self.context.make_current() {
            log::warn!("GlRenderer: could not bind context for teardown, GL objects leak with it: {e:#}");
            return;
        }
        unsafe { self.pipeline.destroy(&self.gl) };
    }
}

/// Renders the triangle through an OpenGL 3.3 core context.
///
/// The viewport is recomputed from the live window size every frame, so a
/// resize only has to tell the window surface about its new size.
pub struct GlRenderer {
    state: Option<GlState>,
    colors: RendererColors,
    status: RendererStatus,
    window: PrismWindowHandle,
}

impl GlRenderer {
    /// Creates the context, compiles the shaders and uploads the triangle.
    ///
    /// Never fails: a setup error is logged and reported through
    /// [`Renderer::status`].
    pub fn new(window: &dyn PrismWindow) -> Self {
        let window = window.clone_handle_arc();
        let (state, status) = settle_setup(NAME, GlState::new(window.as_ref()));
        Self {
            state,
            colors: RendererColors::default(),
            status,
            window,
        }
    }
}

impl Renderer for GlRenderer {
    fn update(&mut self) {
        let Some(state) = &self.state else {
            return;
        };
        if let Err(e) = state.draw_frame(self.window.inner_size(), self.colors.clear) {
            log::warn!("GlRenderer: frame dropped: {e:#}");
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(state) = &self.state else {
            return;
        };
        if width == 0 || height == 0 {
            log::debug!("GlRenderer: ignoring resize to {width}x{height}");
            return;
        }
        match state.context.make_current() {
            Ok(()) => state.context.resize(width, height),
            Err(e) => log::warn!("GlRenderer: resize skipped: {e:#}"),
        }
    }

    fn name(&self) -> &str {
        NAME
    }

    fn status(&self) -> &RendererStatus {
        &self.status
    }

    fn colors(&self) -> &RendererColors {
        &self.colors
    }

    fn colors_mut(&mut self) -> &mut RendererColors {
        &mut self.colors
    }
}
