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

use crate::math::Rgba8;
use crate::renderer::api::status::RendererStatus;

/// The mutable per-instance colors of a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererColors {
    /// The color the target is cleared to before drawing.
    pub clear: Rgba8,
    /// The color of the shape drawn on top.
    ///
    /// Shader-based backends draw their triangle in a fixed color baked into
    /// the embedded shaders; the generic backend fills its quad with this one.
    pub triangle: Rgba8,
}

impl Default for RendererColors {
    fn default() -> Self {
        Self {
            clear: Rgba8::BLUE,
            triangle: Rgba8::RED,
        }
    }
}

/// The contract every graphics backend satisfies.
///
/// A renderer is created fully set up by the factory in `prism-infra`,
/// bound to one window, and then driven by the host from a single thread:
/// one [`update`](Renderer::update) per frame and a [`resize`](Renderer::resize)
/// whenever the window reports a new size.
///
/// Construction can fail. A failed renderer still implements this trait:
/// [`status`](Renderer::status) reports the failure and `update`/`resize`
/// do nothing.
pub trait Renderer {
    /// Hook for setup that has to happen after construction.
    ///
    /// Backends perform all their setup while being constructed, so the
    /// default does nothing.
    fn initialize(&mut self) {}

    /// Renders and presents exactly one frame.
    ///
    /// Safe to call at whatever cadence the host chooses; steady-state calls do
    /// not allocate new GPU objects.
    fn update(&mut self);

    /// Rebuilds the surfaces that depend on the window size.
    ///
    /// Calling it with the current size is harmless, and zero dimensions
    /// (a minimized window) are ignored.
    ///
    /// ## Arguments
    /// * `width` - The new width of the window's inner area, in pixels.
    /// * `height` - The new height of the window's inner area, in pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// A stable, non-empty, human-readable identifier of the backend.
    fn name(&self) -> &str;

    /// Whether construction succeeded.
    fn status(&self) -> &RendererStatus;

    /// The colors currently used by this instance.
    fn colors(&self) -> &RendererColors;

    /// Mutable access to the colors used by this instance.
    fn colors_mut(&mut self) -> &mut RendererColors;

    /// Returns `true` if the renderer is able to present frames.
    fn is_ready(&self) -> bool {
        self.status().is_ready()
    }

    /// The color the target is cleared to.
    fn clear_color(&self) -> Rgba8 {
        self.colors().clear
    }

    /// Sets the color the target is cleared to. Takes effect on the next frame.
    fn set_clear_color(&mut self, color: Rgba8) {
        self.colors_mut().clear = color;
    }

    /// The color of the drawn shape.
    fn triangle_color(&self) -> Rgba8 {
        self.colors().triangle
    }

    /// Sets the color of the drawn shape. Takes effect on the next frame.
    fn set_triangle_color(&mut self, color: Rgba8) {
        self.colors_mut().triangle = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A renderer that only counts calls, to exercise the provided methods.
    struct CountingRenderer {
        colors: RendererColors,
        status: RendererStatus,
        frames: u32,
        last_size: Option<(u32, u32)>,
    }

    impl Renderer for CountingRenderer {
        fn update(&mut self) {
            if self.status.is_ready() {
                self.frames += 1;
            }
        }

        fn resize(&mut self, width: u32, height: u32) {
            if self.status.is_ready() && width > 0 && height > 0 {
                self.last_size = Some((width, height));
            }
        }

        fn name(&self) -> &str {
            "Counting"
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

    fn counting(status: RendererStatus) -> CountingRenderer {
        CountingRenderer {
            colors: RendererColors::default(),
            status,
            frames: 0,
            last_size: None,
        }
    }

    #[test]
    fn test_default_colors() {
        let renderer = counting(RendererStatus::Ready);
        assert_eq!(renderer.clear_color(), Rgba8::new(0, 0, 255, 255));
        assert_eq!(renderer.triangle_color(), Rgba8::new(255, 0, 0, 255));
    }

    #[test]
    fn test_color_setters_through_trait_object() {
        let mut renderer: Box<dyn Renderer> = Box::new(counting(RendererStatus::Ready));
        renderer.initialize();
        renderer.set_clear_color(Rgba8::new(100, 100, 100, 128));
        renderer.set_triangle_color(Rgba8::GREEN);
        assert_eq!(renderer.clear_color(), Rgba8::new(100, 100, 100, 128));
        assert_eq!(renderer.triangle_color(), Rgba8::GREEN);
        assert!(renderer.is_ready());
    }

    #[test]
    fn test_failed_renderer_ignores_calls() {
        let mut renderer = counting(RendererStatus::failed("no device"));
        renderer.update();
        renderer.resize(800, 600);
        assert_eq!(renderer.frames, 0);
        assert_eq!(renderer.last_size, None);
        assert!(!renderer.is_ready());
    }
}
