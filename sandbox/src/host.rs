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

//! The winit application that owns the windows and their renderers.

use prism_core::platform::window::PrismWindow;
use prism_core::renderer::Renderer;
use prism_core::{HostConfig, WindowConfig};
use prism_infra::{create_renderer, WinitWindow, WinitWindowBuilder};
use std::collections::HashMap;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::WindowId;

/// A window and the renderer bound to it.
///
/// Field order matters: the renderer is dropped before the window it draws into.
struct HostedWindow {
    renderer: Box<dyn Renderer>,
    window: WinitWindow,
    frames: u64,
}

/// Drives every configured window from the winit event loop.
pub struct SandboxHost {
    config: HostConfig,
    frame_limit: Option<u64>,
    windows: HashMap<WindowId, HostedWindow>,
    started: bool,
}

impl SandboxHost {
    pub fn new(config: HostConfig, frame_limit: Option<u64>) -> Self {
        Self {
            config,
            frame_limit,
            windows: HashMap::new(),
            started: false,
        }
    }

    /// Opens one window and binds the configured backend to it.
    ///
    /// A backend that fails its setup is kept: it draws nothing, but its
    /// window stays open and the other windows are unaffected.
    fn open_window(&mut self, event_loop: &ActiveEventLoop, config: &WindowConfig) {
        // --- 1. Resolve the backend ---
        let kind = match config.renderer_type() {
            Ok(kind) => kind,
            Err(e) => {
                log::error!("Sandbox: skipping window '{}': {e}", config.display_title());
                return;
            }
        };

        // --- 2. Create the native window ---
        let window = match WinitWindowBuilder::new()
            .with_title(config.display_title())
            .with_dimensions(config.width, config.height)
            .build(event_loop)
        {
            Ok(window) => window,
            Err(e) => {
                log::error!("Sandbox: failed to create window for '{kind}': {e}");
                return;
            }
        };

        // --- 3. Bind a renderer ---
        let Some(mut renderer) = create_renderer(&window, &kind) else {
            log::error!("Sandbox: '{kind}' is not available in this build, closing its window");
            return;
        };
        if let Some(color) = config.clear_color {
            renderer.set_clear_color(color);
        }
        if let Some(color) = config.triangle_color {
            renderer.set_triangle_color(color);
        }
        renderer.initialize();

        log::info!(
            "Sandbox: window '{}' uses {} ({})",
            config.display_title(),
            renderer.name(),
            renderer.status()
        );

        self.windows.insert(
            window.winit_id(),
            HostedWindow {
                renderer,
                window,
                frames: 0,
            },
        );
    }

    /// Whether every open window has rendered the requested number of frames.
    fn frame_limit_reached(&self) -> bool {
        match self.frame_limit {
            Some(limit) => self.windows.values().all(|hosted| hosted.frames >= limit),
            None => false,
        }
    }
}

impl ApplicationHandler for SandboxHost {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return; // Windows survive a suspend/resume cycle.
        }
        self.started = true;

        let configs = self.config.windows.clone();
        for config in &configs {
            self.open_window(event_loop, config);
        }

        if self.windows.is_empty() {
            log::error!("Sandbox: no window could be opened, exiting");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(hosted) = self.windows.remove(&id) {
                    log::info!("Sandbox: closing {}", hosted.renderer.name());
                    let HostedWindow {
                        renderer, window, ..
                    } = hosted;
                    drop(renderer);
                    drop(window);
                }
                if self.windows.is_empty() {
                    log::info!("Sandbox: last window closed, exiting event loop...");
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(hosted) = self.windows.get_mut(&id) {
                    log::debug!(
                        "Sandbox: {} resized to {}x{}",
                        hosted.renderer.name(),
                        size.width,
                        size.height
                    );
                    hosted.renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(hosted) = self.windows.get_mut(&id) {
                    hosted.renderer.update();
                    hosted.frames += 1;
                    log::trace!("Sandbox: {} frame {}", hosted.renderer.name(), hosted.frames);
                }
                if self.frame_limit_reached() {
                    log::info!("Sandbox: frame limit reached, exiting event loop...");
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    /// Requests a redraw of every window so each renders continuously.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        for hosted in self.windows.values() {
            hosted.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Renderers go first; each still needs its window while tearing down.
        for (_, hosted) in self.windows.drain() {
            let HostedWindow {
                renderer, window, ..
            } = hosted;
            drop(renderer);
            drop(window);
        }
        log::info!("Sandbox: all renderers released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_limit_without_windows() {
        let host = SandboxHost::new(HostConfig::default(), Some(3));
        // With nothing open, `all` is vacuously true.
        assert!(host.frame_limit_reached());

        let host = SandboxHost::new(HostConfig::default(), None);
        assert!(!host.frame_limit_reached());
    }
}
