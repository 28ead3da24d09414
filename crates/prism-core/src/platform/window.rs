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

//! The window contract renderers are bound to.

use crate::renderer::error::RenderError;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use std::sync::Arc;

/// A shared, thread-safe handle to a window.
///
/// Renderers keep one for their whole lifetime, so the native window outlives
/// every surface created from it. It also lets a backend read the live window
/// size each frame.
pub type PrismWindowHandle = Arc<dyn PrismWindow>;

/// A trait that abstracts the behavior of a window.
///
/// Any windowing backend (winit, SDL, a test double...) can implement this
/// trait to have renderers attached to it.
pub trait PrismWindow: HasWindowHandle + HasDisplayHandle + Send + Sync {
    /// Returns the physical dimensions (width, height) of the window's inner area.
    fn inner_size(&self) -> (u32, u32);

    /// Requests that the window be redrawn.
    fn request_redraw(&self);

    /// Clones an Arc'd, thread-safe handle to the window.
    /// Renderers store this to keep their surface target alive.
    fn clone_handle_arc(&self) -> PrismWindowHandle;

    /// Returns a stable identifier for the window.
    fn id(&self) -> u64;
}

/// Extracts the raw window and display handles of `window`.
///
/// Backends call this before touching any graphics API, so a window that cannot
/// provide handles fails a renderer cheaply.
pub fn raw_handles(
    window: &dyn PrismWindow,
) -> Result<(RawWindowHandle, RawDisplayHandle), RenderError> {
    let raw_window = window.window_handle()?.as_raw();
    let raw_display = window.display_handle()?.as_raw();
    Ok((raw_window, raw_display))
}

#[cfg(test)]
mod tests {
    use super::*;
    use raw_window_handle::{DisplayHandle, HandleError, WindowHandle};

    struct Detached;

    impl PrismWindow for Detached {
        fn inner_size(&self) -> (u32, u32) {
            (480, 320)
        }

        fn request_redraw(&self) {}

        fn clone_handle_arc(&self) -> PrismWindowHandle {
            Arc::new(Detached)
        }

        fn id(&self) -> u64 {
            0
        }
    }

    impl HasWindowHandle for Detached {
        fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
            Err(HandleError::Unavailable)
        }
    }

    impl HasDisplayHandle for Detached {
        fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
            Err(HandleError::Unavailable)
        }
    }

    #[test]
    fn test_unavailable_handles_map_to_render_error() {
        let handle = Detached.clone_handle_arc();
        assert_eq!(handle.inner_size(), (480, 320));
        match raw_handles(handle.as_ref()) {
            Err(RenderError::WindowHandle(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected a window handle error, got {other:?}"),
        }
    }
}
