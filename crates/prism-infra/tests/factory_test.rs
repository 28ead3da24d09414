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

//! Integration tests for the renderer factory and the shared failure policy.
//!
//! The window used here cannot hand out native handles, so every backend
//! fails during setup without touching a GPU. That is exactly the path the
//! failure policy has to make safe.

use prism_core::platform::window::{PrismWindow, PrismWindowHandle};
use prism_core::renderer::{Renderer, RendererStatus, RendererType};
use prism_core::Rgba8;
use prism_infra::{create_ready_renderer, create_renderer};
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use std::sync::Arc;

/// A window without a native counterpart.
struct HeadlessWindow {
    id: u64,
}

impl PrismWindow for HeadlessWindow {
    fn inner_size(&self) -> (u32, u32) {
        (480, 320)
    }

    fn request_redraw(&self) {}

    fn clone_handle_arc(&self) -> PrismWindowHandle {
        Arc::new(HeadlessWindow { id: self.id })
    }

    fn id(&self) -> u64 {
        self.id
    }
}

impl HasWindowHandle for HeadlessWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasDisplayHandle for HeadlessWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Every renderer type this build can construct.
fn available_types() -> Vec<RendererType> {
    let mut types = Vec::new();
    if cfg!(feature = "opengl") {
        types.push(RendererType::OpenGL3_3);
    }
    if cfg!(feature = "vulkan") {
        types.push(RendererType::Vulkan);
    }
    if cfg!(feature = "wgpu") {
        types.push(RendererType::generic("auto"));
    }
    if cfg!(windows) {
        types.push(RendererType::Direct3D11);
        types.push(RendererType::Direct3D12);
    }
    types
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure policy
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_failed_setup_yields_a_failed_renderer() {
    init_logging();
    let window = HeadlessWindow { id: 1 };
    for kind in available_types() {
        let renderer = create_renderer(&window, &kind)
            .unwrap_or_else(|| panic!("{kind} should be constructible in this build"));
        match renderer.status() {
            RendererStatus::Failed { reason } => {
                assert!(!reason.is_empty(), "{kind} should explain its failure")
            }
            RendererStatus::Ready => panic!("{kind} cannot be ready without a native window"),
        }
        assert!(!renderer.is_ready());
    }
}

#[test]
fn test_failed_renderer_ignores_update_and_resize() {
    init_logging();
    let window = HeadlessWindow { id: 2 };
    for kind in available_types() {
        let mut renderer = create_renderer(&window, &kind).expect("renderer");
        renderer.initialize();
        for _ in 0..3 {
            renderer.update();
        }
        renderer.resize(800, 600);
        renderer.resize(0, 0);
        renderer.update();
        assert!(!renderer.is_ready());
    }
}

#[test]
fn test_create_ready_renderer_filters_failures() {
    init_logging();
    let window = HeadlessWindow { id: 3 };
    for kind in available_types() {
        assert!(
            create_ready_renderer(&window, &kind).is_none(),
            "{kind} must not be handed out as ready"
        );
    }
}

#[cfg(feature = "wgpu")]
#[test]
fn test_unknown_generic_driver_fails_with_its_name() {
    init_logging();
    let window = HeadlessWindow { id: 4 };
    let renderer = create_renderer(&window, &RendererType::generic("directfb")).expect("renderer");
    match renderer.status() {
        RendererStatus::Failed { reason } => {
            assert!(reason.contains("directfb"), "unexpected reason: {reason}");
            assert!(reason.contains("vulkan"), "available drivers should be listed");
        }
        RendererStatus::Ready => panic!("an unknown driver cannot be ready"),
    }
    assert!(renderer.name().contains("directfb"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory selection
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(windows))]
#[test]
fn test_direct3d_is_unavailable_off_windows() {
    init_logging();
    let window = HeadlessWindow { id: 5 };
    assert!(create_renderer(&window, &RendererType::Direct3D11).is_none());
    assert!(create_renderer(&window, &RendererType::Direct3D12).is_none());
}

#[test]
fn test_names_are_distinct_and_non_empty() {
    init_logging();
    let window = HeadlessWindow { id: 6 };
    let mut names: Vec<String> = available_types()
        .iter()
        .filter_map(|kind| create_renderer(&window, kind))
        .map(|renderer| renderer.name().to_string())
        .collect();
    assert!(names.iter().all(|name| !name.is_empty()));

    let count = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), count, "backend names must be distinct");
}

// ─────────────────────────────────────────────────────────────────────────────
// Colors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_colors_are_adjustable_on_any_instance() {
    init_logging();
    let window = HeadlessWindow { id: 7 };
    for kind in available_types() {
        let mut renderer = create_renderer(&window, &kind).expect("renderer");
        assert_eq!(renderer.clear_color(), Rgba8::new(0, 0, 255, 255));
        assert_eq!(renderer.triangle_color(), Rgba8::RED);

        renderer.set_clear_color(Rgba8::new(100, 100, 100, 128));
        renderer.set_triangle_color(Rgba8::GREEN);
        assert_eq!(renderer.clear_color(), Rgba8::new(100, 100, 100, 128));
        assert_eq!(renderer.triangle_color(), Rgba8::GREEN);
    }
}
