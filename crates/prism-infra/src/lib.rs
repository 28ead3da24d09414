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

//! Provides concrete implementations of the `prism-core` contracts.
//!
//! Each graphics API lives in its own module under [`graphics`] and implements
//! [`prism_core::Renderer`]. The factory in [`graphics`] picks one for a
//! [`prism_core::RendererType`]. [`platform`] adapts winit windows to
//! [`prism_core::platform::PrismWindow`].

pub mod graphics;
pub mod platform;

pub use graphics::{create_ready_renderer, create_renderer};
pub use platform::window::{WinitWindow, WinitWindowBuilder};
