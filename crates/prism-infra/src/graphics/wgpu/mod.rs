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

//! The generic 2D backend, a thin wrapper over `wgpu`.
//!
//! The host names the native driver wgpu should bind to (see
//! [`backend::DRIVER_NAMES`]); each frame clears the surface and fills a
//! centered quad covering a quarter of the window.

pub mod backend;
mod context;
mod renderer;

pub use self::renderer::Wgpu2DRenderer;
