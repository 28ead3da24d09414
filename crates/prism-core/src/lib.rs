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

//! # Prism Core
//!
//! Foundational crate containing the renderer contract, the geometry shared by
//! every backend, and the plain types a host needs to drive them.
//!
//! Nothing in here talks to a graphics API. Concrete backends live in
//! `prism-infra` and implement [`renderer::Renderer`].

#![warn(missing_docs)]

pub mod config;
pub mod math;
pub mod platform;
pub mod renderer;

pub use config::{ConfigError, HostConfig, WindowConfig};
pub use math::Rgba8;
pub use renderer::{Renderer, RendererStatus, RendererType};
