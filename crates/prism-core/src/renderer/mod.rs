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

//! Provides the backend-agnostic rendering contract.
//!
//! This module defines the "common language" shared by all backends: the
//! [`Renderer`] trait, the fixed triangle every backend draws, the closed set of
//! [`RendererType`]s a host may request, and the error and status types a
//! backend reports through.
//!
//! The 'how' lives in `prism-infra`, which holds one implementation of
//! [`Renderer`] per graphics API.

pub mod api;
pub mod error;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{RenderError, ShaderStage};
pub use self::traits::{Renderer, RendererColors};
