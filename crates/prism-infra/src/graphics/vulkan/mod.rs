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

//! Vulkan backend built directly on `ash`.
//!
//! - [`bootstrap`]: instance, validation, surface, physical/logical device.
//! - [`queue`]: multi-buffered command submission ([`queue::VulkanQueue`]).
//! - [`swapchain`]: swapchain, image views and framebuffers.
//! - [`pipeline`]: render pass, triangle pipeline and vertex buffer.
//!
//! Every object wrapper owns a clone of the `ash::Device` dispatch table and
//! destroys its handles on drop, so a setup that fails half-way releases what
//! it already created in reverse order.

pub mod bootstrap;
mod debug;
pub mod pipeline;
pub mod queue;
mod renderer;
pub mod swapchain;

pub use self::renderer::VulkanRenderer;

/// Command buffers in the graphics and present queues.
pub const FRAMES_IN_FLIGHT: usize = 3;

/// Command buffers in the transfer queue, sized for batched uploads.
pub const TRANSFER_BUFFER_COUNT: usize = 30;
