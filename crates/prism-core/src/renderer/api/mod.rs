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

//! Plain data types shared by the renderer contract and its backends.

pub mod frame_ring;
pub mod geometry;
pub mod renderer_type;
pub mod status;

pub use self::frame_ring::{FrameRing, FrameTicket};
pub use self::geometry::{
    triangle_bytes, QuadRect, TRIANGLE_VERTICES, VERTEX_COMPONENTS, VERTEX_COUNT, VERTEX_OFFSET,
    VERTEX_STRIDE,
};
pub use self::renderer_type::{ParseRendererTypeError, RendererType};
pub use self::status::RendererStatus;
