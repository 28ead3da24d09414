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

//! The geometry every backend draws.
//!
//! The triangle is expressed directly in clip space, so no transform is needed
//! on any backend. It is immutable and shared read-only by all renderer
//! instances.

/// One triangle as three `(x, y, z)` positions in clip space.
pub const TRIANGLE_VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0, //
    0.5, -0.5, 0.0, //
    0.0, 0.5, 0.0,
];

/// Number of `f32` components per vertex.
pub const VERTEX_COMPONENTS: u32 = 3;

/// Distance in bytes between two consecutive vertices.
pub const VERTEX_STRIDE: u32 = VERTEX_COMPONENTS * std::mem::size_of::<f32>() as u32;

/// Byte offset of the position attribute inside a vertex.
pub const VERTEX_OFFSET: u32 = 0;

/// Number of vertices in [`TRIANGLE_VERTICES`].
pub const VERTEX_COUNT: u32 = TRIANGLE_VERTICES.len() as u32 / VERTEX_COMPONENTS;

/// Returns [`TRIANGLE_VERTICES`] as raw bytes, ready for a buffer upload.
pub fn triangle_bytes() -> &'static [u8] {
    bytemuck::cast_slice(&TRIANGLE_VERTICES)
}

/// An axis-aligned rectangle in window pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl QuadRect {
    /// The rectangle centered in a `width` x `height` window, half as wide and
    /// half as tall as the window, so it covers a quarter of its area.
    ///
    /// Integer division is applied exactly as `{cx - cx/2, cy - cy/2, cx, cy}`
    /// with `cx = width / 2` and `cy = height / 2`.
    pub fn centered_quarter(width: u32, height: u32) -> Self {
        let cx = (width / 2) as i32;
        let cy = (height / 2) as i32;
        Self {
            x: cx - cx / 2,
            y: cy - cy / 2,
            width: cx,
            height: cy,
        }
    }

    /// Returns `true` if the rectangle covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns `true` if the pixel at `(px, py)` lies inside the rectangle.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.width && py < self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(VERTEX_STRIDE, 12);
        assert_eq!(VERTEX_OFFSET, 0);
        assert_eq!(VERTEX_COUNT, 3);
        assert_eq!(triangle_bytes().len(), 36);
    }

    #[test]
    fn test_triangle_positions() {
        let positions: Vec<&[f32]> = TRIANGLE_VERTICES.chunks(3).collect();
        assert_eq!(positions[0], [-0.5, -0.5, 0.0]);
        assert_eq!(positions[1], [0.5, -0.5, 0.0]);
        assert_eq!(positions[2], [0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_triangle_is_counter_clockwise() {
        let v = &TRIANGLE_VERTICES;
        let signed_area = (v[3] - v[0]) * (v[7] - v[1]) - (v[6] - v[0]) * (v[4] - v[1]);
        assert!(signed_area > 0.0);
    }

    #[test]
    fn test_centered_quarter_for_even_window() {
        let rect = QuadRect::centered_quarter(480, 320);
        assert_eq!(
            rect,
            QuadRect {
                x: 120,
                y: 80,
                width: 240,
                height: 160
            }
        );
        assert!(rect.contains(240, 160));
        assert!(!rect.contains(0, 0));
        assert_eq!(
            (rect.width * rect.height) as u32 * 4,
            480 * 320,
            "the quad covers a quarter of the window"
        );
    }

    #[test]
    fn test_centered_quarter_uses_integer_division() {
        let rect = QuadRect::centered_quarter(7, 5);
        // cx = 3, cy = 2
        assert_eq!(
            rect,
            QuadRect {
                x: 2,
                y: 1,
                width: 3,
                height: 2
            }
        );
    }

    #[test]
    fn test_degenerate_window_yields_empty_quad() {
        assert!(QuadRect::centered_quarter(1, 1).is_empty());
        assert!(QuadRect::centered_quarter(0, 600).is_empty());
        assert!(!QuadRect::centered_quarter(2, 2).is_empty());
    }
}
