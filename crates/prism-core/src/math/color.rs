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

//! Defines the `Rgba8` color type and its conversions to GPU-ready values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A color with four 8-bit channels, stored in the order red, green, blue, alpha.
///
/// This is the color type every renderer exposes for its clear and triangle
/// colors. Because each channel is a `u8`, an out-of-range channel cannot be
/// represented; conversion to the floating-point form a graphics API expects
/// happens at the point of use.
///
/// In configuration files a color is written as a four-element array,
/// e.g. `clear_color = [0, 0, 255, 255]`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
#[repr(C)]
pub struct Rgba8 {
    /// The red channel.
    pub r: u8,
    /// The green channel.
    pub g: u8,
    /// The blue channel.
    pub b: u8,
    /// The alpha channel. `255` is fully opaque.
    pub a: u8,
}

impl Rgba8 {
    // --- Common Color Constants ---

    /// Opaque black (`{0, 0, 0, 255}`).
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white (`{255, 255, 255, 255}`).
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Opaque red (`{255, 0, 0, 255}`).
    pub const RED: Self = Self::new(255, 0, 0, 255);
    /// Opaque green (`{0, 255, 0, 255}`).
    pub const GREEN: Self = Self::new(0, 255, 0, 255);
    /// Opaque blue (`{0, 0, 255, 255}`).
    pub const BLUE: Self = Self::new(0, 0, 255, 255);

    /// Creates a new color from explicit channel values.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the channels as `[r, g, b, a]`.
    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Converts every channel to the `0.0..=1.0` range by dividing by 255.
    #[inline]
    pub fn to_normalized(self) -> [f32; 4] {
        self.to_array().map(|c| c as f32 / 255.0)
    }

    /// Returns the normalized color with red, green and blue multiplied by
    /// the normalized alpha. Alpha itself is left untouched.
    ///
    /// `{100, 100, 100, 128}` premultiplies to roughly `50 / 255` per color channel.
    #[inline]
    pub fn to_premultiplied(self) -> [f32; 4] {
        let [r, g, b, a] = self.to_normalized();
        [r * a, g * a, b * a, a]
    }

    /// Normalized channels widened to `f64`, the precision some APIs take clear values in.
    #[inline]
    pub fn to_f64_array(self) -> [f64; 4] {
        self.to_array().map(|c| c as f64 / 255.0)
    }
}

impl Default for Rgba8 {
    /// Returns opaque black.
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<Rgba8> for [u8; 4] {
    fn from(color: Rgba8) -> Self {
        color.to_array()
    }
}

impl fmt::Display for Rgba8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}, {}, {}}}", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalized_conversion() {
        let [r, g, b, a] = Rgba8::BLUE.to_normalized();
        assert_relative_eq!(r, 0.0);
        assert_relative_eq!(g, 0.0);
        assert_relative_eq!(b, 1.0);
        assert_relative_eq!(a, 1.0);

        let [r, ..] = Rgba8::new(51, 0, 0, 0).to_normalized();
        assert_relative_eq!(r, 0.2);
    }

    #[test]
    fn test_premultiplied_halves_half_transparent_color() {
        let color = Rgba8::new(100, 100, 100, 128);
        let [r, g, b, a] = color.to_premultiplied();

        let expected = (100.0 / 255.0) * (128.0 / 255.0);
        assert_relative_eq!(r, expected, epsilon = 1e-6);
        assert_relative_eq!(g, expected, epsilon = 1e-6);
        assert_relative_eq!(b, expected, epsilon = 1e-6);
        assert_relative_eq!(a, 128.0 / 255.0, epsilon = 1e-6);

        // ~50 once written back into an 8-bit target.
        assert_eq!((r * 255.0).round() as u8, 50);
    }

    #[test]
    fn test_opaque_color_is_unchanged_by_premultiplication() {
        let color = Rgba8::new(12, 200, 77, 255);
        assert_eq!(color.to_premultiplied(), color.to_normalized());
    }

    #[test]
    fn test_array_conversions_and_display() {
        let color: Rgba8 = [1, 2, 3, 4].into();
        assert_eq!(color, Rgba8::new(1, 2, 3, 4));
        assert_eq!(<[u8; 4]>::from(color), [1, 2, 3, 4]);
        assert_eq!(color.to_string(), "{1, 2, 3, 4}");
        assert_eq!(Rgba8::default(), Rgba8::BLACK);
    }

    #[test]
    fn test_f64_conversion_matches_f32() {
        let color = Rgba8::new(255, 128, 0, 64);
        let narrow = color.to_normalized();
        let wide = color.to_f64_array();
        for (n, w) in narrow.iter().zip(wide.iter()) {
            assert_relative_eq!(*n as f64, *w, epsilon = 1e-6);
        }
    }
}
