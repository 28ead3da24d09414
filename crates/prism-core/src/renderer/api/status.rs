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

//! Construction status of a renderer.

use std::fmt;

/// The outcome of a renderer's construction.
///
/// Every backend is constructible. When setup fails the instance still exists,
/// reports [`RendererStatus::Failed`] and turns `update`/`resize` into no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RendererStatus {
    /// All GPU objects were created; frames are presented.
    #[default]
    Ready,
    /// Setup failed. Nothing will be drawn by this instance.
    Failed {
        /// Human-readable cause, including the driver's error where available.
        reason: String,
    },
}

impl RendererStatus {
    /// Builds a failed status from anything displayable.
    pub fn failed(reason: impl fmt::Display) -> Self {
        RendererStatus::Failed {
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for [`RendererStatus::Ready`].
    pub fn is_ready(&self) -> bool {
        matches!(self, RendererStatus::Ready)
    }
}

impl fmt::Display for RendererStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererStatus::Ready => write!(f, "ready"),
            RendererStatus::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_status() {
        let status = RendererStatus::failed("no adapter");
        assert!(!status.is_ready());
        assert_eq!(status.to_string(), "failed: no adapter");
        assert!(RendererStatus::default().is_ready());
    }
}
