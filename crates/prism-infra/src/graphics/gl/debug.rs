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

//! Forwards `KHR_debug` messages to the `log` facade.

use glow::HasContext;

/// Registers the debug callback if the context exposes debug output.
pub(super) fn install(gl: &mut glow::Context) {
    if !gl.supports_debug() {
        log::debug!("GlRenderer: debug output not supported by this context");
        return;
    }
    unsafe {
        gl.enable(glow::DEBUG_OUTPUT);
        gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
        gl.debug_message_callback(forward_message);
    }
    log::debug!("GlRenderer: debug output enabled");
}

fn forward_message(source: u32, kind: u32, id: u32, severity: u32, message: &str) {
    if let Some(level) = log_level(severity) {
        log::log!(
            level,
            "GL debug [{} {} #{id}]: {message}",
            source_name(source),
            type_name(kind)
        );
    }
}

/// Maps a GL debug severity to a log level. Notifications are dropped.
fn log_level(severity: u32) -> Option<log::Level> {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => Some(log::Level::Error),
        glow::DEBUG_SEVERITY_MEDIUM | glow::DEBUG_SEVERITY_LOW => Some(log::Level::Warn),
        glow::DEBUG_SEVERITY_NOTIFICATION => None,
        _ => Some(log::Level::Info),
    }
}

fn source_name(source: u32) -> &'static str {
    match source {
        glow::DEBUG_SOURCE_API => "api",
        glow::DEBUG_SOURCE_WINDOW_SYSTEM => "window-system",
        glow::DEBUG_SOURCE_SHADER_COMPILER => "shader-compiler",
        glow::DEBUG_SOURCE_THIRD_PARTY => "third-party",
        glow::DEBUG_SOURCE_APPLICATION => "application",
        _ => "other",
    }
}

fn type_name(kind: u32) -> &'static str {
    match kind {
        glow::DEBUG_TYPE_ERROR => "error",
        glow::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "deprecated",
        glow::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "undefined",
        glow::DEBUG_TYPE_PORTABILITY => "portability",
        glow::DEBUG_TYPE_PERFORMANCE => "performance",
        glow::DEBUG_TYPE_MARKER => "marker",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_are_dropped() {
        assert_eq!(log_level(glow::DEBUG_SEVERITY_NOTIFICATION), None);
    }

    #[test]
    fn test_severities_map_to_levels() {
        assert_eq!(log_level(glow::DEBUG_SEVERITY_HIGH), Some(log::Level::Error));
        assert_eq!(log_level(glow::DEBUG_SEVERITY_MEDIUM), Some(log::Level::Warn));
        assert_eq!(log_level(glow::DEBUG_SEVERITY_LOW), Some(log::Level::Warn));
    }

    #[test]
    fn test_names() {
        assert_eq!(source_name(glow::DEBUG_SOURCE_SHADER_COMPILER), "shader-compiler");
        assert_eq!(type_name(glow::DEBUG_TYPE_PERFORMANCE), "performance");
        assert_eq!(type_name(0), "other");
    }
}
