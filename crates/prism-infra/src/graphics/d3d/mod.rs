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

//! Pieces shared by the Direct3D 11 and 12 backends.

use anyhow::Result;
use prism_core::platform::window::{raw_handles, PrismWindow};
use prism_core::renderer::{RenderError, ShaderStage};
use raw_window_handle::RawWindowHandle;
use std::ffi::c_void;
use windows::core::{s, PCSTR};
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D::Fxc::{
    D3DCompile, D3DCOMPILE_DEBUG, D3DCOMPILE_ENABLE_STRICTNESS, D3DCOMPILE_SKIP_OPTIMIZATION,
};
use windows::Win32::Graphics::Direct3D::ID3DBlob;

/// The triangle shaders for both Direct3D backends.
pub(crate) const TRIANGLE_HLSL: &str = r#"
struct VSOutput {
    float4 position : SV_POSITION;
};

VSOutput vs_main(float3 position : POSITION) {
    VSOutput output;
    output.position = float4(position, 1.0);
    return output;
}

float4 ps_main(VSOutput input) : SV_TARGET {
    return float4(1.0, 0.5, 0.2, 1.0);
}
"#;

/// Returns the Win32 window behind `window`.
pub(crate) fn window_hwnd(window: &dyn PrismWindow) -> Result<HWND> {
    let (raw_window, _) = raw_handles(window)?;
    match raw_window {
        RawWindowHandle::Win32(handle) => Ok(HWND(handle.hwnd.get() as *mut c_void)),
        other => Err(RenderError::UnsupportedPlatform(format!(
            "Direct3D needs a Win32 window, got {other:?}"
        ))
        .into()),
    }
}

/// Compiles one stage of [`TRIANGLE_HLSL`] with FXC.
pub(crate) fn compile_triangle_shader(stage: ShaderStage) -> Result<ID3DBlob, RenderError> {
    let (entry_point, target) = match stage {
        ShaderStage::Vertex => (s!("vs_main"), s!("vs_5_0")),
        ShaderStage::Fragment => (s!("ps_main"), s!("ps_5_0")),
    };
    let flags = if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        D3DCOMPILE_ENABLE_STRICTNESS
    };

    let mut code: Option<ID3DBlob> = None;
    let mut errors: Option<ID3DBlob> = None;
    let compiled = unsafe {
        D3DCompile(
            TRIANGLE_HLSL.as_ptr() as *const c_void,
            TRIANGLE_HLSL.len(),
            PCSTR::null(),
            None,
            None,
            entry_point,
            target,
            flags,
            0,
            &mut code,
            Some(&mut errors),
        )
    };

    match (compiled, code) {
        (Ok(()), Some(code)) => Ok(code),
        (result, _) => {
            let log = errors
                .map(|blob| String::from_utf8_lossy(blob_bytes(&blob)).trim_end().to_string())
                .or_else(|| result.err().map(|e| e.to_string()))
                .unwrap_or_else(|| "the compiler produced no bytecode".to_string());
            Err(RenderError::ShaderCompilation { stage, log })
        }
    }
}

/// Views the contents of a blob.
pub(crate) fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_shaders_compile() {
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            let blob = compile_triangle_shader(stage).unwrap();
            assert!(!blob_bytes(&blob).is_empty());
        }
    }
}
