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

use anyhow::{anyhow, Result};
use windows::core::Interface;
use windows::Win32::Graphics::Direct3D::D3D_FEATURE_LEVEL;
use windows::Win32::Graphics::Direct3D12::{D3D12CreateDevice, ID3D12Device};
use windows::Win32::Graphics::Dxgi::*;

/// A hardware adapter able to create a device at the requested level.
pub(super) struct SelectedAdapter {
    pub adapter: IDXGIAdapter1,
    pub name: String,
}

/// Picks the first hardware adapter supporting `level`.
///
/// Adapters are ordered by GPU preference when the factory can do it
/// (`IDXGIFactory6`), otherwise in enumeration order.
pub(super) fn select_adapter(
    factory: &IDXGIFactory4,
    level: D3D_FEATURE_LEVEL,
) -> Result<SelectedAdapter> {
    let by_preference = factory.cast::<IDXGIFactory6>().ok();
    if by_preference.is_none() {
        log::debug!("D3D12Renderer: IDXGIFactory6 unavailable, enumerating adapters in order");
    }

    for index in 0.. {
        let enumerated = match &by_preference {
            Some(factory6) => unsafe {
                factory6.EnumAdapterByGpuPreference::<IDXGIAdapter1>(
                    index,
                    DXGI_GPU_PREFERENCE_HIGH_PERFORMANCE,
                )
            },
            None => unsafe { factory.EnumAdapters1(index) },
        };
        // DXGI_ERROR_NOT_FOUND ends the enumeration.
        let Ok(adapter) = enumerated else {
            break;
        };

        let desc = unsafe { adapter.GetDesc1()? };
        let name = adapter_name(&desc.Description);
        if desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32 != 0 {
            log::debug!("D3D12Renderer: skipping software adapter \"{name}\"");
            continue;
        }

        let supported = unsafe {
            D3D12CreateDevice(&adapter, level, std::ptr::null_mut::<Option<ID3D12Device>>())
        }
        .is_ok();
        if supported {
            return Ok(SelectedAdapter { adapter, name });
        }
        log::debug!("D3D12Renderer: \"{name}\" lacks feature level {:#x}", level.0);
    }

    Err(anyhow!("No hardware adapter supports feature level {:#x}", level.0))
}

/// Decodes the NUL-terminated UTF-16 adapter description.
fn adapter_name(description: &[u16]) -> String {
    let len = description
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(description.len());
    String::from_utf16_lossy(&description[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_name_stops_at_nul() {
        let mut raw = [0u16; 128];
        for (slot, c) in raw.iter_mut().zip("Test GPU".encode_utf16()) {
            *slot = c;
        }
        assert_eq!(adapter_name(&raw), "Test GPU");
        assert_eq!(adapter_name(&[]), "");
    }
}
