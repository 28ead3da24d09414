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

use crate::graphics::d3d::{blob_bytes, compile_triangle_shader, window_hwnd};
use crate::graphics::settle_setup;
use anyhow::{anyhow, Context, Result};
use prism_core::math::Rgba8;
use prism_core::platform::window::{PrismWindow, PrismWindowHandle};
use prism_core::renderer::{
    triangle_bytes, Renderer, RendererColors, RendererStatus, ShaderStage, VERTEX_COUNT,
    VERTEX_OFFSET, VERTEX_STRIDE,
};
use std::ffi::c_void;
use windows::core::s;
use windows::Win32::Foundation::{HMODULE, HWND, TRUE};
use windows::Win32::Graphics::Direct3D::{
    D3D_DRIVER_TYPE_HARDWARE, D3D_FEATURE_LEVEL, D3D_FEATURE_LEVEL_10_0, D3D_FEATURE_LEVEL_11_0,
    D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
};
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;

const NAME: &str = "Direct3D 11";
const BUFFER_COUNT: u32 = 2;
const FEATURE_LEVELS: [D3D_FEATURE_LEVEL; 2] = [D3D_FEATURE_LEVEL_11_0, D3D_FEATURE_LEVEL_10_0];

struct Pipeline {
    vertex_shader: ID3D11VertexShader,
    pixel_shader: ID3D11PixelShader,
    input_layout: ID3D11InputLayout,
    rasterizer: ID3D11RasterizerState,
    vertex_buffer: ID3D11Buffer,
}

impl Pipeline {
    fn new(device: &ID3D11Device) -> Result<Self> {
        // --- 1. Shaders ---
        let vs_blob = compile_triangle_shader(ShaderStage::Vertex)?;
        let ps_blob = compile_triangle_shader(ShaderStage::Fragment)?;
        let vs_bytes = blob_bytes(&vs_blob);

        let mut vertex_shader = None;
        let mut pixel_shader = None;
        unsafe {
            device.CreateVertexShader(vs_bytes, None, Some(&mut vertex_shader))?;
            device.CreatePixelShader(blob_bytes(&ps_blob), None, Some(&mut pixel_shader))?;
        }

        // --- 2. Input Layout and Raster State ---
        let elements = [D3D11_INPUT_ELEMENT_DESC {
            SemanticName: s!("POSITION"),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32B32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: VERTEX_OFFSET,
            InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        }];
        let mut input_layout = None;
        unsafe { device.CreateInputLayout(&elements, vs_bytes, Some(&mut input_layout))? };

        let raster_desc = D3D11_RASTERIZER_DESC {
            FillMode: D3D11_FILL_SOLID,
            CullMode: D3D11_CULL_BACK,
            FrontCounterClockwise: TRUE,
            DepthClipEnable: TRUE,
            ..Default::default()
        };
        let mut rasterizer = None;
        unsafe { device.CreateRasterizerState(&raster_desc, Some(&mut rasterizer))? };

        // --- 3. Vertex Buffer ---
        let bytes = triangle_bytes();
        let buffer_desc = D3D11_BUFFER_DESC {
            ByteWidth: bytes.len() as u32,
            Usage: D3D11_USAGE_IMMUTABLE,
            BindFlags: D3D11_BIND_VERTEX_BUFFER.0 as u32,
            ..Default::default()
        };
        let initial = D3D11_SUBRESOURCE_DATA {
            pSysMem: bytes.as_ptr() as *const c_void,
            ..Default::default()
        };
        let mut vertex_buffer = None;
        unsafe { device.CreateBuffer(&buffer_desc, Some(&initial), Some(&mut vertex_buffer))? };

        Ok(Self {
            vertex_shader: vertex_shader.ok_or_else(|| anyhow!("CreateVertexShader returned nothing"))?,
            pixel_shader: pixel_shader.ok_or_else(|| anyhow!("CreatePixelShader returned nothing"))?,
            input_layout: input_layout.ok_or_else(|| anyhow!("CreateInputLayout returned nothing"))?,
            rasterizer: rasterizer.ok_or_else(|| anyhow!("CreateRasterizerState returned nothing"))?,
            vertex_buffer: vertex_buffer.ok_or_else(|| anyhow!("CreateBuffer returned nothing"))?,
        })
    }
}

struct D3D11State {
    pipeline: Pipeline,
    /// `None` only between releasing and recreating it during a resize.
    render_target: Option<ID3D11RenderTargetView>,
    swap_chain: IDXGISwapChain,
    context: ID3D11DeviceContext,
    device: ID3D11Device,
}

impl D3D11State {
    fn new(window: &dyn PrismWindow) -> Result<Self> {
        let hwnd = window_hwnd(window)?;

        // --- 1. Device and Swapchain ---
        let (device, context, swap_chain) = create_device_and_swap_chain(hwnd)?;

        // --- 2. Render Target ---
        let render_target = create_render_target(&device, &swap_chain)?;

        // --- 3. Pipeline ---
        let pipeline = Pipeline::new(&device)?;

        Ok(Self {
            pipeline,
            render_target: Some(render_target),
            swap_chain,
            context,
            device,
        })
    }

    fn draw_frame(&self, (width, height): (u32, u32), clear: Rgba8) -> Result<()> {
        let Some(render_target) = &self.render_target else {
            return Ok(());
        };
        let viewport = D3D11_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: width as f32,
            Height: height as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        let vertex_buffers = [Some(self.pipeline.vertex_buffer.clone())];
        let strides = [VERTEX_STRIDE];
        let offsets = [0];

        unsafe {
            let ctx = &self.context;
            ctx.RSSetState(&self.pipeline.rasterizer);
            ctx.RSSetViewports(Some(&[viewport]));
            ctx.OMSetRenderTargets(Some(&[Some(render_target.clone())]), None);
            ctx.ClearRenderTargetView(render_target, &clear.to_normalized());
            ctx.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            ctx.IASetInputLayout(&self.pipeline.input_layout);
            ctx.IASetVertexBuffers(
                0,
                1,
                Some(vertex_buffers.as_ptr()),
                Some(strides.as_ptr()),
                Some(offsets.as_ptr()),
            );
            ctx.VSSetShader(&self.pipeline.vertex_shader, None);
            ctx.PSSetShader(&self.pipeline.pixel_shader, None);
            ctx.Draw(VERTEX_COUNT, 0);

            self.swap_chain
                .Present(1, DXGI_PRESENT(0))
                .ok()
                .context("Present failed")
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        // Every reference to the back buffer has to go before ResizeBuffers.
        self.render_target = None;
        unsafe {
            self.context.OMSetRenderTargets(None, None);
            self.swap_chain
                .ResizeBuffers(0, width, height, DXGI_FORMAT_UNKNOWN, DXGI_SWAP_CHAIN_FLAG(0))
                .context("ResizeBuffers failed")?;
        }
        self.render_target = Some(create_render_target(&self.device, &self.swap_chain)?);
        Ok(())
    }
}

fn create_device_and_swap_chain(
    hwnd: HWND,
) -> Result<(ID3D11Device, ID3D11DeviceContext, IDXGISwapChain)> {
    // Size zero lets the swapchain take the window's client area.
    let desc = DXGI_SWAP_CHAIN_DESC {
        BufferDesc: DXGI_MODE_DESC {
            Format: DXGI_FORMAT_R8G8B8A8_UNORM,
            ..Default::default()
        },
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
        BufferCount: BUFFER_COUNT,
        OutputWindow: hwnd,
        Windowed: TRUE,
        SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
        Flags: 0,
    };

    let create = |flags: D3D11_CREATE_DEVICE_FLAG| {
        let mut device = None;
        let mut context = None;
        let mut swap_chain = None;
        unsafe {
            D3D11CreateDeviceAndSwapChain(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                HMODULE::default(),
                flags,
                Some(&FEATURE_LEVELS),
                D3D11_SDK_VERSION,
                Some(&desc),
                Some(&mut swap_chain),
                Some(&mut device),
                None,
                Some(&mut context),
            )
        }
        .map(|()| (device, context, swap_chain))
    };

    let created = if cfg!(debug_assertions) {
        create(D3D11_CREATE_DEVICE_DEBUG).or_else(|e| {
            log::warn!("D3D11Renderer: debug device unavailable ({e}), retrying without it");
            create(D3D11_CREATE_DEVICE_FLAG(0))
        })
    } else {
        create(D3D11_CREATE_DEVICE_FLAG(0))
    };

    match created.context("D3D11CreateDeviceAndSwapChain failed")? {
        (Some(device), Some(context), Some(swap_chain)) => Ok((device, context, swap_chain)),
        _ => Err(anyhow!("D3D11CreateDeviceAndSwapChain returned no device")),
    }
}

fn create_render_target(
    device: &ID3D11Device,
    swap_chain: &IDXGISwapChain,
) -> Result<ID3D11RenderTargetView> {
    unsafe {
        let back_buffer: ID3D11Texture2D =
            swap_chain.GetBuffer(0).context("Failed to get the back buffer")?;
        let mut view = None;
        device
            .CreateRenderTargetView(&back_buffer, None, Some(&mut view))
            .context("CreateRenderTargetView failed")?;
        view.ok_or_else(|| anyhow!("CreateRenderTargetView returned nothing"))
    }
}

/// Renders the triangle through Direct3D 11.
pub struct D3D11Renderer {
    state: Option<D3D11State>,
    colors: RendererColors,
    status: RendererStatus,
    window: PrismWindowHandle,
}

impl D3D11Renderer {
    /// Creates the device, swapchain, shaders and vertex buffer.
    ///
    /// Never fails: a setup error is logged and reported through
    /// [`Renderer::status`].
    pub fn new(window: &dyn PrismWindow) -> Self {
        let window = window.clone_handle_arc();
        let (state, status) = settle_setup(NAME, D3D11State::new(window.as_ref()));
        Self {
            state,
            colors: RendererColors::default(),
            status,
            window,
        }
    }
}

impl Renderer for D3D11Renderer {
    fn update(&mut self) {
        let Some(state) = &self.state else {
            return;
        };
        if let Err(e) = state.draw_frame(self.window.inner_size(), self.colors.clear) {
            log::warn!("D3D11Renderer: frame dropped: {e:#}");
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if width == 0 || height == 0 {
            log::debug!("D3D11Renderer: ignoring resize to {width}x{height}");
            return;
        }
        if let Err(e) = state.resize(width, height) {
            log::error!("D3D11Renderer: resize to {width}x{height} failed: {e:#}");
        }
    }

    fn name(&self) -> &str {
        NAME
    }

    fn status(&self) -> &RendererStatus {
        &self.status
    }

    fn colors(&self) -> &RendererColors {
        &self.colors
    }

    fn colors_mut(&mut self) -> &mut RendererColors {
        &mut self.colors
    }
}
