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

use super::adapter::select_adapter;
use super::FRAME_COUNT;
use crate::graphics::d3d::{blob_bytes, compile_triangle_shader, window_hwnd};
use crate::graphics::settle_setup;
use anyhow::{anyhow, Context, Result};
use prism_core::math::Rgba8;
use prism_core::platform::window::{PrismWindow, PrismWindowHandle};
use prism_core::renderer::{
    triangle_bytes, Renderer, RendererColors, RendererStatus, ShaderStage, VERTEX_COUNT,
    VERTEX_OFFSET, VERTEX_STRIDE,
};
use std::mem::ManuallyDrop;
use windows::core::{s, Interface};
use windows::Win32::Foundation::{CloseHandle, HANDLE, HWND, RECT};
use windows::Win32::Graphics::Direct3D::{
    ID3DBlob, D3D_FEATURE_LEVEL_11_0, D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
};
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::Win32::System::Threading::{CreateEventA, WaitForSingleObject, INFINITE};

const NAME: &str = "Direct3D 12";
const RENDER_TARGET_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

/// A transition barrier that borrows `resource` without adding a reference.
fn transition_barrier(
    resource: &ID3D12Resource,
    before: D3D12_RESOURCE_STATES,
    after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                StateBefore: before,
                StateAfter: after,
            }),
        },
    }
}

/// Runs `wait` whatever `submitted` holds, then reports the submission error
/// first and the wait error otherwise.
fn after_gpu_idle(submitted: Result<()>, wait: impl FnOnce() -> Result<()>) -> Result<()> {
    let waited = wait();
    submitted.and(waited)
}

fn viewport_and_scissor(width: u32, height: u32) -> (D3D12_VIEWPORT, RECT) {
    let viewport = D3D12_VIEWPORT {
        TopLeftX: 0.0,
        TopLeftY: 0.0,
        Width: width as f32,
        Height: height as f32,
        MinDepth: D3D12_MIN_DEPTH,
        MaxDepth: D3D12_MAX_DEPTH,
    };
    let scissor = RECT {
        left: 0,
        top: 0,
        right: width as i32,
        bottom: height as i32,
    };
    (viewport, scissor)
}

/// Signals `fence` on `queue` and blocks until the GPU reaches it.
struct FrameFence {
    fence: ID3D12Fence,
    event: HANDLE,
    next_value: u64,
}

impl FrameFence {
    fn new(device: &ID3D12Device) -> Result<Self> {
        let fence: ID3D12Fence = unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) }
            .context("CreateFence failed")?;
        let event = unsafe { CreateEventA(None, false, false, None) }
            .context("Failed to create the fence event")?;
        Ok(Self {
            fence,
            event,
            next_value: 1,
        })
    }

    fn wait_for_gpu(&mut self, queue: &ID3D12CommandQueue) -> Result<()> {
        let value = self.next_value;
        self.next_value += 1;
        unsafe {
            queue.Signal(&self.fence, value).context("Signal failed")?;
            if self.fence.GetCompletedValue() < value {
                self.fence
                    .SetEventOnCompletion(value, self.event)
                    .context("SetEventOnCompletion failed")?;
                WaitForSingleObject(self.event, INFINITE);
            }
        }
        Ok(())
    }
}

impl Drop for FrameFence {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.event) } {
            log::warn!("D3D12Renderer: failed to close the fence event: {e}");
        }
    }
}

/// The swapchain's back buffers and their RTV heap.
struct RenderTargets {
    heap: ID3D12DescriptorHeap,
    descriptor_size: usize,
    buffers: Vec<ID3D12Resource>,
}

impl RenderTargets {
    fn new(device: &ID3D12Device) -> Result<Self> {
        let heap: ID3D12DescriptorHeap = unsafe {
            device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                NumDescriptors: FRAME_COUNT,
                ..Default::default()
            })
        }
        .context("Failed to create the RTV heap")?;
        let descriptor_size =
            unsafe { device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV) }
                as usize;
        Ok(Self {
            heap,
            descriptor_size,
            buffers: Vec::with_capacity(FRAME_COUNT as usize),
        })
    }

    /// Creates one view per back buffer of `swap_chain`.
    fn acquire(&mut self, device: &ID3D12Device, swap_chain: &IDXGISwapChain3) -> Result<()> {
        self.buffers.clear();
        for index in 0..FRAME_COUNT {
            let buffer: ID3D12Resource = unsafe { swap_chain.GetBuffer(index) }
                .with_context(|| format!("Failed to get back buffer {index}"))?;
            unsafe { device.CreateRenderTargetView(&buffer, None, self.handle(index as usize)) };
            self.buffers.push(buffer);
        }
        Ok(())
    }

    fn release(&mut self) {
        self.buffers.clear();
    }

    fn handle(&self, index: usize) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        let start = unsafe { self.heap.GetCPUDescriptorHandleForHeapStart() };
        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: start.ptr + index * self.descriptor_size,
        }
    }
}

struct D3D12State {
    render_targets: RenderTargets,
    swap_chain: IDXGISwapChain3,
    /// Backs `vertex_buffer_view`; only held, never read.
    #[allow(dead_code)]
    vertex_buffer: ID3D12Resource,
    vertex_buffer_view: D3D12_VERTEX_BUFFER_VIEW,
    pipeline_state: ID3D12PipelineState,
    root_signature: ID3D12RootSignature,
    command_list: ID3D12GraphicsCommandList,
    command_allocator: ID3D12CommandAllocator,
    command_queue: ID3D12CommandQueue,
    fence: FrameFence,
    device: ID3D12Device,
    frame_index: u32,
    size: (u32, u32),
}

impl D3D12State {
    fn new(window: &dyn PrismWindow) -> Result<Self> {
        let hwnd = window_hwnd(window)?;
        let size = window.inner_size();

        // --- 1. Factory, Adapter and Device ---
        if cfg!(debug_assertions) {
            enable_debug_layer();
        }
        let factory_flags = if cfg!(debug_assertions) {
            DXGI_CREATE_FACTORY_DEBUG
        } else {
            DXGI_CREATE_FACTORY_FLAGS(0)
        };
        let factory: IDXGIFactory4 =
            unsafe { CreateDXGIFactory2(factory_flags) }.context("CreateDXGIFactory2 failed")?;
        let selected = select_adapter(&factory, D3D_FEATURE_LEVEL_11_0)?;
        let mut device: Option<ID3D12Device> = None;
        unsafe { D3D12CreateDevice(&selected.adapter, D3D_FEATURE_LEVEL_11_0, &mut device) }
            .context("D3D12CreateDevice failed")?;
        let device = device.ok_or_else(|| anyhow!("D3D12CreateDevice returned no device"))?;
        log::info!("D3D12Renderer: using adapter \"{}\"", selected.name);

        // --- 2. Command Queue and Swapchain ---
        let command_queue: ID3D12CommandQueue = unsafe {
            device.CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                ..Default::default()
            })
        }
        .context("CreateCommandQueue failed")?;
        let swap_chain = create_swap_chain(&factory, &command_queue, hwnd, size)?;
        let frame_index = unsafe { swap_chain.GetCurrentBackBufferIndex() };

        // --- 3. Render Targets ---
        let mut render_targets = RenderTargets::new(&device)?;
        render_targets.acquire(&device, &swap_chain)?;

        // --- 4. Pipeline ---
        let command_allocator: ID3D12CommandAllocator =
            unsafe { device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }
                .context("CreateCommandAllocator failed")?;
        let root_signature = create_root_signature(&device)?;
        let pipeline_state = create_pipeline_state(&device, &root_signature)?;
        let command_list: ID3D12GraphicsCommandList = unsafe {
            device.CreateCommandList(
                0,
                D3D12_COMMAND_LIST_TYPE_DIRECT,
                &command_allocator,
                &pipeline_state,
            )
        }
        .context("CreateCommandList failed")?;
        // Lists are created open; update() expects a closed one.
        unsafe { command_list.Close() }.context("Failed to close the command list")?;

        // --- 5. Geometry and Synchronization ---
        let (vertex_buffer, vertex_buffer_view) = create_vertex_buffer(&device)?;
        let fence = FrameFence::new(&device)?;

        Ok(Self {
            render_targets,
            swap_chain,
            vertex_buffer,
            vertex_buffer_view,
            pipeline_state,
            root_signature,
            command_list,
            command_allocator,
            command_queue,
            fence,
            device,
            frame_index,
            size,
        })
    }

    fn draw_frame(&mut self, clear: Rgba8) -> Result<()> {
        let back_buffer = self
            .render_targets
            .buffers
            .get(self.frame_index as usize)
            .ok_or_else(|| anyhow!("No back buffer at index {}", self.frame_index))?;
        let rtv = self.render_targets.handle(self.frame_index as usize);
        let (viewport, scissor) = viewport_and_scissor(self.size.0, self.size.1);
        let list = &self.command_list;

        unsafe {
            // --- 1. Record ---
            self.command_allocator.Reset().context("Allocator reset failed")?;
            list.Reset(&self.command_allocator, &self.pipeline_state)
                .context("Command list reset failed")?;
            list.SetGraphicsRootSignature(&self.root_signature);
            list.RSSetViewports(&[viewport]);
            list.RSSetScissorRects(&[scissor]);
            list.ResourceBarrier(&[transition_barrier(
                back_buffer,
                D3D12_RESOURCE_STATE_PRESENT,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
            )]);
            list.OMSetRenderTargets(1, Some(&rtv), false, None);
            list.ClearRenderTargetView(rtv, &clear.to_normalized(), None);
            list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            list.IASetVertexBuffers(0, Some(&[self.vertex_buffer_view]));
            list.DrawInstanced(VERTEX_COUNT, 1, 0, 0);
            list.ResourceBarrier(&[transition_barrier(
                back_buffer,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
                D3D12_RESOURCE_STATE_PRESENT,
            )]);
            list.Close().context("Command list close failed")?;

            // --- 2. Submit and Present ---
            let lists = [Some(list.cast::<ID3D12CommandList>()?)];
            self.command_queue.ExecuteCommandLists(&lists);
        }
        let presented = unsafe { self.swap_chain.Present(1, DXGI_PRESENT(0)) }
            .ok()
            .context("Present failed");

        // --- 3. Wait for the frame ---
        // The list was executed even when presenting failed, so the allocator
        // may only be reset once the GPU is done with it.
        let fence = &mut self.fence;
        let queue = &self.command_queue;
        after_gpu_idle(presented, || fence.wait_for_gpu(queue))?;
        self.frame_index = unsafe { self.swap_chain.GetCurrentBackBufferIndex() };
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.fence.wait_for_gpu(&self.command_queue)?;
        self.render_targets.release();
        unsafe {
            self.swap_chain
                .ResizeBuffers(
                    FRAME_COUNT,
                    width,
                    height,
                    DXGI_FORMAT_UNKNOWN,
                    DXGI_SWAP_CHAIN_FLAG(0),
                )
                .context("ResizeBuffers failed")?;
        }
        self.render_targets.acquire(&self.device, &self.swap_chain)?;
        self.frame_index = unsafe { self.swap_chain.GetCurrentBackBufferIndex() };
        self.size = (width, height);
        log::debug!("D3D12Renderer: back buffers resized to {width}x{height}");
        Ok(())
    }
}

impl Drop for D3D12State {
    fn drop(&mut self) {
        // The GPU may still reference the last frame's resources.
        if let Err(e) = self.fence.wait_for_gpu(&self.command_queue) {
            log::warn!("D3D12Renderer: {e:#} during teardown");
        }
    }
}

fn enable_debug_layer() {
    let mut debug: Option<ID3D12Debug> = None;
    match unsafe { D3D12GetDebugInterface(&mut debug) } {
        Ok(()) => {
            if let Some(debug) = debug {
                unsafe { debug.EnableDebugLayer() };
                log::info!("D3D12Renderer: debug layer enabled");
            }
        }
        Err(e) => log::debug!("D3D12Renderer: debug layer unavailable: {e}"),
    }
}

fn create_swap_chain(
    factory: &IDXGIFactory4,
    queue: &ID3D12CommandQueue,
    hwnd: HWND,
    (width, height): (u32, u32),
) -> Result<IDXGISwapChain3> {
    let desc = DXGI_SWAP_CHAIN_DESC1 {
        BufferCount: FRAME_COUNT,
        Width: width,
        Height: height,
        Format: RENDER_TARGET_FORMAT,
        BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
        SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let swap_chain: IDXGISwapChain3 =
        unsafe { factory.CreateSwapChainForHwnd(queue, hwnd, &desc, None, None) }
            .context("CreateSwapChainForHwnd failed")?
            .cast()?;
    // Fullscreen transitions are not supported.
    unsafe { factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER) }
        .context("MakeWindowAssociation failed")?;
    Ok(swap_chain)
}

fn create_root_signature(device: &ID3D12Device) -> Result<ID3D12RootSignature> {
    let desc = D3D12_ROOT_SIGNATURE_DESC {
        Flags: D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
        ..Default::default()
    };
    let mut signature: Option<ID3DBlob> = None;
    let mut errors: Option<ID3DBlob> = None;
    let serialized = unsafe {
        D3D12SerializeRootSignature(
            &desc,
            D3D_ROOT_SIGNATURE_VERSION_1,
            &mut signature,
            Some(&mut errors),
        )
    };
    if let Err(e) = serialized {
        let detail = errors
            .map(|blob| String::from_utf8_lossy(blob_bytes(&blob)).into_owned())
            .unwrap_or_else(|| e.to_string());
        return Err(anyhow!("Root signature serialization failed: {detail}"));
    }
    let signature = signature.ok_or_else(|| anyhow!("Root signature serialization was empty"))?;
    unsafe { device.CreateRootSignature(0, blob_bytes(&signature)) }
        .context("CreateRootSignature failed")
}

fn create_pipeline_state(
    device: &ID3D12Device,
    root_signature: &ID3D12RootSignature,
) -> Result<ID3D12PipelineState> {
    let vertex_shader = compile_triangle_shader(ShaderStage::Vertex)?;
    let pixel_shader = compile_triangle_shader(ShaderStage::Fragment)?;

    let input_elements = [D3D12_INPUT_ELEMENT_DESC {
        SemanticName: s!("POSITION"),
        SemanticIndex: 0,
        Format: DXGI_FORMAT_R32G32B32_FLOAT,
        InputSlot: 0,
        AlignedByteOffset: VERTEX_OFFSET,
        InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
        InstanceDataStepRate: 0,
    }];

    let mut desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
        InputLayout: D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: input_elements.as_ptr(),
            NumElements: input_elements.len() as u32,
        },
        pRootSignature: unsafe { std::mem::transmute_copy(root_signature) },
        VS: D3D12_SHADER_BYTECODE {
            pShaderBytecode: unsafe { vertex_shader.GetBufferPointer() },
            BytecodeLength: unsafe { vertex_shader.GetBufferSize() },
        },
        PS: D3D12_SHADER_BYTECODE {
            pShaderBytecode: unsafe { pixel_shader.GetBufferPointer() },
            BytecodeLength: unsafe { pixel_shader.GetBufferSize() },
        },
        RasterizerState: D3D12_RASTERIZER_DESC {
            FillMode: D3D12_FILL_MODE_SOLID,
            CullMode: D3D12_CULL_MODE_BACK,
            FrontCounterClockwise: true.into(),
            DepthClipEnable: true.into(),
            ..Default::default()
        },
        DepthStencilState: D3D12_DEPTH_STENCIL_DESC::default(),
        SampleMask: u32::MAX,
        PrimitiveTopologyType: D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
        NumRenderTargets: 1,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    desc.BlendState.RenderTarget[0] = D3D12_RENDER_TARGET_BLEND_DESC {
        BlendEnable: false.into(),
        LogicOpEnable: false.into(),
        SrcBlend: D3D12_BLEND_ONE,
        DestBlend: D3D12_BLEND_ZERO,
        BlendOp: D3D12_BLEND_OP_ADD,
        SrcBlendAlpha: D3D12_BLEND_ONE,
        DestBlendAlpha: D3D12_BLEND_ZERO,
        BlendOpAlpha: D3D12_BLEND_OP_ADD,
        LogicOp: D3D12_LOGIC_OP_NOOP,
        RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
    };
    desc.RTVFormats[0] = RENDER_TARGET_FORMAT;

    unsafe { device.CreateGraphicsPipelineState(&desc) }
        .context("CreateGraphicsPipelineState failed")
}

/// Uploads the triangle into an upload-heap buffer. Fine for three vertices
/// written once.
fn create_vertex_buffer(
    device: &ID3D12Device,
) -> Result<(ID3D12Resource, D3D12_VERTEX_BUFFER_VIEW)> {
    let bytes = triangle_bytes();
    let heap = D3D12_HEAP_PROPERTIES {
        Type: D3D12_HEAP_TYPE_UPLOAD,
        ..Default::default()
    };
    let desc = D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
        Width: bytes.len() as u64,
        Height: 1,
        DepthOrArraySize: 1,
        MipLevels: 1,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
        ..Default::default()
    };

    let mut buffer: Option<ID3D12Resource> = None;
    unsafe {
        device.CreateCommittedResource(
            &heap,
            D3D12_HEAP_FLAG_NONE,
            &desc,
            D3D12_RESOURCE_STATE_GENERIC_READ,
            None,
            &mut buffer,
        )
    }
    .context("Failed to create the vertex buffer")?;
    let buffer = buffer.ok_or_else(|| anyhow!("CreateCommittedResource returned nothing"))?;

    unsafe {
        let mut mapped = std::ptr::null_mut();
        buffer
            .Map(0, None, Some(&mut mapped))
            .context("Failed to map the vertex buffer")?;
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped as *mut u8, bytes.len());
        buffer.Unmap(0, None);
    }

    let view = D3D12_VERTEX_BUFFER_VIEW {
        BufferLocation: unsafe { buffer.GetGPUVirtualAddress() },
        StrideInBytes: VERTEX_STRIDE,
        SizeInBytes: bytes.len() as u32,
    };
    Ok((buffer, view))
}

/// Renders the triangle through Direct3D 12.
///
/// Frames are not pipelined: `update` waits for the GPU before returning.
pub struct D3D12Renderer {
    state: Option<D3D12State>,
    colors: RendererColors,
    status: RendererStatus,
    window: PrismWindowHandle,
}

impl D3D12Renderer {
    /// Creates the device, swapchain, pipeline and vertex buffer.
    ///
    /// Never fails: a setup error is logged and reported through
    /// [`Renderer::status`].
    pub fn new(window: &dyn PrismWindow) -> Self {
        let window = window.clone_handle_arc();
        let (state, status) = settle_setup(NAME, D3D12State::new(window.as_ref()));
        Self {
            state,
            colors: RendererColors::default(),
            status,
            window,
        }
    }
}

impl Renderer for D3D12Renderer {
    fn update(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        // Follow the window if a resize was not forwarded.
        let live = self.window.inner_size();
        if live.0 > 0 && live.1 > 0 && live != state.size {
            if let Err(e) = state.resize(live.0, live.1) {
                log::error!("D3D12Renderer: resize to {}x{} failed: {e:#}", live.0, live.1);
                return;
            }
        }
        if let Err(e) = state.draw_frame(self.colors.clear) {
            log::warn!("D3D12Renderer: frame dropped: {e:#}");
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if width == 0 || height == 0 || (width, height) == state.size {
            return;
        }
        if let Err(e) = state.resize(width, height) {
            log::error!("D3D12Renderer: resize to {width}x{height} failed: {e:#}");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_covers_the_window() {
        let (viewport, scissor) = viewport_and_scissor(480, 320);
        assert_eq!((viewport.Width, viewport.Height), (480.0, 320.0));
        assert_eq!((scissor.right, scissor.bottom), (480, 320));
        assert_eq!((scissor.left, scissor.top), (0, 0));
    }

    #[test]
    fn test_failed_present_still_waits_for_the_gpu() {
        let mut waited = false;
        let result = after_gpu_idle(Err(anyhow!("Present failed")), || {
            waited = true;
            Ok(())
        });
        assert!(waited);
        assert_eq!(result.unwrap_err().to_string(), "Present failed");
    }

    #[test]
    fn test_wait_error_surfaces_after_a_successful_present() {
        let result = after_gpu_idle(Ok(()), || Err(anyhow!("Signal failed")));
        assert_eq!(result.unwrap_err().to_string(), "Signal failed");
        assert!(after_gpu_idle(Ok(()), || Ok(())).is_ok());
    }
}
