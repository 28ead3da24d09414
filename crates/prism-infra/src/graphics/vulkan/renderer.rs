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

use super::bootstrap::VulkanDevice;
use super::pipeline::{RenderPass, TrianglePipeline, VertexBuffer};
use super::queue::{VulkanCommandBuffer, VulkanQueue};
use super::swapchain::{self, is_surface_lost, surface_error, Framebuffers, VulkanSwapchain};
use super::{FRAMES_IN_FLIGHT, TRANSFER_BUFFER_COUNT};
use crate::graphics::settle_setup;
use anyhow::{anyhow, Context, Result};
use ash::vk;
use prism_core::math::Rgba8;
use prism_core::platform::window::{raw_handles, PrismWindow, PrismWindowHandle};
use prism_core::renderer::{
    triangle_bytes, RenderError, Renderer, RendererColors, RendererStatus, VERTEX_COUNT,
};

const NAME: &str = "Vulkan";

/// All Vulkan objects of one renderer. Fields drop top to bottom, so
/// everything built on the device goes before it.
struct VulkanState {
    framebuffers: Framebuffers,
    pipeline: TrianglePipeline,
    vertex_buffer: VertexBuffer,
    render_pass: RenderPass,
    swapchain: VulkanSwapchain,
    swapchain_loader: ash::khr::swapchain::Device,
    present_queue: VulkanQueue,
    graphics_queue: VulkanQueue,
    transfer_queue: VulkanQueue,
    /// Set when the swapchain no longer matches the surface and could not
    /// be rebuilt yet, typically while the window is minimized.
    swapchain_dirty: bool,
    device: VulkanDevice,
}

impl VulkanState {
    fn new(window: &dyn PrismWindow) -> Result<Self> {
        let (raw_window, raw_display) = raw_handles(window)?;

        // --- 1. Instance, Surface and Device ---
        let device = VulkanDevice::new(raw_window, raw_display)?;
        let families = device.families;

        // --- 2. Queues ---
        let transfer_queue =
            VulkanQueue::new(device.device(), families.transfer, TRANSFER_BUFFER_COUNT, "transfer")?;
        let graphics_queue =
            VulkanQueue::new(device.device(), families.graphics, FRAMES_IN_FLIGHT, "graphics")?;
        let present_queue =
            VulkanQueue::new(device.device(), families.present, FRAMES_IN_FLIGHT, "present")?;

        // --- 3. Swapchain ---
        let swapchain_loader = ash::khr::swapchain::Device::new(device.instance(), device.device());
        let extent = swapchain::surface_extent(&device, window.inner_size())?;
        if extent.width == 0 || extent.height == 0 {
            return Err(RenderError::InitializationFailed(
                "the window has no drawable area".to_string(),
            )
            .into());
        }
        let swapchain = VulkanSwapchain::new(&device, &swapchain_loader, extent, None)?;

        // --- 4. Render Pass, Pipeline and Geometry ---
        let render_pass = RenderPass::new(device.device(), swapchain.format.format)?;
        let pipeline = TrianglePipeline::new(device.device(), &render_pass)?;
        let vertex_buffer = VertexBuffer::new(&device, triangle_bytes())?;
        let framebuffers = Framebuffers::new(device.device(), &render_pass, &swapchain)?;

        log::info!(
            "VulkanRenderer: ready on \"{}\" with a {}x{} swapchain",
            device.device_name,
            extent.width,
            extent.height
        );
        log::debug!(
            "VulkanRenderer: command buffers graphics={} present={} transfer={}",
            graphics_queue.slot_count(),
            present_queue.slot_count(),
            transfer_queue.slot_count()
        );

        Ok(Self {
            framebuffers,
            pipeline,
            vertex_buffer,
            render_pass,
            swapchain,
            swapchain_loader,
            present_queue,
            graphics_queue,
            transfer_queue,
            swapchain_dirty: false,
            device,
        })
    }

    fn draw_frame(&mut self, clear: Rgba8, window_size: (u32, u32)) -> Result<()> {
        if self.swapchain_dirty {
            self.rebuild_swapchain(window_size)?;
            if self.swapchain_dirty {
                return Ok(());
            }
        }

        // --- 1. Acquire ---
        let command = self.graphics_queue.wait_on_next_command_buffer()?;
        let acquired = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain.handle(),
                u64::MAX,
                command.image_available,
                vk::Fence::null(),
            )
        };
        let image_index = match acquired {
            Ok((index, _suboptimal)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::debug!("VulkanRenderer: swapchain out of date on acquire");
                return self.rebuild_swapchain(window_size);
            }
            Err(e) => return Err(surface_error(e)).context("Failed to acquire a swapchain image"),
        };

        // --- 2. Record and Submit ---
        let submitted = self.record(&command, image_index, clear).and_then(|()| {
            self.graphics_queue.submit(
                &command,
                &[command.image_available],
                &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT],
                &[command.render_finished],
            )
        });
        if let Err(e) = submitted {
            // The acquire semaphore is pending and the image is held; both must be
            // handed back before this slot or the swapchain is used again.
            if let Err(release) = self.graphics_queue.release_acquired(&command) {
                log::warn!("VulkanRenderer: could not release the acquired image: {release:#}");
            }
            self.swapchain_dirty = true;
            return Err(e);
        }

        // --- 3. Present ---
        let wait = [command.render_finished];
        let swapchains = [self.swapchain.handle()];
        let indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait)
            .swapchains(&swapchains)
            .image_indices(&indices);
        let presented = unsafe {
            self.swapchain_loader
                .queue_present(self.present_queue.queue(), &present_info)
        };
        match presented {
            Ok(false) => Ok(()),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::debug!("VulkanRenderer: swapchain suboptimal or out of date on present");
                self.rebuild_swapchain(window_size)
            }
            Err(e) => Err(e).context("Failed to present"),
        }
    }

    fn record(&self, command: &VulkanCommandBuffer, image_index: u32, clear: Rgba8) -> Result<()> {
        let device = self.device.device();
        let framebuffer = self
            .framebuffers
            .get(image_index)
            .ok_or_else(|| anyhow!("No framebuffer for swapchain image {image_index}"))?;

        let extent = self.swapchain.extent;
        let render_area = vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent,
        };
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: clear.to_normalized(),
            },
        }];
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass.handle())
            .framebuffer(framebuffer)
            .render_area(render_area)
            .clear_values(&clear_values);
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };

        command.begin(device)?;
        unsafe {
            device.cmd_begin_render_pass(command.buffer, &begin_info, vk::SubpassContents::INLINE);
            device.cmd_bind_pipeline(
                command.buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline.handle(),
            );
            device.cmd_set_viewport(command.buffer, 0, &[viewport]);
            device.cmd_set_scissor(command.buffer, 0, &[render_area]);
            device.cmd_bind_vertex_buffers(command.buffer, 0, &[self.vertex_buffer.handle()], &[0]);
            device.cmd_draw(command.buffer, VERTEX_COUNT, 1, 0, 0);
            device.cmd_end_render_pass(command.buffer);
        }
        command.end(device)
    }

    /// Replaces the swapchain and its framebuffers.
    ///
    /// A lost surface is not an error here: it only happens while the window
    /// is being destroyed, and nothing more will be drawn to it.
    fn rebuild_swapchain(&mut self, requested: (u32, u32)) -> Result<()> {
        let extent = match swapchain::surface_extent(&self.device, requested) {
            Ok(extent) => extent,
            Err(e) if is_surface_lost(&e) => {
                log::warn!("VulkanRenderer: surface lost, skipping swapchain rebuild");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if extent.width == 0 || extent.height == 0 {
            log::debug!("VulkanRenderer: surface has zero extent, deferring swapchain rebuild");
            self.swapchain_dirty = true;
            return Ok(());
        }

        self.device.wait_idle()?;
        self.swapchain_dirty = true;

        let swapchain = match VulkanSwapchain::new(
            &self.device,
            &self.swapchain_loader,
            extent,
            Some(&mut self.swapchain),
        ) {
            Ok(swapchain) => swapchain,
            Err(e) if is_surface_lost(&e) => {
                log::warn!("VulkanRenderer: surface lost while rebuilding the swapchain");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let framebuffers = Framebuffers::new(self.device.device(), &self.render_pass, &swapchain)?;

        // The old framebuffers reference the old views, so they go first.
        self.framebuffers = framebuffers;
        self.swapchain = swapchain;
        self.swapchain_dirty = false;
        log::debug!("VulkanRenderer: swapchain rebuilt at {}x{}", extent.width, extent.height);
        Ok(())
    }
}

impl Drop for VulkanState {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            log::warn!("VulkanRenderer: {e:#} during teardown");
        }
    }
}

/// Renders the triangle through Vulkan.
///
/// The swapchain is rebuilt when the surface reports it out of date or
/// suboptimal, and on resize. While the window is minimized the rebuild is
/// deferred and frames are skipped.
pub struct VulkanRenderer {
    state: Option<VulkanState>,
    colors: RendererColors,
    status: RendererStatus,
    window: PrismWindowHandle,
}

impl VulkanRenderer {
    /// Creates the instance, device, queues, swapchain and triangle pipeline.
    ///
    /// Never fails: a setup error is logged and reported through
    /// [`Renderer::status`].
    pub fn new(window: &dyn PrismWindow) -> Self {
        let window = window.clone_handle_arc();
        let (state, status) = settle_setup(NAME, VulkanState::new(window.as_ref()));
        Self {
            state,
            colors: RendererColors::default(),
            status,
            window,
        }
    }
}

impl Renderer for VulkanRenderer {
    fn update(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if let Err(e) = state.draw_frame(self.colors.clear, self.window.inner_size()) {
            log::warn!("VulkanRenderer: frame dropped: {e:#}");
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if width == 0 || height == 0 {
            log::debug!("VulkanRenderer: ignoring resize to {width}x{height}");
            return;
        }
        let current = state.swapchain.extent;
        if !state.swapchain_dirty && (current.width, current.height) == (width, height) {
            return;
        }
        if let Err(e) = state.rebuild_swapchain((width, height)) {
            log::warn!("VulkanRenderer: resize to {width}x{height} failed: {e:#}");
            state.swapchain_dirty = true;
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
