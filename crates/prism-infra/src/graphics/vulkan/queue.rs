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

//! Multi-buffered command submission.

use anyhow::{Context, Result};
use ash::vk;
use prism_core::renderer::FrameRing;

/// One slot of a [`VulkanQueue`]: a command buffer and its synchronization
/// objects. The handles stay owned by the queue.
#[derive(Debug, Clone, Copy)]
pub struct VulkanCommandBuffer {
    pub index: usize,
    pub buffer: vk::CommandBuffer,
    /// Signaled when the GPU finishes the slot's last submission.
    pub fence: vk::Fence,
    pub image_available: vk::Semaphore,
    pub render_finished: vk::Semaphore,
}

impl VulkanCommandBuffer {
    pub fn begin(&self, device: &ash::Device) -> Result<()> {
        let info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { device.begin_command_buffer(self.buffer, &info) }
            .context("Failed to begin command buffer")
    }

    pub fn end(&self, device: &ash::Device) -> Result<()> {
        unsafe { device.end_command_buffer(self.buffer) }.context("Failed to end command buffer")
    }
}

/// A device queue with a ring of command buffers.
///
/// A slot's fence is only waited on when that slot was submitted since the
/// last wait, so a frame abandoned before submission never stalls the ring.
pub struct VulkanQueue {
    device: ash::Device,
    queue: vk::Queue,
    family_index: u32,
    pool: vk::CommandPool,
    slots: Vec<VulkanCommandBuffer>,
    ring: FrameRing,
    label: &'static str,
}

impl VulkanQueue {
    /// Creates a command pool on `family_index` with `slot_count` command
    /// buffers. Fences start signaled.
    ///
    /// ## Arguments
    /// * `device` - The logical device owning the queue.
    /// * `family_index` - The queue family; queue 0 of it is used.
    /// * `slot_count` - Command buffers in the ring, at least 1.
    /// * `label` - Used in log messages.
    pub fn new(
        device: &ash::Device,
        family_index: u32,
        slot_count: usize,
        label: &'static str,
    ) -> Result<Self> {
        let ring = FrameRing::new(slot_count);
        let queue = unsafe { device.get_device_queue(family_index, 0) };

        let pool_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(family_index);
        let pool = unsafe { device.create_command_pool(&pool_info, None) }
            .with_context(|| format!("Failed to create the {label} command pool"))?;

        // From here on, drop releases whatever was created.
        let mut this = Self {
            device: device.clone(),
            queue,
            family_index,
            pool,
            slots: Vec::with_capacity(ring.capacity()),
            ring,
            label,
        };

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(this.ring.capacity() as u32);
        let buffers = unsafe { device.allocate_command_buffers(&alloc_info) }
            .with_context(|| format!("Failed to allocate {label} command buffers"))?;

        for (index, buffer) in buffers.into_iter().enumerate() {
            let slot = create_slot(device, index, buffer)
                .with_context(|| format!("Failed to create {label} slot {index}"))?;
            this.slots.push(slot);
        }

        log::debug!(
            "VulkanQueue[{label}]: {} command buffers on family {family_index}",
            this.slots.len()
        );
        Ok(this)
    }

    /// Advances to the next slot, waits for its previous submission if there
    /// is one, and resets it for recording.
    pub fn wait_on_next_command_buffer(&mut self) -> Result<VulkanCommandBuffer> {
        let ticket = self.ring.advance();
        let slot = self.slots[ticket.index];
        unsafe {
            if ticket.wait_required {
                self.device
                    .wait_for_fences(&[slot.fence], true, u64::MAX)
                    .with_context(|| format!("{}: fence wait failed", self.label))?;
            }
            self.device
                .reset_fences(&[slot.fence])
                .with_context(|| format!("{}: fence reset failed", self.label))?;
            self.device
                .reset_command_buffer(slot.buffer, vk::CommandBufferResetFlags::empty())
                .with_context(|| format!("{}: command buffer reset failed", self.label))?;
        }
        Ok(slot)
    }

    /// Advances to the next slot without waiting. The caller is responsible
    /// for knowing the slot is no longer in use.
    pub fn next_command_buffer(&mut self) -> VulkanCommandBuffer {
        let ticket = self.ring.advance();
        self.slots[ticket.index]
    }

    /// The slot returned by the last advance, if any.
    pub fn current_command_buffer(&self) -> Option<VulkanCommandBuffer> {
        self.ring.current().map(|index| self.slots[index])
    }

    /// Submits `command` and signals its fence on completion.
    ///
    /// ## Arguments
    /// * `wait` - Semaphores to wait on, paired with `wait_stages`.
    /// * `signal` - Semaphores to signal when the work completes.
    pub fn submit(
        &mut self,
        command: &VulkanCommandBuffer,
        wait: &[vk::Semaphore],
        wait_stages: &[vk::PipelineStageFlags],
        signal: &[vk::Semaphore],
    ) -> Result<()> {
        let buffers = [command.buffer];
        let submit = vk::SubmitInfo::default()
            .wait_semaphores(wait)
            .wait_dst_stage_mask(wait_stages)
            .command_buffers(&buffers)
            .signal_semaphores(signal);
        unsafe {
            self.device
                .queue_submit(self.queue, &[submit], command.fence)
        }
        .with_context(|| format!("{}: queue submit failed", self.label))?;
        self.ring.mark_submitted(command.index);
        Ok(())
    }

    /// Ends a frame whose image was acquired but whose work never reached the
    /// queue.
    ///
    /// Submits an empty batch that consumes `command.image_available` and
    /// signals the slot's fence, so both are back in a reusable state the next
    /// time the ring visits this slot. The acquired image itself is not
    /// presented; the caller rebuilds the swapchain to get it back.
    pub fn release_acquired(&mut self, command: &VulkanCommandBuffer) -> Result<()> {
        let wait = [command.image_available];
        let stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let submit = release_submit_info(&wait, &stages);
        unsafe {
            self.device
                .queue_submit(self.queue, &[submit], command.fence)
        }
        .with_context(|| format!("{}: release submit failed", self.label))?;
        self.ring.mark_submitted(command.index);
        Ok(())
    }

    pub fn queue(&self) -> vk::Queue {
        self.queue
    }

    pub fn family_index(&self) -> u32 {
        self.family_index
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl Drop for VulkanQueue {
    fn drop(&mut self) {
        unsafe {
            for slot in self.slots.drain(..) {
                self.device.destroy_semaphore(slot.render_finished, None);
                self.device.destroy_semaphore(slot.image_available, None);
                self.device.destroy_fence(slot.fence, None);
            }
            // Frees the command buffers as well.
            self.device.destroy_command_pool(self.pool, None);
        }
    }
}

fn create_slot(
    device: &ash::Device,
    index: usize,
    buffer: vk::CommandBuffer,
) -> Result<VulkanCommandBuffer> {
    let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
    let semaphore_info = vk::SemaphoreCreateInfo::default();
    unsafe {
        let fence = device.create_fence(&fence_info, None)?;
        let image_available = match device.create_semaphore(&semaphore_info, None) {
            Ok(semaphore) => semaphore,
            Err(e) => {
                device.destroy_fence(fence, None);
                return Err(e.into());
            }
        };
        let render_finished = match device.create_semaphore(&semaphore_info, None) {
            Ok(semaphore) => semaphore,
            Err(e) => {
                device.destroy_semaphore(image_available, None);
                device.destroy_fence(fence, None);
                return Err(e.into());
            }
        };
        Ok(VulkanCommandBuffer {
            index,
            buffer,
            fence,
            image_available,
            render_finished,
        })
    }
}

/// A batch that only waits: no command buffers and nothing to signal besides
/// the fence passed to the submit call.
fn release_submit_info<'a>(
    wait: &'a [vk::Semaphore],
    wait_stages: &'a [vk::PipelineStageFlags],
) -> vk::SubmitInfo<'a> {
    vk::SubmitInfo::default()
        .wait_semaphores(wait)
        .wait_dst_stage_mask(wait_stages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn test_release_batch_only_consumes_the_acquire_semaphore() {
        let wait = [vk::Semaphore::from_raw(0x10)];
        let stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let info = release_submit_info(&wait, &stages);

        assert_eq!(info.wait_semaphore_count, 1);
        assert_eq!(unsafe { *info.p_wait_semaphores }, wait[0]);
        assert_eq!(unsafe { *info.p_wait_dst_stage_mask }, stages[0]);
        assert_eq!(info.command_buffer_count, 0);
        assert_eq!(info.signal_semaphore_count, 0);
    }
}
