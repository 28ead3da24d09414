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

//! Render pass, triangle pipeline and vertex buffer.

use super::bootstrap::{find_memory_type, VulkanDevice};
use anyhow::{anyhow, Context, Result};
use ash::vk;
use prism_core::renderer::{RenderError, ShaderStage, VERTEX_OFFSET, VERTEX_STRIDE};

/// The triangle shaders, compiled to SPIR-V at pipeline creation.
pub const TRIANGLE_SHADER: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.5, 0.2, 1.0);
}
"#;

/// Compiles one entry point of a WGSL module to SPIR-V words.
///
/// The SPIR-V backend flips `y` so clip space matches the other backends.
pub fn compile_wgsl(
    source: &str,
    stage: ShaderStage,
    entry_point: &str,
) -> Result<Vec<u32>, RenderError> {
    let failed = |log: String| RenderError::ShaderCompilation { stage, log };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| failed(e.emit_to_string(source)))?;
    let info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| failed(e.emit_to_string(source)))?;

    let pipeline_options = naga::back::spv::PipelineOptions {
        shader_stage: match stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        },
        entry_point: entry_point.to_string(),
    };
    naga::back::spv::write_vec(
        &module,
        &info,
        &naga::back::spv::Options::default(),
        Some(&pipeline_options),
    )
    .map_err(|e| failed(e.to_string()))
}

/// A single-subpass render pass that clears the swapchain image and leaves it
/// ready to present.
pub struct RenderPass {
    device: ash::Device,
    handle: vk::RenderPass,
}

impl RenderPass {
    pub fn new(device: &ash::Device, format: vk::Format) -> Result<Self> {
        let attachments = [vk::AttachmentDescription::default()
            .format(format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)];
        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)];
        // The image is acquired asynchronously; writes wait for the
        // acquire semaphore at the color output stage.
        let dependencies = [vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)];
        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let handle = unsafe { device.create_render_pass(&info, None) }
            .context("Failed to create the render pass")?;
        Ok(Self {
            device: device.clone(),
            handle,
        })
    }

    pub fn handle(&self) -> vk::RenderPass {
        self.handle
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe { self.device.destroy_render_pass(self.handle, None) };
    }
}

/// Shader module destroyed when it goes out of scope; only needed until the
/// pipeline is created.
struct ShaderModule<'a> {
    device: &'a ash::Device,
    handle: vk::ShaderModule,
}

impl<'a> ShaderModule<'a> {
    fn new(device: &'a ash::Device, stage: ShaderStage, entry_point: &str) -> Result<Self> {
        let words = compile_wgsl(TRIANGLE_SHADER, stage, entry_point)?;
        let info = vk::ShaderModuleCreateInfo::default().code(&words);
        let handle = unsafe { device.create_shader_module(&info, None) }
            .with_context(|| format!("Failed to create the {stage} shader module"))?;
        Ok(Self { device, handle })
    }
}

impl Drop for ShaderModule<'_> {
    fn drop(&mut self) {
        unsafe { self.device.destroy_shader_module(self.handle, None) };
    }
}

/// Graphics pipeline drawing the triangle with dynamic viewport and scissor.
pub struct TrianglePipeline {
    device: ash::Device,
    layout: vk::PipelineLayout,
    handle: vk::Pipeline,
}

impl TrianglePipeline {
    pub fn new(device: &ash::Device, render_pass: &RenderPass) -> Result<Self> {
        // --- 1. Shaders ---
        let vertex = ShaderModule::new(device, ShaderStage::Vertex, "vs_main")?;
        let fragment = ShaderModule::new(device, ShaderStage::Fragment, "fs_main")?;
        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex.handle)
                .name(c"vs_main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment.handle)
                .name(c"fs_main"),
        ];

        // --- 2. Fixed Function State ---
        let bindings = [vk::VertexInputBindingDescription {
            binding: 0,
            stride: VERTEX_STRIDE,
            input_rate: vk::VertexInputRate::VERTEX,
        }];
        let attributes = [vk::VertexInputAttributeDescription {
            location: 0,
            binding: 0,
            format: vk::Format::R32G32B32_SFLOAT,
            offset: VERTEX_OFFSET,
        }];
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&bindings)
            .vertex_attribute_descriptions(&attributes);
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST);
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);
        // The triangle winds counter-clockwise on screen once y is flipped.
        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .line_width(1.0);
        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);
        let blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(false)
            .color_write_mask(vk::ColorComponentFlags::RGBA)];
        let color_blend =
            vk::PipelineColorBlendStateCreateInfo::default().attachments(&blend_attachments);
        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        // --- 3. Layout and Pipeline ---
        let layout_info = vk::PipelineLayoutCreateInfo::default();
        let layout = unsafe { device.create_pipeline_layout(&layout_info, None) }
            .context("Failed to create the pipeline layout")?;

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass.handle())
            .subpass(0);

        let created = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
        };
        let handle = match created {
            Ok(pipelines) => pipelines.into_iter().next(),
            Err((_, e)) => {
                unsafe { device.destroy_pipeline_layout(layout, None) };
                return Err(anyhow!(e).context("Failed to create the triangle pipeline"));
            }
        };
        let Some(handle) = handle else {
            unsafe { device.destroy_pipeline_layout(layout, None) };
            return Err(anyhow!("The driver returned no pipeline"));
        };

        Ok(Self {
            device: device.clone(),
            layout,
            handle,
        })
    }

    pub fn handle(&self) -> vk::Pipeline {
        self.handle
    }
}

impl Drop for TrianglePipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.handle, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// A host-visible vertex buffer filled once at creation.
pub struct VertexBuffer {
    device: ash::Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
}

impl VertexBuffer {
    pub fn new(device: &VulkanDevice, bytes: &[u8]) -> Result<Self> {
        let vk_device = device.device();
        let size = bytes.len() as vk::DeviceSize;

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(vk::BufferUsageFlags::VERTEX_BUFFER)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe { vk_device.create_buffer(&buffer_info, None) }
            .context("Failed to create the vertex buffer")?;

        let mut this = Self {
            device: vk_device.clone(),
            buffer,
            memory: vk::DeviceMemory::null(),
        };

        let requirements = unsafe { vk_device.get_buffer_memory_requirements(buffer) };
        let memory_type = find_memory_type(
            &device.memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )
        .ok_or_else(|| anyhow!("No host-visible coherent memory for the vertex buffer"))?;

        let alloc_info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        unsafe {
            this.memory = vk_device
                .allocate_memory(&alloc_info, None)
                .context("Failed to allocate vertex memory")?;
            vk_device
                .bind_buffer_memory(buffer, this.memory, 0)
                .context("Failed to bind vertex memory")?;
            let mapped = vk_device
                .map_memory(this.memory, 0, size, vk::MemoryMapFlags::empty())
                .context("Failed to map vertex memory")?;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.cast::<u8>(), bytes.len());
            vk_device.unmap_memory(this.memory);
        }
        Ok(this)
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            if self.memory != vk::DeviceMemory::null() {
                self.device.free_memory(self.memory, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_shader_compiles_to_spirv() {
        for (stage, entry) in [
            (ShaderStage::Vertex, "vs_main"),
            (ShaderStage::Fragment, "fs_main"),
        ] {
            let words = compile_wgsl(TRIANGLE_SHADER, stage, entry).unwrap();
            assert_eq!(words[0], 0x0723_0203, "SPIR-V magic number");
        }
    }

    #[test]
    fn test_invalid_shader_reports_stage() {
        match compile_wgsl("fn broken( {", ShaderStage::Fragment, "fs_main") {
            Err(RenderError::ShaderCompilation { stage, log }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("expected a compilation error, got {other:?}"),
        }
    }
}
