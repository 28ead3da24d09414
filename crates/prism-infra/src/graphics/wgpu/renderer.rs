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

use super::backend::driver_selection;
use super::context::WgpuGraphicsContext;
use crate::graphics::settle_setup;
use anyhow::Result;
use prism_core::math::Rgba8;
use prism_core::platform::window::{PrismWindow, PrismWindowHandle};
use prism_core::renderer::{QuadRect, Renderer, RendererColors, RendererStatus};
use std::borrow::Cow;
use wgpu::util::DeviceExt;

const QUAD_SHADER: &str = r#"
struct QuadUniform {
    color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> quad: QuadUniform;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    // Two triangles covering the whole viewport.
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    return vec4<f32>(corners[index], 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return quad.color;
}
"#;

const QUAD_VERTEX_COUNT: u32 = 6;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadUniform {
    color: [f32; 4],
}

impl From<Rgba8> for QuadUniform {
    fn from(color: Rgba8) -> Self {
        Self {
            color: color.to_normalized(),
        }
    }
}

fn clear_value(color: Rgba8) -> wgpu::Color {
    let [r, g, b, a] = color.to_f64_array();
    wgpu::Color { r, g, b, a }
}

/// The quad pipeline and its color uniform.
struct QuadPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    uploaded_color: Rgba8,
}

impl QuadPipeline {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, color: Rgba8) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Generic2D Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(QUAD_SHADER)),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Generic2D Quad Color"),
            contents: bytemuck::bytes_of(&QuadUniform::from(color)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Generic2D Quad Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Generic2D Quad Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Generic2D Quad Pipeline Layout"),
            bind_group_layouts: &[Some(&bind_group_layout)],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Generic2D Quad Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group,
            uniform_buffer,
            uploaded_color: color,
        }
    }

    /// Uploads the quad color if it changed since the last frame.
    fn sync_color(&mut self, queue: &wgpu::Queue, color: Rgba8) {
        if self.uploaded_color != color {
            queue.write_buffer(
                &self.uniform_buffer,
                0,
                bytemuck::bytes_of(&QuadUniform::from(color)),
            );
            self.uploaded_color = color;
        }
    }
}

struct Wgpu2DState {
    quad: QuadPipeline,
    context: WgpuGraphicsContext,
}

impl Wgpu2DState {
    fn new(window: &PrismWindowHandle, driver: &str, colors: &RendererColors) -> Result<Self> {
        let selection = driver_selection(driver)?;
        let context =
            pollster::block_on(WgpuGraphicsContext::new(&selection, window, window.inner_size()))?;
        let quad = QuadPipeline::new(&context.device, context.surface_config.format, colors.triangle);
        log::info!(
            "Wgpu2DRenderer: bound to \"{}\" through {:?}",
            context.adapter_name,
            context.adapter_backend
        );
        Ok(Self { quad, context })
    }

    fn draw_frame(&mut self, colors: &RendererColors) {
        let Some(frame) = self.context.acquire() else {
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.quad.sync_color(&self.context.queue, colors.triangle);

        let (width, height) = self.context.size();
        let rect = QuadRect::centered_quarter(width, height);

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Generic2D Frame Encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Generic2D Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_value(colors.clear)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if !rect.is_empty() {
                // The quad covers the whole viewport, so restricting the
                // viewport to the rectangle is what sizes it.
                pass.set_viewport(
                    rect.x as f32,
                    rect.y as f32,
                    rect.width as f32,
                    rect.height as f32,
                    0.0,
                    1.0,
                );
                pass.set_pipeline(&self.quad.pipeline);
                pass.set_bind_group(0, &self.quad.bind_group, &[]);
                pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}

/// Clears the window and fills a centered quad through wgpu.
///
/// The driver name picks the native API wgpu binds to. An unknown name fails
/// the instance.
pub struct Wgpu2DRenderer {
    state: Option<Wgpu2DState>,
    name: String,
    colors: RendererColors,
    status: RendererStatus,
    window: PrismWindowHandle,
}

impl Wgpu2DRenderer {
    /// Resolves `driver`, then creates the surface, device and quad pipeline.
    pub fn new(window: &dyn PrismWindow, driver: &str) -> Self {
        let window = window.clone_handle_arc();
        let colors = RendererColors::default();
        let name = format!("Wgpu2D {{ {driver} }}");
        let (state, status) = settle_setup(&name, Wgpu2DState::new(&window, driver, &colors));
        Self {
            state,
            name,
            colors,
            status,
            window,
        }
    }
}

impl Renderer for Wgpu2DRenderer {
    fn update(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        // The window size is read live; follow it if the host has not
        // forwarded a resize yet.
        let live = self.window.inner_size();
        if live.0 > 0 && live.1 > 0 && live != state.context.size() {
            state.context.resize(live.0, live.1);
        }
        state.draw_frame(&self.colors);
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if (width, height) != state.context.size() {
            state.context.resize(width, height);
        }
    }

    fn name(&self) -> &str {
        &self.name
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
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<QuadUniform>(), 16);
        let uniform = QuadUniform::from(Rgba8::RED);
        assert_eq!(uniform.color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_clear_value_is_normalized() {
        let color = clear_value(Rgba8::new(0, 0, 255, 255));
        assert_eq!((color.r, color.g, color.b, color.a), (0.0, 0.0, 1.0, 1.0));
    }
}
