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

use glow::HasContext;
use prism_core::renderer::{
    triangle_bytes, RenderError, ShaderStage, VERTEX_COMPONENTS, VERTEX_COUNT, VERTEX_OFFSET,
    VERTEX_STRIDE,
};

type Program = <glow::Context as HasContext>::Program;
type Shader = <glow::Context as HasContext>::Shader;
type Buffer = <glow::Context as HasContext>::Buffer;
type VertexArray = <glow::Context as HasContext>::VertexArray;

const VERTEX_SHADER_SOURCE: &str = r#"#version 330 core
layout (location = 0) in vec3 a_position;

void main() {
    gl_Position = vec4(a_position, 1.0);
}
"#;

const FRAGMENT_SHADER_SOURCE: &str = r#"#version 330 core
out vec4 frag_color;

void main() {
    frag_color = vec4(1.0, 0.5, 0.2, 1.0);
}
"#;

/// The linked program plus the vertex array describing the triangle buffer.
pub(super) struct TrianglePipeline {
    program: Program,
    vertex_array: VertexArray,
    vertex_buffer: Buffer,
}

impl TrianglePipeline {
    /// Compiles and links the embedded shaders and uploads the triangle.
    ///
    /// # Safety
    /// The context `gl` was loaded from must be current on this thread.
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, RenderError> {
        // --- 1. Shaders and program ---
        let vertex = compile_shader(gl, glow::VERTEX_SHADER, ShaderStage::Vertex, VERTEX_SHADER_SOURCE)?;
        let fragment = match compile_shader(
            gl,
            glow::FRAGMENT_SHADER,
            ShaderStage::Fragment,
            FRAGMENT_SHADER_SOURCE,
        ) {
            Ok(shader) => shader,
            Err(e) => {
                gl.delete_shader(vertex);
                return Err(e);
            }
        };
        let linked = link_program(gl, vertex, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);
        let program = linked?;

        // --- 2. Vertex array and buffer ---
        let vertex_array = match gl.create_vertex_array() {
            Ok(vao) => vao,
            Err(e) => {
                gl.delete_program(program);
                return Err(RenderError::Backend(format!("glGenVertexArrays failed: {e}")));
            }
        };
        let vertex_buffer = match gl.create_buffer() {
            Ok(vbo) => vbo,
            Err(e) => {
                gl.delete_vertex_array(vertex_array);
                gl.delete_program(program);
                return Err(RenderError::Backend(format!("glGenBuffers failed: {e}")));
            }
        };

        gl.bind_vertex_array(Some(vertex_array));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, triangle_bytes(), glow::STATIC_DRAW);
        gl.vertex_attrib_pointer_f32(
            0,
            VERTEX_COMPONENTS as i32,
            glow::FLOAT,
            false,
            VERTEX_STRIDE as i32,
            VERTEX_OFFSET as i32,
        );
        gl.enable_vertex_attrib_array(0);
        gl.bind_vertex_array(None);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        Ok(Self {
            program,
            vertex_array,
            vertex_buffer,
        })
    }

    /// Binds the program and vertex array and draws the triangle.
    ///
    /// # Safety
    /// The owning context must be current.
    pub unsafe fn draw(&self, gl: &glow::Context) {
        gl.use_program(Some(self.program));
        gl.bind_vertex_array(Some(self.vertex_array));
        gl.draw_arrays(glow::TRIANGLES, 0, VERTEX_COUNT as i32);
        gl.bind_vertex_array(None);
    }

    /// # Safety
    /// The owning context must be current. `self` must not be used afterwards.
    pub unsafe fn destroy(&self, gl: &glow::Context) {
        gl.delete_buffer(self.vertex_buffer);
        gl.delete_vertex_array(self.vertex_array);
        gl.delete_program(self.program);
    }
}

unsafe fn compile_shader(
    gl: &glow::Context,
    kind: u32,
    stage: ShaderStage,
    source: &str,
) -> Result<Shader, RenderError> {
    let shader = gl.create_shader(kind).map_err(|log| RenderError::ShaderCompilation {
        stage,
        log,
    })?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(RenderError::ShaderCompilation { stage, log });
    }
    Ok(shader)
}

unsafe fn link_program(
    gl: &glow::Context,
    vertex: Shader,
    fragment: Shader,
) -> Result<Program, RenderError> {
    let program = gl
        .create_program()
        .map_err(|e| RenderError::Backend(format!("glCreateProgram failed: {e}")))?;
    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    gl.link_program(program);
    gl.detach_shader(program, vertex);
    gl.detach_shader(program, fragment);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(RenderError::Backend(format!("Program link failed: {log}")));
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shaders_target_glsl_330_core() {
        for source in [VERTEX_SHADER_SOURCE, FRAGMENT_SHADER_SOURCE] {
            assert!(source.starts_with("#version 330 core"));
        }
        assert!(VERTEX_SHADER_SOURCE.contains("layout (location = 0) in vec3"));
        assert!(FRAGMENT_SHADER_SOURCE.contains("vec4(1.0, 0.5, 0.2, 1.0)"));
    }
}
