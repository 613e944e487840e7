//! Plane geometry for GPU rendering.
//!
//! - [`Vertex3d`]: position, normal and UV, the layout the compiled reveal
//!   programs read
//! - [`Mesh`]: GPU-resident vertex and index buffers
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |

use crate::gpu::GpuContext;

/// A vertex with position, normal, and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Position in the plane's local space.
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Texture coordinates in [0, 1], v = 0 at the top edge.
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout descriptor for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Vertices and indices of a `width` x `height` quad in the XY plane,
/// centred on the origin and facing +Z.
///
/// Texture coordinates follow the wgpu convention: v = 0 along the top edge,
/// so the image appears upright.
pub fn plane_geometry(width: f32, height: f32) -> (Vec<Vertex3d>, Vec<u32>) {
    let hw = width * 0.5;
    let hh = height * 0.5;
    let normal = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex3d::new([-hw, -hh, 0.0], normal, [0.0, 1.0]),
        Vertex3d::new([hw, -hh, 0.0], normal, [1.0, 1.0]),
        Vertex3d::new([hw, hh, 0.0], normal, [1.0, 0.0]),
        Vertex3d::new([-hw, hh, 0.0], normal, [0.0, 0.0]),
    ];
    let indices = vec![0, 1, 2, 2, 3, 0];
    (vertices, indices)
}

/// GPU-resident geometry with vertex and index buffers.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Upload vertex and index data.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Plane Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Plane Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Creates a `width` x `height` quad, see [`plane_geometry`].
    pub fn plane(gpu: &GpuContext, width: f32, height: f32) -> Self {
        let (vertices, indices) = plane_geometry(width, height);
        Self::new(gpu, &vertices, &indices)
    }
}
