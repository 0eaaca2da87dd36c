//! CPU-side mesh generation.
//!
//! All generators emit counter-clockwise triangles when seen from outside, with
//! per-face normals for boxes and planes and smooth normals for spheres.

use glam::Vec3;

/// Vertex layout shared by every mesh: position and normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }

    /// Get the vertex buffer layout for this vertex type.
    pub const fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
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
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Indexed triangle list ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Faces of an axis-aligned box as (normal, u, v) with `u × v = normal`.
const BOX_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned box spanning `min..max`, 24 vertices and 12 triangles.
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let (min, max) = (min.min(max), min.max(max));
        let centre = (min + max) * 0.5;
        let half = (max - min) * 0.5;

        let mut mesh = Self {
            vertices: Vec::with_capacity(24),
            indices: Vec::with_capacity(36),
        };
        for (normal, u, v) in BOX_FACES {
            let face_centre = centre + normal * half;
            mesh.push_quad(face_centre, u * half, v * half, normal);
        }
        mesh
    }

    /// UV sphere centred at the origin.
    ///
    /// `rings` is the number of latitude bands and `sectors` the number of longitude
    /// bands; both are clamped to usable minimums.
    pub fn sphere(radius: f32, rings: u32, sectors: u32) -> Self {
        let rings = rings.max(2);
        let sectors = sectors.max(3);
        let mut mesh = Self {
            vertices: Vec::with_capacity(((rings + 1) * (sectors + 1)) as usize),
            indices: Vec::with_capacity((rings * sectors * 6) as usize),
        };

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            for sector in 0..=sectors {
                let theta = std::f32::consts::TAU * sector as f32 / sectors as f32;
                let (sin_theta, cos_theta) = theta.sin_cos();
                let normal = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
                mesh.vertices.push(Vertex::new(normal * radius, normal));
            }
        }

        for ring in 0..rings {
            for sector in 0..sectors {
                let current = ring * (sectors + 1) + sector;
                let next = current + sectors + 1;
                mesh.indices
                    .extend_from_slice(&[current, current + 1, next, current + 1, next + 1, next]);
            }
        }

        mesh
    }

    /// Upward-facing rectangle on the plane `y`, spanning the given X and Z ranges.
    pub fn plane_xz(x0: f32, z0: f32, x1: f32, z1: f32, y: f32) -> Self {
        let (min_x, max_x) = (x0.min(x1), x0.max(x1));
        let (min_z, max_z) = (z0.min(z1), z0.max(z1));
        let centre = Vec3::new((min_x + max_x) * 0.5, y, (min_z + max_z) * 0.5);
        let half_x = (max_x - min_x) * 0.5;
        let half_z = (max_z - min_z) * 0.5;

        let mut mesh = Self {
            vertices: Vec::with_capacity(4),
            indices: Vec::with_capacity(6),
        };
        mesh.push_quad(centre, Vec3::Z * half_z, Vec3::X * half_x, Vec3::Y);
        mesh
    }

    fn push_quad(&mut self, centre: Vec3, u: Vec3, v: Vec3, normal: Vec3) {
        let base = self.vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            self.vertices.push(Vertex::new(centre + u * su + v * sv, normal));
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}
