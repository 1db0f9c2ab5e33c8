//! Vertex layout and the procedural box used for every glass panel.

use cgmath::InnerSpace;

/// Describes how a vertex type is laid out in a GPU vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Width (x), height (y) and depth (z) of a panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxDimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Default for BoxDimensions {
    fn default() -> Self {
        Self {
            width: 3.56,
            height: 2.1,
            depth: 0.1,
        }
    }
}

/// An axis-aligned box centred on the origin, one quad per face so every face
/// carries its own normals and a full `0..1` UV range.
///
/// Built once per scene and shared between all panels.
#[derive(Debug, Clone)]
pub struct BoxGeometry {
    dimensions: BoxDimensions,
    vertices: Vec<ModelVertex>,
    indices: Vec<u16>,
}

// (normal, texture-u direction, texture-v "up" direction); u x v == normal.
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

impl BoxGeometry {
    pub fn new(dimensions: BoxDimensions) -> Self {
        let half = cgmath::Vector3::new(
            dimensions.width / 2.0,
            dimensions.height / 2.0,
            dimensions.depth / 2.0,
        );
        let extent = |axis: cgmath::Vector3<f32>| {
            axis.x.abs() * half.x + axis.y.abs() * half.y + axis.z.abs() * half.z
        };

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in FACES {
            let normal = cgmath::Vector3::from(normal);
            let u = cgmath::Vector3::from(u);
            let v = cgmath::Vector3::from(v);
            let centre = normal * extent(normal);
            let (du, dv) = (u * extent(u), v * extent(v));

            let base = vertices.len() as u16;
            // top-left, top-right, bottom-left, bottom-right
            for (su, sv, uv) in [
                (-1.0, 1.0, [0.0, 0.0]),
                (1.0, 1.0, [1.0, 0.0]),
                (-1.0, -1.0, [0.0, 1.0]),
                (1.0, -1.0, [1.0, 1.0]),
            ] {
                vertices.push(ModelVertex {
                    position: (centre + du * su + dv * sv).into(),
                    tex_coords: uv,
                    normal: normal.into(),
                    // We'll calculate these later
                    tangent: [0.0; 3],
                    bitangent: [0.0; 3],
                });
            }
            indices.extend_from_slice(&[base, base + 2, base + 1, base + 2, base + 3, base + 1]);
        }
        compute_tangents(&mut vertices, &indices);

        Self {
            dimensions,
            vertices,
            indices,
        }
    }

    pub fn dimensions(&self) -> BoxDimensions {
        self.dimensions
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }
}

/// Normal maps need a tangent frame per vertex; derive it from the UV layout
/// of the triangles each vertex belongs to and average.
pub fn compute_tangents(vertices: &mut [ModelVertex], indices: &[u16]) {
    let mut triangles_included = vec![0u32; vertices.len()];

    for c in indices.chunks_exact(3) {
        let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);
        let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);

        let pos0: cgmath::Vector3<_> = v0.position.into();
        let pos1: cgmath::Vector3<_> = v1.position.into();
        let pos2: cgmath::Vector3<_> = v2.position.into();

        let uv0: cgmath::Vector2<_> = v0.tex_coords.into();
        let uv1: cgmath::Vector2<_> = v1.tex_coords.into();
        let uv2: cgmath::Vector2<_> = v2.tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        //     delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let r = 1.0 / (delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x);
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // flipped so normal maps stay right-handed with wgpu's top-left UV origin
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        for i in [i0, i1, i2] {
            vertices[i].tangent = (tangent + cgmath::Vector3::from(vertices[i].tangent)).into();
            vertices[i].bitangent =
                (bitangent + cgmath::Vector3::from(vertices[i].bitangent)).into();
            triangles_included[i] += 1;
        }
    }

    for (v, n) in vertices.iter_mut().zip(triangles_included) {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        v.tangent = (cgmath::Vector3::from(v.tangent) * denom).normalize().into();
        v.bitangent = (cgmath::Vector3::from(v.bitangent) * denom).normalize().into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> BoxGeometry {
        BoxGeometry::new(BoxDimensions::default())
    }

    #[test]
    fn box_has_four_vertices_and_two_triangles_per_face() {
        let geometry = panel();
        assert_eq!(geometry.vertices().len(), 24);
        assert_eq!(geometry.indices().len(), 36);
        assert!(geometry.indices().iter().all(|&i| (i as usize) < 24));
    }

    #[test]
    fn vertices_lie_on_the_box_surface() {
        let dims = BoxDimensions::default();
        for v in panel().vertices() {
            assert!((v.position[0].abs() - dims.width / 2.0).abs() < 1e-5);
            assert!((v.position[1].abs() - dims.height / 2.0).abs() < 1e-5);
            assert!((v.position[2].abs() - dims.depth / 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn triangles_wind_counter_clockwise_seen_from_outside() {
        let geometry = panel();
        let vertices = geometry.vertices();
        for c in geometry.indices().chunks_exact(3) {
            let p = |i: u16| cgmath::Vector3::from(vertices[i as usize].position);
            let face_normal = (p(c[1]) - p(c[0])).cross(p(c[2]) - p(c[0]));
            let normal = cgmath::Vector3::from(vertices[c[0] as usize].normal);
            assert!(face_normal.dot(normal) > 0.0);
        }
    }

    #[test]
    fn tangent_frame_is_orthonormal() {
        for v in panel().vertices() {
            let n = cgmath::Vector3::from(v.normal);
            let t = cgmath::Vector3::from(v.tangent);
            let b = cgmath::Vector3::from(v.bitangent);
            assert!((t.magnitude() - 1.0).abs() < 1e-5);
            assert!((b.magnitude() - 1.0).abs() < 1e-5);
            assert!(t.dot(n).abs() < 1e-5);
            assert!(b.dot(n).abs() < 1e-5);
            // right-handed: T x B points along N
            assert!(t.cross(b).dot(n) > 0.99);
        }
    }
}
