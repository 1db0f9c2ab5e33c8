use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::data_structures::scene::Lights;

/// Spot and ambient light in one uniform block.
#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

/**
 * GPU layout of [`Lights`]. Scalars ride in the `w` lane of each vec4 so the
 * block needs no padding fields.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// xyz position, w cutoff distance (0 = unlimited)
    spot_position: [f32; 4],
    /// rgb colour premultiplied by intensity, w decay exponent
    spot_colour: [f32; 4],
    /// xyz unit direction towards the target, w cosine of the outer cone
    spot_direction: [f32; 4],
    /// rgb ambient premultiplied by intensity, w cosine of the inner cone
    ambient: [f32; 4],
}

impl LightUniform {
    pub fn from_lights(lights: &Lights) -> Self {
        let spot = &lights.spot;
        let ambient = &lights.ambient;
        let towards = spot.target - spot.position;
        let direction = if towards.magnitude2() > 0.0 {
            towards.normalize()
        } else {
            cgmath::Vector3::new(0.0, -1.0, 0.0)
        };
        let cos_outer = spot.angle.0.cos();
        let cos_inner = (spot.angle.0 * (1.0 - spot.penumbra)).cos();

        Self {
            spot_position: [spot.position.x, spot.position.y, spot.position.z, spot.distance],
            spot_colour: [
                spot.colour[0] * spot.intensity,
                spot.colour[1] * spot.intensity,
                spot.colour[2] * spot.intensity,
                spot.decay,
            ],
            spot_direction: [direction.x, direction.y, direction.z, cos_outer],
            ambient: [
                ambient.colour[0] * ambient.intensity,
                ambient.colour[1] * ambient.intensity,
                ambient.colour[2] * ambient.intensity,
                cos_inner,
            ],
        }
    }
}

impl LightResources {
    pub fn new(device: &wgpu::Device, lights: &Lights) -> Self {
        let uniform = LightUniform::from_lights(lights);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_four_vec4s() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 64);
    }

    #[test]
    fn default_spot_points_at_the_origin() {
        let uniform = LightUniform::from_lights(&Lights::default());
        let expected = -1.0 / 3.0f32.sqrt();
        for axis in 0..3 {
            assert!((uniform.spot_direction[axis] - expected).abs() < 1e-6);
        }
        assert_eq!(uniform.spot_position, [10.0, 10.0, 10.0, 100.0]);
        assert_eq!(&uniform.spot_colour[..3], &[2.0, 2.0, 2.0]);
        // 30 degree cone, inner edge at 27
        assert!((uniform.spot_direction[3] - 0.866_025).abs() < 1e-5);
        assert!(uniform.ambient[3] > uniform.spot_direction[3]);
    }
}
