//! The glass pipeline and the per-panel material bindings.
//!
//! Bind groups: 0 material (normal map, environment, material uniform),
//! 1 camera, 2 lights. See `glass.wgsl`.

use wgpu::util::DeviceExt;

use crate::data_structures::{
    geometry::{ModelVertex, Vertex},
    instance::InstanceRaw,
    material::{GlassMaterial, Side},
    texture::Texture,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    colour: [f32; 3],
    roughness: f32,
    env_intensity: f32,
    transmission: f32,
    thickness: f32,
    ior: f32,
    uv_repeat: [f32; 2],
    /// Highest environment mip; roughness 1 samples here.
    max_lod: f32,
    _padding: f32,
}

impl MaterialUniform {
    pub fn new(material: &GlassMaterial, environment_mips: u32) -> Self {
        let profile = material.profile();
        Self {
            colour: profile.colour,
            roughness: profile.roughness,
            env_intensity: profile.env_intensity,
            transmission: profile.transmission,
            thickness: profile.thickness,
            ior: profile.ior,
            uv_repeat: material.normal_map().repeat(),
            max_lod: environment_mips.saturating_sub(1) as f32,
            _padding: 0.0,
        }
    }
}

pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    let sampler_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            texture_entry(0),
            sampler_entry(1),
            texture_entry(2),
            sampler_entry(3),
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("glass_material_bind_group_layout"),
    })
}

/// GPU side of one [`GlassMaterial`].
#[derive(Debug)]
pub struct MaterialBinding {
    pub normal_map: Texture,
    pub uniform: MaterialUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl MaterialBinding {
    /// `environment` is the already uploaded texture of the material's
    /// environment; all panels share it.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        material: &GlassMaterial,
        environment: &Texture,
        environment_mips: u32,
    ) -> anyhow::Result<Self> {
        let normal_map = Texture::from_asset(device, queue, material.normal_map())?;
        let uniform = MaterialUniform::new(material, environment_mips);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(material.normal_map().name()),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let (Some(normal_sampler), Some(environment_sampler)) =
            (&normal_map.sampler, &environment.sampler)
        else {
            anyhow::bail!("glass textures need samplers");
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&normal_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(normal_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(environment_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: buffer.as_entire_binding(),
                },
            ],
            label: Some(material.normal_map().name()),
        });

        Ok(Self {
            normal_map,
            uniform,
            buffer,
            bind_group,
        })
    }
}

/// Glass is tested against the depth buffer but never writes it, so the far
/// side of a double-sided panel is not hidden by the near side.
pub fn glass_depth_stencil() -> wgpu::DepthStencilState {
    crate::pipelines::mk_depth_stencil(Texture::DEPTH_FORMAT, false)
}

pub fn mk_glass_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    material_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
    side: Side,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Glass Pipeline Layout"),
        bind_group_layouts: &[
            material_layout,
            camera_bind_group_layout,
            light_bind_group_layout,
        ],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Glass Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("glass.wgsl").into()),
    };
    crate::pipelines::mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(glass_depth_stencil()),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        side.cull_mode(),
        shader,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use image::RgbaImage;

    use super::*;
    use crate::data_structures::{asset::TextureAsset, material::GlassProfile};

    #[test]
    fn uniform_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
    }

    #[test]
    fn glass_reads_depth_without_writing_it() {
        let depth = glass_depth_stencil();
        assert!(!depth.depth_write_enabled);
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::Less);
        assert_eq!(depth.format, Texture::DEPTH_FORMAT);
    }

    #[test]
    fn uniform_carries_profile_and_repeat() {
        let mut asset = TextureAsset::new("/textures/glass.jpg", RgbaImage::new(2, 2));
        asset.set_repeat(2.0, 3.0);
        let material = GlassMaterial::new(Arc::new(asset), None, GlassProfile::default());
        let uniform = MaterialUniform::new(&material, 6);
        assert_eq!(uniform.uv_repeat, [2.0, 3.0]);
        assert_eq!(uniform.max_lod, 5.0);
        assert_eq!(uniform.ior, 1.5);
        assert_eq!(MaterialUniform::new(&material, 0).max_lod, 0.0);
    }
}
