//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! and helpers for the three kinds the renderer needs: the depth buffer, linear
//! normal maps built from a [`TextureAsset`], and the mipmapped HDR
//! environment built from an [`EnvironmentMap`].

use std::borrow::Cow;

use anyhow::*;
use half::f16;
use image::imageops;

use crate::data_structures::{asset::TextureAsset, environment::EnvironmentMap};

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Filterable HDR format used for the environment chain.
    pub const ENVIRONMENT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Upload a decoded normal map.
    ///
    /// Normal maps store vectors rather than colours, so the texture is linear
    /// (`Rgba8Unorm`). The sampler follows the asset's wrap configuration.
    /// Images larger than the device allows are downscaled to fit.
    pub fn from_asset(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        asset: &TextureAsset,
    ) -> Result<Self> {
        let (source_width, source_height) = asset.dimensions();
        if source_width == 0 || source_height == 0 {
            bail!("texture {} has no pixels", asset.path());
        }
        let max_dimension = device.limits().max_texture_dimension_2d;
        let (width, height) = fit_within(source_width, source_height, max_dimension);
        let pixels = if (width, height) == (source_width, source_height) {
            Cow::Borrowed(asset.image())
        } else {
            log::warn!(
                "{} is {}x{}, downscaling to {}x{}",
                asset.path(),
                source_width,
                source_height,
                width,
                height
            );
            Cow::Owned(imageops::resize(
                asset.image(),
                width,
                height,
                imageops::FilterType::Triangle,
            ))
        };
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(asset.name()),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            pixels.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let (wrap_s, wrap_t) = asset.wrap();
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(asset.name()),
            address_mode_u: wrap_s.into(),
            address_mode_v: wrap_t.into(),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        }));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    /// Upload every prefiltered level of `environment` as one mip level of a
    /// single `Rgba16Float` texture.
    pub fn from_environment(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        environment: &EnvironmentMap,
    ) -> Result<Self> {
        let (width, height) = environment.base_size();
        if environment.mip_count() == 0 || width == 0 || height == 0 {
            bail!("environment {} has no levels", environment.source());
        }
        let max_dimension = device.limits().max_texture_dimension_2d;
        if width.max(height) > max_dimension {
            bail!(
                "environment {} is {}x{}, the device allows {}",
                environment.source(),
                width,
                height,
                max_dimension
            );
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("environment map"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: environment.mip_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::ENVIRONMENT_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in environment.levels().iter().enumerate() {
            let (level_width, level_height) = level.image.dimensions();
            let texels: Vec<f16> = level
                .image
                .pixels()
                .flat_map(|p| [p[0], p[1], p[2], 1.0])
                .map(f16::from_f32)
                .collect();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                bytemuck::cast_slice(&texels),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    // 4 channels * 2 bytes
                    bytes_per_row: Some(8 * level_width),
                    rows_per_image: Some(level_height),
                },
                wgpu::Extent3d {
                    width: level_width,
                    height: level_height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // Longitude wraps around, latitude does not.
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("environment sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

/// Scale `width` x `height` down, keeping the aspect ratio, until neither side
/// exceeds `max_dimension`. Sizes that already fit are returned unchanged.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    let longest = width.max(height);
    if longest <= max_dimension {
        return (width, height);
    }
    let scale =
        |side: u32| ((side as u64 * max_dimension as u64) / longest as u64).max(1) as u32;
    (scale(width), scale(height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_images_fit_the_webgl2_limit() {
        let limit = wgpu::Limits::downlevel_webgl2_defaults().max_texture_dimension_2d;
        assert_eq!(fit_within(4096, 4096, limit), (2048, 2048));
        assert_eq!(fit_within(4096, 1024, limit), (2048, 512));
        assert_eq!(fit_within(1, 10_000, limit), (1, 2048));
    }

    #[test]
    fn images_within_the_limit_are_untouched() {
        assert_eq!(fit_within(2048, 2048, 2048), (2048, 2048));
        assert_eq!(fit_within(300, 7, 2048), (300, 7));
    }
}
