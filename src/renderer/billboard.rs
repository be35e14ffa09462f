// ── Grass billboard pass ──────────────────────────────────────────────────────
//
// Transparent quads drawn after all opaque geometry: culling off, depth test
// on (writes off so blades don't punch holes in each other), standard alpha
// blending. Quads are rendered in scene-list order, NOT sorted back-to-front
// against the camera; that can show blending artifacts from some angles.
// Changing the order is an explicit decision recorded in DESIGN.md, not
// something this pass does quietly.
//
// The bright-pass attachment receives black at the blade's alpha, so grass
// occludes bloom behind it without ever adding glow of its own.

use std::path::Path;

use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::geometry::{self, BillboardVertex};

use super::targets::{DEPTH_FORMAT, HDR_FORMAT};

const TEXTURE_SIZE: u32 = 64;

/// Procedural grass texture: a fringe of tapering blades, transparent
/// background. Deterministic — blade shapes come from a hash of the column,
/// not a RNG.
pub fn procedural_grass(size: u32) -> RgbaImage {
    let mut img = RgbaImage::new(size, size);
    for x in 0..size {
        // Cheap per-column hash in [0, 1).
        let h = ((x as f32 * 12.9898).sin() * 43758.5453).fract().abs();
        let blade_height = (0.45 + 0.5 * h) * size as f32;
        let phase = h * std::f32::consts::TAU;
        for y in 0..size {
            let from_bottom = (size - 1 - y) as f32;
            if from_bottom < blade_height {
                let t = from_bottom / blade_height;
                // Blades thin toward the tip and sway slightly.
                let sway = (phase + t * 2.0).sin() * 0.3;
                let center = (x as f32 / size as f32 + sway / size as f32).fract();
                let width = 1.0 - t * 0.8;
                if (center * 7.0).fract() < width * 0.55 {
                    let g = 90.0 + 100.0 * t + 40.0 * h;
                    img.put_pixel(x, y, image::Rgba([30, g as u8, 25, 255]));
                }
            }
        }
    }
    img
}

fn load_texture(path: &Path) -> RgbaImage {
    match image::open(path) {
        Ok(img) => {
            let img = img.to_rgba8();
            if img.dimensions() == (TEXTURE_SIZE, TEXTURE_SIZE) {
                img
            } else {
                image::imageops::resize(
                    &img,
                    TEXTURE_SIZE,
                    TEXTURE_SIZE,
                    image::imageops::FilterType::Triangle,
                )
            }
        }
        Err(e) => {
            log::warn!("grass texture {path:?} failed to load: {e}; using procedural blades");
            procedural_grass(TEXTURE_SIZE)
        }
    }
}

const BILLBOARD_SHADER: &str = "
struct Camera {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
}
@group(0) @binding(0) var<uniform> camera: Camera;
struct Model {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
}
@group(1) @binding(0) var<uniform> object: Model;
@group(2) @binding(0) var t_grass: texture_2d<f32>;
@group(2) @binding(1) var s_grass: sampler;

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.clip = camera.view_proj * object.model * vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}

struct FragmentOut {
    @location(0) color: vec4<f32>,
    @location(1) bright: vec4<f32>,
}

@fragment
fn fs_main(in: VertexOut) -> FragmentOut {
    let color = textureSample(t_grass, s_grass, in.uv);
    if color.a < 0.1 {
        discard;
    }
    var out: FragmentOut;
    out.color = color;
    out.bright = vec4<f32>(0.0, 0.0, 0.0, color.a);
    return out;
}
";

pub struct BillboardPass {
    pipeline: wgpu::RenderPipeline,
    pub model_layout: wgpu::BindGroupLayout,
    texture_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl BillboardPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        camera_layout: &wgpu::BindGroupLayout,
        texture_path: &Path,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("grass_texture"),
            size: wgpu::Extent3d {
                width: TEXTURE_SIZE,
                height: TEXTURE_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let pixels = load_texture(texture_path);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * TEXTURE_SIZE),
                rows_per_image: Some(TEXTURE_SIZE),
            },
            wgpu::Extent3d {
                width: TEXTURE_SIZE,
                height: TEXTURE_SIZE,
                depth_or_array_layers: 1,
            },
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("grass_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("billboard_model_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("billboard_texture_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let texture_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("billboard_texture_bg"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("billboard_shader"),
            source: wgpu::ShaderSource::Wgsl(BILLBOARD_SHADER.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("billboard_pipeline_layout"),
            bind_group_layouts: &[camera_layout, &model_layout, &texture_layout],
            ..Default::default()
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("billboard_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<BillboardVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[
                    Some(wgpu::ColorTargetState {
                        format: HDR_FORMAT,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: HDR_FORMAT,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                ],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Blades are visible from both sides.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let (vertices, indices) = geometry::grass_quad();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("billboard_vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("billboard_indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            pipeline,
            model_layout,
            texture_group,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Draw every billboard in list order using per-quad dynamic offsets
    /// into the model uniform buffer.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        camera_group: &wgpu::BindGroup,
        model_group: &wgpu::BindGroup,
        offsets: &[u32],
    ) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera_group, &[]);
        pass.set_bind_group(2, &self.texture_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for &offset in offsets {
            pass.set_bind_group(1, model_group, &[offset]);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedural_grass_is_deterministic() {
        assert_eq!(procedural_grass(32), procedural_grass(32));
    }

    #[test]
    fn procedural_grass_has_transparent_sky_and_opaque_roots() {
        let img = procedural_grass(64);
        let transparent = img.pixels().filter(|p| p[3] == 0).count();
        let opaque = img.pixels().filter(|p| p[3] == 255).count();
        assert!(transparent > 0, "blades should not fill the whole quad");
        assert!(opaque > 0, "some blade pixels must be opaque");
        // The top row is above every blade tip.
        assert!((0..64).all(|x| img.get_pixel(x, 0)[3] == 0));
    }
}
