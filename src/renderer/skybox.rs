// ── Skybox pass ───────────────────────────────────────────────────────────────
//
// Cubemap skybox drawn after the opaque geometry at maximum depth with a
// LessEqual compare. Face images are looked up on disk; a missing or
// unreadable face logs a warning and falls back to a procedural sky
// gradient so the frame still renders.

use std::path::Path;

use image::RgbaImage;
use walkdir::WalkDir;
use wgpu::util::DeviceExt;

use crate::geometry;

use super::targets::{DEPTH_FORMAT, HDR_FORMAT};

/// Face file names, in cubemap layer order: +X, -X, +Y, -Y, +Z, -Z.
pub const FACE_NAMES: [&str; 6] = ["front", "back", "top", "bottom", "left", "right"];

const FACE_SIZE: u32 = 256;

/// Procedural fallback face: a vertical gradient from deep sky blue down to
/// a pale horizon. The same image serves every face; the seams are soft
/// enough for a placeholder.
pub fn fallback_face(size: u32) -> RgbaImage {
    let mut img = RgbaImage::new(size, size);
    for y in 0..size {
        let t = y as f32 / (size - 1).max(1) as f32;
        let r = (0.35 + 0.45 * t) * 255.0;
        let g = (0.55 + 0.35 * t) * 255.0;
        let b = (0.85 + 0.12 * t) * 255.0;
        for x in 0..size {
            img.put_pixel(x, y, image::Rgba([r as u8, g as u8, b as u8, 255]));
        }
    }
    img
}

/// Find `<name>.<any extension>` anywhere under `dir`.
fn find_face(dir: &Path, name: &str) -> Option<std::path::PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_file()
                && entry.path().file_stem().and_then(|s| s.to_str()) == Some(name)
        })
        .map(|entry| entry.into_path())
}

fn load_face(dir: &Path, name: &str) -> RgbaImage {
    let Some(path) = find_face(dir, name) else {
        log::warn!("skybox face '{name}' not found under {dir:?}; using gradient fallback");
        return fallback_face(FACE_SIZE);
    };
    match image::open(&path) {
        Ok(img) => {
            let img = img.to_rgba8();
            // All six layers of a cube texture must share one size.
            if img.dimensions() == (FACE_SIZE, FACE_SIZE) {
                img
            } else {
                image::imageops::resize(
                    &img,
                    FACE_SIZE,
                    FACE_SIZE,
                    image::imageops::FilterType::Triangle,
                )
            }
        }
        Err(e) => {
            log::warn!("skybox face {path:?} failed to load: {e}; using gradient fallback");
            fallback_face(FACE_SIZE)
        }
    }
}

const SKYBOX_SHADER: &str = "
struct Camera {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
}
@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var t_sky: texture_cube<f32>;
@group(1) @binding(1) var s_sky: sampler;

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) direction: vec3<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOut {
    var out: VertexOut;
    let clip = camera.view_proj * vec4<f32>(position, 1.0);
    // Pin depth to the far plane so the sky never occludes geometry.
    out.clip = clip.xyww;
    out.direction = position;
    return out;
}

struct FragmentOut {
    @location(0) color: vec4<f32>,
    @location(1) bright: vec4<f32>,
}

@fragment
fn fs_main(in: VertexOut) -> FragmentOut {
    let color = textureSample(t_sky, s_sky, in.direction).rgb;
    var out: FragmentOut;
    out.color = vec4<f32>(color, 1.0);
    let luma = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    if luma > 1.0 {
        out.bright = vec4<f32>(color, 1.0);
    } else {
        out.bright = vec4<f32>(0.0, 0.0, 0.0, 1.0);
    }
    return out;
}
";

pub struct SkyboxPass {
    pipeline: wgpu::RenderPipeline,
    pub camera_layout: wgpu::BindGroupLayout,
    texture_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
}

impl SkyboxPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces_dir: &Path,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("skybox_cubemap"),
            size: wgpu::Extent3d {
                width: FACE_SIZE,
                height: FACE_SIZE,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, name) in FACE_NAMES.iter().enumerate() {
            let face = load_face(faces_dir, name);
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d { x: 0, y: 0, z: layer as u32 },
                    aspect: wgpu::TextureAspect::All,
                },
                &face,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * FACE_SIZE),
                    rows_per_image: Some(FACE_SIZE),
                },
                wgpu::Extent3d {
                    width: FACE_SIZE,
                    height: FACE_SIZE,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("skybox_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox_camera_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("skybox_texture_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
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
            label: Some("skybox_texture_bg"),
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
            label: Some("skybox_shader"),
            source: wgpu::ShaderSource::Wgsl(SKYBOX_SHADER.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("skybox_pipeline_layout"),
            bind_group_layouts: &[&camera_layout, &texture_layout],
            ..Default::default()
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("skybox_pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: (3 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[
                    Some(wgpu::ColorTargetState {
                        format: HDR_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: HDR_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                ],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // The camera sits inside the cube.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let cube: Vec<[f32; 3]> = geometry::skybox_cube();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox_vertices"),
            contents: bytemuck::cast_slice(&cube),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            pipeline,
            camera_layout,
            texture_group,
            vertex_buffer,
        }
    }

    /// Record the skybox draw into an already-open scene pass.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, camera_group: &wgpu::BindGroup) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, camera_group, &[]);
        pass.set_bind_group(1, &self.texture_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..36, 0..1);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_face_is_a_top_down_gradient() {
        let img = fallback_face(16);
        let top = img.get_pixel(8, 0);
        let bottom = img.get_pixel(8, 15);
        assert!(bottom[0] > top[0], "horizon should be paler than zenith");
        assert_eq!(top[3], 255);
    }

    #[test]
    fn face_names_cover_all_six_layers() {
        assert_eq!(FACE_NAMES.len(), 6);
        let unique: std::collections::HashSet<_> = FACE_NAMES.iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn missing_faces_dir_yields_fallbacks() {
        let face = load_face(Path::new("/nonexistent/skybox"), "front");
        assert_eq!(face.dimensions(), (FACE_SIZE, FACE_SIZE));
    }
}
