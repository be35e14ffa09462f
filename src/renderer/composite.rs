// ── Tonemap composite stage ───────────────────────────────────────────────────
//
// The final fullscreen pass: add the blurred bloom onto the HDR scene color,
// compress with the exposure tonemap, gamma-encode, and write the swapchain.
// The pure functions at the top are the exact math the shader runs; the
// property tests exercise them directly.

use wgpu::util::DeviceExt;

use crate::post::PostProcessState;

use super::targets::RenderTarget;

/// Display gamma used by the final encode, applied regardless of toggles.
pub const GAMMA: f32 = 2.2;

/// Exposure tone mapping: `1 − exp(−c·e)`. For c, e ≥ 0 the result lies in
/// [0, 1) and increases monotonically in both arguments.
pub fn tonemap(color: f32, exposure: f32) -> f32 {
    1.0 - (-color * exposure).exp()
}

/// Gamma 2.2 encode of a linear channel already inside [0, 1].
pub fn gamma_encode(channel: f32) -> f32 {
    channel.powf(1.0 / GAMMA)
}

/// CPU mirror of the composite shader for one pixel: bloom addition,
/// HDR tonemap or linear clamp, then the gamma encode.
pub fn composite_pixel(hdr: [f32; 3], bloom: [f32; 3], state: &PostProcessState) -> [f32; 3] {
    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let sum = hdr[c] + if state.bloom_enabled { bloom[c] } else { 0.0 };
        let mapped = if state.hdr_enabled {
            tonemap(sum, state.exposure)
        } else {
            sum.clamp(0.0, 1.0)
        };
        out[c] = gamma_encode(mapped);
    }
    out
}

// ── GPU stage ─────────────────────────────────────────────────────────────────

const COMPOSITE_SHADER: &str = "
struct VertexOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> VertexOut {
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
    );
    var uvs = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 1.0),
    );
    var out: VertexOut;
    out.pos = vec4<f32>(positions[vi], 0.0, 1.0);
    out.uv  = uvs[vi];
    return out;
}

@group(0) @binding(0) var t_hdr: texture_2d<f32>;
@group(0) @binding(1) var t_bloom: texture_2d<f32>;
@group(0) @binding(2) var s_color: sampler;
struct CompositeUniform {
    hdr_enabled: u32,
    bloom_enabled: u32,
    exposure: f32,
    _pad: f32,
}
@group(1) @binding(0) var<uniform> params: CompositeUniform;

const GAMMA: f32 = 2.2;

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    var color = textureSample(t_hdr, s_color, in.uv).rgb;
    if params.bloom_enabled != 0u {
        color += textureSample(t_bloom, s_color, in.uv).rgb;
    }
    var mapped: vec3<f32>;
    if params.hdr_enabled != 0u {
        mapped = vec3<f32>(1.0) - exp(-color * params.exposure);
    } else {
        mapped = clamp(color, vec3<f32>(0.0), vec3<f32>(1.0));
    }
    return vec4<f32>(pow(mapped, vec3<f32>(1.0 / GAMMA)), 1.0);
}
";

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeUniform {
    hdr_enabled: u32,
    bloom_enabled: u32,
    exposure: f32,
    _pad: f32,
}

impl From<&PostProcessState> for CompositeUniform {
    fn from(state: &PostProcessState) -> Self {
        Self {
            hdr_enabled: state.hdr_enabled as u32,
            bloom_enabled: state.bloom_enabled as u32,
            exposure: state.exposure,
            _pad: 0.0,
        }
    }
}

pub struct CompositePass {
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    uniform_group: wgpu::BindGroup,
    texture_group: Option<wgpu::BindGroup>,
}

impl CompositePass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite_texture_bgl"),
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
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composite_uniform_bgl"),
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

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("composite_shader"),
            source: wgpu::ShaderSource::Wgsl(COMPOSITE_SHADER.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("composite_pipeline_layout"),
            bind_group_layouts: &[&texture_layout, &uniform_layout],
            ..Default::default()
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("composite_pipeline"),
            layout: Some(&layout),
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
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("composite_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("composite_uniform"),
            contents: bytemuck::cast_slice(&[CompositeUniform::from(&PostProcessState::default())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite_uniform_bg"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            texture_layout,
            sampler,
            uniform_buffer,
            uniform_group,
            texture_group: None,
        }
    }

    /// (Re)bind the HDR color and bloom result textures. Called at startup
    /// and whenever the targets are recreated.
    pub fn bind_inputs(
        &mut self,
        device: &wgpu::Device,
        hdr: &RenderTarget,
        bloom_view: &wgpu::TextureView,
    ) {
        self.texture_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite_texture_bg"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&hdr.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(bloom_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
    }

    /// Upload this frame's toggle/exposure state.
    pub fn update(&self, queue: &wgpu::Queue, state: &PostProcessState) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[CompositeUniform::from(state)]),
        );
    }

    /// Encode the fullscreen composite into the swapchain view. An unbound
    /// input texture is a setup bug, not a runtime condition.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let texture_group = self
            .texture_group
            .as_ref()
            .expect("composite inputs must be bound before rendering");
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("composite_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, texture_group, &[]);
        rpass.set_bind_group(1, &self.uniform_group, &[]);
        rpass.draw(0..6, 0..1);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tonemap_stays_inside_the_unit_interval() {
        for &c in &[0.0, 0.1, 1.0, 10.0, 1000.0] {
            for &e in &[0.0, 0.5, 1.0, 16.0] {
                let m = tonemap(c, e);
                assert!((0.0..1.0).contains(&m), "tonemap({c}, {e}) = {m}");
            }
        }
    }

    #[test]
    fn tonemap_is_monotone_in_color_and_exposure() {
        let mut prev = -1.0;
        for i in 0..100 {
            let m = tonemap(i as f32 * 0.25, 1.0);
            assert!(m >= prev);
            prev = m;
        }
        prev = -1.0;
        for i in 0..100 {
            let m = tonemap(2.0, i as f32 * 0.25);
            assert!(m >= prev);
            prev = m;
        }
    }

    #[test]
    fn tonemap_of_black_is_black() {
        assert_eq!(tonemap(0.0, 1.0), 0.0);
        assert_eq!(tonemap(0.0, 16.0), 0.0);
    }

    #[test]
    fn hdr_off_makes_exposure_a_no_op() {
        let hdr = [0.3, 0.5, 2.0];
        let bloom = [0.1, 0.1, 0.1];
        let mut state = PostProcessState { hdr_enabled: false, bloom_enabled: true, exposure: 1.0 };
        let low = composite_pixel(hdr, bloom, &state);
        state.exposure = 9.0;
        let high = composite_pixel(hdr, bloom, &state);
        assert_eq!(low, high);
        // And the result is the gamma-encoded clamped linear sum.
        assert_eq!(low[2], gamma_encode(1.0));
        assert!((low[0] - gamma_encode(0.4)).abs() < 1e-6);
    }

    #[test]
    fn bloom_off_ignores_the_blur_contents() {
        let hdr = [0.4, 0.4, 0.4];
        let state = PostProcessState { hdr_enabled: true, bloom_enabled: false, exposure: 1.0 };
        let quiet = composite_pixel(hdr, [0.0; 3], &state);
        let loud = composite_pixel(hdr, [1.0; 3], &state);
        assert_eq!(quiet, loud);
    }

    #[test]
    fn black_scene_composites_to_black() {
        let state = PostProcessState { hdr_enabled: true, bloom_enabled: true, exposure: 1.0 };
        assert_eq!(composite_pixel([0.0; 3], [0.0; 3], &state), [0.0; 3]);
    }

    #[test]
    fn gamma_encode_brightens_midtones() {
        let g = gamma_encode(0.5);
        assert!(g > 0.5 && g < 1.0);
        assert_eq!(gamma_encode(0.0), 0.0);
        assert_eq!(gamma_encode(1.0), 1.0);
    }
}
