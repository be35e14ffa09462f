// ── Bloom blur stage ──────────────────────────────────────────────────────────
//
// Separable Gaussian blur over the bright-pass texture: each pass convolves
// a 9-texel window (5 weights, mirrored) along one axis, alternating
// horizontal then vertical, ping-ponging between two offscreen targets.
// The plan below is pure data so the pass sequence and final-buffer parity
// are testable without a GPU; `blur_cpu` mirrors the shader kernel exactly
// (same weights, same edge clamping) and backs the property tests.

use wgpu::util::DeviceExt;

use super::targets::{HDR_FORMAT, PingPongPair, RenderTarget};

/// Production blur iteration count.
pub const BLUR_ITERATIONS: u32 = 10;

/// 5-tap half-kernel of the separable Gaussian; index 0 is the center texel,
/// indices 1..4 are mirrored to both sides. Sums to ~1 over the full window.
pub const GAUSSIAN_WEIGHTS: [f32; 5] = [0.227_027, 0.194_594_6, 0.121_621_6, 0.054_054, 0.016_216];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Where a blur pass reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurSource {
    /// The raw bright-pass texture (first iteration only).
    Bright,
    /// One of the two ping-pong buffers.
    PingPong(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlurPass {
    pub axis: Axis,
    pub source: BlurSource,
    /// Index of the ping-pong buffer written by this pass.
    pub destination: usize,
}

/// The fixed pass sequence for a given iteration count.
#[derive(Clone, Copy, Debug)]
pub struct BlurPlan {
    pub iterations: u32,
}

impl BlurPlan {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Pass `i` blurs horizontally when `i` is even, vertically when odd.
    /// The first write lands in buffer 0, seeding the parity; every later
    /// pass reads the buffer the previous pass wrote.
    pub fn passes(&self) -> impl Iterator<Item = BlurPass> + '_ {
        (0..self.iterations).map(|i| BlurPass {
            axis: if i % 2 == 0 { Axis::Horizontal } else { Axis::Vertical },
            source: if i == 0 {
                BlurSource::Bright
            } else {
                BlurSource::PingPong(((i - 1) % 2) as usize)
            },
            destination: (i % 2) as usize,
        })
    }

    /// Which buffer holds the final result, or `None` when zero iterations
    /// leave the bright-pass texture untouched as the result.
    pub fn final_buffer(&self) -> Option<usize> {
        if self.iterations == 0 {
            None
        } else {
            Some(((self.iterations - 1) % 2) as usize)
        }
    }
}

// ── CPU reference kernel ──────────────────────────────────────────────────────

/// Clamp a tap coordinate to the valid texel range (no wraparound).
pub fn clamp_tap(coord: i64, len: u32) -> u32 {
    coord.clamp(0, len as i64 - 1) as u32
}

/// One single-axis Gaussian pass over an RGB image stored as `[r, g, b]`
/// triples in row-major order. Mirrors the fragment shader texel for texel.
pub fn blur_pass_cpu(src: &[[f32; 3]], width: u32, height: u32, axis: Axis) -> Vec<[f32; 3]> {
    assert_eq!(src.len(), (width * height) as usize);
    let mut out = vec![[0.0f32; 3]; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0f32; 3];
            for (tap, weight) in (-4i64..=4).map(|t| (t, GAUSSIAN_WEIGHTS[t.unsigned_abs() as usize])) {
                let (sx, sy) = match axis {
                    Axis::Horizontal => (clamp_tap(x as i64 + tap, width), y),
                    Axis::Vertical => (x, clamp_tap(y as i64 + tap, height)),
                };
                let texel = src[(sy * width + sx) as usize];
                for c in 0..3 {
                    acc[c] += texel[c] * weight;
                }
            }
            out[(y * width + x) as usize] = acc;
        }
    }
    out
}

/// Run the full blur plan on the CPU. With zero iterations the input is
/// returned untouched.
pub fn blur_cpu(src: &[[f32; 3]], width: u32, height: u32, iterations: u32) -> Vec<[f32; 3]> {
    let mut image = src.to_vec();
    for pass in BlurPlan::new(iterations).passes() {
        image = blur_pass_cpu(&image, width, height, pass.axis);
    }
    image
}

// ── GPU stage ─────────────────────────────────────────────────────────────────

const BLUR_SHADER: &str = "
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

@group(0) @binding(0) var t_source: texture_2d<f32>;
@group(0) @binding(1) var s_source: sampler;
struct BlurUniform {
    // (1,0) horizontal or (0,1) vertical.
    direction: vec2<f32>,
    texel: vec2<f32>,
}
@group(1) @binding(0) var<uniform> blur: BlurUniform;

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    var weights = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    var acc = textureSample(t_source, s_source, in.uv).rgb * weights[0];
    for (var i = 1; i < 5; i += 1) {
        let offset = blur.direction * blur.texel * f32(i);
        acc += textureSample(t_source, s_source, in.uv + offset).rgb * weights[i];
        acc += textureSample(t_source, s_source, in.uv - offset).rgb * weights[i];
    }
    return vec4<f32>(acc, 1.0);
}
";

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurUniform {
    direction: [f32; 2],
    texel: [f32; 2],
}

/// GPU side of the blur: one pipeline, two per-axis uniform bind groups, and
/// pre-built source bind groups for the bright-pass and both ping-pong views.
pub struct BloomBlur {
    pub plan: BlurPlan,
    ping_pong: PingPongPair,
    pipeline: wgpu::RenderPipeline,
    /// Source bind groups: [bright, ping_pong 0, ping_pong 1].
    source_groups: [wgpu::BindGroup; 3],
    axis_groups: [wgpu::BindGroup; 2],
}

impl BloomBlur {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        bright: &RenderTarget,
        iterations: u32,
    ) -> Self {
        let ping_pong = PingPongPair::new(device, width, height);

        let source_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blur_source_bgl"),
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

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blur_uniform_bgl"),
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
            label: Some("blur_shader"),
            source: wgpu::ShaderSource::Wgsl(BLUR_SHADER.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blur_pipeline_layout"),
            bind_group_layouts: &[&source_layout, &uniform_layout],
            ..Default::default()
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blur_pipeline"),
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
                    format: HDR_FORMAT,
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

        // Edge taps clamp to the nearest valid texel instead of wrapping
        // into the opposite screen edge.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blur_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let texel = [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32];
        let axis_groups = [
            Self::axis_group(device, &uniform_layout, [1.0, 0.0], texel, "blur_horizontal"),
            Self::axis_group(device, &uniform_layout, [0.0, 1.0], texel, "blur_vertical"),
        ];

        let source_group = |view: &wgpu::TextureView, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &source_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            })
        };
        let source_groups = [
            source_group(&bright.view, "blur_src_bright"),
            source_group(&ping_pong.targets[0].view, "blur_src_ping"),
            source_group(&ping_pong.targets[1].view, "blur_src_pong"),
        ];

        Self {
            plan: BlurPlan::new(iterations),
            ping_pong,
            pipeline,
            source_groups,
            axis_groups,
        }
    }

    fn axis_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        direction: [f32; 2],
        texel: [f32; 2],
        label: &str,
    ) -> wgpu::BindGroup {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[BlurUniform { direction, texel }]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    /// Rebuild the ping-pong targets and bind groups for a new size.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32, bright: &RenderTarget) {
        *self = Self::new(device, width, height, bright, self.plan.iterations);
    }

    /// Encode every blur pass. After this, `result_view` names the texture
    /// holding the blurred bloom (the raw bright-pass when iterations == 0).
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        for pass in self.plan.passes() {
            let source_group = match pass.source {
                BlurSource::Bright => &self.source_groups[0],
                BlurSource::PingPong(i) => &self.source_groups[1 + i],
            };
            let axis_group = match pass.axis {
                Axis::Horizontal => &self.axis_groups[0],
                Axis::Vertical => &self.axis_groups[1],
            };
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blur_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.ping_pong.targets[pass.destination].view,
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
            rpass.set_bind_group(0, source_group, &[]);
            rpass.set_bind_group(1, axis_group, &[]);
            rpass.draw(0..6, 0..1);
        }
    }

    /// The texture view holding the final blurred result, given the
    /// bright-pass view to fall back to at zero iterations.
    pub fn result_view<'a>(&'a self, bright: &'a RenderTarget) -> &'a wgpu::TextureView {
        match self.plan.final_buffer() {
            Some(i) => &self.ping_pong.targets[i].view,
            None => &bright.view,
        }
    }

}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_over_the_full_window() {
        let total: f32 =
            GAUSSIAN_WEIGHTS[0] + 2.0 * GAUSSIAN_WEIGHTS[1..].iter().sum::<f32>();
        assert!((total - 1.0).abs() < 1e-2, "window sum {total}");
    }

    #[test]
    fn plan_alternates_axes_starting_horizontal() {
        let axes: Vec<Axis> = BlurPlan::new(4).passes().map(|p| p.axis).collect();
        assert_eq!(
            axes,
            vec![Axis::Horizontal, Axis::Vertical, Axis::Horizontal, Axis::Vertical]
        );
    }

    #[test]
    fn plan_reads_bright_only_on_the_first_pass() {
        let passes: Vec<BlurPass> = BlurPlan::new(3).passes().collect();
        assert_eq!(passes[0].source, BlurSource::Bright);
        assert_eq!(passes[1].source, BlurSource::PingPong(0));
        assert_eq!(passes[2].source, BlurSource::PingPong(1));
    }

    #[test]
    fn every_pass_writes_the_buffer_the_next_pass_reads() {
        let passes: Vec<BlurPass> = BlurPlan::new(10).passes().collect();
        for pair in passes.windows(2) {
            assert_eq!(BlurSource::PingPong(pair[0].destination), pair[1].source);
        }
    }

    #[test]
    fn final_parity_follows_the_iteration_count() {
        assert_eq!(BlurPlan::new(0).final_buffer(), None);
        assert_eq!(BlurPlan::new(1).final_buffer(), Some(0));
        assert_eq!(BlurPlan::new(2).final_buffer(), Some(1));
        assert_eq!(BlurPlan::new(10).final_buffer(), Some(1));
    }

    #[test]
    fn zero_iterations_is_the_identity() {
        let src = vec![[1.0, 2.0, 3.0], [0.5, 0.0, 9.0]];
        assert_eq!(blur_cpu(&src, 2, 1, 0), src);
    }

    #[test]
    fn one_pass_preserves_total_energy_on_a_uniform_image() {
        // A constant image stays constant under a normalized kernel.
        let src = vec![[2.0, 2.0, 2.0]; 16];
        let out = blur_pass_cpu(&src, 4, 4, Axis::Horizontal);
        for texel in out {
            assert!((texel[0] - 2.0).abs() < 1e-2);
        }
    }

    #[test]
    fn single_texel_width_clamps_without_wrapping() {
        // 1×4 image: every horizontal tap clamps onto the same column, so a
        // horizontal pass leaves values untouched (full kernel lands on one
        // texel). No panic, no wraparound between rows.
        let src = vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [5.0, 5.0, 5.0]];
        let out = blur_pass_cpu(&src, 1, 4, Axis::Horizontal);
        for (a, b) in out.iter().zip(&src) {
            for c in 0..3 {
                assert!((a[c] - b[c]).abs() < 1e-2);
            }
        }
    }

    #[test]
    fn clamp_tap_never_leaves_the_texture() {
        assert_eq!(clamp_tap(-4, 1), 0);
        assert_eq!(clamp_tap(7, 4), 3);
        assert_eq!(clamp_tap(2, 4), 2);
    }

    #[test]
    fn blur_is_deterministic() {
        let src: Vec<[f32; 3]> = (0..64).map(|i| [i as f32, 0.0, 64.0 - i as f32]).collect();
        let a = blur_cpu(&src, 8, 8, 10);
        let b = blur_cpu(&src, 8, 8, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn blur_spreads_a_point_of_light() {
        let mut src = vec![[0.0f32; 3]; 81];
        src[40] = [10.0, 10.0, 10.0]; // center of a 9×9 image
        let out = blur_cpu(&src, 9, 9, 2);
        assert!(out[40][0] < 10.0, "center should lose energy");
        assert!(out[41][0] > 0.0, "neighbor should gain energy");
        assert!(out[40][0] > out[41][0], "center stays brightest");
    }
}
