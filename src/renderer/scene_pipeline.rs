// ── Lit scene pipeline ────────────────────────────────────────────────────────
//
// Draws the opaque placements into both scene targets at once: color
// attachment 0 receives the full Phong-lit result, attachment 1 the
// bright-pass (the same color where Rec. 709 luma exceeds 1.0, else black).
// Lights travel as one structured uniform — a directional light plus an
// array of point lights indexed by a count, never by name.

use wgpu::util::DeviceExt;

use crate::geometry::Vertex;
use crate::scene::{MAX_POINT_LIGHTS, Scene};

use super::targets::{DEPTH_FORMAT, HDR_FORMAT};

/// Bright-pass luminance threshold shared by every geometry shader.
pub const BRIGHT_THRESHOLD: f32 = 1.0;

/// Rec. 709 luma of a linear RGB color — the brightness the threshold
/// compares against, mirrored from the shaders for the tests.
pub fn luminance(color: [f32; 3]) -> f32 {
    0.2126 * color[0] + 0.7152 * color[1] + 0.0722 * color[2]
}

/// What the bright-pass attachment receives for a given lit color.
pub fn bright_pass(color: [f32; 3]) -> [f32; 3] {
    if luminance(color) > BRIGHT_THRESHOLD {
        color
    } else {
        [0.0, 0.0, 0.0]
    }
}

// ── Uniform layouts ───────────────────────────────────────────────────────────

/// Per-object transform pair: the model matrix and its inverse-transpose for
/// normals. Slots are written once at scene upload and addressed with
/// dynamic offsets of `MODEL_STRIDE` bytes.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

/// Dynamic-offset stride; 256 covers every adapter's uniform alignment.
pub const MODEL_STRIDE: u64 = 256;

impl ModelUniform {
    pub fn from_matrix(model: glam::Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct DirectionalRaw {
    direction: [f32; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PointRaw {
    position: [f32; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
    /// (constant, linear, quadratic, unused)
    attenuation: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    directional: DirectionalRaw,
    points: [PointRaw; MAX_POINT_LIGHTS],
    point_count: u32,
    shininess: f32,
    _pad: [f32; 2],
}

impl LightsUniform {
    pub fn from_scene(scene: &Scene) -> Self {
        let v4 = |v: [f32; 3]| [v[0], v[1], v[2], 0.0];
        let mut points = [PointRaw {
            position: [0.0; 4],
            ambient: [0.0; 4],
            diffuse: [0.0; 4],
            specular: [0.0; 4],
            attenuation: [1.0, 0.0, 0.0, 0.0],
        }; MAX_POINT_LIGHTS];
        let active = scene.active_point_lights();
        for (raw, light) in points.iter_mut().zip(active) {
            *raw = PointRaw {
                position: v4(light.position),
                ambient: v4(light.ambient),
                diffuse: v4(light.diffuse),
                specular: v4(light.specular),
                attenuation: [light.constant, light.linear, light.quadratic, 0.0],
            };
        }
        Self {
            directional: DirectionalRaw {
                direction: v4(scene.directional.direction),
                ambient: v4(scene.directional.ambient),
                diffuse: v4(scene.directional.diffuse),
                specular: v4(scene.directional.specular),
            },
            points,
            point_count: active.len() as u32,
            shininess: scene.shininess,
            _pad: [0.0; 2],
        }
    }
}

// ── Shader ────────────────────────────────────────────────────────────────────

const SCENE_SHADER: &str = "
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

struct DirectionalLight {
    direction: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
}
struct PointLight {
    position: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
    attenuation: vec4<f32>,
}
struct Lights {
    directional: DirectionalLight,
    points: array<PointLight, 4>,
    point_count: u32,
    shininess: f32,
    _pad: vec2<f32>,
}
@group(2) @binding(0) var<uniform> lights: Lights;

struct VertexIn {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
}
struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) albedo: vec3<f32>,
}

@vertex
fn vs_main(in: VertexIn) -> VertexOut {
    var out: VertexOut;
    let world = object.model * vec4<f32>(in.position, 1.0);
    out.clip = camera.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (object.normal * vec4<f32>(in.normal, 0.0)).xyz;
    out.albedo = in.color;
    return out;
}

struct FragmentOut {
    @location(0) color: vec4<f32>,
    @location(1) bright: vec4<f32>,
}

fn phong(
    light_dir: vec3<f32>,
    normal: vec3<f32>,
    view_dir: vec3<f32>,
    ambient: vec3<f32>,
    diffuse: vec3<f32>,
    specular: vec3<f32>,
    albedo: vec3<f32>,
) -> vec3<f32> {
    let diff = max(dot(normal, light_dir), 0.0);
    let reflect_dir = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), lights.shininess);
    return ambient * albedo + diffuse * diff * albedo + specular * spec;
}

@fragment
fn fs_main(in: VertexOut) -> FragmentOut {
    let normal = normalize(in.normal);
    let view_dir = normalize(camera.position.xyz - in.world_pos);

    var result = phong(
        normalize(-lights.directional.direction.xyz),
        normal,
        view_dir,
        lights.directional.ambient.rgb,
        lights.directional.diffuse.rgb,
        lights.directional.specular.rgb,
        in.albedo,
    );

    for (var i = 0u; i < lights.point_count; i += 1u) {
        let light = lights.points[i];
        let to_light = light.position.xyz - in.world_pos;
        let distance = length(to_light);
        let attenuation = 1.0 / (light.attenuation.x
            + light.attenuation.y * distance
            + light.attenuation.z * distance * distance);
        result += phong(
            normalize(to_light),
            normal,
            view_dir,
            light.ambient.rgb,
            light.diffuse.rgb,
            light.specular.rgb,
            in.albedo,
        ) * attenuation;
    }

    var out: FragmentOut;
    out.color = vec4<f32>(result, 1.0);
    let luma = dot(result, vec3<f32>(0.2126, 0.7152, 0.0722));
    if luma > 1.0 {
        out.bright = vec4<f32>(result, 1.0);
    } else {
        out.bright = vec4<f32>(0.0, 0.0, 0.0, 1.0);
    }
    return out;
}
";

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct ScenePipeline {
    pub render_pipeline: wgpu::RenderPipeline,
    pub camera_layout: wgpu::BindGroupLayout,
    pub model_layout: wgpu::BindGroupLayout,
    pub lights_layout: wgpu::BindGroupLayout,
}

pub fn create_scene_pipeline(device: &wgpu::Device) -> ScenePipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(SCENE_SHADER.into()),
    });

    let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene_camera_bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene_model_bgl"),
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

    let lights_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene_lights_bgl"),
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

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[&camera_layout, &model_layout, &lights_layout],
        ..Default::default()
    });

    let vertex_attrs = wgpu::vertex_attr_array![
        0 => Float32x3,  // position
        1 => Float32x3,  // normal
        2 => Float32x3,  // color
    ];

    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &vertex_attrs,
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
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    ScenePipeline {
        render_pipeline,
        camera_layout,
        model_layout,
        lights_layout,
    }
}

/// Upload the scene's light rig as one uniform buffer.
pub fn create_lights_buffer(device: &wgpu::Device, scene: &Scene) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("lights_uniform"),
        contents: bytemuck::cast_slice(&[LightsUniform::from_scene(scene)]),
        usage: wgpu::BufferUsages::UNIFORM,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bright_pass_keeps_only_over_threshold_colors() {
        assert_eq!(bright_pass([0.5, 0.5, 0.5]), [0.0, 0.0, 0.0]);
        let hot = [3.0, 2.5, 1.0];
        assert_eq!(bright_pass(hot), hot);
    }

    #[test]
    fn bright_pass_weights_green_heaviest() {
        // Rec. 709: green alone can cross the threshold where blue cannot.
        assert_eq!(bright_pass([0.0, 1.5, 0.0]), [0.0, 1.5, 0.0]);
        assert_eq!(bright_pass([0.0, 0.0, 1.5]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn lights_uniform_counts_only_active_lights() {
        let scene = Scene::default();
        let uniform = LightsUniform::from_scene(&scene);
        assert_eq!(uniform.point_count as usize, scene.point_lights.len());
        assert_eq!(uniform.shininess, 32.0);
    }

    #[test]
    fn lights_uniform_layout_is_tightly_packed() {
        // The WGSL struct expects 64 + 4·80 + 16 bytes.
        assert_eq!(std::mem::size_of::<LightsUniform>(), 400);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 128);
    }

    #[test]
    fn model_uniform_inverts_nonuniform_scale_for_normals() {
        let m = glam::Mat4::from_scale(glam::Vec3::new(2.0, 1.0, 1.0));
        let u = ModelUniform::from_matrix(m);
        // Inverse-transpose of a pure scale halves the scaled axis.
        assert!((u.normal[0][0] - 0.5).abs() < 1e-6);
        assert!((u.normal[1][1] - 1.0).abs() < 1e-6);
    }
}
