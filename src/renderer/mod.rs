pub mod billboard;
pub mod bloom;
pub mod composite;
pub mod mesh;
pub mod scene_pipeline;
pub mod skybox;
pub mod targets;

use std::path::Path;
use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use billboard::BillboardPass;
use bloom::{BLUR_ITERATIONS, BloomBlur};
use composite::CompositePass;
use mesh::MeshRegistry;
use scene_pipeline::{MODEL_STRIDE, ModelUniform, ScenePipeline, create_lights_buffer, create_scene_pipeline};
use skybox::SkyboxPass;
use targets::SceneTargets;

use crate::camera::CameraUniform;
use crate::post::PostProcessState;
use crate::scene::{MeshId, Scene};

const SKYBOX_DIR: &str = "resources/textures/skybox";
const GRASS_TEXTURE: &str = "resources/textures/grass.png";

/// The whole per-frame pipeline: scene rasterization into the HDR dual
/// targets, the iterative bloom blur, and the tonemap composite into the
/// swapchain. Strictly sequential, single-threaded, vsync-bound.
pub struct Renderer {
    pub window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    targets: SceneTargets,
    scene_pipeline: ScenePipeline,
    meshes: MeshRegistry,

    camera_buffer: wgpu::Buffer,
    camera_group: wgpu::BindGroup,
    skybox_camera_buffer: wgpu::Buffer,
    skybox_camera_group: wgpu::BindGroup,
    lights_group: wgpu::BindGroup,

    /// Bindings into one uniform buffer holding a 256-byte slot per
    /// placement, then one per billboard; written once at upload (the scene
    /// never moves) and addressed by dynamic offset.
    scene_model_group: wgpu::BindGroup,
    billboard_model_group: wgpu::BindGroup,
    /// Opaque draw list in scene order: mesh and its model-buffer offset.
    draw_list: Vec<(MeshId, u32)>,
    billboard_offsets: Vec<u32>,

    skybox: SkyboxPass,
    billboards: BillboardPass,
    bloom: BloomBlur,
    composite: CompositePass,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, scene: &Scene) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(Arc::clone(&window))
            .expect("failed to create rendering surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .expect("no suitable GPU adapter found");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .expect("failed to create device");

        let caps = surface.get_capabilities(&adapter);
        // The composite shader gamma-encodes by hand; an sRGB swapchain
        // would encode a second time.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let targets = SceneTargets::new(&device, config.width, config.height);
        let scene_pipeline = create_scene_pipeline(&device);
        let meshes = MeshRegistry::build(&device);

        let uniform_buffer = |label: &str| {
            use wgpu::util::DeviceExt;
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&[CameraUniform {
                    view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
                    position: [0.0; 4],
                }]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let camera_buffer = uniform_buffer("camera_buffer");
        let skybox_camera_buffer = uniform_buffer("skybox_camera_buffer");

        let camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bg"),
            layout: &scene_pipeline.camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let lights_buffer = create_lights_buffer(&device, scene);
        let lights_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lights_bg"),
            layout: &scene_pipeline.lights_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: lights_buffer.as_entire_binding(),
            }],
        });

        // ── Static model transforms ───────────────────────────────────────
        let slot_count = (scene.placements.len() + scene.billboards.len()).max(1);
        let model_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("model_buffer"),
            size: slot_count as u64 * MODEL_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut draw_list = Vec::with_capacity(scene.placements.len());
        for (i, placement) in scene.placements.iter().enumerate() {
            let offset = i as u64 * MODEL_STRIDE;
            queue.write_buffer(
                &model_buffer,
                offset,
                bytemuck::cast_slice(&[ModelUniform::from_matrix(placement.model_matrix())]),
            );
            draw_list.push((placement.mesh, offset as u32));
        }
        let mut billboard_offsets = Vec::with_capacity(scene.billboards.len());
        for (i, billboard) in scene.billboards.iter().enumerate() {
            let offset = (scene.placements.len() + i) as u64 * MODEL_STRIDE;
            queue.write_buffer(
                &model_buffer,
                offset,
                bytemuck::cast_slice(&[ModelUniform::from_matrix(billboard.model_matrix())]),
            );
            billboard_offsets.push(offset as u32);
        }

        let model_binding = |layout: &wgpu::BindGroupLayout, label: &str| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &model_buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(std::mem::size_of::<ModelUniform>() as u64),
                    }),
                }],
            })
        };
        let scene_model_group = model_binding(&scene_pipeline.model_layout, "scene_model_bg");

        let skybox = SkyboxPass::new(&device, &queue, Path::new(SKYBOX_DIR));
        let skybox_camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox_camera_bg"),
            layout: &skybox.camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: skybox_camera_buffer.as_entire_binding(),
            }],
        });

        let billboards = BillboardPass::new(
            &device,
            &queue,
            &scene_pipeline.camera_layout,
            Path::new(GRASS_TEXTURE),
        );
        let billboard_model_group = model_binding(&billboards.model_layout, "billboard_model_bg");

        let bloom = BloomBlur::new(
            &device,
            config.width,
            config.height,
            &targets.bright,
            BLUR_ITERATIONS,
        );

        let mut composite = CompositePass::new(&device, format);
        composite.bind_inputs(&device, &targets.color, bloom.result_view(&targets.bright));

        Self {
            window,
            surface,
            device,
            queue,
            config,
            targets,
            scene_pipeline,
            meshes,
            camera_buffer,
            camera_group,
            skybox_camera_buffer,
            skybox_camera_group,
            lights_group,
            scene_model_group,
            billboard_model_group,
            draw_list,
            billboard_offsets,
            skybox,
            billboards,
            bloom,
            composite,
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);

        self.targets = SceneTargets::new(&self.device, new_size.width, new_size.height);
        self.bloom
            .resize(&self.device, new_size.width, new_size.height, &self.targets.bright);
        self.composite.bind_inputs(
            &self.device,
            &self.targets.color,
            self.bloom.result_view(&self.targets.bright),
        );
        log::debug!("render targets resized to {}x{}", new_size.width, new_size.height);
    }

    /// Render one frame.
    ///
    /// Pass order:
    /// 1. scene pass — opaque placements (MRT: lit color + bright-pass),
    ///    then the skybox at maximum depth, then unsorted grass billboards
    ///    with alpha blending;
    /// 2. bloom blur — the fixed ping-pong Gaussian sequence;
    /// 3. composite — bloom add, exposure tonemap, gamma encode into the
    ///    swapchain.
    pub fn render(
        &mut self,
        camera: &CameraUniform,
        skybox_camera: &CameraUniform,
        state: &PostProcessState,
    ) -> Result<(), wgpu::SurfaceError> {
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(std::slice::from_ref(camera)));
        self.queue.write_buffer(
            &self.skybox_camera_buffer,
            0,
            bytemuck::cast_slice(std::slice::from_ref(skybox_camera)),
        );
        self.composite.update(&self.queue, state);

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &self.targets.color.view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &self.targets.bright.view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            // ── Opaque placements ─────────────────────────────────────────
            pass.set_pipeline(&self.scene_pipeline.render_pipeline);
            pass.set_bind_group(0, &self.camera_group, &[]);
            pass.set_bind_group(2, &self.lights_group, &[]);
            for &(mesh_id, offset) in &self.draw_list {
                let Some(mesh) = self.meshes.get(mesh_id) else {
                    continue;
                };
                pass.set_bind_group(1, &self.scene_model_group, &[offset]);
                mesh.draw(&mut pass);
            }

            // ── Skybox (after opaque, before transparents) ────────────────
            self.skybox.draw(&mut pass, &self.skybox_camera_group);

            // ── Grass billboards, unsorted ────────────────────────────────
            self.billboards.draw(
                &mut pass,
                &self.camera_group,
                &self.billboard_model_group,
                &self.billboard_offsets,
            );
        }

        self.bloom.encode(&mut encoder);
        self.composite.encode(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
