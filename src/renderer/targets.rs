// ── Offscreen render targets ──────────────────────────────────────────────────
//
// All intermediate images are Rgba16Float so lighting results above 1.0
// survive until the tonemap pass. Targets are allocated once at startup for
// the fixed window size and live for the whole process.

/// HDR color format used by every offscreen stage.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A fixed-size offscreen color image that can be rendered into and sampled.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// The rasterizer's dual-output bundle: the full lit scene and the isolated
/// bright-pass, sharing one depth buffer. Both color attachments are written
/// by the same draw calls under the same depth test.
pub struct SceneTargets {
    pub color: RenderTarget,
    pub bright: RenderTarget,
    pub depth_view: wgpu::TextureView,
}

impl SceneTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scene_depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            color: RenderTarget::new(device, width, height, "scene_hdr_color"),
            bright: RenderTarget::new(device, width, height, "scene_bright_pass"),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
        }
    }
}

/// Two depth-less HDR targets used alternately as read-source and
/// write-destination across the iterative blur passes.
pub struct PingPongPair {
    pub targets: [RenderTarget; 2],
}

impl PingPongPair {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            targets: [
                RenderTarget::new(device, width, height, "bloom_ping"),
                RenderTarget::new(device, width, height, "bloom_pong"),
            ],
        }
    }
}
