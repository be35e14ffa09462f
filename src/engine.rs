use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::camera::{Camera, CameraMovement};
use crate::input::InputState;
use crate::post::{EXPOSURE_RATE, PostProcessState, Toggle};
use crate::renderer::Renderer;
use crate::scene::Scene;

// ── Key bindings ─────────────────────────────────────────────────────────────
//
// WASD      move
// mouse     look, scroll zoom
// H         toggle HDR tonemapping
// B         toggle bloom
// Q / E     exposure down / up (held)
// Escape    quit

const KEY_TOGGLE_HDR: KeyCode = KeyCode::KeyH;
const KEY_TOGGLE_BLOOM: KeyCode = KeyCode::KeyB;
const KEY_EXPOSURE_DOWN: KeyCode = KeyCode::KeyQ;
const KEY_EXPOSURE_UP: KeyCode = KeyCode::KeyE;

// ── EngineBuilder ────────────────────────────────────────────────────────────

pub struct EngineBuilder {
    title: String,
    width: u32,
    height: u32,
    scene: Scene,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            title: "skyisle".into(),
            width: crate::DEFAULT_WIDTH,
            height: crate::DEFAULT_HEIGHT,
            scene: Scene::default(),
        }
    }
}

impl EngineBuilder {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scene = scene;
        self
    }

    /// Run the frame loop until the window closes or Escape is pressed.
    /// Window or GPU setup failures are fatal: they log and terminate.
    pub fn run(self) {
        let event_loop = match EventLoop::new() {
            Ok(el) => el,
            Err(e) => {
                log::error!("failed to create event loop: {e}");
                std::process::exit(1);
            }
        };
        let mut app = App {
            config: self,
            state: None,
        };
        if let Err(e) = event_loop.run_app(&mut app) {
            log::error!("event loop terminated abnormally: {e}");
            std::process::exit(1);
        }
    }
}

// ── Engine state ─────────────────────────────────────────────────────────────

struct Engine {
    renderer: Renderer,
    camera: Camera,
    input: InputState,
    post: PostProcessState,
    hdr_toggle: Toggle,
    bloom_toggle: Toggle,
    last_instant: Option<Instant>,
    quit_requested: bool,
}

impl Engine {
    /// Advance toggle/exposure/camera state from this frame's input.
    /// The toggle machines flip exactly once per physical press no matter
    /// how many frames the key stays down.
    fn process_input(&mut self, dt: f32) {
        if self.hdr_toggle.poll(self.input.is_key_held(KEY_TOGGLE_HDR)) {
            self.post.hdr_enabled = !self.post.hdr_enabled;
            log::info!("hdr tonemapping {}", if self.post.hdr_enabled { "on" } else { "off" });
        }
        if self.bloom_toggle.poll(self.input.is_key_held(KEY_TOGGLE_BLOOM)) {
            self.post.bloom_enabled = !self.post.bloom_enabled;
            log::info!("bloom {}", if self.post.bloom_enabled { "on" } else { "off" });
        }
        if self.input.is_key_held(KEY_EXPOSURE_DOWN) {
            self.post.adjust_exposure(-EXPOSURE_RATE * dt);
        }
        if self.input.is_key_held(KEY_EXPOSURE_UP) {
            self.post.adjust_exposure(EXPOSURE_RATE * dt);
        }

        if self.input.is_key_held(KeyCode::KeyW) {
            self.camera.process_keyboard(CameraMovement::Forward, dt);
        }
        if self.input.is_key_held(KeyCode::KeyS) {
            self.camera.process_keyboard(CameraMovement::Backward, dt);
        }
        if self.input.is_key_held(KeyCode::KeyA) {
            self.camera.process_keyboard(CameraMovement::Left, dt);
        }
        if self.input.is_key_held(KeyCode::KeyD) {
            self.camera.process_keyboard(CameraMovement::Right, dt);
        }

        let [dx, dy] = self.input.mouse_delta;
        if dx != 0.0 || dy != 0.0 {
            self.camera.process_mouse(dx, -dy);
        }
        if self.input.scroll_delta != 0.0 {
            self.camera.process_scroll(self.input.scroll_delta);
        }
    }
}

// ── App (winit ApplicationHandler) ───────────────────────────────────────────

struct App {
    config: EngineBuilder,
    state: Option<Engine>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(&self.config.title)
                .with_inner_size(winit::dpi::PhysicalSize::new(
                    self.config.width,
                    self.config.height,
                ))
                .with_resizable(false),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {e}");
                std::process::exit(1);
            }
        };

        // Capture the pointer for free-look; not every platform supports
        // grabbing, so failure just means the cursor stays visible.
        if window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
            .is_ok()
        {
            window.set_cursor_visible(false);
        }

        let renderer = pollster::block_on(Renderer::new(Arc::clone(&window), &self.config.scene));

        // Starting vantage point: up and back from the center island.
        let camera = Camera::new(Vec3::new(5.0, 10.0, 15.0));

        self.state = Some(Engine {
            renderer,
            camera,
            input: InputState::new(),
            post: PostProcessState::default(),
            hdr_toggle: Toggle::new(),
            bloom_toggle: Toggle::new(),
            last_instant: None,
            quit_requested: false,
        });
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(engine) = self.state.as_ref() {
            engine.renderer.window.request_redraw();
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        let Some(engine) = self.state.as_mut() else { return };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            engine.input.mouse_delta[0] += dx as f32;
            engine.input.mouse_delta[1] += dy as f32;
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(engine) = self.state.as_mut() else { return };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                engine.renderer.resize(size);
            }

            WindowEvent::MouseWheel { delta, .. } => {
                use winit::event::MouseScrollDelta;
                engine.input.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / 100.0) as f32,
                };
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    engine.input.key_down(code);
                    if code == KeyCode::Escape {
                        engine.quit_requested = true;
                    }
                }
                ElementState::Released => engine.input.key_up(code),
            },

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = match engine.last_instant {
                    Some(prev) => now.duration_since(prev).as_secs_f32().min(0.25),
                    None => 1.0 / 60.0,
                };
                engine.last_instant = Some(now);

                engine.process_input(dt);

                // The quit signal never interrupts a frame mid-flight: the
                // current iteration completes, then the loop exits.
                if engine.quit_requested {
                    event_loop.exit();
                    return;
                }

                let size = engine.renderer.window.inner_size();
                let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
                let camera_uniform = engine.camera.build_uniform(aspect);
                let skybox_uniform = engine.camera.build_skybox_uniform(aspect);

                match engine
                    .renderer
                    .render(&camera_uniform, &skybox_uniform, &engine.post)
                {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let size = engine.renderer.window.inner_size();
                        engine.renderer.resize(size);
                    }
                    Err(e) => log::error!("render error: {e}"),
                }

                engine.input.clear_frame_state();
            }

            _ => {}
        }
    }
}
