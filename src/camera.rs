use glam::{Mat4, Vec3};

/// Camera uniform uploaded to the GPU — the combined view-projection matrix
/// plus the world-space eye position (needed for specular highlights).
///
/// Layout (column-major, matching WGSL `mat4x4<f32>`); `position.w` is unused
/// padding so the struct stays 16-byte aligned.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

/// Movement directions decoupled from the concrete key bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Fly camera: free yaw/pitch look with planar WASD movement and a
/// scroll-driven field of view.
pub struct Camera {
    /// World-space eye position.
    pub position: Vec3,
    /// Yaw in degrees; -90 looks down -Z.
    pub yaw: f32,
    /// Pitch in degrees, clamped to ±89 to keep the view basis stable.
    pub pitch: f32,
    /// Vertical field of view in degrees, clamped to [FOV_MIN, FOV_MAX].
    pub fov: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
}

/// Units per second of keyboard movement.
const MOVE_SPEED: f32 = 2.5;
/// Degrees of look rotation per pixel of pointer motion.
const LOOK_SENSITIVITY: f32 = 0.1;
const PITCH_LIMIT: f32 = 89.0;
pub const FOV_MIN: f32 = 1.0;
pub const FOV_MAX: f32 = 45.0;

const WORLD_UP: Vec3 = Vec3::Y;

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut cam = Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            fov: FOV_MAX,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: WORLD_UP,
        };
        cam.update_basis();
        cam
    }

    /// Move along the current view basis: forward follows the full look
    /// direction, strafing stays on the horizontal right vector.
    pub fn process_keyboard(&mut self, movement: CameraMovement, dt: f32) {
        let velocity = MOVE_SPEED * dt;
        match movement {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    /// Apply a pointer delta in pixels (`dy` positive when the pointer moves
    /// up). Pitch is clamped so the view never flips over the poles.
    pub fn process_mouse(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * LOOK_SENSITIVITY;
        self.pitch = (self.pitch + dy * LOOK_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_basis();
    }

    /// Scroll zoom: shrinks the field of view when scrolling up.
    pub fn process_scroll(&mut self, dy: f32) {
        self.fov = (self.fov - dy).clamp(FOV_MIN, FOV_MAX);
    }

    fn update_basis(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(WORLD_UP).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// View matrix with the translation stripped — the skybox follows the
    /// camera's orientation but never its position.
    pub fn skybox_view_matrix(&self) -> Mat4 {
        let mut view = self.view_matrix();
        view.w_axis = glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        view
    }

    /// Build the GPU-ready `CameraUniform` for the given aspect ratio.
    /// Near/far planes are fixed at 0.1 .. 100 — the scene never leaves
    /// that range.
    pub fn build_uniform(&self, aspect: f32) -> CameraUniform {
        let proj = Mat4::perspective_rh(self.fov.to_radians(), aspect, 0.1, 100.0);
        CameraUniform {
            view_proj: (proj * self.view_matrix()).to_cols_array_2d(),
            position: [self.position.x, self.position.y, self.position.z, 1.0],
        }
    }

    /// Skybox view-projection: orientation only, no translation.
    pub fn build_skybox_uniform(&self, aspect: f32) -> CameraUniform {
        let proj = Mat4::perspective_rh(self.fov.to_radians(), aspect, 0.1, 100.0);
        CameraUniform {
            view_proj: (proj * self.skybox_view_matrix()).to_cols_array_2d(),
            position: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_yaw_looks_down_negative_z() {
        let cam = Camera::new(Vec3::ZERO);
        assert!((cam.front - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn pitch_clamps_at_limits() {
        let mut cam = Camera::new(Vec3::ZERO);
        cam.process_mouse(0.0, 10_000.0);
        assert_eq!(cam.pitch, PITCH_LIMIT);
        cam.process_mouse(0.0, -100_000.0);
        assert_eq!(cam.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn scroll_clamps_fov() {
        let mut cam = Camera::new(Vec3::ZERO);
        cam.process_scroll(1000.0);
        assert_eq!(cam.fov, FOV_MIN);
        cam.process_scroll(-1000.0);
        assert_eq!(cam.fov, FOV_MAX);
    }

    #[test]
    fn forward_movement_follows_front() {
        let mut cam = Camera::new(Vec3::ZERO);
        cam.process_keyboard(CameraMovement::Forward, 1.0);
        assert!(cam.position.z < 0.0);
        assert!((cam.position.x).abs() < 1e-5);
    }

    #[test]
    fn skybox_view_has_no_translation() {
        let cam = Camera::new(Vec3::new(5.0, 10.0, 15.0));
        let view = cam.skybox_view_matrix();
        assert_eq!(view.w_axis, glam::Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn uniform_position_matches_camera() {
        let cam = Camera::new(Vec3::new(5.0, 10.0, 15.0));
        let u = cam.build_uniform(2.0);
        assert_eq!(u.position, [5.0, 10.0, 15.0, 1.0]);
    }
}
