// ── Scene description ─────────────────────────────────────────────────────────
//
// The scene layout is data: a list of placement records consumed by one
// generic draw loop, plus the light rig. No per-object draw code exists
// anywhere — adding an object means adding a record. The whole description
// is serde-serializable so a JSON file can replace the built-in default.

use std::path::Path;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Largest number of point lights the shader's light array holds.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Identifies one of the procedural meshes built by `geometry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshId {
    Island,
    TreeSmall,
    TreeLarge,
    Hedge,
    Tulip,
    Bench,
    Bird,
}

/// One placed object: mesh plus its decomposed model transform.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Placement {
    pub mesh: MeshId,
    pub translation: [f32; 3],
    pub scale: [f32; 3],
    /// Rotation axis; ignored when `rotation_degrees` is 0.
    #[serde(default = "default_axis")]
    pub rotation_axis: [f32; 3],
    #[serde(default)]
    pub rotation_degrees: f32,
}

fn default_axis() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

impl Placement {
    /// Model matrix: translate, then scale, then rotate (`M = T · S · R`),
    /// so the rotation spins the object in place before it is sized and
    /// moved onto its island.
    pub fn model_matrix(&self) -> Mat4 {
        let t = Mat4::from_translation(Vec3::from_array(self.translation));
        let s = Mat4::from_scale(Vec3::from_array(self.scale));
        let r = if self.rotation_degrees == 0.0 {
            Mat4::IDENTITY
        } else {
            Mat4::from_axis_angle(
                Vec3::from_array(self.rotation_axis).normalize(),
                self.rotation_degrees.to_radians(),
            )
        };
        t * s * r
    }
}

/// A grass billboard: a world-anchored quad, always drawn after opaque
/// geometry with alpha blending. Billboards are rendered in list order —
/// not sorted back-to-front against the camera — which can produce blending
/// artifacts from some viewing angles (see DESIGN.md).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Billboard {
    /// World position of the quad's bottom-center.
    pub position: [f32; 3],
    #[serde(default = "default_billboard_size")]
    pub size: [f32; 2],
}

fn default_billboard_size() -> [f32; 2] {
    [0.8, 0.8]
}

impl Billboard {
    /// The quad stands upright in world space (no camera facing): model =
    /// translation · scale over the unit grass quad.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::from_array(self.position))
            * Mat4::from_scale(Vec3::new(self.size[0], self.size[1], 1.0))
    }
}

// ── Lights ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub direction: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PointLight {
    pub position: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    /// Attenuation 1/(constant + linear·d + quadratic·d²).
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl PointLight {
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

// ── Scene ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scene {
    pub placements: Vec<Placement>,
    pub billboards: Vec<Billboard>,
    pub directional: DirectionalLight,
    /// At most `MAX_POINT_LIGHTS` entries reach the shader; extras are
    /// dropped with a warning at upload time.
    pub point_lights: Vec<PointLight>,
    #[serde(default = "default_shininess")]
    pub shininess: f32,
}

fn default_shininess() -> f32 {
    32.0
}

impl Scene {
    /// Load a scene from a JSON file, falling back to the built-in default
    /// when the file is missing or malformed. A decorative scene failing to
    /// parse should not stop the frame loop from ever starting.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(scene) => scene,
                Err(e) => {
                    log::warn!("scene {path:?} failed to parse ({e}); using built-in scene");
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("scene {path:?} unreadable ({e}); using built-in scene");
                Self::default()
            }
        }
    }

    /// The point lights that actually fit the shader array.
    pub fn active_point_lights(&self) -> &[PointLight] {
        if self.point_lights.len() > MAX_POINT_LIGHTS {
            log::warn!(
                "scene has {} point lights; only the first {MAX_POINT_LIGHTS} are used",
                self.point_lights.len()
            );
        }
        &self.point_lights[..self.point_lights.len().min(MAX_POINT_LIGHTS)]
    }
}

impl Default for Scene {
    /// The hand-authored island layout: four floating islands with their
    /// trees, birds, a bench, hedges and tulips, plus grass billboards
    /// scattered on the front islands.
    fn default() -> Self {
        let p = |mesh, t: [f32; 3], s: [f32; 3]| Placement {
            mesh,
            translation: t,
            scale: s,
            rotation_axis: default_axis(),
            rotation_degrees: 0.0,
        };
        let rot = |mesh, t: [f32; 3], s: [f32; 3], axis: [f32; 3], deg: f32| Placement {
            mesh,
            translation: t,
            scale: s,
            rotation_axis: axis,
            rotation_degrees: deg,
        };

        let placements = vec![
            // Island one — center.
            p(MeshId::Island, [0.0, -3.0, 0.0], [0.5, 0.5, 0.5]),
            rot(MeshId::Bench, [1.0, -1.0, -2.5], [1.0, 1.0, 1.0], [0.0, 1.0, 0.0], -20.0),
            p(MeshId::Hedge, [1.5, -1.0, 2.2], [1.0, 1.0, 1.0]),
            p(MeshId::TreeLarge, [-2.5, -1.0, -1.8], [1.0, 1.0, 1.0]),
            rot(MeshId::Bird, [1.9, -0.35, -2.0], [0.5, 0.5, 0.5], [0.0, 1.0, 0.0], 50.0),
            // Island two — behind.
            p(MeshId::Island, [0.0, -3.0, -10.0], [0.4, 0.5, 0.4]),
            p(MeshId::TreeLarge, [0.0, -1.0, -12.75], [1.0, 1.0, 1.0]),
            rot(MeshId::Bird, [1.75, -0.93, -8.5], [0.5, 0.5, 0.5], [0.0, 1.0, 0.0], 50.0),
            rot(MeshId::Bird, [-1.5, -0.82, -10.0], [0.5, 0.5, 0.5], [0.0, 1.0, 0.0], 110.0),
            p(MeshId::Tulip, [-1.8, -0.95, -8.4], [1.0, 1.0, 1.0]),
            p(MeshId::Tulip, [0.6, -1.0, -7.7], [1.0, 1.0, 1.0]),
            p(MeshId::Tulip, [1.6, -1.0, -11.8], [1.0, 1.0, 1.0]),
            // Island three — front left.
            p(MeshId::Island, [-7.0, -0.5, 7.0], [0.4, 0.5, 0.4]),
            p(MeshId::TreeSmall, [-8.3, 1.5, 8.4], [1.2, 1.2, 1.2]),
            p(MeshId::Hedge, [-7.4, 1.5, 8.9], [1.0, 1.0, 1.0]),
            p(MeshId::Tulip, [-5.4, 1.5, 8.9], [1.0, 1.0, 1.0]),
            p(MeshId::TreeSmall, [-7.0, 1.5, 5.2], [1.0, 1.0, 1.0]),
            p(MeshId::Hedge, [-5.75, 1.5, 4.75], [1.0, 1.0, 1.0]),
            p(MeshId::Tulip, [-8.0, 1.5, 5.0], [1.0, 1.0, 1.0]),
            // Island four — front right.
            p(MeshId::Island, [7.0, -5.5, 7.0], [0.4, 0.5, 0.4]),
            p(MeshId::TreeLarge, [8.0, -3.5, 5.0], [0.8, 0.8, 0.8]),
            p(MeshId::Hedge, [6.0, -3.5, 5.2], [1.0, 1.0, 1.0]),
            p(MeshId::TreeSmall, [5.5, -3.5, 8.6], [1.0, 1.0, 1.0]),
            p(MeshId::Hedge, [6.4, -3.5, 8.8], [1.0, 1.0, 1.0]),
        ];

        let billboards = vec![
            Billboard { position: [-0.8, -1.0, 1.2], size: [0.8, 0.8] },
            Billboard { position: [0.4, -1.0, 1.8], size: [0.7, 0.6] },
            Billboard { position: [-1.6, -1.0, 0.4], size: [0.9, 0.7] },
            Billboard { position: [2.3, -1.0, 0.8], size: [0.8, 0.8] },
            Billboard { position: [-6.2, 1.5, 7.6], size: [0.8, 0.7] },
            Billboard { position: [-7.9, 1.5, 7.1], size: [0.7, 0.8] },
            Billboard { position: [6.9, -3.5, 7.4], size: [0.8, 0.8] },
            Billboard { position: [7.6, -3.5, 8.2], size: [0.7, 0.7] },
        ];

        Self {
            placements,
            billboards,
            directional: DirectionalLight {
                direction: [-0.2, -1.0, 0.0],
                ambient: [0.2, 0.2, 0.2],
                diffuse: [0.2, 0.2, 0.2],
                specular: [0.5, 0.5, 0.5],
            },
            point_lights: vec![
                // Soft lamp over the center island.
                PointLight {
                    position: [0.0, 4.0, 0.0],
                    ambient: [0.6, 0.6, 0.6],
                    diffuse: [0.6, 0.6, 0.6],
                    specular: [1.0, 1.0, 1.0],
                    constant: 1.0,
                    linear: 0.09,
                    quadratic: 0.032,
                },
                // A deliberately over-bright glow above the back island so
                // the bright-pass has something to bloom.
                PointLight {
                    position: [0.0, 1.5, -10.0],
                    ambient: [0.0, 0.0, 0.0],
                    diffuse: [6.0, 5.2, 3.0],
                    specular: [6.0, 5.2, 3.0],
                    constant: 1.0,
                    linear: 0.09,
                    quadratic: 0.032,
                },
            ],
            shininess: default_shininess(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_has_four_islands() {
        let scene = Scene::default();
        let islands = scene
            .placements
            .iter()
            .filter(|p| p.mesh == MeshId::Island)
            .count();
        assert_eq!(islands, 4);
    }

    #[test]
    fn default_scene_fits_the_light_array() {
        let scene = Scene::default();
        assert!(scene.point_lights.len() <= MAX_POINT_LIGHTS);
        assert_eq!(scene.active_point_lights().len(), scene.point_lights.len());
    }

    #[test]
    fn extra_point_lights_are_dropped() {
        let mut scene = Scene::default();
        let spare = scene.point_lights[0].clone();
        for _ in 0..6 {
            scene.point_lights.push(spare.clone());
        }
        assert_eq!(scene.active_point_lights().len(), MAX_POINT_LIGHTS);
    }

    #[test]
    fn attenuation_matches_the_inverse_square_form() {
        let light = &Scene::default().point_lights[0];
        let a = light.attenuation(0.0);
        assert!((a - 1.0).abs() < 1e-6);
        // 1 / (1 + 0.09·10 + 0.032·100) = 1 / 5.1
        let a10 = light.attenuation(10.0);
        assert!((a10 - 1.0 / 5.1).abs() < 1e-6);
        assert!(light.attenuation(5.0) > a10);
    }

    #[test]
    fn model_matrix_applies_translation_last() {
        let placement = Placement {
            mesh: MeshId::Bench,
            translation: [1.0, 2.0, 3.0],
            scale: [2.0, 2.0, 2.0],
            rotation_axis: [0.0, 1.0, 0.0],
            rotation_degrees: 0.0,
        };
        let m = placement.model_matrix();
        let p = m.transform_point3(glam::Vec3::new(1.0, 0.0, 0.0));
        // Scale doubles the point, then translation shifts it.
        assert!((p - glam::Vec3::new(3.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn scene_round_trips_through_json() {
        let scene = Scene::default();
        let json = serde_json::to_string(&scene).unwrap();
        let back: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(back.placements.len(), scene.placements.len());
        assert_eq!(back.billboards.len(), scene.billboards.len());
        assert_eq!(back.point_lights.len(), scene.point_lights.len());
    }

    #[test]
    fn missing_scene_file_falls_back_to_default() {
        let scene = Scene::load_or_default(Path::new("/nonexistent/scene.json"));
        assert_eq!(scene.placements.len(), Scene::default().placements.len());
    }
}
