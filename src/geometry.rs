// =============================================================================
// GEOMETRY.RS — Procedural meshes for the island scene
//
// Every mesh is built procedurally from a handful of primitives (box,
// cylinder, cone, disc, quad), so the scene renders without any model
// assets on disk. Colors are baked per vertex and act as the material's
// diffuse/ambient albedo in the lighting shader.
// =============================================================================

use glam::Vec3;

/// One lit scene vertex. `color` is the material albedo.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// CPU-side mesh: vertex list plus triangle indices.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn push_tri(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Append a quad (two CCW triangles) with a flat normal.
    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3, color: [f32; 3]) {
        let base = self.vertices.len() as u32;
        for p in corners {
            self.vertices.push(Vertex {
                position: p.to_array(),
                normal: normal.to_array(),
                color,
            });
        }
        self.push_tri(base, base + 1, base + 2);
        self.push_tri(base, base + 2, base + 3);
    }

    /// Append an axis-aligned box spanning `min..max`.
    fn push_box(&mut self, min: Vec3, max: Vec3, color: [f32; 3]) {
        let (n, x) = (min, max);
        // +X, -X, +Y, -Y, +Z, -Z — corners wound CCW as seen from outside.
        self.push_quad(
            [
                Vec3::new(x.x, n.y, x.z),
                Vec3::new(x.x, n.y, n.z),
                Vec3::new(x.x, x.y, n.z),
                Vec3::new(x.x, x.y, x.z),
            ],
            Vec3::X,
            color,
        );
        self.push_quad(
            [
                Vec3::new(n.x, n.y, n.z),
                Vec3::new(n.x, n.y, x.z),
                Vec3::new(n.x, x.y, x.z),
                Vec3::new(n.x, x.y, n.z),
            ],
            Vec3::NEG_X,
            color,
        );
        self.push_quad(
            [
                Vec3::new(n.x, x.y, x.z),
                Vec3::new(x.x, x.y, x.z),
                Vec3::new(x.x, x.y, n.z),
                Vec3::new(n.x, x.y, n.z),
            ],
            Vec3::Y,
            color,
        );
        self.push_quad(
            [
                Vec3::new(n.x, n.y, n.z),
                Vec3::new(x.x, n.y, n.z),
                Vec3::new(x.x, n.y, x.z),
                Vec3::new(n.x, n.y, x.z),
            ],
            Vec3::NEG_Y,
            color,
        );
        self.push_quad(
            [
                Vec3::new(n.x, n.y, x.z),
                Vec3::new(x.x, n.y, x.z),
                Vec3::new(x.x, x.y, x.z),
                Vec3::new(n.x, x.y, x.z),
            ],
            Vec3::Z,
            color,
        );
        self.push_quad(
            [
                Vec3::new(x.x, n.y, n.z),
                Vec3::new(n.x, n.y, n.z),
                Vec3::new(n.x, x.y, n.z),
                Vec3::new(x.x, x.y, n.z),
            ],
            Vec3::NEG_Z,
            color,
        );
    }

    /// Append an open cylinder around the Y axis from `y0` to `y1`.
    fn push_cylinder(&mut self, radius: f32, y0: f32, y1: f32, segments: u32, color: [f32; 3]) {
        for i in 0..segments {
            let a0 = (i as f32 / segments as f32) * std::f32::consts::TAU;
            let a1 = ((i + 1) as f32 / segments as f32) * std::f32::consts::TAU;
            let (c0, s0) = (a0.cos(), a0.sin());
            let (c1, s1) = (a1.cos(), a1.sin());
            let base = self.vertices.len() as u32;
            for (c, s, y) in [(c0, s0, y0), (c1, s1, y0), (c1, s1, y1), (c0, s0, y1)] {
                self.vertices.push(Vertex {
                    position: [radius * c, y, radius * s],
                    normal: [c, 0.0, s],
                    color,
                });
            }
            self.push_tri(base, base + 2, base + 1);
            self.push_tri(base, base + 3, base + 2);
        }
    }

    /// Append a cone: a ring of `radius` at `y_base` converging to a single
    /// apex at `y_apex`. Face normals tilt with the slope.
    fn push_cone(&mut self, radius: f32, y_base: f32, y_apex: f32, segments: u32, color: [f32; 3]) {
        let slope = radius / (y_apex - y_base);
        for i in 0..segments {
            let a0 = (i as f32 / segments as f32) * std::f32::consts::TAU;
            let a1 = ((i + 1) as f32 / segments as f32) * std::f32::consts::TAU;
            let (c0, s0) = (a0.cos(), a0.sin());
            let (c1, s1) = (a1.cos(), a1.sin());
            let am = (a0 + a1) * 0.5;
            let base = self.vertices.len() as u32;
            let n0 = Vec3::new(c0, slope.abs(), s0).normalize();
            let n1 = Vec3::new(c1, slope.abs(), s1).normalize();
            let nm = Vec3::new(am.cos(), slope.abs(), am.sin()).normalize();
            let flip = if y_apex < y_base { -1.0 } else { 1.0 };
            self.vertices.push(Vertex {
                position: [radius * c0, y_base, radius * s0],
                normal: (n0 * Vec3::new(1.0, flip, 1.0)).to_array(),
                color,
            });
            self.vertices.push(Vertex {
                position: [radius * c1, y_base, radius * s1],
                normal: (n1 * Vec3::new(1.0, flip, 1.0)).to_array(),
                color,
            });
            self.vertices.push(Vertex {
                position: [0.0, y_apex, 0.0],
                normal: (nm * Vec3::new(1.0, flip, 1.0)).to_array(),
                color,
            });
            if y_apex >= y_base {
                self.push_tri(base, base + 2, base + 1);
            } else {
                self.push_tri(base, base + 1, base + 2);
            }
        }
    }

    /// Append a horizontal disc at `y` facing up.
    fn push_disc(&mut self, radius: f32, y: f32, segments: u32, color: [f32; 3]) {
        let center = self.vertices.len() as u32;
        self.vertices.push(Vertex {
            position: [0.0, y, 0.0],
            normal: [0.0, 1.0, 0.0],
            color,
        });
        for i in 0..segments {
            let a = (i as f32 / segments as f32) * std::f32::consts::TAU;
            self.vertices.push(Vertex {
                position: [radius * a.cos(), y, radius * a.sin()],
                normal: [0.0, 1.0, 0.0],
                color,
            });
        }
        for i in 0..segments {
            let next = (i + 1) % segments;
            self.push_tri(center, center + 1 + next, center + 1 + i);
        }
    }
}

// ── Palette ───────────────────────────────────────────────────────────────────

const GRASS_GREEN: [f32; 3] = [0.28, 0.55, 0.18];
const ROCK_BROWN: [f32; 3] = [0.42, 0.32, 0.24];
const TRUNK_BROWN: [f32; 3] = [0.36, 0.25, 0.13];
const CANOPY_GREEN: [f32; 3] = [0.13, 0.42, 0.15];
const HEDGE_GREEN: [f32; 3] = [0.18, 0.45, 0.20];
const TULIP_RED: [f32; 3] = [0.85, 0.12, 0.15];
const STEM_GREEN: [f32; 3] = [0.20, 0.50, 0.22];
const BENCH_GRAY: [f32; 3] = [0.55, 0.55, 0.58];
const BIRD_WHITE: [f32; 3] = [0.92, 0.90, 0.85];
const BIRD_BEAK: [f32; 3] = [0.90, 0.55, 0.10];

// ── Scene meshes ──────────────────────────────────────────────────────────────

/// Floating island: grassy top disc, rocky sides tapering to a point below.
pub fn island() -> MeshData {
    let mut mesh = MeshData::default();
    mesh.push_disc(4.0, 0.0, 16, GRASS_GREEN);
    mesh.push_cylinder(4.0, -0.6, 0.0, 16, GRASS_GREEN);
    mesh.push_cone(4.0, -0.6, -4.5, 16, ROCK_BROWN);
    mesh
}

/// Small tree: short trunk with a single conical canopy.
pub fn tree_small() -> MeshData {
    let mut mesh = MeshData::default();
    mesh.push_cylinder(0.12, 0.0, 0.9, 8, TRUNK_BROWN);
    mesh.push_cone(0.75, 0.7, 2.1, 10, CANOPY_GREEN);
    mesh
}

/// Large tree: taller trunk, two stacked canopy cones.
pub fn tree_large() -> MeshData {
    let mut mesh = MeshData::default();
    mesh.push_cylinder(0.18, 0.0, 1.4, 8, TRUNK_BROWN);
    mesh.push_cone(1.1, 1.1, 2.6, 12, CANOPY_GREEN);
    mesh.push_cone(0.8, 2.1, 3.4, 12, CANOPY_GREEN);
    mesh
}

/// Round box hedge: a squat rounded lump, approximated by a box plus a cap.
pub fn hedge() -> MeshData {
    let mut mesh = MeshData::default();
    mesh.push_box(
        Vec3::new(-0.45, 0.0, -0.45),
        Vec3::new(0.45, 0.55, 0.45),
        HEDGE_GREEN,
    );
    mesh.push_cone(0.45, 0.55, 0.8, 8, HEDGE_GREEN);
    mesh
}

/// Tulip: thin stem topped with a red petal cone.
pub fn tulip() -> MeshData {
    let mut mesh = MeshData::default();
    mesh.push_cylinder(0.03, 0.0, 0.45, 6, STEM_GREEN);
    mesh.push_cone(0.12, 0.45, 0.7, 6, TULIP_RED);
    mesh.push_cone(0.12, 0.58, 0.45, 6, TULIP_RED);
    mesh
}

/// Concrete bench: two leg blocks carrying a slab.
pub fn bench() -> MeshData {
    let mut mesh = MeshData::default();
    mesh.push_box(
        Vec3::new(-0.85, 0.0, -0.25),
        Vec3::new(-0.6, 0.45, 0.25),
        BENCH_GRAY,
    );
    mesh.push_box(
        Vec3::new(0.6, 0.0, -0.25),
        Vec3::new(0.85, 0.45, 0.25),
        BENCH_GRAY,
    );
    mesh.push_box(
        Vec3::new(-1.0, 0.45, -0.3),
        Vec3::new(1.0, 0.6, 0.3),
        BENCH_GRAY,
    );
    mesh
}

/// Perched bird: body cone pair, a beak, and two folded wing quads.
pub fn bird() -> MeshData {
    let mut mesh = MeshData::default();
    mesh.push_cone(0.25, 0.0, 0.7, 8, BIRD_WHITE);
    mesh.push_cone(0.25, 0.0, -0.35, 8, BIRD_WHITE);
    mesh.push_cone(0.08, 0.55, 0.85, 6, BIRD_BEAK);
    mesh.push_quad(
        [
            Vec3::new(0.2, 0.35, -0.1),
            Vec3::new(0.55, 0.25, -0.3),
            Vec3::new(0.5, 0.2, 0.1),
            Vec3::new(0.2, 0.25, 0.15),
        ],
        Vec3::new(0.3, 1.0, 0.0).normalize(),
        BIRD_WHITE,
    );
    mesh.push_quad(
        [
            Vec3::new(-0.2, 0.25, 0.15),
            Vec3::new(-0.5, 0.2, 0.1),
            Vec3::new(-0.55, 0.25, -0.3),
            Vec3::new(-0.2, 0.35, -0.1),
        ],
        Vec3::new(-0.3, 1.0, 0.0).normalize(),
        BIRD_WHITE,
    );
    mesh
}

// ── Billboard quad ────────────────────────────────────────────────────────────

/// Textured billboard vertex — UVs address the grass texture.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BillboardVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Unit grass quad in the XY plane, base on y=0, facing +Z.
/// UV origin is top-left so the texture reads upright.
pub fn grass_quad() -> (Vec<BillboardVertex>, Vec<u32>) {
    let vertices = vec![
        BillboardVertex { position: [-0.5, 0.0, 0.0], uv: [0.0, 1.0] },
        BillboardVertex { position: [0.5, 0.0, 0.0], uv: [1.0, 1.0] },
        BillboardVertex { position: [0.5, 1.0, 0.0], uv: [1.0, 0.0] },
        BillboardVertex { position: [-0.5, 1.0, 0.0], uv: [0.0, 0.0] },
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];
    (vertices, indices)
}

// ── Skybox cube ───────────────────────────────────────────────────────────────

/// 36-vertex skybox cube, positions only. Faces point inward; the cube is
/// rendered with culling disabled at maximum depth.
pub fn skybox_cube() -> Vec<[f32; 3]> {
    vec![
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, 1.0, 1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, -1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, -1.0],
        [1.0, -1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [1.0, -1.0, 1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [1.0, 1.0, -1.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
    ]
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn check_mesh(mesh: &MeshData) {
        assert!(!mesh.vertices.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0, "index count must form triangles");
        let max = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < max), "index out of range");
        for v in &mesh.vertices {
            let len = Vec3::from_array(v.normal).length();
            assert!((len - 1.0).abs() < 1e-3, "normal not unit length: {len}");
        }
    }

    #[test]
    fn all_scene_meshes_are_well_formed() {
        for (name, mesh) in [
            ("island", island()),
            ("tree_small", tree_small()),
            ("tree_large", tree_large()),
            ("hedge", hedge()),
            ("tulip", tulip()),
            ("bench", bench()),
            ("bird", bird()),
        ] {
            let m = mesh;
            check_mesh(&m);
            assert!(m.indices.len() >= 3, "{name} has no triangles");
        }
    }

    #[test]
    fn island_tapers_below_its_top() {
        let m = island();
        let min_y = m
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::INFINITY, f32::min);
        let max_y = m
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::NEG_INFINITY, f32::max);
        assert!(min_y < -4.0);
        assert_eq!(max_y, 0.0);
    }

    #[test]
    fn grass_quad_is_two_triangles() {
        let (verts, indices) = grass_quad();
        assert_eq!(verts.len(), 4);
        assert_eq!(indices.len(), 6);
        assert!(indices.iter().all(|&i| (i as usize) < verts.len()));
    }

    #[test]
    fn skybox_cube_has_36_vertices_on_the_unit_cube() {
        let verts = skybox_cube();
        assert_eq!(verts.len(), 36);
        for v in &verts {
            assert!(v.iter().all(|c| c.abs() == 1.0));
        }
    }
}
