use skyisle::scene::{Billboard, MAX_POINT_LIGHTS, MeshId, Placement, Scene};

// ── Default scene layout ──────────────────────────────────────────────────

#[test]
fn default_scene_matches_the_island_layout() {
    let scene = Scene::default();
    let count = |id: MeshId| scene.placements.iter().filter(|p| p.mesh == id).count();
    assert_eq!(count(MeshId::Island), 4);
    assert_eq!(count(MeshId::Bird), 3);
    assert_eq!(count(MeshId::Bench), 1);
    assert!(count(MeshId::Tulip) >= 3);
    assert!(!scene.billboards.is_empty(), "grass billboards expected");
}

#[test]
fn default_lights_carry_the_expected_parameters() {
    let scene = Scene::default();
    assert_eq!(scene.directional.direction, [-0.2, -1.0, 0.0]);
    assert_eq!(scene.shininess, 32.0);
    let lamp = &scene.point_lights[0];
    assert_eq!((lamp.constant, lamp.linear, lamp.quadratic), (1.0, 0.09, 0.032));
}

#[test]
fn scene_always_fits_the_shader_light_array() {
    let scene = Scene::default();
    assert!(scene.active_point_lights().len() <= MAX_POINT_LIGHTS);
}

// ── Transforms ────────────────────────────────────────────────────────────

#[test]
fn placement_rotation_happens_before_scale_and_translation() {
    let placement = Placement {
        mesh: MeshId::Bird,
        translation: [10.0, 0.0, 0.0],
        scale: [2.0, 1.0, 1.0],
        rotation_axis: [0.0, 1.0, 0.0],
        rotation_degrees: 90.0,
    };
    // +Z rotates onto +X (y-axis, 90°), then x doubles, then translates.
    let p = placement.model_matrix().transform_point3(glam::Vec3::Z);
    assert!((p - glam::Vec3::new(12.0, 0.0, 0.0)).length() < 1e-4, "{p:?}");
}

#[test]
fn billboard_matrix_anchors_the_quad_base() {
    let billboard = Billboard { position: [1.0, 2.0, 3.0], size: [2.0, 4.0] };
    let m = billboard.model_matrix();
    // The unit quad's bottom-center (origin) lands on the anchor point.
    assert!((m.transform_point3(glam::Vec3::ZERO) - glam::Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
    // Its top edge rises by the full height.
    let top = m.transform_point3(glam::Vec3::new(0.0, 1.0, 0.0));
    assert!((top.y - 6.0).abs() < 1e-5);
}

// ── Serde round trip ──────────────────────────────────────────────────────

#[test]
fn scene_json_round_trip_preserves_the_layout() {
    let scene = Scene::default();
    let json = serde_json::to_string_pretty(&scene).unwrap();
    let back: Scene = serde_json::from_str(&json).unwrap();
    assert_eq!(back.placements.len(), scene.placements.len());
    assert_eq!(back.placements[0].mesh, scene.placements[0].mesh);
    assert_eq!(back.directional.direction, scene.directional.direction);
}

#[test]
fn minimal_scene_json_fills_in_defaults() {
    let json = r#"{
        "placements": [
            { "mesh": "island", "translation": [0, -3, 0], "scale": [0.5, 0.5, 0.5] }
        ],
        "billboards": [ { "position": [0, 0, 0] } ],
        "directional": {
            "direction": [0, -1, 0],
            "ambient": [0.2, 0.2, 0.2],
            "diffuse": [0.2, 0.2, 0.2],
            "specular": [0.5, 0.5, 0.5]
        },
        "point_lights": []
    }"#;
    let scene: Scene = serde_json::from_str(json).unwrap();
    assert_eq!(scene.placements[0].rotation_degrees, 0.0);
    assert_eq!(scene.billboards[0].size, [0.8, 0.8]);
    assert_eq!(scene.shininess, 32.0);
}

#[test]
fn malformed_scene_file_falls_back_to_default() {
    let dir = std::env::temp_dir().join("skyisle_scene_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    let scene = Scene::load_or_default(&path);
    assert_eq!(scene.placements.len(), Scene::default().placements.len());
    std::fs::remove_file(&path).ok();
}
