use skyisle::post::{EXPOSURE_MAX, PostProcessState, Toggle};
use skyisle::renderer::composite::{composite_pixel, gamma_encode, tonemap};

// ── Tonemap properties ────────────────────────────────────────────────────

#[test]
fn tonemap_bounded_to_unit_interval_for_all_inputs() {
    for c in (0..200).map(|i| i as f32 * 0.5) {
        for e in (0..64).map(|i| i as f32 * 0.25) {
            let m = tonemap(c, e);
            assert!((0.0..1.0).contains(&m), "tonemap({c}, {e}) = {m}");
        }
    }
}

#[test]
fn tonemap_monotone_in_color() {
    for e in [0.25, 1.0, 4.0] {
        let mut prev = -1.0;
        for c in (0..400).map(|i| i as f32 * 0.1) {
            let m = tonemap(c, e);
            assert!(m >= prev, "not monotone at c={c}, e={e}");
            prev = m;
        }
    }
}

#[test]
fn tonemap_monotone_in_exposure() {
    for c in [0.1, 1.0, 8.0] {
        let mut prev = -1.0;
        for e in (0..400).map(|i| i as f32 * 0.1) {
            let m = tonemap(c, e);
            assert!(m >= prev, "not monotone at c={c}, e={e}");
            prev = m;
        }
    }
}

// ── Composite toggle semantics ────────────────────────────────────────────

#[test]
fn hdr_off_reduces_to_clamped_linear_sum() {
    let state = PostProcessState { hdr_enabled: false, bloom_enabled: true, exposure: 3.7 };
    let out = composite_pixel([0.25, 0.5, 3.0], [0.05, 0.0, 0.0], &state);
    assert!((out[0] - gamma_encode(0.3)).abs() < 1e-6);
    assert!((out[1] - gamma_encode(0.5)).abs() < 1e-6);
    assert_eq!(out[2], 1.0); // clamped then gamma(1) = 1

    // Any exposure gives the identical result.
    for e in [0.0, 1.0, EXPOSURE_MAX] {
        let s = PostProcessState { exposure: e, ..state };
        assert_eq!(composite_pixel([0.25, 0.5, 3.0], [0.05, 0.0, 0.0], &s), out);
    }
}

#[test]
fn bloom_off_is_independent_of_blur_output() {
    let state = PostProcessState { hdr_enabled: true, bloom_enabled: false, exposure: 1.0 };
    let base = composite_pixel([0.2, 0.3, 0.4], [0.0; 3], &state);
    // Feed the composite an all-white bloom buffer: nothing may change.
    let with_white_bloom = composite_pixel([0.2, 0.3, 0.4], [1.0; 3], &state);
    assert_eq!(base, with_white_bloom);
}

#[test]
fn bloom_on_brightens_the_result() {
    let state = PostProcessState::default();
    let without = composite_pixel([0.2, 0.2, 0.2], [0.0; 3], &state);
    let with = composite_pixel([0.2, 0.2, 0.2], [0.5; 3], &state);
    for c in 0..3 {
        assert!(with[c] > without[c]);
    }
}

// ── Toggle state machine ──────────────────────────────────────────────────

#[test]
fn key_held_across_five_polls_flips_exactly_once() {
    let mut toggle = Toggle::new();
    let mut state = PostProcessState::default();
    let before = state.hdr_enabled;
    for _ in 0..5 {
        if toggle.poll(true) {
            state.hdr_enabled = !state.hdr_enabled;
        }
    }
    assert_eq!(state.hdr_enabled, !before);
}

#[test]
fn down_up_down_flips_twice() {
    let mut toggle = Toggle::new();
    let mut flips = 0;
    for down in [true, false, true] {
        if toggle.poll(down) {
            flips += 1;
        }
    }
    assert_eq!(flips, 2);
}

// ── End-to-end ────────────────────────────────────────────────────────────

#[test]
fn black_scene_composites_to_solid_black() {
    use skyisle::renderer::bloom::blur_cpu;
    use skyisle::renderer::scene_pipeline::bright_pass;

    let state = PostProcessState { hdr_enabled: true, bloom_enabled: true, exposure: 1.0 };

    // Rasterize: an all-black 4×4 scene, bright-pass extracted per pixel.
    let scene = vec![[0.0f32; 3]; 16];
    let bright: Vec<[f32; 3]> = scene.iter().map(|&c| bright_pass(c)).collect();

    // Blur at the production iteration count, then composite.
    let bloom = blur_cpu(&bright, 4, 4, 10);
    for (hdr, blur) in scene.iter().zip(&bloom) {
        assert_eq!(composite_pixel(*hdr, *blur, &state), [0.0, 0.0, 0.0]);
    }
}
