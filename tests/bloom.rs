use skyisle::renderer::bloom::{
    Axis, BLUR_ITERATIONS, BlurPlan, BlurSource, GAUSSIAN_WEIGHTS, blur_cpu, blur_pass_cpu,
};

// ── Plan shape ────────────────────────────────────────────────────────────

#[test]
fn production_plan_runs_ten_passes_ending_vertical() {
    let plan = BlurPlan::new(BLUR_ITERATIONS);
    let passes: Vec<_> = plan.passes().collect();
    assert_eq!(passes.len(), 10);
    assert_eq!(passes.last().unwrap().axis, Axis::Vertical);
    assert_eq!(plan.final_buffer(), Some(passes.last().unwrap().destination));
}

#[test]
fn zero_iteration_plan_has_no_passes_and_no_final_buffer() {
    let plan = BlurPlan::new(0);
    assert_eq!(plan.passes().count(), 0);
    assert_eq!(plan.final_buffer(), None);
}

#[test]
fn single_iteration_plan_reads_bright_and_lands_in_the_seed_buffer() {
    let plan = BlurPlan::new(1);
    let passes: Vec<_> = plan.passes().collect();
    assert_eq!(passes.len(), 1);
    assert_eq!(passes[0].source, BlurSource::Bright);
    assert_eq!(passes[0].axis, Axis::Horizontal);
    assert_eq!(plan.final_buffer(), Some(passes[0].destination));
}

#[test]
fn sources_chain_destinations_across_the_whole_plan() {
    for iterations in 1..=12 {
        let passes: Vec<_> = BlurPlan::new(iterations).passes().collect();
        for pair in passes.windows(2) {
            assert_eq!(BlurSource::PingPong(pair[0].destination), pair[1].source);
        }
    }
}

// ── Kernel behavior ───────────────────────────────────────────────────────

#[test]
fn zero_iterations_returns_the_input_unchanged() {
    let src: Vec<[f32; 3]> = (0..12).map(|i| [i as f32, 2.0, 0.5]).collect();
    assert_eq!(blur_cpu(&src, 4, 3, 0), src);
}

#[test]
fn one_iteration_blurs_along_x_only() {
    // Bright column in a 5×3 image: a horizontal pass spreads it along x,
    // leaving each row identical (no vertical mixing yet).
    let mut src = vec![[0.0f32; 3]; 15];
    for y in 0..3 {
        src[y * 5 + 2] = [1.0, 1.0, 1.0];
    }
    let out = blur_cpu(&src, 5, 3, 1);
    for y in 0..3 {
        assert!(out[y * 5 + 1][0] > 0.0, "energy must spread horizontally");
        assert_eq!(out[y * 5..y * 5 + 5], out[0..5], "rows must stay identical");
    }
}

#[test]
fn border_samples_clamp_instead_of_wrapping() {
    // A hot left edge in a 8×1 strip: wrapping would leak energy into the
    // rightmost texel, clamping must not.
    let mut src = vec![[0.0f32; 3]; 8];
    src[0] = [100.0, 0.0, 0.0];
    let out = blur_pass_cpu(&src, 8, 1, Axis::Horizontal);
    assert!(out[0][0] > out[1][0]);
    assert_eq!(out[7][0], 0.0, "far edge must receive nothing");
}

#[test]
fn one_texel_wide_image_survives_blurring() {
    let src = vec![[3.0, 1.0, 0.25]];
    let out = blur_cpu(&src, 1, 1, 10);
    // Every tap clamps onto the single texel; a normalized kernel leaves it
    // within rounding of the input.
    for c in 0..3 {
        assert!((out[0][c] - src[0][c]).abs() < 0.05);
    }
}

#[test]
fn result_depends_only_on_iterations_and_weights() {
    let src: Vec<[f32; 3]> = (0..36).map(|i| [(i % 7) as f32, (i % 5) as f32, 1.0]).collect();
    assert_eq!(blur_cpu(&src, 6, 6, 10), blur_cpu(&src, 6, 6, 10));
    assert_ne!(blur_cpu(&src, 6, 6, 2), blur_cpu(&src, 6, 6, 10));
}

#[test]
fn kernel_window_is_normalized() {
    let total = GAUSSIAN_WEIGHTS[0] + 2.0 * GAUSSIAN_WEIGHTS[1..].iter().sum::<f32>();
    assert!((total - 1.0).abs() < 1e-2);
}
