// ── Post-process state ────────────────────────────────────────────────────────
//
// The HDR/bloom toggles and the exposure level live in one explicit struct
// that is passed by reference into input handling and the composite stage.
// The composite stage reads it once per frame; input handling is the only
// writer.

/// Exposure change per second while an adjust key is held.
pub const EXPOSURE_RATE: f32 = 1.0;

/// Upper exposure clamp. The tonemap curve `1 - exp(-c·e)` saturates toward
/// solid white well before this point, so values beyond it only destroy the
/// image; the lower bound of 0 turns tonemapping into a black screen, which
/// is the expected extreme.
pub const EXPOSURE_MAX: f32 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostProcessState {
    pub hdr_enabled: bool,
    pub bloom_enabled: bool,
    /// Exposure level, kept within `[0, EXPOSURE_MAX]`.
    pub exposure: f32,
}

impl Default for PostProcessState {
    fn default() -> Self {
        Self { hdr_enabled: true, bloom_enabled: true, exposure: 1.0 }
    }
}

impl PostProcessState {
    /// Nudge exposure by `delta`, clamping to the valid range.
    pub fn adjust_exposure(&mut self, delta: f32) {
        self.exposure = (self.exposure + delta).clamp(0.0, EXPOSURE_MAX);
    }
}

// ── Toggle ────────────────────────────────────────────────────────────────────

/// Edge-detecting key toggle: {Released, Pressed} with a flip only on the
/// Released→Pressed transition. Holding the key across any number of polls
/// produces exactly one flip; releasing re-arms it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Toggle {
    pressed: bool,
}

impl Toggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current key-down state for this poll. Returns `true` exactly
    /// when the tracked boolean should flip.
    pub fn poll(&mut self, down: bool) -> bool {
        let flip = down && !self.pressed;
        self.pressed = down;
        flip
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_once_while_held() {
        let mut t = Toggle::new();
        let flips: u32 = (0..5).map(|_| t.poll(true) as u32).sum();
        assert_eq!(flips, 1);
    }

    #[test]
    fn toggle_rearms_on_release() {
        let mut t = Toggle::new();
        assert!(t.poll(true));
        assert!(!t.poll(false));
        assert!(t.poll(true));
    }

    #[test]
    fn toggle_ignores_release_while_released() {
        let mut t = Toggle::new();
        assert!(!t.poll(false));
        assert!(!t.poll(false));
        assert!(t.poll(true));
    }

    #[test]
    fn exposure_clamps_at_zero() {
        let mut s = PostProcessState::default();
        s.adjust_exposure(-5.0);
        assert_eq!(s.exposure, 0.0);
    }

    #[test]
    fn exposure_clamps_at_upper_bound() {
        let mut s = PostProcessState::default();
        s.adjust_exposure(1000.0);
        assert_eq!(s.exposure, EXPOSURE_MAX);
    }

    #[test]
    fn default_state_has_everything_on() {
        let s = PostProcessState::default();
        assert!(s.hdr_enabled);
        assert!(s.bloom_enabled);
        assert_eq!(s.exposure, 1.0);
    }
}
