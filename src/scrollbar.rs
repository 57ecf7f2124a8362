use std::time::{Duration, Instant};

/// Fraction of the remaining distance covered each frame.
pub const EASING: f64 = 0.3;
/// Below this distance the thumb snaps onto the target.
pub const SNAP_EPSILON: f64 = 0.001;
pub const HIDE_AFTER: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Still easing; scroll to this ratio and ask for another frame.
    Moving(f64),
    /// Snapped onto the target; the animation is over.
    Settled(f64),
}

impl Step {
    pub fn ratio(&self) -> f64 {
        match *self {
            Step::Moving(r) | Step::Settled(r) => r,
        }
    }
}

/// Eased scrollbar thumb with auto-hide.
#[derive(Debug, Clone)]
pub struct Scrollbar {
    target: f64,
    animating: bool,
    dragging: bool,
    visible_until: Option<Instant>,
}

impl Default for Scrollbar {
    fn default() -> Self {
        Self::new()
    }
}

impl Scrollbar {
    pub fn new() -> Self {
        Self {
            target: 0.0,
            animating: false,
            dragging: false,
            visible_until: None,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn set_target(&mut self, ratio: f64) {
        self.target = ratio.clamp(0.0, 1.0);
        self.animating = true;
    }

    pub fn stop(&mut self) {
        self.animating = false;
    }

    /// One animation frame starting from the current scroll ratio.
    pub fn step(&mut self, current: f64) -> Step {
        let delta = self.target - current;
        if delta.abs() < SNAP_EPSILON {
            self.animating = false;
            return Step::Settled(self.target);
        }
        Step::Moving(current + delta * EASING)
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn touch(&mut self, now: Instant) {
        self.visible_until = Some(now + HIDE_AFTER);
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.dragging || self.visible_until.map(|until| now < until).unwrap_or(false)
    }
}

/// Maps a pointer row on a track starting at `track_top` with `track_len`
/// rows to a ratio in [0,1].
pub fn pointer_to_ratio(row: u16, track_top: u16, track_len: u16) -> f64 {
    if track_len <= 1 {
        return 0.0;
    }
    let rel = row.saturating_sub(track_top) as f64;
    (rel / (track_len - 1) as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eases_toward_target_and_settles() {
        let mut bar = Scrollbar::new();
        bar.set_target(1.0);

        let mut current = 0.0;
        let mut frames = 0;
        loop {
            match bar.step(current) {
                Step::Moving(next) => {
                    assert!(next > current && next < 1.0);
                    current = next;
                }
                Step::Settled(last) => {
                    assert_eq!(last, 1.0);
                    break;
                }
            }
            frames += 1;
            assert!(frames < 100);
        }
        assert!(!bar.is_animating());

        let mut fresh = Scrollbar::new();
        fresh.set_target(1.0);
        assert!((fresh.step(0.0).ratio() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn target_is_clamped() {
        let mut bar = Scrollbar::new();
        bar.set_target(3.0);
        assert_eq!(bar.target(), 1.0);
        bar.set_target(-1.0);
        assert_eq!(bar.target(), 0.0);
    }

    #[test]
    fn hides_after_inactivity_unless_dragging() {
        let start = Instant::now();
        let mut bar = Scrollbar::new();
        assert!(!bar.is_visible(start));

        bar.touch(start);
        assert!(bar.is_visible(start + Duration::from_secs(2)));
        assert!(!bar.is_visible(start + Duration::from_secs(4)));

        bar.begin_drag();
        assert!(bar.is_visible(start + Duration::from_secs(10)));
    }

    #[test]
    fn pointer_rows_map_onto_track() {
        assert_eq!(pointer_to_ratio(2, 2, 11), 0.0);
        assert_eq!(pointer_to_ratio(7, 2, 11), 0.5);
        assert_eq!(pointer_to_ratio(40, 2, 11), 1.0);
        assert_eq!(pointer_to_ratio(0, 2, 11), 0.0);
        assert_eq!(pointer_to_ratio(5, 0, 1), 0.0);
    }
}
