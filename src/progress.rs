/// Scroll position of the content viewport, in lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub offset: usize,
    pub scroll_height: usize,
    pub client_height: usize,
}

impl ScrollMetrics {
    pub fn max_offset(&self) -> usize {
        self.scroll_height.saturating_sub(self.client_height)
    }

    /// 0.0 at the top, 1.0 at the bottom. Content that fits the viewport
    /// counts as fully read.
    pub fn ratio(&self) -> f64 {
        if self.scroll_height <= self.client_height {
            return 1.0;
        }
        (self.offset as f64 / self.max_offset() as f64).clamp(0.0, 1.0)
    }
}

/// Recomputes the progress ratio at most once per frame no matter how many
/// scroll or resize events were requested in between.
#[derive(Debug, Clone)]
pub struct ProgressIndicator {
    ratio: f64,
    dirty: bool,
    computations: u64,
}

impl Default for ProgressIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressIndicator {
    pub fn new() -> Self {
        Self {
            ratio: 0.0,
            dirty: true,
            computations: 0,
        }
    }

    pub fn request(&mut self) {
        self.dirty = true;
    }

    pub fn is_pending(&self) -> bool {
        self.dirty
    }

    /// Returns true when the ratio was recomputed this frame.
    pub fn on_frame(&mut self, metrics: ScrollMetrics) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        self.computations += 1;
        self.ratio = metrics.ratio();
        true
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn percent(&self) -> u16 {
        (self.ratio * 100.0).round() as u16
    }

    pub fn computations(&self) -> u64 {
        self.computations
    }
}
