/// Refresh Driver - pull-to-refresh gesture detection and single-flight guard
use tracing::debug;

/// Turns raw scroll offsets into the "pulled back to the top" signal
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    threshold: f64,
    last_offset: Option<f64>,
}

impl ScrollTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last_offset: None,
        }
    }

    /// Record an offset and report whether it completes a refresh gesture.
    ///
    /// The gesture needs the list at its origin, movement toward the origin,
    /// and a previous position away from it. The first observation never
    /// qualifies.
    pub fn observe(&mut self, offset: f64) -> bool {
        let previous = self.last_offset.replace(offset);

        match previous {
            Some(last) => offset <= self.threshold && offset < last && last > self.threshold,
            None => false,
        }
    }

    pub fn last_offset(&self) -> Option<f64> {
        self.last_offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshDriver {
    state: RefreshState,
}

impl RefreshDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn is_refreshing(&self) -> bool {
        self.state == RefreshState::Refreshing
    }

    /// Try to start a refresh; refused while one is running or while the
    /// pagination driver has a fetch outstanding.
    pub fn begin(&mut self, pagination_busy: bool) -> bool {
        if self.is_refreshing() {
            debug!("Refresh already in flight, signal dropped");
            return false;
        }
        if pagination_busy {
            debug!("Refresh blocked by in-flight pagination");
            return false;
        }
        self.state = RefreshState::Refreshing;
        true
    }

    pub fn finish(&mut self) {
        self.state = RefreshState::Idle;
    }
}
