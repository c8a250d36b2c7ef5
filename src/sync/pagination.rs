/// Pagination Driver - single-flight forward pagination
use crate::models::PageCursor;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    /// Ready to fetch `next`
    Idle { next: PageCursor },
    /// One request outstanding for `cursor`
    Fetching { cursor: PageCursor },
    /// Server reported no further pages
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct PaginationDriver {
    state: PaginationState,
    page_size: u32,
    margin: f64,
}

impl PaginationDriver {
    pub fn new(page_size: u32, margin: f64) -> Self {
        Self {
            state: PaginationState::Idle {
                next: PageCursor::first(page_size),
            },
            page_size,
            margin,
        }
    }

    /// Back to the first page, discarding any outstanding fetch
    pub fn reset(&mut self) {
        self.state = PaginationState::Idle {
            next: PageCursor::first(self.page_size),
        };
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.state, PaginationState::Fetching { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == PaginationState::Exhausted
    }

    /// Whether the end sentinel is close enough to count as a proximity signal
    pub fn within_margin(&self, distance_to_end: f64) -> bool {
        distance_to_end <= self.margin
    }

    /// Accept a proximity signal.
    ///
    /// Returns the cursor to fetch, or `None` when the signal must be dropped
    /// (already fetching, or exhausted).
    pub fn begin(&mut self) -> Option<PageCursor> {
        match self.state {
            PaginationState::Idle { next } => {
                self.state = PaginationState::Fetching { cursor: next };
                debug!("Pagination: Idle -> Fetching page {}", next.page());
                Some(next)
            }
            PaginationState::Fetching { cursor } => {
                debug!("Pagination: page {} already in flight, signal dropped", cursor.page());
                None
            }
            PaginationState::Exhausted => None,
        }
    }

    /// Record a successful fetch of `cursor`.
    ///
    /// Returns `false` if this response is stale (the driver is no longer
    /// waiting for it) and must be discarded.
    pub fn complete(&mut self, cursor: PageCursor, next: Option<PageCursor>) -> bool {
        if self.state != (PaginationState::Fetching { cursor }) {
            return false;
        }

        self.state = match next {
            Some(next) => PaginationState::Idle { next },
            None => PaginationState::Exhausted,
        };
        debug!("Pagination: page {} done -> {:?}", cursor.page(), self.state);
        true
    }

    /// Re-arm after a failed fetch so the next signal retries the same cursor
    pub fn fail(&mut self, cursor: PageCursor) -> bool {
        if self.state != (PaginationState::Fetching { cursor }) {
            return false;
        }
        self.state = PaginationState::Idle { next: cursor };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight() {
        let mut driver = PaginationDriver::new(5, 100.0);

        let cursor = driver.begin().unwrap();
        assert_eq!(cursor.page(), 1);
        assert!(driver.is_fetching());

        // Second signal while fetching is dropped, not queued
        assert!(driver.begin().is_none());

        assert!(driver.complete(cursor, Some(cursor.next())));
        assert_eq!(driver.begin().map(|c| c.page()), Some(2));
    }

    #[test]
    fn test_exhaustion_is_terminal() {
        let mut driver = PaginationDriver::new(5, 100.0);
        let cursor = driver.begin().unwrap();

        assert!(driver.complete(cursor, None));
        assert!(driver.is_exhausted());
        assert!(driver.begin().is_none());
    }

    #[test]
    fn test_failure_rearms_same_cursor() {
        let mut driver = PaginationDriver::new(5, 100.0);
        let first = driver.begin().unwrap();
        driver.complete(first, Some(first.next()));

        let second = driver.begin().unwrap();
        assert!(driver.fail(second));
        assert!(!driver.is_exhausted());
        assert_eq!(driver.state(), PaginationState::Idle { next: second });
        assert_eq!(driver.begin(), Some(second));
    }

    #[test]
    fn test_stale_completion_ignored() {
        let mut driver = PaginationDriver::new(5, 100.0);
        let first = driver.begin().unwrap();
        driver.complete(first, Some(first.next()));

        // A late duplicate response for page 1 changes nothing
        assert!(!driver.complete(first, None));
        assert!(!driver.fail(first));
        assert_eq!(driver.state(), PaginationState::Idle { next: first.next() });
    }

    #[test]
    fn test_reset_orphans_outstanding_fetch() {
        let mut driver = PaginationDriver::new(5, 100.0);
        let first = driver.begin().unwrap();
        driver.complete(first, None);
        assert!(driver.is_exhausted());

        driver.reset();
        let again = driver.begin().unwrap();
        assert_eq!(again.page(), 1);

        driver.reset();
        // The fetch issued before the reset is no longer awaited
        assert!(!driver.complete(again, None));
        assert_eq!(driver.state(), PaginationState::Idle { next: again });
    }

    #[test]
    fn test_within_margin() {
        let driver = PaginationDriver::new(5, 100.0);
        assert!(driver.within_margin(40.0));
        assert!(driver.within_margin(100.0));
        assert!(!driver.within_margin(250.0));
    }
}
