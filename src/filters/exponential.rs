use super::CursorFilter;

/// Exponential smoothing of cursor targets
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<(f64, f64)>,
}

impl ExponentialFilter {
    /// `alpha` must be in (0, 1]; callers validate it (see `create_filter`)
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            last: None,
        }
    }
}

impl CursorFilter for ExponentialFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        let filtered = match self.last {
            Some((lx, ly)) => (
                self.alpha * x + (1.0 - self.alpha) * lx,
                self.alpha * y + (1.0 - self.alpha) * ly,
            ),
            None => (x, y),
        };
        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_filter() {
        let mut filter = ExponentialFilter::new(0.5);

        // First target passes through
        assert_eq!(filter.apply(100.0, 200.0), (100.0, 200.0));

        // Second target is smoothed
        assert_eq!(filter.apply(200.0, 300.0), (150.0, 250.0));
    }

    #[test]
    fn test_alpha_one_tracks_input() {
        let mut filter = ExponentialFilter::new(1.0);
        filter.apply(10.0, 20.0);
        assert_eq!(filter.apply(640.0, 480.0), (640.0, 480.0));
    }
}
