use super::CursorFilter;
use std::collections::VecDeque;

/// Moving average over the last `window_size` targets
pub struct MovingAverageFilter {
    window_size: usize,
    history: VecDeque<(f64, f64)>,
}

impl MovingAverageFilter {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            history: VecDeque::with_capacity(window_size),
        }
    }

    /// Configured window length
    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl CursorFilter for MovingAverageFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        if self.history.len() >= self.window_size {
            self.history.pop_front();
        }
        self.history.push_back((x, y));

        let n = self.history.len() as f64;
        let (sum_x, sum_y) = self
            .history
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(hx, hy)| (sx + hx, sy + hy));

        (sum_x / n, sum_y / n)
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        let mut filter = MovingAverageFilter::new(3);

        assert_eq!(filter.apply(100.0, 200.0), (100.0, 200.0));
        assert_eq!(filter.apply(200.0, 300.0), (150.0, 250.0));
        assert_eq!(filter.apply(300.0, 400.0), (200.0, 300.0));

        // Window is full, oldest target is dropped
        assert_eq!(filter.apply(400.0, 500.0), (300.0, 400.0));
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut filter = MovingAverageFilter::new(4);
        filter.apply(0.0, 0.0);
        filter.apply(100.0, 100.0);
        filter.reset();
        assert_eq!(filter.apply(40.0, 60.0), (40.0, 60.0));
    }
}
