//! Vertical push-down bookkeeping for one section pass

/// Growth of a control, applied to every control that starts below it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    /// Original (template) bottom edge of the control
    pub threshold: f64,
    /// Total downward shift accumulated at that edge
    pub span: f64,
}

/// Collects spans while a section is laid out top to bottom.
///
/// A control whose original top lies strictly below a recorded threshold is
/// shifted by the largest span among those thresholds.
#[derive(Debug, Clone, Default)]
pub struct SpanTracker {
    spans: Vec<Span>,
}

impl SpanTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift for a control starting at `top` in section coordinates
    pub fn span_for(&self, top: f64) -> f64 {
        self.spans
            .iter()
            .filter(|s| s.threshold < top)
            .map(|s| s.span)
            .fold(0.0, f64::max)
    }

    pub fn record(&mut self, threshold: f64, span: f64) {
        self.spans.push(Span { threshold, span });
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_spans_no_shift() {
        assert_eq!(SpanTracker::new().span_for(100.0), 0.0);
    }

    #[test]
    fn test_only_controls_below_threshold_shift() {
        let mut tracker = SpanTracker::new();
        tracker.record(30.0, 20.0);

        assert_eq!(tracker.span_for(30.0), 0.0);
        assert_eq!(tracker.span_for(10.0), 0.0);
        assert_eq!(tracker.span_for(31.0), 20.0);
    }

    #[test]
    fn test_largest_applicable_span_wins() {
        let mut tracker = SpanTracker::new();
        tracker.record(10.0, 5.0);
        tracker.record(20.0, 40.0);
        tracker.record(50.0, 60.0);

        assert_eq!(tracker.span_for(25.0), 40.0);
        assert_eq!(tracker.span_for(55.0), 60.0);

        tracker.clear();
        assert!(tracker.is_empty());
    }
}
