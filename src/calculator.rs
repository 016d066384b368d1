use crate::metric::Metric;
use crate::models::GradeRecord;

/// Holds the metric a session currently has selected.
///
/// Each caller owns its own calculator. Code that shares one across callers
/// should use [`GradeCalculator::compute_with`], which never touches the
/// stored selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeCalculator {
    metric: Metric,
}

impl GradeCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metric(metric: Metric) -> Self {
        Self { metric }
    }

    pub fn set_metric(&mut self, metric: Metric) {
        self.metric = metric;
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn name(&self) -> &'static str {
        self.metric.name()
    }

    pub fn compute(&self, grades: &[GradeRecord]) -> String {
        self.metric.compute(grades)
    }

    pub fn compute_with(&self, metric: Metric, grades: &[GradeRecord]) -> String {
        metric.compute(grades)
    }

    pub fn available(&self) -> [Metric; 4] {
        Metric::ALL
    }
}
