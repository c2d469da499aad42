//! Respondent-facing progress.

use serde::Serialize;
use survey_flow_types::ProgressReport;

use crate::Diagnostic;

/// Position in the survey, for progress bars.
///
/// `current` is the 0-based traversal position, not the number of answered
/// questions. On completion it equals `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub is_complete: bool,
}

impl Progress {
    /// Fraction of the survey traversed, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.is_complete || self.total == 0 {
            return 1.0;
        }
        self.current as f64 / self.total as f64
    }

    /// Whole percent, rounded down.
    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).floor() as u8
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_complete {
            write!(f, "{}/{} (complete)", self.current, self.total)
        } else {
            write!(f, "{}/{}", self.current, self.total)
        }
    }
}

/// Keeps the last progress value shown to the respondent.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    last: Progress,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            last: Progress {
                current: 0,
                total,
                is_complete: false,
            },
        }
    }

    pub fn current(&self) -> Progress {
        self.last
    }

    /// Record a forward move. The numerator never goes down here, even when
    /// a jump lands on an earlier question.
    pub fn forward(&mut self, position: usize) -> Progress {
        self.last.current = self.last.current.max(position.min(self.last.total));
        self.last
    }

    /// Record an explicit step back.
    pub fn back(&mut self, position: usize) -> Progress {
        self.last.current = position.min(self.last.total);
        self.last
    }

    pub fn complete(&mut self) -> Progress {
        self.last.current = self.last.total;
        self.last.is_complete = true;
        self.last
    }

    /// Compare a progress service report with the local value.
    ///
    /// The local value stays authoritative. A different total or completion
    /// flag is reported; the remote position is informational only.
    pub fn check_report(&self, report: &ProgressReport) -> Option<Diagnostic> {
        if report.total_questions == self.last.total && report.is_completed == self.last.is_complete {
            return None;
        }
        Some(Diagnostic::ProgressMismatch {
            remote_current: report.current_question,
            remote_total: report.total_questions,
            remote_completed: report.is_completed,
            local_current: self.last.current,
            local_total: self.last.total,
            local_completed: self.last.is_complete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_never_decreases() {
        let mut tracker = ProgressTracker::new(5);
        assert_eq!(tracker.forward(3).current, 3);
        assert_eq!(tracker.forward(1).current, 3);
        assert_eq!(tracker.forward(4).current, 4);
    }

    #[test]
    fn back_sets_position() {
        let mut tracker = ProgressTracker::new(5);
        tracker.forward(3);
        assert_eq!(tracker.back(2).current, 2);
    }

    #[test]
    fn complete_fills_bar() {
        let mut tracker = ProgressTracker::new(4);
        tracker.forward(1);
        let progress = tracker.complete();
        assert_eq!(progress.current, 4);
        assert!(progress.is_complete);
        assert_eq!(progress.percent(), 100);
        assert_eq!(progress.to_string(), "4/4 (complete)");
    }

    #[test]
    fn fraction_of_empty_survey() {
        let tracker = ProgressTracker::new(0);
        assert_eq!(tracker.current().fraction(), 1.0);
    }

    #[test]
    fn percent_rounds_down() {
        let mut tracker = ProgressTracker::new(3);
        assert_eq!(tracker.forward(1).percent(), 33);
        assert_eq!(tracker.forward(2).percent(), 66);
    }

    #[test]
    fn report_mismatch() {
        let mut tracker = ProgressTracker::new(3);
        tracker.forward(1);

        let agreeing = ProgressReport {
            current_question: 2,
            total_questions: 3,
            is_completed: false,
        };
        assert!(tracker.check_report(&agreeing).is_none());

        let finished = ProgressReport {
            is_completed: true,
            ..agreeing.clone()
        };
        assert!(matches!(
            tracker.check_report(&finished),
            Some(Diagnostic::ProgressMismatch {
                remote_completed: true,
                local_current: 1,
                ..
            })
        ));

        let resized = ProgressReport {
            total_questions: 4,
            ..agreeing
        };
        assert!(tracker.check_report(&resized).is_some());
    }
}
