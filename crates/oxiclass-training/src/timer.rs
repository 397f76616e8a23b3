use std::time::{Duration, Instant};

use serde::Serialize;

/// Learning phases whose wall-clock cost is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedPhase {
    Matching,
    GeneticAlgorithm,
    Deletion,
    Subsumption,
    AttributeTracking,
    Evaluation,
}

impl TimedPhase {
    pub const COUNT: usize = 6;
}

/// Accumulates elapsed wall-clock time per learning phase.
///
/// One phase is active at a time. Starting a phase while another is active
/// discards the earlier measurement, so callers bracket each phase with
/// [`Self::start`] and [`Self::stop`].
#[derive(Debug, Clone)]
pub struct RunTimer {
    started: Instant,
    active: Option<(TimedPhase, Instant)>,
    totals: [Duration; TimedPhase::COUNT],
}

impl RunTimer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            active: None,
            totals: [Duration::ZERO; TimedPhase::COUNT],
        }
    }

    pub fn start(&mut self, phase: TimedPhase) {
        self.active = Some((phase, Instant::now()));
    }

    /// Ends the active phase and adds its duration to the phase total.
    pub fn stop(&mut self) {
        if let Some((phase, since)) = self.active.take() {
            self.totals[phase as usize] += since.elapsed();
        }
    }

    /// Wall-clock time since the timer was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[must_use]
    pub fn total(&self, phase: TimedPhase) -> Duration {
        self.totals[phase as usize]
    }

    #[must_use]
    pub fn report(&self) -> TimerReport {
        TimerReport {
            total_seconds: self.elapsed().as_secs_f64(),
            matching_seconds: self.total(TimedPhase::Matching).as_secs_f64(),
            genetic_algorithm_seconds: self.total(TimedPhase::GeneticAlgorithm).as_secs_f64(),
            deletion_seconds: self.total(TimedPhase::Deletion).as_secs_f64(),
            subsumption_seconds: self.total(TimedPhase::Subsumption).as_secs_f64(),
            attribute_tracking_seconds: self.total(TimedPhase::AttributeTracking).as_secs_f64(),
            evaluation_seconds: self.total(TimedPhase::Evaluation).as_secs_f64(),
        }
    }
}

impl Default for RunTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-phase wall-clock totals in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerReport {
    pub total_seconds: f64,
    pub matching_seconds: f64,
    pub genetic_algorithm_seconds: f64,
    pub deletion_seconds: f64,
    pub subsumption_seconds: f64,
    pub attribute_tracking_seconds: f64,
    pub evaluation_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_without_start_is_a_no_op() {
        let mut timer = RunTimer::new();
        timer.stop();
        assert_eq!(timer.total(TimedPhase::Matching), Duration::ZERO);
    }

    #[test]
    fn test_phase_totals_accumulate_independently() {
        let mut timer = RunTimer::new();
        timer.start(TimedPhase::Matching);
        timer.stop();
        timer.start(TimedPhase::Deletion);
        timer.stop();
        assert_eq!(timer.total(TimedPhase::Evaluation), Duration::ZERO);
        assert!(timer.total(TimedPhase::Matching) <= timer.elapsed());
    }

    #[test]
    fn test_report_covers_every_phase() {
        let report = RunTimer::new().report();
        assert!(report.total_seconds >= 0.0);
        assert_eq!(report.matching_seconds, 0.0);
        assert_eq!(report.evaluation_seconds, 0.0);
    }
}
