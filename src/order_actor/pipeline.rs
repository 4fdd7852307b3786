//! Simulated preparation pipeline behind the in-process status source.

use crate::model::{CheckResult, StatusPayload};
use std::time::Duration;

/// Status reported before the first stage is reached.
pub const ORDER_RECEIVED: &str = "Order received";

/// The stages every order walks through, in order.
pub const DEFAULT_STAGES: [&str; 5] = [
    "Grinding beans",
    "Steaming milk",
    "Taking a sip (quality control)",
    "On transit",
    "Picked up",
];

/// Drives an order through a fixed list of stages on its own clock: stage `i`
/// is reached `(i + 1) * stage_duration` after the order was accepted.
///
/// Reads never move an order forward. Whether a snapshot is new depends on
/// the reader's last-seen status, so any number of readers each see every
/// stage exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparationPipeline {
    stages: Vec<String>,
    stage_duration: Duration,
}

impl PreparationPipeline {
    /// Builds a pipeline. Falls back to [`DEFAULT_STAGES`] when `stages` is empty,
    /// and a zero `stage_duration` is treated as one millisecond.
    pub fn new(stages: Vec<String>, stage_duration: Duration) -> Self {
        let stages = if stages.is_empty() {
            DEFAULT_STAGES.iter().map(|s| s.to_string()).collect()
        } else {
            stages
        };
        Self {
            stages,
            stage_duration: stage_duration.max(Duration::from_millis(1)),
        }
    }

    pub fn with_stage_duration(stage_duration: Duration) -> Self {
        Self::new(Vec::new(), stage_duration)
    }

    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    pub fn stage_duration(&self) -> Duration {
        self.stage_duration
    }

    fn last_stage(&self) -> usize {
        self.stages.len() - 1
    }

    fn label(&self, stage: Option<usize>) -> &str {
        stage
            .and_then(|i| self.stages.get(i))
            .map(String::as_str)
            .unwrap_or(ORDER_RECEIVED)
    }

    /// Index of the last stage reached after `elapsed`, `None` before the first.
    fn reached(&self, elapsed: Duration) -> Option<usize> {
        let periods = elapsed.as_millis() / self.stage_duration.as_millis();
        let periods = usize::try_from(periods).unwrap_or(usize::MAX);
        periods.checked_sub(1).map(|i| i.min(self.last_stage()))
    }

    /// Index of the stage `last_seen` names, `None` for anything else.
    fn position(&self, last_seen: Option<&StatusPayload>) -> Option<usize> {
        let seen = last_seen?.as_str()?;
        self.stages.iter().position(|stage| stage == seen)
    }

    /// The snapshot a reader that last saw `last_seen` gets `elapsed` after
    /// the order was accepted.
    ///
    /// A reader behind the clock is handed the stage right after its
    /// last-seen one, so stages are never skipped.
    pub fn snapshot(&self, elapsed: Duration, last_seen: Option<&StatusPayload>) -> CheckResult {
        let last = self.last_stage();
        let seen = self.position(last_seen);
        if seen == Some(last) {
            return CheckResult::new(false, self.label(seen), true);
        }

        let next = seen.map_or(0, |s| s + 1);
        match self.reached(elapsed) {
            Some(reached) if reached >= next => {
                CheckResult::new(true, self.label(Some(next)), next == last)
            }
            _ => CheckResult::unchanged(self.label(seen)),
        }
    }
}

impl Default for PreparationPipeline {
    fn default() -> Self {
        Self::new(Vec::new(), Duration::from_secs(1))
    }
}
