//! Stopping controller.
//!
//! Consumes one observation per loop iteration and decides whether the
//! session keeps crawling. Decisions are absorbing: once stopped, the
//! controller reports the same reason for the rest of the session, so a
//! late frontier drain or a straggling fetch can never flip the recorded
//! outcome.

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::confidence::ConfidenceSnapshot;

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Target confidence reached
    Confidence,

    /// Marginal gain stayed below the saturation threshold for too long
    Saturation,

    /// The site cannot answer the query at all
    Irrelevant,

    /// No candidates left to crawl
    FrontierExhausted,

    /// Page cap or wall-clock budget exhausted
    MaxPages,

    /// Too many provider calls failed to keep scoring meaningful
    ProviderDegraded,

    /// The caller cancelled the session
    Cancelled,
}

/// Outcome of one stopping check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Keep crawling
    Continue,

    /// Stop with the given reason
    Stop(StopReason),
}

/// One loop iteration's worth of session state, as seen by the controller.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    /// The strategy reports the site cannot answer the query
    pub domain_mismatch: bool,

    /// The provider failure ratio crossed the configured limit
    pub provider_degraded: bool,

    /// Latest confidence snapshot
    pub confidence: ConfidenceSnapshot,

    /// The frontier is empty and no fetches are in flight
    pub frontier_empty: bool,

    /// Pages crawled so far
    pub pages_crawled: usize,

    /// Page cap or wall-clock budget exhausted
    pub budget_exhausted: bool,
}

/// Decides when the session stops, in a fixed priority order: irrelevance,
/// provider degradation, confidence, saturation, frontier exhaustion,
/// budget.
#[derive(Debug)]
pub struct StoppingController {
    target_confidence: f32,
    saturation_threshold: f32,
    saturation_patience: usize,

    low_gain_streak: usize,
    last_pages: usize,
    decided: Option<StopReason>,
}

impl StoppingController {
    /// Create a controller from the session config.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            target_confidence: config.target_confidence,
            saturation_threshold: config.saturation_threshold,
            saturation_patience: config.saturation_patience.max(1),
            low_gain_streak: 0,
            last_pages: 0,
            decided: None,
        }
    }

    /// The decision already reached, if any.
    pub fn decided(&self) -> Option<StopReason> {
        self.decided
    }

    /// Force a decision from outside the priority chain (cancellation).
    pub fn force(&mut self, reason: StopReason) -> StopReason {
        *self.decided.get_or_insert(reason)
    }

    /// Check the current observation against the stopping conditions.
    pub fn decide(&mut self, observation: &Observation) -> Decision {
        if let Some(reason) = self.decided {
            return Decision::Stop(reason);
        }

        // The streak only advances when a new page has actually landed,
        // otherwise repeated checks of the same state would inflate it
        if observation.pages_crawled > self.last_pages {
            self.last_pages = observation.pages_crawled;
            if observation.confidence.saturation < self.saturation_threshold {
                self.low_gain_streak += 1;
            } else {
                self.low_gain_streak = 0;
            }
        }

        let reason = if observation.domain_mismatch {
            Some(StopReason::Irrelevant)
        } else if observation.provider_degraded {
            Some(StopReason::ProviderDegraded)
        } else if observation.pages_crawled > 0
            && observation.confidence.overall >= self.target_confidence
        {
            Some(StopReason::Confidence)
        } else if self.low_gain_streak >= self.saturation_patience {
            Some(StopReason::Saturation)
        } else if observation.frontier_empty {
            Some(StopReason::FrontierExhausted)
        } else if observation.budget_exhausted {
            Some(StopReason::MaxPages)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                self.decided = Some(reason);
                tracing::info!(
                    ?reason,
                    pages_crawled = observation.pages_crawled,
                    confidence = observation.confidence.overall,
                    "Session stopping"
                );
                Decision::Stop(reason)
            }
            None => Decision::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(overall: f32, saturation: f32) -> ConfidenceSnapshot {
        ConfidenceSnapshot {
            coverage: overall,
            consistency: 0.5,
            saturation,
            overall,
        }
    }

    fn observation(pages: usize, overall: f32, saturation: f32) -> Observation {
        Observation {
            domain_mismatch: false,
            provider_degraded: false,
            confidence: snapshot(overall, saturation),
            frontier_empty: false,
            pages_crawled: pages,
            budget_exhausted: false,
        }
    }

    #[test]
    fn test_continues_below_target() {
        let mut controller = StoppingController::new(&SessionConfig::default());
        assert_eq!(
            controller.decide(&observation(1, 0.4, 1.0)),
            Decision::Continue
        );
    }

    #[test]
    fn test_stops_on_confidence() {
        let mut controller = StoppingController::new(&SessionConfig::default());
        assert_eq!(
            controller.decide(&observation(3, 0.85, 1.0)),
            Decision::Stop(StopReason::Confidence)
        );
    }

    #[test]
    fn test_saturation_needs_consecutive_pages() {
        let config = SessionConfig::default().with_saturation(0.1, 2);
        let mut controller = StoppingController::new(&config);

        assert_eq!(controller.decide(&observation(1, 0.4, 0.0)), Decision::Continue);
        // Re-checking the same page count must not advance the streak
        assert_eq!(controller.decide(&observation(1, 0.4, 0.0)), Decision::Continue);
        // A good page resets it
        assert_eq!(controller.decide(&observation(2, 0.4, 0.9)), Decision::Continue);
        assert_eq!(controller.decide(&observation(3, 0.4, 0.0)), Decision::Continue);
        assert_eq!(
            controller.decide(&observation(4, 0.4, 0.0)),
            Decision::Stop(StopReason::Saturation)
        );
    }

    #[test]
    fn test_priority_irrelevant_over_budget() {
        let mut controller = StoppingController::new(&SessionConfig::default());
        let mut observation = observation(5, 0.2, 1.0);
        observation.domain_mismatch = true;
        observation.budget_exhausted = true;

        assert_eq!(
            controller.decide(&observation),
            Decision::Stop(StopReason::Irrelevant)
        );
    }

    #[test]
    fn test_decision_is_absorbing() {
        let mut controller = StoppingController::new(&SessionConfig::default());
        let mut first = observation(2, 0.2, 1.0);
        first.frontier_empty = true;
        assert_eq!(
            controller.decide(&first),
            Decision::Stop(StopReason::FrontierExhausted)
        );

        // Later, better-looking state cannot change the recorded reason
        assert_eq!(
            controller.decide(&observation(3, 0.95, 1.0)),
            Decision::Stop(StopReason::FrontierExhausted)
        );
        assert_eq!(controller.decided(), Some(StopReason::FrontierExhausted));
    }

    #[test]
    fn test_force_respects_existing_decision() {
        let mut controller = StoppingController::new(&SessionConfig::default());
        assert_eq!(controller.force(StopReason::Cancelled), StopReason::Cancelled);
        assert_eq!(controller.force(StopReason::MaxPages), StopReason::Cancelled);
    }
}
