//! Stop conditions polled before every step.

use crate::schema::{AlgorithmState, ProblemTarget, StopReason};

/// Decides from the latest snapshot whether a run is finished.
///
/// Conditions are evaluated fresh on every poll and must not keep state of their own.
pub trait StopCondition {
    /// Reason to stop after `state`, if any.
    fn check(&self, state: &AlgorithmState) -> Option<StopReason>;

    fn should_stop(&self, state: &AlgorithmState) -> bool {
        self.check(state).is_some()
    }
}

impl<S: StopCondition + ?Sized> StopCondition for Box<S> {
    fn check(&self, state: &AlgorithmState) -> Option<StopReason> {
        (**self).check(state)
    }
}

/// Stop once `max_steps` steps have completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCounterStopCondition {
    max_steps: u32,
}

impl StepCounterStopCondition {
    pub fn new(max_steps: u32) -> Self {
        Self { max_steps }
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }
}

impl StopCondition for StepCounterStopCondition {
    fn check(&self, state: &AlgorithmState) -> Option<StopReason> {
        (state.step_number >= self.max_steps).then_some(StopReason::MaxSteps)
    }
}

/// Stop once the best quality is at least as good as `target_quality`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetQualityStopCondition {
    target_quality: f64,
    direction: ProblemTarget,
}

impl TargetQualityStopCondition {
    pub fn new(target_quality: f64, direction: ProblemTarget) -> Self {
        Self {
            target_quality,
            direction,
        }
    }
}

impl StopCondition for TargetQualityStopCondition {
    fn check(&self, state: &AlgorithmState) -> Option<StopReason> {
        let best = state.best_quality();
        let reached = !best.is_nan() && !self.direction.is_better(self.target_quality, best);
        reached.then_some(StopReason::TargetReached)
    }
}

/// Stop after `patience` steps without a strict improvement of the best solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagnationStopCondition {
    patience: u32,
}

impl StagnationStopCondition {
    pub fn new(patience: u32) -> Self {
        Self { patience }
    }
}

impl StopCondition for StagnationStopCondition {
    fn check(&self, state: &AlgorithmState) -> Option<StopReason> {
        let idle = state.step_number.saturating_sub(state.last_improvement_step);
        (idle >= self.patience).then_some(StopReason::Stagnation)
    }
}

/// Stops as soon as any of its conditions does, reporting the first reason in order.
#[derive(Default)]
pub struct AnyStopCondition {
    conditions: Vec<Box<dyn StopCondition + Send>>,
}

impl AnyStopCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, condition: impl StopCondition + Send + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }
}

impl StopCondition for AnyStopCondition {
    fn check(&self, state: &AlgorithmState) -> Option<StopReason> {
        self.conditions.iter().find_map(|c| c.check(state))
    }
}

impl std::fmt::Debug for AnyStopCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyStopCondition")
            .field("conditions", &self.conditions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FireworkId, FireworkSnapshot, FireworkType};

    fn state(step_number: u32, best: f64, last_improvement_step: u32) -> AlgorithmState {
        let best_solution = FireworkSnapshot {
            id: FireworkId(0),
            coordinates: vec![0.0],
            quality: Some(best),
            kind: FireworkType::Initial,
            birth_step: 0,
            parent: None,
        };
        AlgorithmState {
            step_number,
            fireworks: vec![best_solution.clone()],
            best_solution,
            last_improvement_step,
        }
    }

    #[test]
    fn test_step_counter() {
        let condition = StepCounterStopCondition::new(3);
        assert!(!condition.should_stop(&state(2, 1.0, 0)));
        assert_eq!(condition.check(&state(3, 1.0, 0)), Some(StopReason::MaxSteps));
    }

    #[test]
    fn test_target_quality() {
        let minimize = TargetQualityStopCondition::new(0.5, ProblemTarget::Minimum);
        assert!(!minimize.should_stop(&state(1, 0.6, 0)));
        assert!(minimize.should_stop(&state(1, 0.5, 0)));
        assert!(!minimize.should_stop(&state(1, f64::NAN, 0)));

        let maximize = TargetQualityStopCondition::new(0.5, ProblemTarget::Maximum);
        assert!(maximize.should_stop(&state(1, 0.6, 0)));
        assert!(!maximize.should_stop(&state(1, 0.4, 0)));
    }

    #[test]
    fn test_stagnation() {
        let condition = StagnationStopCondition::new(5);
        assert!(!condition.should_stop(&state(8, 1.0, 4)));
        assert_eq!(condition.check(&state(9, 1.0, 4)), Some(StopReason::Stagnation));
    }

    #[test]
    fn test_any_reports_first_reason() {
        let condition = AnyStopCondition::new()
            .with(StepCounterStopCondition::new(10))
            .with(StagnationStopCondition::new(2));
        assert!(!condition.should_stop(&state(1, 1.0, 0)));
        assert_eq!(condition.check(&state(4, 1.0, 1)), Some(StopReason::Stagnation));
        assert_eq!(condition.check(&state(10, 1.0, 9)), Some(StopReason::MaxSteps));
        assert!(!AnyStopCondition::new().should_stop(&state(100, 1.0, 0)));
    }
}
