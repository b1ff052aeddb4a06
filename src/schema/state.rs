//! Snapshot types emitted by a running algorithm.
//!
//! Everything here is plain owned data: the renderer can keep a snapshot for as
//! long as it likes without holding on to the engine.

use serde::{Deserialize, Serialize};

/// Identifier of a firework, unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FireworkId(pub u64);

/// How a firework came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireworkType {
    /// Sampled uniformly when the run was initialized.
    Initial,
    /// Produced by an explosion around its parent.
    ExplosionSpark,
    /// Specific spark of the 2010 algorithm.
    SpecificSpark,
    /// Gaussian spark of the 2012 and 2014 algorithms.
    GaussianSpark,
    /// Located by the elite strategy's polynomial fit.
    Elite,
}

/// Position and quality of a firework's parent at the time it exploded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentSnapshot {
    pub id: FireworkId,
    pub coordinates: Vec<f64>,
    pub quality: Option<f64>,
}

/// A firework as seen by observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireworkSnapshot {
    pub id: FireworkId,
    /// One value per problem dimension, in dimension order.
    pub coordinates: Vec<f64>,
    /// `None` until evaluated; NaN when the objective failed.
    pub quality: Option<f64>,
    pub kind: FireworkType,
    /// Step in which this firework was created.
    pub birth_step: u32,
    pub parent: Option<ParentSnapshot>,
}

impl FireworkSnapshot {
    /// Quality as a plain number, NaN when missing.
    #[inline]
    pub fn quality_or_nan(&self) -> f64 {
        self.quality.unwrap_or(f64::NAN)
    }
}

/// Immutable state emitted at the end of every completed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmState {
    /// Completed steps; zero right after initialization.
    pub step_number: u32,
    /// Current population, in selection order.
    pub fireworks: Vec<FireworkSnapshot>,
    /// Best firework seen since the run started.
    pub best_solution: FireworkSnapshot,
    /// Last step in which the best solution strictly improved.
    pub last_improvement_step: u32,
}

impl AlgorithmState {
    /// Quality of the best-ever firework, NaN if nothing evaluated to a number.
    #[inline]
    pub fn best_quality(&self) -> f64 {
        self.best_solution.quality_or_nan()
    }

    /// Serialize for a renderer living outside the process.
    ///
    /// JSON has no NaN: a `Some(NaN)` quality is written as `null` and reads
    /// back as `None`. [`FireworkSnapshot::quality_or_nan`] treats both alike.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Lifecycle of one algorithm run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlgorithmPhase {
    #[default]
    Uninitialized,
    Initialized,
    Stepping,
    Stopped,
}

/// Reason a run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Reached the configured number of steps.
    MaxSteps,
    /// Best quality reached the configured target.
    TargetReached,
    /// No strict improvement for the configured number of steps.
    Stagnation,
    /// Stopped from outside.
    Cancelled,
    /// A step could not be completed.
    Error(String),
}

/// Statistics from a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Completed steps.
    pub steps: u32,
    /// Objective evaluations performed, including initialization.
    pub evaluations: u64,
    /// Best firework found.
    pub best: FireworkSnapshot,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    pub stop_reason: StopReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn firework(id: u64, quality: Option<f64>, parent: Option<ParentSnapshot>) -> FireworkSnapshot {
        FireworkSnapshot {
            id: FireworkId(id),
            coordinates: vec![0.5, -1.0],
            quality,
            kind: if parent.is_some() {
                FireworkType::ExplosionSpark
            } else {
                FireworkType::Initial
            },
            birth_step: 1,
            parent,
        }
    }

    #[test]
    fn test_best_quality_defaults_to_nan() {
        let state = AlgorithmState {
            step_number: 0,
            fireworks: vec![firework(0, None, None)],
            best_solution: firework(0, None, None),
            last_improvement_step: 0,
        };
        assert!(state.best_quality().is_nan());
    }

    #[test]
    fn test_state_serialization() {
        let parent = ParentSnapshot {
            id: FireworkId(0),
            coordinates: vec![0.0, 0.0],
            quality: Some(2.0),
        };
        let spark = firework(7, Some(1.25), Some(parent));
        let state = AlgorithmState {
            step_number: 3,
            fireworks: vec![spark.clone()],
            best_solution: spark,
            last_improvement_step: 2,
        };

        let json = state.to_json().unwrap();
        assert!(json.contains("\"step_number\":3"));
        assert!(json.contains("\"kind\":\"ExplosionSpark\""));

        let parsed: AlgorithmState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
        assert_eq!(parsed.best_quality(), 1.25);
    }

    #[test]
    fn test_nan_quality_reads_back_as_missing() {
        let state = AlgorithmState {
            step_number: 1,
            fireworks: vec![firework(3, Some(f64::NAN), None)],
            best_solution: firework(3, Some(f64::NAN), None),
            last_improvement_step: 0,
        };

        let json = state.to_json().unwrap();
        assert!(json.contains("\"quality\":null"));

        let parsed: AlgorithmState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.best_solution.quality, None);
        assert_eq!(parsed.fireworks[0].quality, None);
        assert!(parsed.best_quality().is_nan());
    }
}
