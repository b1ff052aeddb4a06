//! Per-variant hooks into the shared step pipeline.

use crate::schema::{AlgorithmSettings, FireworkType};

use super::super::problem::Problem;
use super::elite::EliteStrategy;
use super::sparks::ExplosionShape;

/// Amplitude floor of the 2012 algorithm, decaying linearly with the step number.
#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeFloor {
    initial: f64,
    last: f64,
    decay_steps: u32,
}

impl AmplitudeFloor {
    /// Floor at `step`, scaled by the mean initial range length.
    pub fn at(&self, step: u32, mean_length: f64) -> f64 {
        let fraction = if self.decay_steps == 0 {
            self.last
        } else {
            let progress = f64::from(step.min(self.decay_steps)) / f64::from(self.decay_steps);
            self.initial - (self.initial - self.last) * progress
        };
        fraction * mean_length
    }
}

/// Self-adapting amplitude of the core firework in the 2014 algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreAmplitude {
    amplitude: f64,
    maximum: f64,
    amplification: f64,
    reduction: f64,
    minimum: f64,
}

impl CoreAmplitude {
    #[inline]
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    fn reset(&mut self, mean_length: f64) {
        self.amplitude = self.maximum.min(mean_length).max(self.minimum);
    }

    fn update(&mut self, improved: bool) {
        let factor = if improved {
            self.amplification
        } else {
            self.reduction
        };
        self.amplitude = (self.amplitude * factor).max(self.minimum);
    }
}

/// Variant-specific behaviour of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Fwa,
    Efwa {
        floor: AmplitudeFloor,
        elite: EliteStrategy,
    },
    DynFwa {
        elite: EliteStrategy,
        core: CoreAmplitude,
    },
}

impl Strategy {
    pub fn from_settings(settings: &AlgorithmSettings) -> Self {
        match settings {
            AlgorithmSettings::Fwa(_) => Strategy::Fwa,
            AlgorithmSettings::Efwa(s) => Strategy::Efwa {
                floor: AmplitudeFloor {
                    initial: s.minimum_amplitude_initial,
                    last: s.minimum_amplitude_final,
                    decay_steps: s.minimum_amplitude_decay_steps,
                },
                elite: EliteStrategy::new(s.function_order, s.sampling_number),
            },
            AlgorithmSettings::DynFwa(s) => Strategy::DynFwa {
                elite: EliteStrategy::new(s.function_order, s.sampling_number),
                core: CoreAmplitude {
                    amplitude: s.base.explosion_sparks_maximum_amplitude,
                    maximum: s.base.explosion_sparks_maximum_amplitude,
                    amplification: s.amplification_coefficient,
                    reduction: s.reduction_coefficient,
                    minimum: s.minimum_core_amplitude,
                },
            },
        }
    }

    /// Restore the start-of-run state.
    pub fn reset(&mut self, problem: &Problem) {
        if let Strategy::DynFwa { core, .. } = self {
            core.reset(problem.mean_initial_length());
        }
    }

    /// How sparks of the firework at `index` are displaced, given the core index.
    pub fn shape(&self, index: usize, core: Option<usize>) -> ExplosionShape {
        match self {
            Strategy::Fwa => ExplosionShape {
                per_dimension: false,
                use_current_range: false,
            },
            Strategy::Efwa { .. } => ExplosionShape {
                per_dimension: true,
                use_current_range: false,
            },
            Strategy::DynFwa { .. } => ExplosionShape {
                per_dimension: true,
                use_current_range: core == Some(index),
            },
        }
    }

    /// Apply the variant's amplitude rules on top of the formula amplitudes.
    pub fn adjust_amplitudes(
        &self,
        amplitudes: &mut [f64],
        core: Option<usize>,
        step: u32,
        problem: &Problem,
    ) {
        match self {
            Strategy::Fwa => {}
            Strategy::Efwa { floor, .. } => {
                let minimum = floor.at(step, problem.mean_initial_length());
                for amplitude in amplitudes.iter_mut() {
                    *amplitude = amplitude.max(minimum);
                }
            }
            Strategy::DynFwa { core: state, .. } => {
                if let Some(slot) = core.and_then(|i| amplitudes.get_mut(i)) {
                    *slot = state.amplitude();
                }
            }
        }
    }

    pub fn gaussian_kind(&self) -> FireworkType {
        match self {
            Strategy::Fwa => FireworkType::SpecificSpark,
            _ => FireworkType::GaussianSpark,
        }
    }

    pub fn elite(&self) -> Option<&EliteStrategy> {
        match self {
            Strategy::Fwa => None,
            Strategy::Efwa { elite, .. } | Strategy::DynFwa { elite, .. } => Some(elite),
        }
    }

    /// Update adaptive state once a step has been committed.
    pub fn after_step(&mut self, improved: bool, best: &[f64], problem: &mut Problem) {
        if let Strategy::DynFwa { core, .. } = self {
            core.update(improved);
            if !improved {
                problem.shrink_current_range(core.reduction);
            }
            problem.recenter_current_range(best);
        }
    }

    /// Current core amplitude, if the variant has one.
    pub fn core_amplitude(&self) -> Option<f64> {
        match self {
            Strategy::DynFwa { core, .. } => Some(core.amplitude()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        Dimension, DynamicFireworksAlgorithmSettings, FireworksAlgorithmSettings2012, Interval,
        ProblemTarget,
    };

    fn problem() -> Problem {
        let dims = vec![
            Dimension::new("x", Interval::new(-5.0, 5.0).unwrap()),
            Dimension::new("y", Interval::new(-5.0, 5.0).unwrap()),
        ];
        Problem::new(dims, |c: &[f64]| c[0] + c[1], ProblemTarget::Minimum).unwrap()
    }

    #[test]
    fn test_amplitude_floor_decays_linearly() {
        let floor = AmplitudeFloor {
            initial: 0.02,
            last: 0.001,
            decay_steps: 100,
        };
        assert!((floor.at(0, 10.0) - 0.2).abs() < 1e-12);
        assert!((floor.at(50, 10.0) - 0.105).abs() < 1e-12);
        assert!((floor.at(100, 10.0) - 0.01).abs() < 1e-12);
        assert!((floor.at(500, 10.0) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_efwa_raises_small_amplitudes() {
        let problem = problem();
        let strategy = Strategy::from_settings(&AlgorithmSettings::Efwa(
            FireworksAlgorithmSettings2012::default(),
        ));
        let mut amplitudes = vec![0.0, 5.0];
        strategy.adjust_amplitudes(&mut amplitudes, Some(0), 0, &problem);
        assert!((amplitudes[0] - 0.2).abs() < 1e-12);
        assert_eq!(amplitudes[1], 5.0);
        assert_eq!(strategy.gaussian_kind(), FireworkType::GaussianSpark);
        assert!(strategy.elite().is_some());
    }

    #[test]
    fn test_core_amplitude_adapts() {
        let mut problem = problem();
        let mut strategy = Strategy::from_settings(&AlgorithmSettings::DynFwa(
            DynamicFireworksAlgorithmSettings::default(),
        ));
        strategy.reset(&problem);
        // Capped by the mean range length.
        assert_eq!(strategy.core_amplitude(), Some(10.0));

        strategy.after_step(true, &[0.0, 0.0], &mut problem);
        assert!((strategy.core_amplitude().unwrap() - 12.0).abs() < 1e-12);
        assert_eq!(problem.current_range(0).length(), 10.0);

        strategy.after_step(false, &[1.0, 1.0], &mut problem);
        assert!((strategy.core_amplitude().unwrap() - 10.8).abs() < 1e-12);
        assert!((problem.current_range(0).length() - 9.0).abs() < 1e-12);
        assert!((problem.current_range(0).midpoint() - 0.5).abs() < 1e-12);

        let mut amplitudes = vec![1.0, 2.0, 3.0];
        strategy.adjust_amplitudes(&mut amplitudes, Some(1), 2, &problem);
        assert_eq!(amplitudes[0], 1.0);
        assert!((amplitudes[1] - 10.8).abs() < 1e-12);
    }

    #[test]
    fn test_only_core_uses_current_range() {
        let strategy = Strategy::from_settings(&AlgorithmSettings::DynFwa(
            DynamicFireworksAlgorithmSettings::default(),
        ));
        assert!(strategy.shape(2, Some(2)).use_current_range);
        assert!(!strategy.shape(1, Some(2)).use_current_range);

        let fwa = Strategy::from_settings(&AlgorithmSettings::default());
        assert!(!fwa.shape(0, Some(0)).per_dimension);
        assert_eq!(fwa.gaussian_kind(), FireworkType::SpecificSpark);
        assert!(fwa.elite().is_none());
    }
}
