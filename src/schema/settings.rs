//! Algorithm settings for the three Fireworks variants and the solver surface.

use serde::{Deserialize, Serialize};

/// Settings shared by every variant (the FWA 2010 parameter set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireworksAlgorithmSettings {
    /// Number of fireworks kept after selection (population size).
    #[serde(default = "default_locations_number")]
    pub locations_number: usize,
    /// Total explosion sparks budget `m` per step.
    #[serde(default = "default_sparks_modifier")]
    pub explosion_sparks_number_modifier: f64,
    /// Lower bound fraction `a` of the spark budget for one firework.
    #[serde(default = "default_sparks_lower_bound")]
    pub explosion_sparks_number_lower_bound: f64,
    /// Upper bound fraction `b` of the spark budget for one firework.
    #[serde(default = "default_sparks_upper_bound")]
    pub explosion_sparks_number_upper_bound: f64,
    /// Maximum explosion amplitude.
    #[serde(default = "default_maximum_amplitude")]
    pub explosion_sparks_maximum_amplitude: f64,
    /// Number of fireworks chosen for specific (Gaussian) sparks each step.
    #[serde(default = "default_specific_sparks")]
    pub specific_sparks_number: usize,
    /// Specific sparks generated per chosen firework.
    #[serde(default = "default_specific_per_explosion")]
    pub specific_sparks_per_explosion_number: usize,
}

impl Default for FireworksAlgorithmSettings {
    fn default() -> Self {
        Self {
            locations_number: default_locations_number(),
            explosion_sparks_number_modifier: default_sparks_modifier(),
            explosion_sparks_number_lower_bound: default_sparks_lower_bound(),
            explosion_sparks_number_upper_bound: default_sparks_upper_bound(),
            explosion_sparks_maximum_amplitude: default_maximum_amplitude(),
            specific_sparks_number: default_specific_sparks(),
            specific_sparks_per_explosion_number: default_specific_per_explosion(),
        }
    }
}

fn default_locations_number() -> usize {
    5
}
fn default_sparks_modifier() -> f64 {
    50.0
}
fn default_sparks_lower_bound() -> f64 {
    0.04
}
fn default_sparks_upper_bound() -> f64 {
    0.8
}
fn default_maximum_amplitude() -> f64 {
    40.0
}
fn default_specific_sparks() -> usize {
    5
}
fn default_specific_per_explosion() -> usize {
    1
}

impl FireworksAlgorithmSettings {
    /// Validate the shared parameter set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locations_number < 2 {
            return Err(ConfigError::PopulationTooSmall(self.locations_number));
        }

        let modifier = self.explosion_sparks_number_modifier;
        if !modifier.is_finite() || modifier <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "explosion sparks number modifier must be positive, got {modifier}"
            )));
        }

        let (a, b) = (
            self.explosion_sparks_number_lower_bound,
            self.explosion_sparks_number_upper_bound,
        );
        if !(0.0..=1.0).contains(&a) || !(0.0..=1.0).contains(&b) || a > b {
            return Err(ConfigError::InvalidValue(format!(
                "spark number bounds must satisfy 0 <= lower <= upper <= 1, got ({a}, {b})"
            )));
        }

        let amplitude = self.explosion_sparks_maximum_amplitude;
        if !amplitude.is_finite() || amplitude <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "maximum explosion amplitude must be positive, got {amplitude}"
            )));
        }

        if self.specific_sparks_number > self.locations_number {
            return Err(ConfigError::TooManySpecificSparks {
                specific: self.specific_sparks_number,
                locations: self.locations_number,
            });
        }

        Ok(())
    }
}

/// Settings for the Enhanced Fireworks Algorithm (2012).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireworksAlgorithmSettings2012 {
    #[serde(flatten)]
    pub base: FireworksAlgorithmSettings,
    /// Order of the polynomial fitted by the elite strategy.
    #[serde(default = "default_function_order")]
    pub function_order: usize,
    /// Number of best candidates sampled for the elite fit.
    #[serde(default = "default_sampling_number")]
    pub sampling_number: usize,
    /// Amplitude floor at step zero, as a fraction of the mean initial range length.
    #[serde(default = "default_minimum_amplitude_initial")]
    pub minimum_amplitude_initial: f64,
    /// Amplitude floor reached after `minimum_amplitude_decay_steps`.
    #[serde(default = "default_minimum_amplitude_final")]
    pub minimum_amplitude_final: f64,
    /// Steps over which the amplitude floor decays linearly.
    #[serde(default = "default_decay_steps")]
    pub minimum_amplitude_decay_steps: u32,
}

impl Default for FireworksAlgorithmSettings2012 {
    fn default() -> Self {
        Self {
            base: FireworksAlgorithmSettings::default(),
            function_order: default_function_order(),
            sampling_number: default_sampling_number(),
            minimum_amplitude_initial: default_minimum_amplitude_initial(),
            minimum_amplitude_final: default_minimum_amplitude_final(),
            minimum_amplitude_decay_steps: default_decay_steps(),
        }
    }
}

fn default_function_order() -> usize {
    2
}
fn default_sampling_number() -> usize {
    10
}
fn default_minimum_amplitude_initial() -> f64 {
    0.02
}
fn default_minimum_amplitude_final() -> f64 {
    0.001
}
fn default_decay_steps() -> u32 {
    100
}

impl FireworksAlgorithmSettings2012 {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base.validate()?;
        validate_elite(self.function_order, self.sampling_number)?;

        let (initial, last) = (self.minimum_amplitude_initial, self.minimum_amplitude_final);
        if !initial.is_finite() || !last.is_finite() || last < 0.0 || initial < last {
            return Err(ConfigError::InvalidValue(format!(
                "amplitude floor must decay to a non-negative final value, got ({initial}, {last})"
            )));
        }
        Ok(())
    }
}

/// Settings for the Dynamic Search Fireworks Algorithm (2014).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicFireworksAlgorithmSettings {
    #[serde(flatten)]
    pub base: FireworksAlgorithmSettings,
    #[serde(default = "default_function_order")]
    pub function_order: usize,
    #[serde(default = "default_sampling_number")]
    pub sampling_number: usize,
    /// Core amplitude multiplier after an improving step.
    #[serde(default = "default_amplification")]
    pub amplification_coefficient: f64,
    /// Core amplitude multiplier after a non-improving step.
    #[serde(default = "default_reduction")]
    pub reduction_coefficient: f64,
    /// Floor for the core amplitude.
    #[serde(default = "default_minimum_core_amplitude")]
    pub minimum_core_amplitude: f64,
}

impl Default for DynamicFireworksAlgorithmSettings {
    fn default() -> Self {
        Self {
            base: FireworksAlgorithmSettings::default(),
            function_order: default_function_order(),
            sampling_number: default_sampling_number(),
            amplification_coefficient: default_amplification(),
            reduction_coefficient: default_reduction(),
            minimum_core_amplitude: default_minimum_core_amplitude(),
        }
    }
}

fn default_amplification() -> f64 {
    1.2
}
fn default_reduction() -> f64 {
    0.9
}
fn default_minimum_core_amplitude() -> f64 {
    1e-9
}

impl DynamicFireworksAlgorithmSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base.validate()?;
        validate_elite(self.function_order, self.sampling_number)?;

        if !self.amplification_coefficient.is_finite() || self.amplification_coefficient < 1.0 {
            return Err(ConfigError::InvalidValue(format!(
                "amplification coefficient must be >= 1, got {}",
                self.amplification_coefficient
            )));
        }
        if !(self.reduction_coefficient > 0.0 && self.reduction_coefficient <= 1.0) {
            return Err(ConfigError::InvalidValue(format!(
                "reduction coefficient must be in (0, 1], got {}",
                self.reduction_coefficient
            )));
        }
        if !self.minimum_core_amplitude.is_finite() || self.minimum_core_amplitude <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "minimum core amplitude must be positive, got {}",
                self.minimum_core_amplitude
            )));
        }
        Ok(())
    }
}

fn validate_elite(function_order: usize, sampling_number: usize) -> Result<(), ConfigError> {
    if function_order == 0 {
        return Err(ConfigError::InvalidValue(
            "function order must be at least 1".to_string(),
        ));
    }
    if sampling_number < function_order + 1 {
        return Err(ConfigError::InvalidValue(format!(
            "sampling number {sampling_number} cannot fit a polynomial of order {function_order}"
        )));
    }
    Ok(())
}

/// Full settings for one algorithm run, tagged by variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant")]
pub enum AlgorithmSettings {
    /// Fireworks Algorithm (2010).
    Fwa(FireworksAlgorithmSettings),
    /// Enhanced Fireworks Algorithm with elite strategy (2012).
    Efwa(FireworksAlgorithmSettings2012),
    /// Dynamic explosion amplitude Fireworks Algorithm (2014).
    DynFwa(DynamicFireworksAlgorithmSettings),
}

impl Default for AlgorithmSettings {
    fn default() -> Self {
        Self::Fwa(FireworksAlgorithmSettings::default())
    }
}

impl AlgorithmSettings {
    /// Parameters shared by every variant.
    pub fn base(&self) -> &FireworksAlgorithmSettings {
        match self {
            AlgorithmSettings::Fwa(s) => s,
            AlgorithmSettings::Efwa(s) => &s.base,
            AlgorithmSettings::DynFwa(s) => &s.base,
        }
    }

    pub fn variant(&self) -> AlgorithmVariant {
        match self {
            AlgorithmSettings::Fwa(_) => AlgorithmVariant::Fwa,
            AlgorithmSettings::Efwa(_) => AlgorithmVariant::Efwa,
            AlgorithmSettings::DynFwa(_) => AlgorithmVariant::DynFwa,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            AlgorithmSettings::Fwa(s) => s.validate(),
            AlgorithmSettings::Efwa(s) => s.validate(),
            AlgorithmSettings::DynFwa(s) => s.validate(),
        }
    }
}

/// Algorithm variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmVariant {
    #[default]
    Fwa,
    Efwa,
    DynFwa,
}

/// The small configuration surface exposed to an interactive front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    #[serde(default)]
    pub variant: AlgorithmVariant,
    #[serde(default = "default_locations_number")]
    pub locations_number: usize,
    #[serde(default = "default_sparks_modifier")]
    pub explosion_sparks_number_modifier: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Pause between steps, in milliseconds.
    #[serde(default = "default_step_delay")]
    pub step_delay_ms: u64,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            variant: AlgorithmVariant::default(),
            locations_number: default_locations_number(),
            explosion_sparks_number_modifier: default_sparks_modifier(),
            max_steps: default_max_steps(),
            step_delay_ms: default_step_delay(),
            random_seed: None,
        }
    }
}

fn default_max_steps() -> u32 {
    50
}
fn default_step_delay() -> u64 {
    100
}

/// Allowed ranges of the solver surface.
pub const LOCATIONS_RANGE: (usize, usize) = (2, 20);
pub const SPARKS_MODIFIER_RANGE: (f64, f64) = (5.0, 200.0);
pub const MAX_STEPS_RANGE: (u32, u32) = (10, 1000);
pub const STEP_DELAY_RANGE: (u64, u64) = (0, 2000);

/// Specific sparks used by the solver presets before capping to the population.
const PRESET_SPECIFIC_SPARKS: usize = 5;

impl SolverSettings {
    /// Validate the surface ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |ok: bool, name: &str, value: String, range: String| {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange {
                    name: name.to_string(),
                    value,
                    range,
                })
            }
        };

        let (lo, hi) = LOCATIONS_RANGE;
        check(
            (lo..=hi).contains(&self.locations_number),
            "locations_number",
            self.locations_number.to_string(),
            format!("[{lo}, {hi}]"),
        )?;

        let (lo, hi) = SPARKS_MODIFIER_RANGE;
        check(
            (lo..=hi).contains(&self.explosion_sparks_number_modifier),
            "explosion_sparks_number_modifier",
            self.explosion_sparks_number_modifier.to_string(),
            format!("[{lo}, {hi}]"),
        )?;

        let (lo, hi) = MAX_STEPS_RANGE;
        check(
            (lo..=hi).contains(&self.max_steps),
            "max_steps",
            self.max_steps.to_string(),
            format!("[{lo}, {hi}]"),
        )?;

        let (lo, hi) = STEP_DELAY_RANGE;
        check(
            (lo..=hi).contains(&self.step_delay_ms),
            "step_delay_ms",
            self.step_delay_ms.to_string(),
            format!("[{lo}, {hi}]"),
        )?;

        Ok(())
    }

    /// Expand the surface into full algorithm settings using the solver presets.
    pub fn algorithm_settings(&self) -> AlgorithmSettings {
        let base = FireworksAlgorithmSettings {
            locations_number: self.locations_number,
            explosion_sparks_number_modifier: self.explosion_sparks_number_modifier,
            explosion_sparks_number_lower_bound: default_sparks_lower_bound(),
            explosion_sparks_number_upper_bound: default_sparks_upper_bound(),
            explosion_sparks_maximum_amplitude: default_maximum_amplitude(),
            specific_sparks_number: PRESET_SPECIFIC_SPARKS.min(self.locations_number),
            specific_sparks_per_explosion_number: default_specific_per_explosion(),
        };
        let sampling_number = self.locations_number.max(default_sampling_number());

        match self.variant {
            AlgorithmVariant::Fwa => AlgorithmSettings::Fwa(base),
            AlgorithmVariant::Efwa => AlgorithmSettings::Efwa(FireworksAlgorithmSettings2012 {
                base,
                sampling_number,
                minimum_amplitude_decay_steps: self.max_steps,
                ..Default::default()
            }),
            AlgorithmVariant::DynFwa => {
                AlgorithmSettings::DynFwa(DynamicFireworksAlgorithmSettings {
                    base,
                    sampling_number,
                    ..Default::default()
                })
            }
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be at least 2, got {0}")]
    PopulationTooSmall(usize),
    #[error("Specific sparks number {specific} exceeds locations number {locations}")]
    TooManySpecificSparks { specific: usize, locations: usize },
    #[error("Interval bounds must be finite, got [{low}, {high}]")]
    NonFiniteBound { low: f64, high: f64 },
    #[error("Interval lower bound {low} exceeds upper bound {high}")]
    InvertedInterval { low: f64, high: f64 },
    #[error("Interval [{low}, {high}] is too wide to represent its length")]
    IntervalTooWide { low: f64, high: f64 },
    #[error("Problem must have at least one dimension")]
    NoDimensions,
    #[error("{name} = {value} is outside the allowed range {range}")]
    OutOfRange {
        name: String,
        value: String,
        range: String,
    },
    #[error("Invalid setting: {0}")]
    InvalidValue(String),
}
