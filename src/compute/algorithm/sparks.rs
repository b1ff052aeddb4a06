//! Spark counts, explosion amplitudes and spark generation.

use crate::schema::{FireworkId, FireworkType, FireworksAlgorithmSettings, Interval, ProblemTarget};

use super::super::firework::Firework;
use super::super::problem::Problem;
use super::super::random::{RangeTooSmall, Randomizer};

/// Guards the spark and amplitude ratios against division by zero.
const EPSILON: f64 = f64::EPSILON;

/// Number of explosion sparks for each firework.
///
/// `m * (worst - q + eps) / (sum(worst - q_j) + eps)`, rounded and clamped to
/// `[round(a * m), round(b * m)]`. Fireworks without a finite quality get the
/// lower bound.
pub fn spark_counts(
    qualities: &[f64],
    target: ProblemTarget,
    settings: &FireworksAlgorithmSettings,
) -> Vec<usize> {
    let m = settings.explosion_sparks_number_modifier;
    let lower = (settings.explosion_sparks_number_lower_bound * m).round();
    let upper = (settings.explosion_sparks_number_upper_bound * m).round();

    let Some(worst) = extreme(qualities, target, false) else {
        return vec![lower as usize; qualities.len()];
    };

    let gaps: Vec<f64> = qualities
        .iter()
        .map(|&q| if q.is_nan() { 0.0 } else { target.gap(worst, q) })
        .collect();
    let total: f64 = gaps.iter().sum();

    qualities
        .iter()
        .zip(&gaps)
        .map(|(q, gap)| {
            if q.is_nan() {
                return lower as usize;
            }
            let raw = m * (gap + EPSILON) / (total + EPSILON);
            raw.round().clamp(lower, upper) as usize
        })
        .collect()
}

/// Explosion amplitude for each firework.
///
/// `A * (q - best + eps) / (sum(q_j - best) + eps)`. Fireworks without a finite
/// quality explode with the full amplitude.
pub fn amplitudes(qualities: &[f64], target: ProblemTarget, maximum: f64) -> Vec<f64> {
    let Some(best) = extreme(qualities, target, true) else {
        return vec![maximum; qualities.len()];
    };

    let gaps: Vec<f64> = qualities
        .iter()
        .map(|&q| if q.is_nan() { 0.0 } else { target.gap(q, best) })
        .collect();
    let total: f64 = gaps.iter().sum();

    qualities
        .iter()
        .zip(&gaps)
        .map(|(q, gap)| {
            if q.is_nan() {
                maximum
            } else {
                maximum * (gap + EPSILON) / (total + EPSILON)
            }
        })
        .collect()
}

/// Best (or worst) finite quality.
fn extreme(qualities: &[f64], target: ProblemTarget, best: bool) -> Option<f64> {
    qualities
        .iter()
        .copied()
        .filter(|q| !q.is_nan())
        .reduce(|a, b| {
            let b_better = target.is_better(b, a);
            if b_better == best { b } else { a }
        })
}

/// How a spark displaces its parent.
#[derive(Debug, Clone, Copy)]
pub struct ExplosionShape {
    /// Draw a separate displacement for every selected dimension.
    pub per_dimension: bool,
    /// Ranges out-of-bounds coordinates are wrapped into, one per dimension.
    pub use_current_range: bool,
}

/// Random non-empty subset of dimension indices.
fn pick_dimensions(count: usize, random: &mut Randomizer) -> Result<Vec<usize>, RangeTooSmall> {
    let z = random.uniform_int(1, count as i32 + 1) as usize;
    random.unique_indices(z, count)
}

fn wrap_range(problem: &Problem, k: usize, use_current_range: bool) -> Interval {
    if use_current_range {
        problem.current_range(k)
    } else {
        problem.initial_range(k)
    }
}

/// Generate one explosion spark around `parent`.
pub fn explosion_spark(
    parent: &Firework,
    amplitude: f64,
    shape: ExplosionShape,
    problem: &Problem,
    random: &mut Randomizer,
    id: FireworkId,
    step: u32,
) -> Result<Firework, RangeTooSmall> {
    let mut coordinates = parent.coordinates().to_vec();
    let dims = pick_dimensions(coordinates.len(), random)?;

    let shared = random.uniform(-amplitude, amplitude);
    for k in dims {
        let displacement = if shape.per_dimension {
            random.uniform(-amplitude, amplitude)
        } else {
            shared
        };
        let range = wrap_range(problem, k, shape.use_current_range);
        coordinates[k] = range.wrap(coordinates[k] + displacement);
    }
    problem.clamp_to_initial_range(&mut coordinates);

    Ok(Firework::new(
        id,
        FireworkType::ExplosionSpark,
        coordinates,
        Some(parent.id()),
        step,
    ))
}

/// Generate one Gaussian spark from `parent`.
///
/// A single `g ~ N(1, 1)` is drawn per spark and scales the offset of each
/// selected coordinate from the best solution. `kind` only tags the spark.
pub fn gaussian_spark(
    parent: &Firework,
    best: &[f64],
    kind: FireworkType,
    problem: &Problem,
    random: &mut Randomizer,
    id: FireworkId,
    step: u32,
) -> Result<Firework, RangeTooSmall> {
    let mut coordinates = parent.coordinates().to_vec();
    let dims = pick_dimensions(coordinates.len(), random)?;

    let coefficient = random.gaussian(1.0, 1.0);
    for k in dims {
        let moved = coordinates[k] + coefficient * (best[k] - coordinates[k]);
        coordinates[k] = problem.initial_range(k).wrap(moved);
    }
    problem.clamp_to_initial_range(&mut coordinates);

    Ok(Firework::new(id, kind, coordinates, Some(parent.id()), step))
}
