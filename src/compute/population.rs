//! Population management: initial sampling and distance-based selection.

use crate::schema::{FireworkType, ProblemTarget};

use super::firework::{Firework, FireworkIds};
use super::problem::Problem;
use super::random::Randomizer;

/// Sample `n` evaluated fireworks uniformly within the problem's current ranges.
pub fn create_initial_population(
    problem: &Problem,
    n: usize,
    random: &mut Randomizer,
    ids: &mut FireworkIds,
) -> Vec<Firework> {
    (0..n)
        .map(|_| {
            let coordinates = problem
                .current_ranges()
                .iter()
                .map(|range| random.uniform(range.low(), range.high()))
                .collect();
            let mut firework =
                Firework::new(ids.next_id(), FireworkType::Initial, coordinates, None, 0);
            firework.evaluate(problem);
            firework
        })
        .collect()
}

/// Index of the best firework; ties resolve to the earliest one. NaN ranks last.
pub fn best_index(fireworks: &[Firework], target: ProblemTarget) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, firework) in fireworks.iter().enumerate() {
        match best {
            None => best = Some(i),
            Some(b) => {
                if target.is_better(firework.quality_or_nan(), fireworks[b].quality_or_nan()) {
                    best = Some(i);
                }
            }
        }
    }
    best
}

/// Index of the worst firework; ties resolve to the latest one. NaN counts as worst.
pub fn worst_index(fireworks: &[Firework], target: ProblemTarget) -> Option<usize> {
    let mut worst: Option<usize> = None;
    for (i, firework) in fireworks.iter().enumerate() {
        match worst {
            None => worst = Some(i),
            Some(w) => {
                if !target.is_better(firework.quality_or_nan(), fireworks[w].quality_or_nan()) {
                    worst = Some(i);
                }
            }
        }
    }
    worst
}

/// Pick the next population from `candidates`.
///
/// The best candidate is always kept. The remaining `n - 1` places are drawn
/// without replacement with probability proportional to each candidate's
/// summed Euclidean distance to all other candidates. If there are no more
/// than `n` candidates, all of them survive.
pub fn select_survivors(
    candidates: Vec<Firework>,
    n: usize,
    target: ProblemTarget,
    random: &mut Randomizer,
) -> Vec<Firework> {
    if candidates.len() <= n {
        return candidates;
    }
    if n == 0 {
        return Vec::new();
    }

    let weights = distance_weights(&candidates);
    let Some(best) = best_index(&candidates, target) else {
        return Vec::new();
    };

    let mut pool: Vec<(Firework, f64)> = candidates.into_iter().zip(weights).collect();
    let mut survivors = Vec::with_capacity(n);
    survivors.push(pool.remove(best).0);

    while survivors.len() < n && !pool.is_empty() {
        let pick = roulette_pick(&pool, random);
        survivors.push(pool.remove(pick).0);
    }

    survivors
}

/// Sum of distances from each candidate to every other candidate.
fn distance_weights(candidates: &[Firework]) -> Vec<f64> {
    let mut weights = vec![0.0; candidates.len()];
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let d = candidates[i].distance(&candidates[j]);
            weights[i] += d;
            weights[j] += d;
        }
    }
    weights
}

/// Roulette-wheel draw over the remaining pool.
///
/// Falls back to a uniform draw when every weight is zero (all candidates coincide).
fn roulette_pick(pool: &[(Firework, f64)], random: &mut Randomizer) -> usize {
    let total: f64 = pool.iter().map(|(_, w)| *w).sum();
    if !(total > 0.0) || !total.is_finite() {
        return random.uniform_int(0, pool.len() as i32) as usize;
    }

    let target = random.uniform(0.0, total);
    let mut cumulative = 0.0;
    for (i, (_, weight)) in pool.iter().enumerate() {
        cumulative += weight;
        if cumulative > target {
            return i;
        }
    }
    pool.len() - 1
}
