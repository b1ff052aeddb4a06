//! Elite strategy: locate a promising point from a polynomial fit of the best samples.
//!
//! Every dimension is fitted independently with a least-squares polynomial of
//! quality against that coordinate. The elite point takes, per dimension, the
//! coordinate where the fitted polynomial is best within the sampled range.

use nalgebra::{DMatrix, DVector};

use crate::schema::{FireworkId, ProblemTarget};

use super::super::firework::Firework;

/// Subintervals scanned for derivative roots when they cannot be found analytically.
const ROOT_SCAN_INTERVALS: usize = 128;
const BISECTION_ITERATIONS: usize = 60;
/// Singular values below this fraction of the largest count as zero.
const RANK_TOLERANCE: f64 = 1e-12;
const SVD_ITERATIONS: usize = 200;

/// Coordinates proposed by the elite strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct ElitePoint {
    pub coordinates: Vec<f64>,
    /// Best of the fitted samples.
    pub parent: FireworkId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EliteStrategy {
    function_order: usize,
    sampling_number: usize,
}

impl EliteStrategy {
    pub fn new(function_order: usize, sampling_number: usize) -> Self {
        Self {
            function_order,
            sampling_number,
        }
    }

    /// Fit the best `sampling_number` evaluated candidates of `pool` and locate the elite point.
    ///
    /// Returns `None` when there is nothing to fit: too few finite samples, too
    /// few distinct values in some dimension, or a singular fit.
    pub fn locate(&self, pool: &[Firework], target: ProblemTarget) -> Option<ElitePoint> {
        let mut samples: Vec<&Firework> = pool
            .iter()
            .filter(|f| f.quality().is_some_and(f64::is_finite))
            .collect();
        samples.sort_by(|a, b| target.compare(a.quality_or_nan(), b.quality_or_nan()));
        samples.truncate(self.sampling_number);

        let needed = self.function_order + 1;
        if samples.len() < needed {
            return None;
        }

        let parent = samples[0].id();
        let ys: Vec<f64> = samples.iter().map(|f| f.quality_or_nan()).collect();
        let dimensions = samples[0].coordinates().len();

        let mut coordinates = Vec::with_capacity(dimensions);
        for k in 0..dimensions {
            let xs: Vec<f64> = samples.iter().map(|f| f.coordinates()[k]).collect();
            if distinct_count(&xs) < needed {
                log::trace!("Elite step skipped: dimension {k} has too few distinct samples");
                return None;
            }

            let Some(fit) = Polynomial::fit(&xs, &ys, self.function_order) else {
                log::warn!("Elite step skipped: singular fit in dimension {k}");
                return None;
            };
            coordinates.push(fit.optimum(target));
        }

        Some(ElitePoint {
            coordinates,
            parent,
        })
    }
}

fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

/// Polynomial in a centered and scaled variable `t = (x - center) / scale`.
#[derive(Debug, Clone)]
struct Polynomial {
    /// Coefficients, constant term first.
    coefficients: Vec<f64>,
    center: f64,
    scale: f64,
    /// Sampled range in `t`.
    t_low: f64,
    t_high: f64,
}

impl Polynomial {
    /// Least-squares fit of `ys` against `xs`.
    fn fit(xs: &[f64], ys: &[f64], order: usize) -> Option<Self> {
        let count = xs.len() as f64;
        let center: f64 = xs.iter().map(|x| x / count).sum();
        let scale = xs
            .iter()
            .map(|x| (x - center).abs())
            .fold(0.0, f64::max);
        if !(scale > 0.0) {
            return None;
        }

        let ts: Vec<f64> = xs.iter().map(|x| (x - center) / scale).collect();
        let size = order + 1;

        let vandermonde = DMatrix::from_fn(ts.len(), size, |i, j| ts[i].powi(j as i32));
        let values = DVector::from_column_slice(ys);

        let svd = vandermonde.try_svd(true, true, f64::EPSILON, SVD_ITERATIONS)?;
        let tolerance = svd.singular_values.max() * RANK_TOLERANCE;
        if svd.rank(tolerance) < size {
            return None;
        }
        let solution = svd.solve(&values, tolerance).ok()?;
        if !solution.iter().all(|c| c.is_finite()) {
            return None;
        }
        let coefficients: Vec<f64> = solution.iter().copied().collect();

        let t_low = ts.iter().copied().fold(f64::INFINITY, f64::min);
        let t_high = ts.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            coefficients,
            center,
            scale,
            t_low,
            t_high,
        })
    }

    fn value_at(coefficients: &[f64], t: f64) -> f64 {
        coefficients.iter().rev().fold(0.0, |acc, c| acc * t + c)
    }

    fn derivative(&self) -> Vec<f64> {
        self.coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| i as f64 * c)
            .collect()
    }

    /// Best point within the sampled range, in original coordinates.
    fn optimum(&self, target: ProblemTarget) -> f64 {
        let mut candidates = vec![self.t_low, self.t_high];
        candidates.extend(self.critical_points());

        let mut best_t = self.t_low;
        let mut best_value = Self::value_at(&self.coefficients, best_t);
        for t in candidates {
            let value = Self::value_at(&self.coefficients, t);
            if target.is_better(value, best_value) {
                best_t = t;
                best_value = value;
            }
        }

        self.center + best_t * self.scale
    }

    /// Real roots of the derivative strictly inside the sampled range.
    fn critical_points(&self) -> Vec<f64> {
        let mut derivative = self.derivative();
        while derivative.last().is_some_and(|c| *c == 0.0) {
            derivative.pop();
        }

        let (low, high) = (self.t_low, self.t_high);
        let inside = |t: f64| t > low && t < high;

        match derivative.len() {
            0 | 1 => Vec::new(),
            2 => {
                let root = -derivative[0] / derivative[1];
                if inside(root) { vec![root] } else { Vec::new() }
            }
            _ => scan_roots(&derivative, low, high)
                .into_iter()
                .filter(|t| inside(*t))
                .collect(),
        }
    }
}

/// Roots of `coefficients` in `[low, high]` found by sign changes over a fixed grid.
fn scan_roots(coefficients: &[f64], low: f64, high: f64) -> Vec<f64> {
    let f = |t: f64| Polynomial::value_at(coefficients, t);
    let step = (high - low) / ROOT_SCAN_INTERVALS as f64;
    let mut roots = Vec::new();

    let mut a = low;
    let mut fa = f(a);
    for i in 1..=ROOT_SCAN_INTERVALS {
        let b = if i == ROOT_SCAN_INTERVALS { high } else { low + step * i as f64 };
        let fb = f(b);

        if fa == 0.0 {
            roots.push(a);
        } else if fa.signum() != fb.signum() && fb != 0.0 {
            roots.push(bisect(&f, a, b, fa));
        }

        a = b;
        fa = fb;
    }
    if fa == 0.0 {
        roots.push(a);
    }
    roots
}

fn bisect(f: &impl Fn(f64) -> f64, mut a: f64, mut b: f64, mut fa: f64) -> f64 {
    for _ in 0..BISECTION_ITERATIONS {
        let mid = 0.5 * (a + b);
        let fm = f(mid);
        if fm == 0.0 {
            return mid;
        }
        if fm.signum() == fa.signum() {
            a = mid;
            fa = fm;
        } else {
            b = mid;
        }
    }
    0.5 * (a + b)
}
