//! Optimization problem: dimensions, objective and search ranges.

use crate::schema::{ConfigError, Dimension, Interval, ProblemTarget};

use super::objective::Objective;

/// Default floor for current-range width, as a fraction of the initial width.
const DEFAULT_MINIMUM_RANGE_FRACTION: f64 = 1e-6;

/// A bounded optimization problem over an ordered set of dimensions.
///
/// The initial range of every dimension is fixed for the problem's lifetime.
/// The current range starts equal to it and may be narrowed or moved during a
/// run; it never leaves the initial range.
pub struct Problem {
    dimensions: Vec<Dimension>,
    current_ranges: Vec<Interval>,
    objective: Box<dyn Objective + Send>,
    target: ProblemTarget,
    minimum_range_fraction: f64,
}

impl std::fmt::Debug for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Problem")
            .field("dimensions", &self.dimensions)
            .field("current_ranges", &self.current_ranges)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Problem {
    /// Create a problem. At least one dimension is required.
    pub fn new<O>(
        dimensions: Vec<Dimension>,
        objective: O,
        target: ProblemTarget,
    ) -> Result<Self, ConfigError>
    where
        O: Objective + Send + 'static,
    {
        if dimensions.is_empty() {
            return Err(ConfigError::NoDimensions);
        }
        let current_ranges = dimensions.iter().map(Dimension::initial_range).collect();

        Ok(Self {
            dimensions,
            current_ranges,
            objective: Box::new(objective),
            target,
            minimum_range_fraction: DEFAULT_MINIMUM_RANGE_FRACTION,
        })
    }

    /// Set the floor for current-range width as a fraction of each initial width.
    pub fn with_minimum_range_fraction(mut self, fraction: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ConfigError::InvalidValue(format!(
                "minimum range fraction must be in [0, 1], got {fraction}"
            )));
        }
        self.minimum_range_fraction = fraction;
        Ok(self)
    }

    #[inline]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    #[inline]
    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    #[inline]
    pub fn target(&self) -> ProblemTarget {
        self.target
    }

    /// Position of `dimension` in coordinate vectors.
    pub fn index_of(&self, dimension: &Dimension) -> Option<usize> {
        self.dimensions.iter().position(|d| d == dimension)
    }

    /// Value of `dimension` in a coordinate vector of this problem.
    pub fn coordinate(&self, coordinates: &[f64], dimension: &Dimension) -> Option<f64> {
        self.index_of(dimension)
            .and_then(|i| coordinates.get(i).copied())
    }

    pub fn initial_range(&self, index: usize) -> Interval {
        self.dimensions[index].initial_range()
    }

    pub fn current_range(&self, index: usize) -> Interval {
        self.current_ranges[index]
    }

    pub fn current_ranges(&self) -> &[Interval] {
        &self.current_ranges
    }

    /// Mean length of the initial ranges.
    pub fn mean_initial_length(&self) -> f64 {
        let count = self.dimensions.len() as f64;
        self.dimensions
            .iter()
            .map(|d| d.initial_range().length() / count)
            .sum()
    }

    /// Restore every current range to its initial range.
    pub fn reset_current_ranges(&mut self) {
        for (current, dimension) in self.current_ranges.iter_mut().zip(&self.dimensions) {
            *current = dimension.initial_range();
        }
    }

    /// Evaluate the objective. Failures and non-finite results become NaN.
    pub fn evaluate(&self, coordinates: &[f64]) -> f64 {
        match self.objective.evaluate(coordinates) {
            Ok(value) if value.is_finite() => value,
            Ok(value) => {
                log::trace!("Objective returned non-finite {value} at {coordinates:?}");
                f64::NAN
            }
            Err(e) => {
                log::trace!("Objective failed at {coordinates:?}: {e}");
                f64::NAN
            }
        }
    }

    /// Clamp each coordinate into its dimension's initial range.
    pub fn clamp_to_initial_range(&self, coordinates: &mut [f64]) {
        for (value, dimension) in coordinates.iter_mut().zip(&self.dimensions) {
            *value = dimension.initial_range().clamp(*value);
        }
    }

    /// Narrow each current range around its midpoint by `factor`.
    ///
    /// The width never drops below the configured minimum fraction of the
    /// initial width. Factors outside `(0, 1]` are ignored.
    pub fn shrink_current_range(&mut self, factor: f64) {
        if !(factor > 0.0 && factor <= 1.0) {
            return;
        }
        for (current, dimension) in self.current_ranges.iter_mut().zip(&self.dimensions) {
            let initial = dimension.initial_range();
            let floor = initial.length() * self.minimum_range_fraction;
            let width = (current.length() * factor).max(floor).min(initial.length());
            *current = centered(initial, current.midpoint(), width);
        }
    }

    /// Move each current range so that it is centered on `center`, keeping its width.
    pub fn recenter_current_range(&mut self, center: &[f64]) {
        for ((current, dimension), &c) in self
            .current_ranges
            .iter_mut()
            .zip(&self.dimensions)
            .zip(center)
        {
            *current = centered(dimension.initial_range(), c, current.length());
        }
    }
}

/// Interval of `width` centered at `center`, shifted to lie inside `outer`.
fn centered(outer: Interval, center: f64, width: f64) -> Interval {
    let width = width.min(outer.length());
    let max_low = (outer.high() - width).max(outer.low());
    let low = (center - 0.5 * width).clamp(outer.low(), max_low);
    let high = (low + width).min(outer.high());
    Interval::new(low, high).unwrap_or(outer)
}
