//! Search-space types: intervals, dimensions and optimization direction.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Closed real interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    low: f64,
    high: f64,
}

impl Interval {
    /// Create an interval, rejecting non-finite or inverted bounds and widths
    /// that overflow `f64`.
    pub fn new(low: f64, high: f64) -> Result<Self, ConfigError> {
        if !low.is_finite() || !high.is_finite() {
            return Err(ConfigError::NonFiniteBound { low, high });
        }
        if low > high {
            return Err(ConfigError::InvertedInterval { low, high });
        }
        if !(high - low).is_finite() {
            return Err(ConfigError::IntervalTooWide { low, high });
        }
        Ok(Self { low, high })
    }

    /// Lower bound.
    #[inline]
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper bound.
    #[inline]
    pub fn high(&self) -> f64 {
        self.high
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn midpoint(&self) -> f64 {
        self.low + 0.5 * self.length()
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Clamp a value into the interval. NaN maps to the lower bound.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.low;
        }
        value.clamp(self.low, self.high)
    }

    /// Map a value back into the interval by wrapping around its width.
    ///
    /// Values already inside are returned unchanged. A degenerate interval
    /// always yields its single point.
    pub fn wrap(&self, value: f64) -> f64 {
        if self.contains(value) {
            return value;
        }
        let width = self.length();
        if width <= 0.0 || !value.is_finite() {
            return self.low;
        }
        self.clamp(self.low + (value - self.low).rem_euclid(width))
    }
}

static NEXT_DIMENSION_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque identity of a [`Dimension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimensionId(u64);

/// A named, bounded axis of the search space.
///
/// Equality is identity: two dimensions created separately are never equal,
/// even with the same name and bounds. Clones share the identity.
#[derive(Debug, Clone)]
pub struct Dimension {
    id: DimensionId,
    name: String,
    initial_range: Interval,
}

impl Dimension {
    pub fn new(name: impl Into<String>, initial_range: Interval) -> Self {
        Self {
            id: DimensionId(NEXT_DIMENSION_ID.fetch_add(1, AtomicOrdering::Relaxed)),
            name: name.into(),
            initial_range,
        }
    }

    #[inline]
    pub fn id(&self) -> DimensionId {
        self.id
    }

    /// Variable name bound to this axis when evaluating expressions.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn initial_range(&self) -> Interval {
        self.initial_range
    }
}

impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Dimension {}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProblemTarget {
    #[default]
    Minimum,
    Maximum,
}

impl ProblemTarget {
    /// Whether `candidate` is strictly better than `incumbent`.
    ///
    /// Any finite value beats NaN; NaN never beats anything.
    pub fn is_better(&self, candidate: f64, incumbent: f64) -> bool {
        match (candidate.is_nan(), incumbent.is_nan()) {
            (true, _) => false,
            (false, true) => true,
            (false, false) => match self {
                ProblemTarget::Minimum => candidate < incumbent,
                ProblemTarget::Maximum => candidate > incumbent,
            },
        }
    }

    /// Ordering that sorts better qualities first and NaN last.
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
                match self {
                    ProblemTarget::Minimum => ord,
                    ProblemTarget::Maximum => ord.reverse(),
                }
            }
        }
    }

    /// Non-negative distance of `quality` from `reference` in the improving direction.
    ///
    /// For minimization this is `quality - reference`; for maximization the sign flips.
    #[inline]
    pub fn gap(&self, quality: f64, reference: f64) -> f64 {
        match self {
            ProblemTarget::Minimum => quality - reference,
            ProblemTarget::Maximum => reference - quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_interval_rejects_bad_bounds() {
        assert!(Interval::new(1.0, 0.0).is_err());
        assert!(Interval::new(f64::NAN, 0.0).is_err());
        assert!(Interval::new(0.0, f64::INFINITY).is_err());
        assert!(Interval::new(2.0, 2.0).is_ok());
    }

    #[test]
    fn test_interval_rejects_overflowing_width() {
        assert_eq!(
            Interval::new(-1e308, 1e308),
            Err(ConfigError::IntervalTooWide {
                low: -1e308,
                high: 1e308
            })
        );
        let wide = Interval::new(-f64::MAX / 2.0, f64::MAX / 2.0).unwrap();
        assert!(wide.length().is_finite());
    }

    #[test]
    fn test_interval_basics() {
        let interval = Interval::new(-5.0, 5.0).unwrap();
        assert_eq!(interval.length(), 10.0);
        assert_eq!(interval.midpoint(), 0.0);
        assert!(interval.contains(5.0));
        assert!(!interval.contains(5.1));
        assert_eq!(interval.clamp(7.0), 5.0);
        assert_eq!(interval.clamp(f64::NAN), -5.0);
    }

    #[test]
    fn test_wrap_is_modular() {
        let interval = Interval::new(-5.0, 5.0).unwrap();
        assert!((interval.wrap(6.0) - -4.0).abs() < 1e-12);
        assert!((interval.wrap(-7.5) - 2.5).abs() < 1e-12);
        assert_eq!(interval.wrap(3.0), 3.0);

        let point = Interval::new(1.0, 1.0).unwrap();
        assert_eq!(point.wrap(10.0), 1.0);
    }

    #[test]
    fn test_dimension_identity() {
        let range = Interval::new(0.0, 1.0).unwrap();
        let a = Dimension::new("x", range);
        let b = Dimension::new("x", range);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_target_ordering() {
        let min = ProblemTarget::Minimum;
        assert!(min.is_better(1.0, 2.0));
        assert!(!min.is_better(2.0, 2.0));
        assert!(min.is_better(100.0, f64::NAN));
        assert!(!min.is_better(f64::NAN, 100.0));
        assert_eq!(min.compare(f64::NAN, 1.0), Ordering::Greater);

        let max = ProblemTarget::Maximum;
        assert!(max.is_better(2.0, 1.0));
        assert_eq!(max.compare(3.0, 1.0), Ordering::Less);
        assert_eq!(max.gap(1.0, 3.0), 2.0);
    }

    proptest! {
        #[test]
        fn prop_clamp_stays_inside(
            a in -1e6f64..1e6,
            b in -1e6f64..1e6,
            v in proptest::num::f64::ANY,
        ) {
            let interval = Interval::new(a.min(b), a.max(b)).unwrap();
            let clamped = interval.clamp(v);
            prop_assert!(clamped >= interval.low() && clamped <= interval.high());
        }

        #[test]
        fn prop_wrap_stays_inside(a in -1e3f64..1e3, w in 0.0f64..1e3, v in -1e6f64..1e6) {
            let interval = Interval::new(a, a + w).unwrap();
            let wrapped = interval.wrap(v);
            prop_assert!(interval.contains(wrapped));
        }
    }
}
