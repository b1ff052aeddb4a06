//! Fireworks: candidate points with memoized quality.

use std::collections::HashMap;

use crate::schema::{FireworkId, FireworkSnapshot, FireworkType, ParentSnapshot};

use super::problem::Problem;

/// A candidate solution.
///
/// The parent link is an identifier only; the parent may already have been
/// dropped from the population. [`Lineage`] resolves it for snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Firework {
    id: FireworkId,
    kind: FireworkType,
    coordinates: Vec<f64>,
    quality: Option<f64>,
    parent: Option<FireworkId>,
    birth_step: u32,
}

impl Firework {
    pub fn new(
        id: FireworkId,
        kind: FireworkType,
        coordinates: Vec<f64>,
        parent: Option<FireworkId>,
        birth_step: u32,
    ) -> Self {
        Self {
            id,
            kind,
            coordinates,
            quality: None,
            parent,
            birth_step,
        }
    }

    #[inline]
    pub fn id(&self) -> FireworkId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> FireworkType {
        self.kind
    }

    #[inline]
    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    #[inline]
    pub fn parent(&self) -> Option<FireworkId> {
        self.parent
    }

    #[inline]
    pub fn birth_step(&self) -> u32 {
        self.birth_step
    }

    /// Cached quality; `None` before evaluation.
    #[inline]
    pub fn quality(&self) -> Option<f64> {
        self.quality
    }

    /// Cached quality, NaN before evaluation.
    #[inline]
    pub fn quality_or_nan(&self) -> f64 {
        self.quality.unwrap_or(f64::NAN)
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.quality.is_some()
    }

    /// Evaluate against `problem` unless already evaluated.
    ///
    /// Returns `true` if the objective was called.
    pub fn evaluate(&mut self, problem: &Problem) -> bool {
        if self.quality.is_some() {
            return false;
        }
        self.quality = Some(problem.evaluate(&self.coordinates));
        true
    }

    /// Euclidean distance between two fireworks.
    pub fn distance(&self, other: &Firework) -> f64 {
        self.coordinates
            .iter()
            .zip(&other.coordinates)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Convert to snapshot, resolving the parent through `lineage`.
    pub fn to_snapshot(&self, lineage: &Lineage) -> FireworkSnapshot {
        FireworkSnapshot {
            id: self.id,
            coordinates: self.coordinates.clone(),
            quality: self.quality,
            kind: self.kind,
            birth_step: self.birth_step,
            parent: self.parent.and_then(|id| lineage.resolve(id)),
        }
    }
}

/// Hands out firework identifiers for one run.
#[derive(Debug, Default, Clone)]
pub struct FireworkIds {
    next: u64,
}

impl FireworkIds {
    pub fn next_id(&mut self) -> FireworkId {
        let id = FireworkId(self.next);
        self.next += 1;
        id
    }
}

/// Position records of fireworks that may be referenced as parents.
///
/// Entries are kept only while some live firework points at them.
#[derive(Debug, Default, Clone)]
pub struct Lineage {
    records: HashMap<FireworkId, (Vec<f64>, Option<f64>)>,
}

impl Lineage {
    /// Record every firework of `population` as a potential parent.
    pub fn record_all(&mut self, population: &[Firework]) {
        for firework in population {
            self.records
                .entry(firework.id)
                .or_insert_with(|| (firework.coordinates.clone(), firework.quality));
        }
    }

    pub fn resolve(&self, id: FireworkId) -> Option<ParentSnapshot> {
        self.records.get(&id).map(|(coordinates, quality)| ParentSnapshot {
            id,
            coordinates: coordinates.clone(),
            quality: *quality,
        })
    }

    /// Drop records none of `fireworks` refers to.
    pub fn retain_parents_of<'a>(&mut self, fireworks: impl IntoIterator<Item = &'a Firework>) {
        let referenced: Vec<FireworkId> = fireworks.into_iter().filter_map(|f| f.parent).collect();
        self.records.retain(|id, _| referenced.contains(id));
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
