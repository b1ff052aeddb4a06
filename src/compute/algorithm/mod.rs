//! The fireworks algorithm engine.
//!
//! All three variants share one step pipeline; [`Strategy`] supplies the
//! variant-specific hooks (amplitude rules, spark shapes, elite point, core
//! amplitude). A run moves through [`AlgorithmPhase`] and emits one
//! [`AlgorithmState`] per completed step.

mod elite;
mod sparks;
mod strategy;

pub use elite::{ElitePoint, EliteStrategy};
pub use sparks::{ExplosionShape, amplitudes, explosion_spark, gaussian_spark, spark_counts};
pub use strategy::{AmplitudeFloor, CoreAmplitude, Strategy};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::schema::{
    AlgorithmPhase, AlgorithmSettings, AlgorithmState, ConfigError, FireworkType, RunSummary,
    StopReason,
};

use super::firework::{Firework, FireworkIds, Lineage};
use super::population::{best_index, create_initial_population, select_survivors, worst_index};
use super::problem::Problem;
use super::random::{RangeTooSmall, Randomizer};
use super::stop::StopCondition;

/// Errors raised while driving a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlgorithmError {
    #[error("Algorithm has not been initialized")]
    NotInitialized,
    #[error("Algorithm has already stopped")]
    AlreadyStopped,
    #[error(transparent)]
    RangeTooSmall(#[from] RangeTooSmall),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Population and best solution of an initialized run.
#[derive(Debug, Clone)]
struct Run {
    population: Vec<Firework>,
    best: Firework,
    last_improvement_step: u32,
    state: AlgorithmState,
}

/// One fireworks algorithm run over a [`Problem`].
pub struct Algorithm {
    problem: Problem,
    settings: AlgorithmSettings,
    strategy: Strategy,
    stop_condition: Box<dyn StopCondition + Send>,
    random: Randomizer,
    ids: FireworkIds,
    lineage: Lineage,
    run: Option<Run>,
    step_number: u32,
    phase: AlgorithmPhase,
    evaluations: u64,
    stop_reason: Option<StopReason>,
    cancelled: Arc<AtomicBool>,
}

impl std::fmt::Debug for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Algorithm")
            .field("problem", &self.problem)
            .field("settings", &self.settings)
            .field("phase", &self.phase)
            .field("step_number", &self.step_number)
            .field("evaluations", &self.evaluations)
            .finish_non_exhaustive()
    }
}

impl Algorithm {
    /// Create a run. Settings are validated up front; nothing is evaluated yet.
    pub fn new(
        problem: Problem,
        stop_condition: impl StopCondition + Send + 'static,
        random: Randomizer,
        settings: AlgorithmSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let strategy = Strategy::from_settings(&settings);

        Ok(Self {
            problem,
            settings,
            strategy,
            stop_condition: Box::new(stop_condition),
            random,
            ids: FireworkIds::default(),
            lineage: Lineage::default(),
            run: None,
            step_number: 0,
            phase: AlgorithmPhase::Uninitialized,
            evaluations: 0,
            stop_reason: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get the cancellation handle. Setting it stops the run before its next step.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    #[inline]
    pub fn phase(&self) -> AlgorithmPhase {
        self.phase
    }

    /// Completed steps.
    #[inline]
    pub fn step_number(&self) -> u32 {
        self.step_number
    }

    /// Objective evaluations so far, including the initial population.
    #[inline]
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn settings(&self) -> &AlgorithmSettings {
        &self.settings
    }

    /// Latest snapshot, `None` before initialization.
    pub fn state(&self) -> Option<&AlgorithmState> {
        self.run.as_ref().map(|run| &run.state)
    }

    /// Best firework seen so far.
    pub fn best(&self) -> Option<&Firework> {
        self.run.as_ref().map(|run| &run.best)
    }

    pub fn population(&self) -> &[Firework] {
        self.run.as_ref().map_or(&[], |run| &run.population)
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    /// Current amplitude of the core firework (2014 algorithm only).
    pub fn core_amplitude(&self) -> Option<f64> {
        self.strategy.core_amplitude()
    }

    /// Build and evaluate the initial population and emit step 0.
    ///
    /// Re-initializing starts a fresh run; the random stream continues.
    pub fn initialize(&mut self) -> &AlgorithmState {
        let target = self.problem.target();
        let n = self.settings.base().locations_number;

        self.problem.reset_current_ranges();
        self.strategy.reset(&self.problem);
        self.ids = FireworkIds::default();
        self.lineage.clear();
        self.cancelled.store(false, Ordering::Relaxed);
        self.stop_reason = None;
        self.step_number = 0;

        let population =
            create_initial_population(&self.problem, n, &mut self.random, &mut self.ids);
        self.evaluations = population.len() as u64;

        // Validated settings guarantee a non-empty population.
        let best = population[best_index(&population, target).unwrap_or(0)].clone();
        let state = snapshot(0, &population, &best, 0, &self.lineage);

        log::debug!(
            "Initialized {:?} run with {} fireworks, best quality {}",
            self.settings.variant(),
            population.len(),
            state.best_quality()
        );

        self.phase = AlgorithmPhase::Initialized;
        &self
            .run
            .insert(Run {
                population,
                best,
                last_improvement_step: 0,
                state,
            })
            .state
    }

    /// Whether the run is over: stopped, cancelled, or the stop condition holds.
    pub fn should_stop(&self) -> bool {
        self.pending_stop().is_some()
    }

    /// Stop the run. The last snapshot stays available.
    pub fn stop(&mut self) {
        self.finish(StopReason::Cancelled);
    }

    /// Perform one step and return the new snapshot.
    ///
    /// On [`AlgorithmError::AlreadyStopped`] the state is left untouched. Any
    /// other error stops the run with [`StopReason::Error`]; the previous
    /// snapshot stays intact.
    pub fn make_step(&mut self) -> Result<&AlgorithmState, AlgorithmError> {
        if self.phase == AlgorithmPhase::Uninitialized {
            return Err(AlgorithmError::NotInitialized);
        }
        if self.halt_if_done() {
            return Err(AlgorithmError::AlreadyStopped);
        }

        if let Err(e) = self.step() {
            log::warn!("Step {} failed: {e}", self.step_number + 1);
            self.finish(StopReason::Error(e.to_string()));
            return Err(e);
        }

        self.state().ok_or(AlgorithmError::NotInitialized)
    }

    /// Iterate over snapshots, initializing first if needed.
    ///
    /// The iterator ends when the run stops and after the first error.
    /// Dropping it leaves the run where it is.
    pub fn steps(&mut self) -> Steps<'_> {
        Steps {
            algorithm: self,
            done: false,
        }
    }

    /// Run to completion, calling `callback` with every snapshot.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<RunSummary, AlgorithmError>
    where
        F: FnMut(&AlgorithmState),
    {
        let start_time = std::time::Instant::now();

        if self.phase == AlgorithmPhase::Uninitialized {
            callback(self.initialize());
        }

        while !self.halt_if_done() {
            callback(self.make_step()?);
        }

        let best = self
            .run
            .as_ref()
            .map(|run| run.state.best_solution.clone())
            .ok_or(AlgorithmError::NotInitialized)?;

        Ok(RunSummary {
            steps: self.step_number,
            evaluations: self.evaluations,
            best,
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
            stop_reason: self.stop_reason.clone().unwrap_or(StopReason::Cancelled),
        })
    }

    /// Run to completion (blocking).
    pub fn run(&mut self) -> Result<RunSummary, AlgorithmError> {
        self.run_with_callback(|_| {})
    }

    fn pending_stop(&self) -> Option<StopReason> {
        if self.phase == AlgorithmPhase::Stopped {
            return Some(self.stop_reason.clone().unwrap_or(StopReason::Cancelled));
        }
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }
        self.state().and_then(|state| self.stop_condition.check(state))
    }

    /// Move to `Stopped` if the run is over. Returns whether it is.
    fn halt_if_done(&mut self) -> bool {
        match self.pending_stop() {
            Some(reason) => {
                self.finish(reason);
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, reason: StopReason) {
        if self.phase == AlgorithmPhase::Stopped {
            return;
        }
        log::info!(
            "Run stopped after {} steps ({:?}), {} evaluations",
            self.step_number,
            reason,
            self.evaluations
        );
        self.phase = AlgorithmPhase::Stopped;
        self.stop_reason = Some(reason);
    }

    /// Generate explosion and Gaussian sparks for the next step.
    ///
    /// This is the only fallible part of a step; nothing but the random stream
    /// and the id counter is touched.
    fn generate_sparks(&mut self, step: u32) -> Result<Vec<Firework>, AlgorithmError> {
        let Some(run) = &self.run else {
            return Err(AlgorithmError::NotInitialized);
        };
        let settings = self.settings.base();
        let target = self.problem.target();
        let population = &run.population;

        let qualities: Vec<f64> = population.iter().map(Firework::quality_or_nan).collect();
        let counts = spark_counts(&qualities, target, settings);
        let mut amplitudes =
            amplitudes(&qualities, target, settings.explosion_sparks_maximum_amplitude);
        let core = best_index(population, target);
        self.strategy
            .adjust_amplitudes(&mut amplitudes, core, self.step_number, &self.problem);

        let gaussian_total =
            settings.specific_sparks_number * settings.specific_sparks_per_explosion_number;
        let mut sparks = Vec::with_capacity(counts.iter().sum::<usize>() + gaussian_total);

        for (i, firework) in population.iter().enumerate() {
            let shape = self.strategy.shape(i, core);
            for _ in 0..counts[i] {
                sparks.push(explosion_spark(
                    firework,
                    amplitudes[i],
                    shape,
                    &self.problem,
                    &mut self.random,
                    self.ids.next_id(),
                    step,
                )?);
            }
        }

        let Some(core) = core else {
            return Ok(sparks);
        };
        let best = population[core].coordinates();
        let kind = self.strategy.gaussian_kind();
        let parents = self
            .random
            .unique_indices(settings.specific_sparks_number, population.len())?;

        for parent in parents {
            for _ in 0..settings.specific_sparks_per_explosion_number {
                sparks.push(gaussian_spark(
                    &population[parent],
                    best,
                    kind,
                    &self.problem,
                    &mut self.random,
                    self.ids.next_id(),
                    step,
                )?);
            }
        }

        Ok(sparks)
    }

    fn step(&mut self) -> Result<(), AlgorithmError> {
        let step = self.step_number + 1;
        let target = self.problem.target();
        let mut sparks = self.generate_sparks(step)?;

        let Some(run) = self.run.as_mut() else {
            return Err(AlgorithmError::NotInitialized);
        };

        for spark in &mut sparks {
            if spark.evaluate(&self.problem) {
                self.evaluations += 1;
            }
        }

        let mut pool = std::mem::take(&mut run.population);
        pool.extend(sparks);
        self.lineage.record_all(&pool);

        let elite = self
            .strategy
            .elite()
            .and_then(|elite| elite.locate(&pool, target));

        let n = self.settings.base().locations_number;
        let mut next = select_survivors(pool, n, target, &mut self.random);

        if let Some(point) = elite {
            let mut coordinates = point.coordinates;
            self.problem.clamp_to_initial_range(&mut coordinates);
            let mut elite = Firework::new(
                self.ids.next_id(),
                FireworkType::Elite,
                coordinates,
                Some(point.parent),
                step,
            );
            if elite.evaluate(&self.problem) {
                self.evaluations += 1;
            }
            if let Some(worst) = worst_index(&next, target)
                && target.is_better(elite.quality_or_nan(), next[worst].quality_or_nan())
            {
                next[worst] = elite;
            }
        }

        let mut improved = false;
        if let Some(i) = best_index(&next, target)
            && target.is_better(next[i].quality_or_nan(), run.best.quality_or_nan())
        {
            run.best = next[i].clone();
            run.last_improvement_step = step;
            improved = true;
        }

        self.strategy
            .after_step(improved, run.best.coordinates(), &mut self.problem);
        self.lineage
            .retain_parents_of(next.iter().chain(std::iter::once(&run.best)));

        run.state = snapshot(
            step,
            &next,
            &run.best,
            run.last_improvement_step,
            &self.lineage,
        );
        run.population = next;
        self.step_number = step;
        self.phase = AlgorithmPhase::Stepping;

        log::debug!(
            "Step {}: {} fireworks, best quality {}, {} evaluations",
            step,
            run.population.len(),
            run.state.best_quality(),
            self.evaluations
        );
        Ok(())
    }
}

fn snapshot(
    step_number: u32,
    population: &[Firework],
    best: &Firework,
    last_improvement_step: u32,
    lineage: &Lineage,
) -> AlgorithmState {
    AlgorithmState {
        step_number,
        fireworks: population.iter().map(|f| f.to_snapshot(lineage)).collect(),
        best_solution: best.to_snapshot(lineage),
        last_improvement_step,
    }
}

/// Iterator over the snapshots of a run. See [`Algorithm::steps`].
pub struct Steps<'a> {
    algorithm: &'a mut Algorithm,
    done: bool,
}

impl Iterator for Steps<'_> {
    type Item = Result<AlgorithmState, AlgorithmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.algorithm.phase() == AlgorithmPhase::Uninitialized {
            return Some(Ok(self.algorithm.initialize().clone()));
        }
        if self.algorithm.halt_if_done() {
            self.done = true;
            return None;
        }

        match self.algorithm.make_step() {
            Ok(state) => Some(Ok(state.clone())),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
