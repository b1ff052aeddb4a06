//! Interactive solver session over a two-dimensional objective.
//!
//! A [`Solver`] owns at most one run at a time and folds every snapshot into a
//! flat [`SolverState`] a plotting front end can draw directly: current
//! fireworks, the best point and the trail of every point shown so far.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::schema::{
    AlgorithmState, ConfigError, Dimension, FireworkSnapshot, FireworkType, Interval,
    ProblemTarget, SolverSettings,
};

use super::algorithm::{Algorithm, AlgorithmError};
use super::objective::{ExpressionCompiler, ExpressionObjective, Objective, ParseError};
use super::problem::Problem;
use super::random::Randomizer;
use super::stop::StepCounterStopCondition;

/// Grid resolution used for surface sampling when the caller has no preference.
pub const DEFAULT_SURFACE_RESOLUTION: usize = 60;

/// Errors raised while setting up or driving a session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),
}

/// A point in plot space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A firework as drawn by the front end: `z` is its quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireworkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FireworkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Position>,
}

impl FireworkPoint {
    fn from_snapshot(firework: &FireworkSnapshot) -> Self {
        let (x, y) = plane(&firework.coordinates);
        Self {
            x,
            y,
            z: firework.quality.unwrap_or(0.0),
            kind: Some(firework.kind),
            parent: firework.parent.as_ref().map(|parent| {
                let (x, y) = plane(&parent.coordinates);
                Position {
                    x,
                    y,
                    z: parent.quality.unwrap_or(0.0),
                }
            }),
        }
    }
}

fn plane(coordinates: &[f64]) -> (f64, f64) {
    (
        coordinates.first().copied().unwrap_or(0.0),
        coordinates.get(1).copied().unwrap_or(0.0),
    )
}

/// Everything a front end needs to draw the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverState {
    pub is_running: bool,
    pub current_step: u32,
    pub total_steps: u32,
    pub firework_positions: Vec<FireworkPoint>,
    pub best_position: Option<FireworkPoint>,
    pub best_quality: Option<f64>,
    /// Every point emitted since the run started.
    pub trail_positions: Vec<FireworkPoint>,
    pub error: Option<String>,
}

impl SolverState {
    fn observe(&mut self, state: &AlgorithmState) {
        let positions: Vec<FireworkPoint> = state
            .fireworks
            .iter()
            .map(FireworkPoint::from_snapshot)
            .collect();

        let best = &state.best_solution;
        let (x, y) = plane(&best.coordinates);

        self.current_step = state.step_number;
        self.trail_positions.extend(positions.iter().cloned());
        self.firework_positions = positions;
        self.best_position = Some(FireworkPoint {
            x,
            y,
            z: best.quality.unwrap_or(0.0),
            kind: None,
            parent: None,
        });
        self.best_quality = best.quality;
    }
}

/// Drives one minimization run at a time for an interactive front end.
#[derive(Debug, Default)]
pub struct Solver {
    algorithm: Option<Algorithm>,
    state: SolverState,
    step_delay: Duration,
    stopped: Arc<AtomicBool>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SolverState {
        &self.state
    }

    /// The active run, if any.
    pub fn algorithm(&self) -> Option<&Algorithm> {
        self.algorithm.as_ref()
    }

    /// Get a handle that stops the session from another thread.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }

    /// Start minimizing `objective` over `x_range` x `y_range`.
    ///
    /// Any previous run is stopped first. Setup failures are recorded as
    /// `"Initialization error: ..."` in the state and returned.
    pub fn solve<O>(
        &mut self,
        objective: O,
        x_range: (f64, f64),
        y_range: (f64, f64),
        settings: &SolverSettings,
    ) -> Result<(), SessionError>
    where
        O: Objective + Send + 'static,
    {
        self.stop();
        self.stopped.store(false, Ordering::Relaxed);

        match Self::build(objective, x_range, y_range, settings) {
            Ok(mut algorithm) => {
                log::info!(
                    "Solving with {:?}: {} fireworks, {} steps",
                    settings.variant,
                    settings.locations_number,
                    settings.max_steps
                );
                self.state = SolverState {
                    is_running: true,
                    total_steps: settings.max_steps,
                    ..Default::default()
                };
                self.state.observe(algorithm.initialize());
                self.step_delay = Duration::from_millis(settings.step_delay_ms);
                self.algorithm = Some(algorithm);
                Ok(())
            }
            Err(e) => {
                self.algorithm = None;
                self.fail(format!("Initialization error: {e}"));
                Err(e)
            }
        }
    }

    /// Compile `formula` in the variables `x` and `y` and start minimizing it.
    pub fn solve_expression<C>(
        &mut self,
        compiler: &C,
        formula: &str,
        x_range: (f64, f64),
        y_range: (f64, f64),
        settings: &SolverSettings,
    ) -> Result<(), SessionError>
    where
        C: ExpressionCompiler,
        C::Output: Send + 'static,
    {
        match compile_formula(compiler, formula) {
            Ok(evaluator) => {
                let objective = ExpressionObjective::new(evaluator, vec!["x".into(), "y".into()]);
                self.solve(objective, x_range, y_range, settings)
            }
            Err(e) => {
                self.stop();
                self.algorithm = None;
                let e = SessionError::from(e);
                self.fail(format!("Initialization error: {e}"));
                Err(e)
            }
        }
    }

    fn build<O>(
        objective: O,
        x_range: (f64, f64),
        y_range: (f64, f64),
        settings: &SolverSettings,
    ) -> Result<Algorithm, SessionError>
    where
        O: Objective + Send + 'static,
    {
        settings.validate()?;
        let dimensions = vec![
            Dimension::new("x", Interval::new(x_range.0, x_range.1)?),
            Dimension::new("y", Interval::new(y_range.0, y_range.1)?),
        ];
        let problem = Problem::new(dimensions, objective, ProblemTarget::Minimum)?;
        let random = settings.random_seed.map(Randomizer::new).unwrap_or_default();

        Ok(Algorithm::new(
            problem,
            StepCounterStopCondition::new(settings.max_steps),
            random,
            settings.algorithm_settings(),
        )?)
    }

    /// Perform one step without pacing. Returns `false` once the run is over.
    ///
    /// Step failures are recorded as `"Algorithm error: ..."` and end the run.
    pub fn advance(&mut self) -> Result<bool, SessionError> {
        if self.stopped.load(Ordering::Relaxed) {
            self.state.is_running = false;
            return Ok(false);
        }
        let Some(algorithm) = self.algorithm.as_mut() else {
            return Ok(false);
        };
        if algorithm.should_stop() {
            self.state.is_running = false;
            return Ok(false);
        }

        match algorithm.make_step().map(|_| ()) {
            Ok(()) => {
                if let Some(state) = algorithm.state() {
                    self.state.observe(state);
                }
                Ok(true)
            }
            Err(e) => {
                self.fail(format!("Algorithm error: {e}"));
                Err(e.into())
            }
        }
    }

    /// Step until the run is over, pausing for the configured delay before each
    /// step and calling `observer` after it.
    pub fn run<F>(&mut self, mut observer: F) -> Result<(), SessionError>
    where
        F: FnMut(&SolverState),
    {
        loop {
            if !self.step_delay.is_zero() {
                std::thread::sleep(self.step_delay);
            }
            if !self.advance()? {
                return Ok(());
            }
            observer(&self.state);
        }
    }

    /// Stop the active run, keeping what has been drawn so far.
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::Relaxed);
        if let Some(algorithm) = self.algorithm.as_mut() {
            algorithm.stop();
        }
        self.state.is_running = false;
    }

    /// Stop and forget the active run.
    pub fn reset(&mut self) {
        self.stop();
        self.algorithm = None;
        self.state = SolverState::default();
    }

    fn fail(&mut self, message: String) {
        log::warn!("{message}");
        self.state.is_running = false;
        self.state.error = Some(message);
    }
}

fn compile_formula<C: ExpressionCompiler>(
    compiler: &C,
    formula: &str,
) -> Result<C::Output, ParseError> {
    if formula.trim().is_empty() {
        return Err(ParseError {
            position: 0,
            message: "Formula is required".to_string(),
        });
    }
    compiler.compile(formula)
}

/// Objective sampled on a regular grid, for drawing a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Row `j` holds the values along `x` at `y[j]`. Failed points are NaN.
    pub z: Vec<Vec<f64>>,
}

/// Evaluate `objective` on a `resolution` x `resolution` grid spanning both ranges.
pub fn sample_surface<O>(
    objective: &O,
    x_range: (f64, f64),
    y_range: (f64, f64),
    resolution: usize,
) -> Result<SurfaceGrid, ConfigError>
where
    O: Objective + ?Sized,
{
    if resolution < 2 {
        return Err(ConfigError::InvalidValue(format!(
            "surface resolution must be at least 2, got {resolution}"
        )));
    }
    let x = linspace(Interval::new(x_range.0, x_range.1)?, resolution);
    let y = linspace(Interval::new(y_range.0, y_range.1)?, resolution);

    let z = y
        .iter()
        .map(|&yj| {
            x.iter()
                .map(|&xi| match objective.evaluate(&[xi, yj]) {
                    Ok(value) if value.is_finite() => value,
                    _ => f64::NAN,
                })
                .collect()
        })
        .collect();

    Ok(SurfaceGrid { x, y, z })
}

fn linspace(range: Interval, n: usize) -> Vec<f64> {
    let step = range.length() / (n - 1) as f64;
    (0..n).map(|i| range.low() + i as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::objective::{Bindings, EvaluationError, Evaluator};
    use crate::schema::AlgorithmVariant;

    /// Recognizes a handful of fixed formulas.
    struct Formulas;

    struct Compiled(fn(f64, f64) -> f64);

    impl Evaluator for Compiled {
        fn evaluate(&self, bindings: &Bindings) -> Result<f64, EvaluationError> {
            let get = |name: &str| {
                bindings
                    .get(name)
                    .copied()
                    .ok_or_else(|| EvaluationError::UndefinedVariable(name.to_string()))
            };
            Ok((self.0)(get("x")?, get("y")?))
        }
    }

    impl ExpressionCompiler for Formulas {
        type Output = Compiled;

        fn compile(&self, text: &str) -> Result<Compiled, ParseError> {
            match text.trim() {
                "x^2 + y^2" => Ok(Compiled(|x, y| x * x + y * y)),
                "1 / x" => Ok(Compiled(|x, _| 1.0 / x)),
                _ => Err(ParseError {
                    position: 0,
                    message: format!("Unexpected input {text:?}"),
                }),
            }
        }
    }

    fn settings(variant: AlgorithmVariant) -> SolverSettings {
        SolverSettings {
            variant,
            locations_number: 5,
            max_steps: 10,
            step_delay_ms: 0,
            random_seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_fills_state() {
        for variant in [AlgorithmVariant::Fwa, AlgorithmVariant::Efwa, AlgorithmVariant::DynFwa] {
            let mut solver = Solver::new();
            solver
                .solve_expression(
                    &Formulas,
                    "x^2 + y^2",
                    (-5.0, 5.0),
                    (-5.0, 5.0),
                    &settings(variant),
                )
                .unwrap();
            assert!(solver.state().is_running);
            assert_eq!(solver.state().total_steps, 10);
            assert_eq!(solver.state().firework_positions.len(), 5);
            let initial_best = solver.state().best_quality.unwrap();

            let mut observed = Vec::new();
            solver.run(|state| observed.push(state.current_step)).unwrap();

            let state = solver.state();
            assert_eq!(observed, (1..=10).collect::<Vec<_>>());
            assert!(!state.is_running);
            assert_eq!(state.current_step, 10);
            assert_eq!(state.firework_positions.len(), 5);
            assert_eq!(state.trail_positions.len(), 11 * 5);
            assert!(state.best_quality.unwrap() <= initial_best);
            assert!(state.error.is_none());

            let sparks = state
                .firework_positions
                .iter()
                .filter(|p| p.kind != Some(FireworkType::Initial));
            for point in sparks {
                assert!(point.parent.is_some());
            }
        }
    }

    #[test]
    fn test_parse_error_is_reported() {
        let mut solver = Solver::new();
        let result = solver.solve_expression(
            &Formulas,
            "x ^^ y",
            (-5.0, 5.0),
            (-5.0, 5.0),
            &settings(AlgorithmVariant::Fwa),
        );
        assert!(matches!(result, Err(SessionError::Parse(_))));

        let error = solver.state().error.as_deref().unwrap();
        assert!(error.starts_with("Initialization error: Parse error"), "{error}");
        assert!(!solver.state().is_running);
        assert!(!solver.advance().unwrap());
    }

    #[test]
    fn test_empty_formula_rejected() {
        let mut solver = Solver::new();
        let result = solver.solve_expression(
            &Formulas,
            "   ",
            (0.0, 1.0),
            (0.0, 1.0),
            &SolverSettings::default(),
        );
        assert!(matches!(result, Err(SessionError::Parse(_))));
        assert!(solver.state().error.as_deref().unwrap().contains("Formula is required"));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut solver = Solver::new();
        let too_small = SolverSettings {
            locations_number: 1,
            ..settings(AlgorithmVariant::Fwa)
        };
        let result = solver.solve(|c: &[f64]| c[0], (0.0, 1.0), (0.0, 1.0), &too_small);
        assert!(matches!(result, Err(SessionError::Config(ConfigError::OutOfRange { .. }))));

        let result = solver.solve(
            |c: &[f64]| c[0],
            (1.0, 0.0),
            (0.0, 1.0),
            &settings(AlgorithmVariant::Fwa),
        );
        assert!(matches!(
            result,
            Err(SessionError::Config(ConfigError::InvertedInterval { .. }))
        ));
        assert!(solver.algorithm().is_none());

        let result = solver.solve(
            |c: &[f64]| c[0],
            (-1e308, 1e308),
            (0.0, 1.0),
            &settings(AlgorithmVariant::Fwa),
        );
        assert!(matches!(
            result,
            Err(SessionError::Config(ConfigError::IntervalTooWide { .. }))
        ));
        assert!(solver.state().error.is_some());
    }

    #[test]
    fn test_stop_handle_from_another_thread() {
        let mut solver = Solver::new();
        solver
            .solve(
                |c: &[f64]| c[0].abs() + c[1].abs(),
                (-1.0, 1.0),
                (-1.0, 1.0),
                &settings(AlgorithmVariant::DynFwa),
            )
            .unwrap();
        assert!(solver.advance().unwrap());

        let handle = solver.stop_handle();
        std::thread::spawn(move || handle.store(true, Ordering::Relaxed))
            .join()
            .unwrap();

        assert!(!solver.advance().unwrap());
        assert!(!solver.state().is_running);
        assert_eq!(solver.state().current_step, 1);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut solver = Solver::new();
        solver
            .solve(
                |c: &[f64]| c[0] * c[1],
                (-1.0, 1.0),
                (-1.0, 1.0),
                &settings(AlgorithmVariant::Fwa),
            )
            .unwrap();
        solver.advance().unwrap();
        solver.reset();
        assert_eq!(solver.state(), &SolverState::default());
        assert!(solver.algorithm().is_none());
    }

    #[test]
    fn test_sample_surface_marks_failures() {
        let objective = ExpressionObjective::new(
            Formulas.compile("1 / x").unwrap(),
            vec!["x".into(), "y".into()],
        );
        let grid = sample_surface(&objective, (-1.0, 1.0), (0.0, 4.0), 3).unwrap();

        assert_eq!(grid.x, vec![-1.0, 0.0, 1.0]);
        assert_eq!(grid.y, vec![0.0, 2.0, 4.0]);
        assert_eq!(grid.z.len(), 3);
        for row in &grid.z {
            assert_eq!(row[0], -1.0);
            assert!(row[1].is_nan());
            assert_eq!(row[2], 1.0);
        }

        assert!(sample_surface(&objective, (-1.0, 1.0), (0.0, 1.0), 1).is_err());
    }
}
