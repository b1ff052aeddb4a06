//! Compute module - The fireworks algorithm engine and its building blocks.
//!
//! # Overview
//!
//! - **Randomness** (`random`): Seeded uniform, Gaussian and unique-index draws
//! - **Problems** (`problem`, `objective`): Dimensions, ranges and the objective
//! - **Fireworks** (`firework`, `population`): Candidates, lineage and selection
//! - **Algorithm** (`algorithm`): FWA, EFWA and dynFWA over one step pipeline
//! - **Stop conditions** (`stop`): When a run is finished
//! - **Session** (`session`): Paced two-dimensional runs for a plotting front end
//!
//! # Example
//!
//! ```rust,no_run
//! use fireworks::compute::{Algorithm, Problem, Randomizer, StepCounterStopCondition};
//! use fireworks::schema::{AlgorithmSettings, Dimension, Interval, ProblemTarget};
//!
//! let dimensions = vec![
//!     Dimension::new("x", Interval::new(-5.0, 5.0).unwrap()),
//!     Dimension::new("y", Interval::new(-5.0, 5.0).unwrap()),
//! ];
//! let problem = Problem::new(
//!     dimensions,
//!     |c: &[f64]| c[0] * c[0] + c[1] * c[1],
//!     ProblemTarget::Minimum,
//! )
//! .unwrap();
//!
//! let mut algorithm = Algorithm::new(
//!     problem,
//!     StepCounterStopCondition::new(50),
//!     Randomizer::new(42),
//!     AlgorithmSettings::default(),
//! )
//! .unwrap();
//!
//! for state in algorithm.steps() {
//!     let state = state.unwrap();
//!     println!("Step {}: best = {:.6}", state.step_number, state.best_quality());
//! }
//! ```

mod algorithm;
mod firework;
mod objective;
mod population;
mod problem;
mod random;
mod stop;

pub mod session;

pub use algorithm::*;
pub use firework::*;
pub use objective::*;
pub use population::*;
pub use problem::*;
pub use random::*;
pub use stop::*;
