//! Fireworks - Swarm-based black-box optimization.
//!
//! This crate implements the Fireworks Algorithm family: the original
//! algorithm (FWA, 2010), the Enhanced Fireworks Algorithm with its elite
//! strategy (EFWA, 2012) and the dynamic explosion amplitude variant
//! (dynFWA, 2014). A population of candidate points ("fireworks") explodes
//! into sparks every step and a distance-based selection keeps the next
//! generation diverse.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Search-space, settings and snapshot types
//! - `compute`: The engine (problems, fireworks, selection, algorithm, session)
//!
//! The engine never draws anything itself. Every completed step produces an
//! owned [`schema::AlgorithmState`], delivered through an iterator or a
//! callback.
//!
//! # Example
//!
//! ```rust,no_run
//! use fireworks::compute::session::Solver;
//! use fireworks::schema::{AlgorithmVariant, SolverSettings};
//!
//! let settings = SolverSettings {
//!     variant: AlgorithmVariant::DynFwa,
//!     step_delay_ms: 0,
//!     ..Default::default()
//! };
//!
//! let mut solver = Solver::new();
//! solver
//!     .solve(|c: &[f64]| (c[0] - 1.0).powi(2) + c[1] * c[1], (-5.0, 5.0), (-5.0, 5.0), &settings)
//!     .unwrap();
//! solver
//!     .run(|state| println!("Step {}: best = {:?}", state.current_step, state.best_quality))
//!     .unwrap();
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{Algorithm, AlgorithmError, Problem, Randomizer, StopCondition};
pub use schema::{AlgorithmSettings, AlgorithmState, Dimension, Interval, ProblemTarget};
