//! Objective functions and the boundary with an external expression engine.
//!
//! The engine never parses formulas itself. A front end compiles text with an
//! [`ExpressionCompiler`] of its choice and hands the resulting [`Evaluator`]
//! over, bound to the problem's dimension names through [`ExpressionObjective`].

use std::collections::HashMap;

/// Variable bindings passed to an expression evaluator.
pub type Bindings = HashMap<String, f64>;

/// Scalar function of a point in the search space.
pub trait Objective {
    /// Evaluate at `coordinates` (one value per dimension, in dimension order).
    fn evaluate(&self, coordinates: &[f64]) -> Result<f64, EvaluationError>;
}

impl<F> Objective for F
where
    F: Fn(&[f64]) -> f64,
{
    fn evaluate(&self, coordinates: &[f64]) -> Result<f64, EvaluationError> {
        Ok(self(coordinates))
    }
}

/// A compiled expression evaluated against named variables.
pub trait Evaluator {
    fn evaluate(&self, bindings: &Bindings) -> Result<f64, EvaluationError>;
}

/// Compiles expression text into an [`Evaluator`].
pub trait ExpressionCompiler {
    type Output: Evaluator;

    fn compile(&self, text: &str) -> Result<Self::Output, ParseError>;
}

/// Adapts an [`Evaluator`] to an [`Objective`] by binding coordinates to variable names.
pub struct ExpressionObjective<E> {
    evaluator: E,
    names: Vec<String>,
}

impl<E: Evaluator> ExpressionObjective<E> {
    /// `names` lists the variable bound to each dimension, in dimension order.
    pub fn new(evaluator: E, names: Vec<String>) -> Self {
        Self { evaluator, names }
    }
}

impl<E: Evaluator> Objective for ExpressionObjective<E> {
    fn evaluate(&self, coordinates: &[f64]) -> Result<f64, EvaluationError> {
        if coordinates.len() != self.names.len() {
            return Err(EvaluationError::Arity {
                expected: self.names.len(),
                got: coordinates.len(),
            });
        }
        let bindings: Bindings = self
            .names
            .iter()
            .cloned()
            .zip(coordinates.iter().copied())
            .collect();
        self.evaluator.evaluate(&bindings)
    }
}

/// Objective evaluation failed. The engine downgrades this to a NaN quality.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("Expected {expected} coordinates, got {got}")]
    Arity { expected: usize, got: usize },
    #[error("Evaluation failed: {0}")]
    Failed(String),
}

/// Expression text could not be compiled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Parse error at {position}: {message}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SumOfSquares;

    impl Evaluator for SumOfSquares {
        fn evaluate(&self, bindings: &Bindings) -> Result<f64, EvaluationError> {
            let x = bindings
                .get("x")
                .ok_or_else(|| EvaluationError::UndefinedVariable("x".into()))?;
            let y = bindings
                .get("y")
                .ok_or_else(|| EvaluationError::UndefinedVariable("y".into()))?;
            Ok(x * x + y * y)
        }
    }

    #[test]
    fn test_closure_objective() {
        let f = |c: &[f64]| c[0] - c[1];
        assert_eq!(Objective::evaluate(&f, &[3.0, 1.0]), Ok(2.0));
    }

    #[test]
    fn test_expression_binding() {
        let objective = ExpressionObjective::new(SumOfSquares, vec!["x".into(), "y".into()]);
        assert_eq!(objective.evaluate(&[3.0, 4.0]), Ok(25.0));
        assert!(matches!(
            objective.evaluate(&[1.0]),
            Err(EvaluationError::Arity { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_undefined_variable_surfaces() {
        let objective = ExpressionObjective::new(SumOfSquares, vec!["x".into(), "z".into()]);
        assert_eq!(
            objective.evaluate(&[1.0, 2.0]),
            Err(EvaluationError::UndefinedVariable("y".into()))
        );
    }
}
