use thiserror::Error;

/// Reasons a grade record is refused before it reaches the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    #[error("score {0} is outside the 0-10 scale")]
    ScoreOutOfRange(f64),

    #[error("coefficient {0} must be a positive number")]
    InvalidCoefficient(f64),

    #[error("subject must not be empty")]
    EmptySubject,
}
