use thiserror::Error;

/// Raised while evaluating a compiled expression.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum RollError {
    /// The invocation rolled more dice than its context allows.
    #[error("too many dice rolled")]
    TooManyRolls,
    #[error("cannot divide by zero")]
    ZeroDivision,
    #[error("cannot take modulus by zero")]
    ZeroModulo,
}
