//! Evaluation of parsed dice expressions into roll trees.

mod ctx;
mod error;
mod num;
mod roller;
mod stringify;
mod tree;

type RResult<T> = Result<T, RollError>;

pub use ctx::RollContext;
pub use error::RollError;
pub use num::Number;
pub use roller::Roller;
#[cfg(test)]
pub(crate) use roller::StepRoller;
pub use stringify::{MarkdownStringifier, SimpleStringifier, Stringify};
pub use tree::Roll;
