//! Typed module - Operations on Values with specific schemas.
//!
//! This module provides validation, comparison, overlay and removal.

mod comparison;
mod merge;
mod parser;
mod remove;
mod typed_value;
mod validation;






pub use comparison::*;
pub use parser::*;
pub use typed_value::{as_typed, TypedValue};
pub use validation::*;
