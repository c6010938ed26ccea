//! Merge module - Multi-manager merge of update and apply operations.
//!
//! This module tracks field ownership across managers and reports conflicts.

mod conflict;
mod merger;
mod operation;

#[cfg(test)]
mod merge_test;

pub use conflict::*;
pub use merger::*;
pub use operation::*;
