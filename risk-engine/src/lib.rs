//! Risk Engine for Transdetect
//!
//! Rule-based fraud scoring for submitted transactions. The engine is a pure
//! function of a candidate transaction and that account's prior history; it
//! performs no I/O and holds no mutable state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;
pub mod velocity;
pub mod scoring;

pub use error::{Error, Result};
pub use types::*;
pub use scoring::{RiskScorer, Rule, ScoringConfig};
