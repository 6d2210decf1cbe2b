//! Prospect inputs, generation outputs, and the synthetic test-prospect
//! generator used by the improvement cycle.

mod generator;
mod types;

pub use generator::ProspectGenerator;
pub use types::{GenerationResult, ProspectInput, ProspectResearch};
