//! Machine- and human-facing result output.

mod writer;

pub use writer::{OutputWriter, ScoreOutput};
