//! The generation collaborator seam.
//!
//! The crew that researches a prospect and writes the email is an external
//! process; this module owns the trait the runner depends on, the
//! subprocess-backed production implementation, and the tolerant stdout
//! parser.

mod pipeline;

pub use pipeline::{parse_pipeline_output, CommandPipeline, GenerationPipeline};
