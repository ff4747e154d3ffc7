pub mod peephole;
pub mod util;

#[cfg(test)]
mod stress_tests;

pub use peephole::{optimize, Diagnostic, Peephole};

use crate::pipeline::{PassConfig, TransformPipeline};

/// Build a transform pipeline based on the given pass configuration.
pub fn default_pipeline(config: &PassConfig) -> TransformPipeline {
    let mut pipeline = TransformPipeline::new();
    if config.peephole {
        pipeline.add(Box::new(Peephole::new()));
    }
    pipeline.set_fixpoint(config.fixpoint);
    pipeline
}
