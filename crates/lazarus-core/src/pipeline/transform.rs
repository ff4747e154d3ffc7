use crate::error::CoreError;
use crate::ir::Body;

/// Result of applying a transform: the (mutated) body and whether any
/// rewrite rule fired.
pub struct TransformResult {
    pub body: Body,
    pub changed: bool,
}

/// Transform trait — a pass that rewrites method bodies.
///
/// The peephole optimizer is the built-in implementation; further passes
/// plug in through the same interface, usually as [`crate::ir::Visitor`]
/// subclasses.
pub trait Transform {
    /// Name of this transform pass.
    fn name(&self) -> &str;

    /// Apply this transform, returning the same body rewritten in place.
    fn apply(&self, body: Body) -> Result<TransformResult, CoreError>;
}

/// Iteration cap for fixpoint pipelines; a pass set that still reports
/// changes past this is cycling, which is a pass bug.
const MAX_FIXPOINT_ITERS: usize = 10;

/// An ordered sequence of transforms to apply.
#[derive(Default)]
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
    fixpoint: bool,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
            fixpoint: false,
        }
    }

    pub fn add(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// When set, the pipeline re-runs until no pass reports a change.
    pub fn set_fixpoint(&mut self, fixpoint: bool) {
        self.fixpoint = fixpoint;
    }

    /// Run all transforms in order on the given body.
    pub fn run(&self, mut body: Body) -> Result<Body, CoreError> {
        for _ in 0..MAX_FIXPOINT_ITERS {
            let mut changed = false;
            for transform in &self.transforms {
                let result = transform.apply(body)?;
                body = result.body;
                changed |= result.changed;
            }
            if !(self.fixpoint && changed) {
                break;
            }
        }
        Ok(body)
    }
}
